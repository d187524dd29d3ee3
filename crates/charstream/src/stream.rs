//! Resumable character stream for parsers.
//!
//! An [`InputStream`] takes document bytes in any registered charset through
//! [`append`](InputStream::append) and presents them as UTF-8, one character
//! at a time, through [`peek`](InputStream::peek) and
//! [`advance`](InputStream::advance). Conversion happens lazily: only when a
//! peek runs past the converted data does the stream resolve the charset
//! (once), strip a byte-order mark (once) and run more raw bytes through its
//! [`Filter`].
//!
//! ```rust
//! use std::sync::Arc;
//! use charstream::{AliasRegistry, InputStream, Peek, StreamOptions};
//!
//! let registry = Arc::new(AliasRegistry::builtin());
//! let mut stream = InputStream::new(
//!     registry,
//!     StreamOptions {
//!         encoding: Some("UTF-16LE".into()),
//!         ..Default::default()
//!     },
//!     None,
//! )
//! .unwrap();
//!
//! stream.append(b"h\x00\xE9\x00").unwrap();
//! stream.append_eof();
//!
//! let mut text = String::new();
//! while let Peek::Char(ch) = stream.peek_char(0).unwrap() {
//!     text.push(ch);
//!     stream.advance(ch.len_utf8());
//! }
//! assert_eq!(text, "hé");
//! assert_eq!(stream.peek(0).unwrap(), Peek::EndOfData);
//! ```

use alloc::{sync::Arc, vec::Vec};

use crate::{
    aliases::{AliasRegistry, UnicodeFamily},
    codec::utf8::char_byte_length,
    detect::is_partial_bom,
    error::{Error, Result},
    filter::Filter,
    options::{EncodingSource, StreamOptions},
};

/// Encoding of the converted buffer.
pub const INTERNAL_ENCODING: &str = "UTF-8";

/// Smallest converted buffer the stream will work with.
const MIN_CAPACITY: usize = 16;

/// Result of a charset detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detected {
    /// Registry id of the detected charset.
    pub registry_id: u16,
    /// How confident the detector is.
    pub source: EncodingSource,
}

/// Picks a charset from the raw bytes seen before the first conversion.
///
/// [`detect_charset`](crate::detect_charset) is the bundled implementation.
pub type CharsetDetector = fn(&[u8], &AliasRegistry) -> Result<Detected>;

/// What [`InputStream::peek`] found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Peek<T> {
    /// A complete character.
    Char(T),
    /// No more input will arrive.
    EndOfData,
    /// More input is needed; append some and peek again.
    OutOfData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharAt {
    Complete(usize),
    Missing,
    Malformed,
}

/// A document being converted to UTF-8 on demand.
#[derive(Debug)]
pub struct InputStream {
    registry: Arc<AliasRegistry>,
    /// Document bytes not converted yet.
    raw: Vec<u8>,
    /// Converted bytes; only `..filled` is meaningful.
    utf8: Vec<u8>,
    filled: usize,
    cursor: usize,
    had_eof: bool,
    done_first_chunk: bool,
    registry_id: Option<u16>,
    source: EncodingSource,
    filter: Filter,
    detector: Option<CharsetDetector>,
}

impl InputStream {
    /// Creates a stream.
    ///
    /// With `options.encoding` set, that charset is used and reported with
    /// `options.source`. Otherwise the charset is chosen on the first
    /// conversion by `detector`, or assumed to be UTF-8 if there is none.
    ///
    /// # Errors
    ///
    /// [`Error::BadEncoding`] if the requested encoding is unknown or
    /// unsupported, [`Error::OutOfMemory`] if the buffer cannot be
    /// allocated.
    pub fn new(
        registry: Arc<AliasRegistry>,
        options: StreamOptions,
        detector: Option<CharsetDetector>,
    ) -> Result<Self> {
        let mut filter = Filter::new(Arc::clone(&registry), INTERNAL_ENCODING)?;
        filter.set_error_mode(options.error_mode);

        let (registry_id, source) = match options.encoding.as_deref() {
            Some(name) => {
                let registry_id = registry
                    .registry_id_from_name(name)
                    .ok_or(Error::BadEncoding)?;
                filter.configure(name)?;
                (Some(registry_id), options.source)
            }
            None => (None, EncodingSource::DEFAULT),
        };

        let capacity = options.buffer_capacity.max(MIN_CAPACITY);
        let mut utf8 = Vec::new();
        utf8.try_reserve_exact(capacity)
            .map_err(|_| Error::OutOfMemory)?;
        utf8.resize(capacity, 0);

        Ok(Self {
            registry,
            raw: Vec::new(),
            utf8,
            filled: 0,
            cursor: 0,
            had_eof: false,
            done_first_chunk: false,
            registry_id,
            source,
            filter,
            detector,
        })
    }

    /// Queues document bytes for conversion.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfMemory`] if the raw buffer cannot grow.
    pub fn append(&mut self, data: &[u8]) -> Result<()> {
        self.raw
            .try_reserve(data.len())
            .map_err(|_| Error::OutOfMemory)?;
        self.raw.extend_from_slice(data);
        Ok(())
    }

    /// Records that no more document bytes will be appended.
    pub fn append_eof(&mut self) {
        self.had_eof = true;
    }

    /// Whether [`append_eof`](Self::append_eof) has been called.
    #[must_use]
    pub const fn had_eof(&self) -> bool {
        self.had_eof
    }

    /// Splices already-converted text in at the cursor. The next peek at
    /// offset zero sees its first character.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfMemory`] if the converted buffer cannot grow.
    pub fn insert(&mut self, text: &str) -> Result<()> {
        let len = text.len();
        while self.filled + len > self.utf8.len() {
            self.grow()?;
        }
        self.utf8
            .copy_within(self.cursor..self.filled, self.cursor + len);
        self.utf8[self.cursor..self.cursor + len].copy_from_slice(text.as_bytes());
        self.filled += len;
        Ok(())
    }

    /// Looks at the character `offset` bytes past the cursor.
    ///
    /// The returned bytes are one complete UTF-8 character borrowed from the
    /// stream's buffer; the borrow ends before the stream can be advanced.
    /// `offset` should be the sum of lengths of characters already peeked.
    ///
    /// # Errors
    ///
    /// Conversion errors from the filter (only [`Error::Invalid`] in strict
    /// mode for well-formed setups), [`Error::NoCharset`] if the detector
    /// fails, [`Error::OutOfMemory`], and [`Error::Invalid`] if `offset`
    /// falls inside a character.
    #[inline]
    pub fn peek(&mut self, offset: usize) -> Result<Peek<&[u8]>> {
        if let CharAt::Complete(len) = self.char_at(offset) {
            let start = self.cursor + offset;
            return Ok(Peek::Char(&self.utf8[start..start + len]));
        }
        self.peek_slow(offset)
    }

    /// Like [`peek`](Self::peek), but copies the character out.
    ///
    /// # Errors
    ///
    /// As for [`peek`](Self::peek).
    pub fn peek_char(&mut self, offset: usize) -> Result<Peek<char>> {
        Ok(match self.peek(offset)? {
            Peek::Char(bytes) => Peek::Char(
                core::str::from_utf8(bytes)
                    .ok()
                    .and_then(|text| text.chars().next())
                    .ok_or(Error::Internal("converted buffer is not UTF-8"))?,
            ),
            Peek::EndOfData => Peek::EndOfData,
            Peek::OutOfData => Peek::OutOfData,
        })
    }

    /// Moves the cursor `bytes` forward, normally by the length of the
    /// character just peeked.
    ///
    /// # Panics
    ///
    /// Panics if fewer than `bytes` converted bytes remain.
    #[inline]
    pub fn advance(&mut self, bytes: usize) {
        assert!(
            bytes <= self.filled - self.cursor,
            "advance by {bytes} bytes with only {} available",
            self.filled - self.cursor
        );
        if self.cursor == self.filled {
            return;
        }
        self.cursor += bytes;
    }

    /// Name of the document charset and how it was chosen.
    ///
    /// Reports the internal encoding until a charset has been recorded with
    /// a source other than [`EncodingSource::DEFAULT`].
    #[must_use]
    pub fn read_charset(&self) -> (&str, EncodingSource) {
        if self.source == EncodingSource::DEFAULT {
            return (INTERNAL_ENCODING, self.source);
        }
        let name = self
            .registry_id
            .and_then(|id| self.registry.registry_id_to_name(id))
            .unwrap_or(INTERNAL_ENCODING);
        (name, self.source)
    }

    /// Switches the document charset for bytes not converted yet, for
    /// example after a parser finds an in-document declaration.
    ///
    /// # Errors
    ///
    /// [`Error::BadEncoding`] if the name is unknown or unsupported; the
    /// current charset stays in effect.
    pub fn change_charset(&mut self, name: &str, source: EncodingSource) -> Result<()> {
        let registry_id = self
            .registry
            .registry_id_from_name(name)
            .ok_or(Error::BadEncoding)?;
        self.filter.configure(name)?;
        self.registry_id = Some(registry_id);
        self.source = source;
        Ok(())
    }

    fn char_at(&self, offset: usize) -> CharAt {
        let available = &self.utf8[..self.filled];
        match available.get(self.cursor + offset..) {
            Some(rest) => match char_byte_length(rest) {
                Ok(len) => CharAt::Complete(len),
                Err(Error::NeedMoreInput) => CharAt::Missing,
                Err(_) => CharAt::Malformed,
            },
            None => CharAt::Missing,
        }
    }

    const fn exhausted<T>(&self) -> Peek<T> {
        if self.had_eof {
            Peek::EndOfData
        } else {
            Peek::OutOfData
        }
    }

    #[cold]
    fn peek_slow(&mut self, offset: usize) -> Result<Peek<&[u8]>> {
        loop {
            match self.char_at(offset) {
                CharAt::Complete(len) => {
                    let start = self.cursor + offset;
                    return Ok(Peek::Char(&self.utf8[start..start + len]));
                }
                CharAt::Malformed => return Err(Error::Invalid),
                CharAt::Missing => {}
            }
            if self.awaits_bom() || (self.raw.is_empty() && !self.filter.has_pending()) {
                return Ok(self.exhausted());
            }

            let raw_before = self.raw.len();
            let unread_before = self.filled - self.cursor;
            if let Err(err) = self.refill() {
                // Text converted ahead of the failure is still delivered.
                if matches!(self.char_at(offset), CharAt::Complete(_)) {
                    continue;
                }
                return Err(err);
            }
            if self.raw.len() == raw_before && self.filled == unread_before {
                return Ok(self.exhausted());
            }
        }
    }

    /// Converts more raw bytes, compacting the converted buffer first.
    fn refill(&mut self) -> Result<()> {
        if !self.done_first_chunk {
            self.resolve_charset()?;
            self.strip_bom()?;
            self.done_first_chunk = true;
        }

        if self.cursor == self.filled {
            self.filled = 0;
        } else {
            self.utf8.copy_within(self.cursor..self.filled, 0);
            self.filled -= self.cursor;
            if self.filled > self.utf8.len() / 2 {
                self.grow()?;
            }
        }
        self.cursor = 0;

        let mut src: &[u8] = &self.raw;
        let mut dst: &mut [u8] = &mut self.utf8[self.filled..];
        let space = dst.len();
        let outcome = self.filter.process(&mut src, &mut dst);
        let produced = space - dst.len();
        let consumed = self.raw.len() - src.len();

        self.raw.drain(..consumed);
        self.filled += produced;
        log::trace!(
            "refill: {consumed} raw bytes -> {produced} converted, {} raw left",
            self.raw.len()
        );
        match outcome {
            Ok(()) | Err(Error::OutOfSpace) => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Whether the first conversion should wait for a possible byte-order
    /// mark to complete.
    fn awaits_bom(&self) -> bool {
        if self.done_first_chunk || self.had_eof {
            return false;
        }
        match self.registry_id {
            None => is_partial_bom(&self.raw, None),
            Some(id) => self
                .registry
                .unicode_family(id)
                .is_some_and(|family| is_partial_bom(&self.raw, Some(family))),
        }
    }

    fn resolve_charset(&mut self) -> Result<()> {
        if self.registry_id.is_some() {
            return Ok(());
        }
        let detected = match self.detector {
            Some(detect) => detect(&self.raw, &self.registry)?,
            None => Detected {
                registry_id: self
                    .registry
                    .registry_id_from_name(INTERNAL_ENCODING)
                    .ok_or(Error::NoCharset)?,
                source: EncodingSource::DEFAULT,
            },
        };
        let name = self
            .registry
            .registry_id_to_name(detected.registry_id)
            .ok_or(Error::NoCharset)?;
        log::debug!("stream charset resolved to {name} ({:?})", detected.source);
        self.filter.configure(name)?;
        self.registry_id = Some(detected.registry_id);
        self.source = detected.source;
        Ok(())
    }

    /// Drops a byte-order mark matching the resolved charset. For UTF-16 and
    /// UTF-32 without a declared byte order the mark also selects it.
    fn strip_bom(&mut self) -> Result<()> {
        let Some(family) = self
            .registry_id
            .and_then(|id| self.registry.unicode_family(id))
        else {
            return Ok(());
        };

        let (marked, len) = match (family, self.raw.as_slice()) {
            (UnicodeFamily::Utf16, [0xFE, 0xFF, ..]) => (UnicodeFamily::Utf16Be, 2),
            (UnicodeFamily::Utf16, [0xFF, 0xFE, ..]) => (UnicodeFamily::Utf16Le, 2),
            (UnicodeFamily::Utf32, [0x00, 0x00, 0xFE, 0xFF, ..]) => (UnicodeFamily::Utf32Be, 4),
            (UnicodeFamily::Utf32, [0xFF, 0xFE, 0x00, 0x00, ..]) => (UnicodeFamily::Utf32Le, 4),
            (family, raw) => match family.bom() {
                Some(bom) if raw.starts_with(bom) => (family, bom.len()),
                _ => return Ok(()),
            },
        };

        if marked != family {
            self.filter.configure(marked.name())?;
            self.registry_id = self
                .registry
                .registry_id_from_name(marked.name())
                .or(self.registry_id);
        }
        log::debug!("stripping {} byte-order mark", marked.name());
        self.raw.drain(..len);
        Ok(())
    }

    /// Doubles the converted buffer.
    fn grow(&mut self) -> Result<()> {
        let additional = self.utf8.len();
        self.utf8
            .try_reserve_exact(additional)
            .map_err(|_| Error::OutOfMemory)?;
        self.utf8.resize(self.utf8.len() + additional, 0);
        log::trace!("converted buffer grown to {} bytes", self.utf8.len());
        Ok(())
    }
}
