//! Charset conversion between a document encoding and the internal one.
//!
//! A [`Filter`] chains a read codec (document bytes to code points) and a
//! write codec (code points to the internal encoding) through a fixed pivot
//! buffer of [`PIVOT_CAPACITY`] code points, so the work per call is bounded
//! no matter how large the input chunk is.

use alloc::sync::Arc;
use core::ops::Range;

use crate::{
    aliases::AliasRegistry,
    codec::Codec,
    error::{Error, Result},
    options::ErrorMode,
};

/// Number of code points converted per decode/encode round.
pub const PIVOT_CAPACITY: usize = 64;

/// Document encoding assumed until [`Filter::configure`] says otherwise.
const DEFAULT_READ_ENCODING: &str = "UTF-8";

/// Two-stage charset converter.
///
/// ```rust
/// use std::sync::Arc;
/// use charstream::{AliasRegistry, Filter};
///
/// let registry = Arc::new(AliasRegistry::builtin());
/// let mut filter = Filter::new(registry, "UTF-8").unwrap();
/// filter.configure("ISO-8859-1").unwrap();
///
/// let mut src: &[u8] = b"na\xEFve";
/// let mut out = [0u8; 16];
/// let mut dst: &mut [u8] = &mut out;
/// filter.process(&mut src, &mut dst).unwrap();
/// let written = 16 - dst.len();
/// assert_eq!(&out[..written], "naïve".as_bytes());
/// ```
#[derive(Debug)]
pub struct Filter {
    registry: Arc<AliasRegistry>,
    read: Codec,
    write: Codec,
    pivot: [u32; PIVOT_CAPACITY],
    /// Decoded code points the write codec has not accepted yet.
    leftover: Option<Range<usize>>,
}

impl Filter {
    /// Creates a filter producing `internal_encoding`. Input is read as
    /// UTF-8 until [`configure`](Self::configure) is called.
    ///
    /// # Errors
    ///
    /// [`Error::BadEncoding`] if either charset cannot be resolved or has no
    /// codec.
    pub fn new(registry: Arc<AliasRegistry>, internal_encoding: &str) -> Result<Self> {
        let read = Codec::new(&registry, DEFAULT_READ_ENCODING)?;
        let write = Codec::new(&registry, internal_encoding)?;
        Ok(Self {
            registry,
            read,
            write,
            pivot: [0; PIVOT_CAPACITY],
            leftover: None,
        })
    }

    /// Selects the document encoding by any spelling of its name.
    ///
    /// Takes effect for bytes passed to later [`process`](Self::process)
    /// calls. Naming the encoding already in use changes nothing; otherwise
    /// the read codec is replaced, keeping its error mode. On failure the
    /// previous codec stays active.
    ///
    /// # Errors
    ///
    /// [`Error::BadEncoding`] if the name is unknown or unsupported.
    pub fn configure(&mut self, encoding: &str) -> Result<()> {
        let canonical = self
            .registry
            .canonicalize(encoding)
            .ok_or(Error::BadEncoding)?;
        if canonical.registry_id() == self.read.registry_id() {
            return Ok(());
        }

        let mut read = Codec::new(&self.registry, canonical.name())?;
        read.set_error_mode(self.read.error_mode());
        log::debug!(
            "filter input switched from {:?} to {:?}",
            self.registry.registry_id_to_name(self.read.registry_id()),
            canonical.name()
        );
        self.read = read;
        Ok(())
    }

    /// Registry id of the current document encoding.
    #[must_use]
    pub const fn encoding(&self) -> u16 {
        self.read.registry_id()
    }

    /// Sets how illegal document bytes are handled.
    pub fn set_error_mode(&mut self, mode: ErrorMode) {
        self.read.set_error_mode(mode);
    }

    /// Whether converted output is waiting for destination space. Such
    /// output is delivered by calling [`process`](Self::process) again, with
    /// an empty source if there is no new input.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.leftover.is_some() || self.read.has_pending_output() || self.write.has_pending_output()
    }

    /// Converts as much of `src` into `dst` as fits.
    ///
    /// Both slices are advanced past what was consumed and produced.
    /// Output held back by an earlier call is delivered before any new input
    /// is read. An empty `src` flushes held-back output.
    ///
    /// # Errors
    ///
    /// - [`Error::OutOfSpace`] once `dst` is full. Unwritten output is kept
    ///   for the next call.
    /// - [`Error::Invalid`] for illegal input in strict mode, with `src` left
    ///   at the offending sequence.
    /// - Anything else the codecs report.
    pub fn process(&mut self, src: &mut &[u8], dst: &mut &mut [u8]) -> Result<()> {
        if let Some(range) = self.leftover.take() {
            let mut pending = &self.pivot[range.clone()];
            let outcome = self.write.encode(&mut pending, dst);
            if !pending.is_empty() {
                self.leftover = Some(range.end - pending.len()..range.end);
            }
            outcome?;
        }

        loop {
            let before = src.len();
            let mut free: &mut [u32] = &mut self.pivot;
            let decoded = self.read.decode(src, &mut free);
            let produced = PIVOT_CAPACITY - free.len();

            let mut pending = &self.pivot[..produced];
            let encoded = self.write.encode(&mut pending, dst);
            if !pending.is_empty() {
                self.leftover = Some(produced - pending.len()..produced);
            }
            encoded?;

            match decoded {
                Ok(()) | Err(Error::OutOfSpace) => {}
                Err(err) => return Err(err),
            }
            if src.is_empty() || (src.len() == before && produced == 0) {
                return Ok(());
            }
        }
    }

    /// Discards held-back output and partial characters in both codecs.
    pub fn reset(&mut self) {
        self.leftover = None;
        self.read.reset();
        self.write.reset();
    }
}
