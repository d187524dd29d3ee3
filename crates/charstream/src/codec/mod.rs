//! Charset codecs.
//!
//! A [`Codec`] converts between one charset's bytes and Unicode code points
//! stored as `u32`, one direction per call, keeping partial characters
//! across calls. Implementations are selected by canonical charset name from
//! an ordered list of [`CodecFactory`] values; the first factory whose
//! [`handles`](CodecFactory::handles) accepts the name wins. The built-in
//! UTF and single-byte codecs come first, the `encoding_rs` fallback last.
//!
//! Both directions follow the same cursor protocol: `src` and `dst` are
//! advanced past what was consumed and produced, so a call interrupted by
//! [`Error::OutOfSpace`] can be repeated with a fresh destination.

mod latin1;
#[cfg(feature = "legacy")]
mod legacy;
mod scheme;
pub(crate) mod staging;
mod utf16;
mod utf32;
pub(crate) mod utf8;

use alloc::boxed::Box;
use core::fmt;

use crate::{
    aliases::AliasRegistry,
    error::{Error, Result},
    options::ErrorMode,
};

/// U+FFFD, substituted for undecodable input.
pub(crate) const REPLACEMENT_CHARACTER: u32 = 0xFFFD;

/// Error handling parameters passed to a [`CodecImpl`] on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    /// What to do with illegal or unmappable input.
    pub mode: ErrorMode,
    /// Character substituted for unmappable code points when encoding in a
    /// lenient mode: U+FFFD for Unicode charsets, `?` otherwise. Decoding
    /// always substitutes U+FFFD.
    pub replacement: char,
}

/// One charset implementation, converting in both directions.
///
/// Implementations keep whatever partial-character state they need between
/// calls and must honour the cursor protocol described on [`Codec::decode`]
/// and [`Codec::encode`].
pub trait CodecImpl: fmt::Debug + Send {
    /// Converts charset bytes to code points.
    ///
    /// # Errors
    ///
    /// See [`Codec::decode`].
    fn decode(&mut self, policy: Policy, src: &mut &[u8], dst: &mut &mut [u32]) -> Result<()>;

    /// Converts code points to charset bytes.
    ///
    /// # Errors
    ///
    /// See [`Codec::encode`].
    fn encode(&mut self, policy: Policy, src: &mut &[u32], dst: &mut &mut [u8]) -> Result<()>;

    /// Forgets all partial input and undelivered output.
    fn reset(&mut self);

    /// Whether converted output is held back waiting for destination space.
    fn has_pending_output(&self) -> bool;
}

/// Constructor for a family of [`CodecImpl`]s.
pub trait CodecFactory: Sync {
    /// Whether this factory implements the charset with the given canonical
    /// name.
    fn handles(&self, canonical: &str) -> bool;

    /// Creates a codec for a canonical name accepted by
    /// [`handles`](Self::handles).
    ///
    /// # Errors
    ///
    /// [`Error::BadEncoding`] if the name is not supported after all.
    fn create(&self, canonical: &str) -> Result<Box<dyn CodecImpl>>;
}

static BUILTIN_FACTORIES: [&dyn CodecFactory; 4] = [
    &utf8::Utf8Factory,
    &utf16::Utf16Factory,
    &utf32::Utf32Factory,
    &latin1::Latin1Factory,
];

#[cfg(feature = "legacy")]
static FALLBACK_FACTORY: Option<&dyn CodecFactory> = Some(&legacy::LegacyFactory);
#[cfg(not(feature = "legacy"))]
static FALLBACK_FACTORY: Option<&dyn CodecFactory> = None;

/// Every codec factory, in selection order.
pub(crate) fn factories() -> impl Iterator<Item = &'static dyn CodecFactory> {
    BUILTIN_FACTORIES.iter().copied().chain(FALLBACK_FACTORY)
}

/// A configured charset converter.
///
/// ```rust
/// use charstream::{AliasRegistry, Codec};
///
/// let registry = AliasRegistry::builtin();
/// let mut codec = Codec::new(&registry, "latin1").unwrap();
///
/// let mut src: &[u8] = b"caf\xE9";
/// let mut out = [0u32; 8];
/// let mut dst: &mut [u32] = &mut out;
/// codec.decode(&mut src, &mut dst).unwrap();
/// assert_eq!(&out[..4], &[0x63, 0x61, 0x66, 0xE9]);
/// ```
#[derive(Debug)]
pub struct Codec {
    registry_id: u16,
    error_mode: ErrorMode,
    replacement: char,
    inner: Box<dyn CodecImpl>,
}

impl Codec {
    /// Creates a codec for any spelling of a charset name.
    ///
    /// The error mode starts as [`ErrorMode::Loose`].
    ///
    /// # Errors
    ///
    /// [`Error::BadEncoding`] if the name is unknown to the registry or no
    /// codec implements it.
    pub fn new(registry: &AliasRegistry, charset: &str) -> Result<Self> {
        let canonical = registry.canonicalize(charset).ok_or(Error::BadEncoding)?;
        let factory = factories()
            .find(|factory| factory.handles(canonical.name()))
            .ok_or(Error::BadEncoding)?;
        Self::with_factory(registry, charset, factory)
    }

    /// Creates a codec for `charset` from a specific factory, bypassing the
    /// built-in selection.
    ///
    /// # Errors
    ///
    /// [`Error::BadEncoding`] if the registry does not know the name or the
    /// factory does not handle it.
    pub fn with_factory(
        registry: &AliasRegistry,
        charset: &str,
        factory: &dyn CodecFactory,
    ) -> Result<Self> {
        let canonical = registry.canonicalize(charset).ok_or(Error::BadEncoding)?;
        if !factory.handles(canonical.name()) {
            return Err(Error::BadEncoding);
        }
        let inner = factory.create(canonical.name())?;
        log::debug!("created {} codec for {charset:?}", canonical.name());

        let replacement = if registry.is_unicode_family(canonical.registry_id()) {
            char::REPLACEMENT_CHARACTER
        } else {
            '?'
        };
        Ok(Self {
            registry_id: canonical.registry_id(),
            error_mode: ErrorMode::default(),
            replacement,
            inner,
        })
    }

    /// Registry id of the charset this codec converts.
    #[must_use]
    pub const fn registry_id(&self) -> u16 {
        self.registry_id
    }

    /// Current error mode.
    #[must_use]
    pub const fn error_mode(&self) -> ErrorMode {
        self.error_mode
    }

    /// Changes how illegal input is handled from the next call on.
    pub fn set_error_mode(&mut self, mode: ErrorMode) {
        self.error_mode = mode;
    }

    const fn policy(&self) -> Policy {
        Policy {
            mode: self.error_mode,
            replacement: self.replacement,
        }
    }

    /// Decodes charset bytes from `src` into code points in `dst`.
    ///
    /// Both slices are advanced past what was consumed and produced. A
    /// sequence cut off at the end of `src` is held internally and completed
    /// by the next call. Calling with an empty `src` flushes any converted
    /// output still held back.
    ///
    /// # Errors
    ///
    /// - [`Error::OutOfSpace`] when `dst` fills up first; call again with
    ///   more room.
    /// - [`Error::Invalid`] in strict mode on an illegal sequence; `src` is
    ///   left at its start. Lenient modes substitute U+FFFD instead.
    /// - [`Error::Internal`] if a partial sequence outgrows its buffer.
    pub fn decode(&mut self, src: &mut &[u8], dst: &mut &mut [u32]) -> Result<()> {
        let policy = self.policy();
        self.inner.decode(policy, src, dst)
    }

    /// Encodes code points from `src` into charset bytes in `dst`.
    ///
    /// Mirrors [`decode`](Self::decode). A character whose encoding does not
    /// fit entirely is consumed and its remaining bytes are delivered first
    /// on the next call.
    ///
    /// # Errors
    ///
    /// - [`Error::OutOfSpace`] when `dst` fills up first.
    /// - [`Error::Invalid`] in strict mode on a code point the charset cannot
    ///   represent; `src` is left at that code point. Lenient modes
    ///   substitute U+FFFD for Unicode charsets and `?` for the others.
    pub fn encode(&mut self, src: &mut &[u32], dst: &mut &mut [u8]) -> Result<()> {
        let policy = self.policy();
        self.inner.encode(policy, src, dst)
    }

    /// Clears partial-character state, keeping the charset and error mode.
    pub fn reset(&mut self) {
        self.inner.reset();
    }

    /// Whether output is held back waiting for destination space.
    #[must_use]
    pub fn has_pending_output(&self) -> bool {
        self.inner.has_pending_output()
    }
}
