use alloc::string::String;

/// How a codec treats sequences it cannot convert.
///
/// # Default
///
/// [`ErrorMode::Loose`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorMode {
    /// Stop at the offending sequence and report [`Error::Invalid`].
    ///
    /// [`Error::Invalid`]: crate::Error::Invalid
    Strict,
    /// Substitute a replacement character and carry on.
    #[default]
    Loose,
    /// Approximate unmappable characters. No transliteration tables are
    /// shipped, so this currently behaves exactly like [`ErrorMode::Loose`].
    Transliterate,
}

/// Opaque priority tag recording how a stream's charset was determined.
///
/// Higher values are conventionally more authoritative, but the stream only
/// stores and reports the tag. The named constants are the values used by
/// the bundled detector and by [`StreamOptions::default`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EncodingSource(pub u32);

impl EncodingSource {
    /// Nothing was known; the internal encoding was assumed.
    pub const DEFAULT: Self = Self(0);
    /// Guessed from the document bytes.
    pub const DETECTED: Self = Self(1);
    /// Taken from a byte-order mark.
    pub const BOM: Self = Self(2);
    /// Supplied by the caller.
    pub const EXPLICIT: Self = Self(3);
}

/// Configuration for an [`InputStream`].
///
/// ```rust
/// use std::sync::Arc;
/// use charstream::{AliasRegistry, InputStream, StreamOptions};
///
/// let registry = Arc::new(AliasRegistry::builtin());
/// let stream = InputStream::new(
///     registry,
///     StreamOptions {
///         encoding: Some("ISO-8859-1".into()),
///         ..Default::default()
///     },
///     None,
/// )
/// .unwrap();
/// assert_eq!(stream.read_charset().0, "ISO-8859-1");
/// ```
///
/// [`InputStream`]: crate::InputStream
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StreamOptions {
    /// Document encoding, by canonical name or alias.
    ///
    /// When `None` the charset is resolved on the first refill, either by
    /// the stream's detector or by assuming the internal encoding.
    ///
    /// # Default
    ///
    /// `None`
    pub encoding: Option<String>,

    /// Priority tag reported alongside an explicit `encoding`.
    ///
    /// # Default
    ///
    /// [`EncodingSource::EXPLICIT`]
    pub source: EncodingSource,

    /// Error mode for decoding the document.
    ///
    /// # Default
    ///
    /// [`ErrorMode::Loose`]
    pub error_mode: ErrorMode,

    /// Initial size in bytes of the converted buffer. The buffer grows on
    /// demand; this only sets how much is converted per refill at first.
    ///
    /// # Default
    ///
    /// `4096`
    pub buffer_capacity: usize,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            encoding: None,
            source: EncodingSource::EXPLICIT,
            error_mode: ErrorMode::Loose,
            buffer_capacity: 4096,
        }
    }
}
