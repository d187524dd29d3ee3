use thiserror::Error;

/// Errors reported by the alias registry, codecs, the conversion filter and
/// the input stream.
///
/// `OutOfSpace` and `NeedMoreInput` are continuation signals rather than
/// failures: the operation made as much progress as it could and can be
/// called again with more room or more input. [`Error::is_fatal`] singles
/// out the kinds a host cannot recover from by retrying.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// An argument was rejected before any work was done.
    #[error("bad parameter")]
    BadParameter,
    /// A buffer could not grow.
    #[error("out of memory")]
    OutOfMemory,
    /// The destination buffer filled up before the source was exhausted.
    #[error("destination buffer exhausted")]
    OutOfSpace,
    /// The input ends in the middle of a character.
    #[error("more input required")]
    NeedMoreInput,
    /// An illegal sequence was found while the error mode was strict.
    #[error("invalid input sequence")]
    Invalid,
    /// The encoding name is unknown or no codec implements it.
    #[error("unsupported encoding")]
    BadEncoding,
    /// The alias table could not be read.
    #[error("alias table not found")]
    FileNotFound,
    /// No charset could be resolved when the stream first converted data.
    #[error("no charset could be resolved for the stream")]
    NoCharset,
    /// An internal bound was exceeded. This indicates a bug, not bad input.
    #[error("internal invariant violated: {0}")]
    Internal(&'static str),
}

impl Error {
    /// Whether this error leaves the reporting object in an unusable state.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::NoCharset | Self::Internal(_))
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;
