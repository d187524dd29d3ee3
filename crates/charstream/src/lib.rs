//! Charset conversion and a resumable input stream for streaming parsers.
//!
//! Documents arrive as bytes in whatever charset they were written in,
//! possibly split at arbitrary points. This crate turns them into UTF-8 a
//! character at a time:
//!
//! - [`AliasRegistry`] resolves any spelling of a charset name.
//! - [`Codec`] converts one charset to code points and back, resumably.
//! - [`Filter`] chains two codecs to convert between charsets.
//! - [`InputStream`] buffers raw and converted bytes and hands a parser one
//!   character at a time through [`peek`](InputStream::peek) and
//!   [`advance`](InputStream::advance), detecting the charset and stripping
//!   a byte-order mark on the way.

#![no_std]
extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

mod aliases;
mod chunk_utils;
mod codec;
mod detect;
mod error;
mod filter;
mod options;
mod stream;

#[cfg(test)]
mod tests;

pub use aliases::{AliasRegistry, CanonicalEntry, UnicodeFamily};
pub use chunk_utils::{produce_chunks, split_by_sizes};
pub use codec::{Codec, CodecFactory, CodecImpl, Policy};
pub use detect::{detect_charset, sniff_bom};
pub use error::{Error, Result};
pub use filter::{Filter, PIVOT_CAPACITY};
pub use options::{EncodingSource, ErrorMode, StreamOptions};
pub use stream::{CharsetDetector, Detected, INTERNAL_ENCODING, InputStream, Peek};
