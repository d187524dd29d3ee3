use alloc::boxed::Box;

use super::{
    CodecFactory, CodecImpl,
    scheme::{Buffered, MAX_SEQUENCE, Scheme, Step},
};
use crate::{
    aliases::names_match,
    error::{Error, Result},
};

/// Single-byte charsets whose bytes are the first code points of Unicode.
const VARIANTS: [(&str, u8); 2] = [("US-ASCII", 0x7F), ("ISO-8859-1", 0xFF)];

pub(crate) struct Latin1Factory;

impl CodecFactory for Latin1Factory {
    fn handles(&self, canonical: &str) -> bool {
        VARIANTS.iter().any(|(name, _)| names_match(canonical, name))
    }

    fn create(&self, canonical: &str) -> Result<Box<dyn CodecImpl>> {
        let (_, max) = VARIANTS
            .iter()
            .find(|(name, _)| names_match(canonical, name))
            .ok_or(Error::BadEncoding)?;
        Ok(Box::new(Buffered::new(Latin1 { max: *max })))
    }
}

#[derive(Debug)]
pub(crate) struct Latin1 {
    /// Highest byte value, and code point, in the repertoire.
    max: u8,
}

impl Scheme for Latin1 {
    fn step(&self, bytes: &[u8]) -> Step {
        if bytes[0] > self.max {
            Step::Malformed { len: 1 }
        } else {
            Step::Scalar {
                cp: u32::from(bytes[0]),
                len: 1,
            }
        }
    }

    fn write(&self, ch: char, out: &mut [u8; MAX_SEQUENCE]) -> Option<usize> {
        let byte = u8::try_from(ch).ok().filter(|byte| *byte <= self.max)?;
        out[0] = byte;
        Some(1)
    }
}
