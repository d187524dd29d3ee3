use alloc::boxed::Box;

use super::{
    CodecFactory, CodecImpl,
    scheme::{Buffered, MAX_SEQUENCE, Scheme, Step},
    utf16::Endian,
};
use crate::{
    aliases::names_match,
    error::{Error, Result},
};

const VARIANTS: [(&str, Endian); 4] = [
    ("UTF-32", Endian::Big),
    ("UTF-32BE", Endian::Big),
    ("UTF-32LE", Endian::Little),
    ("ISO-10646-UCS-4", Endian::Big),
];

pub(crate) struct Utf32Factory;

impl CodecFactory for Utf32Factory {
    fn handles(&self, canonical: &str) -> bool {
        VARIANTS.iter().any(|(name, _)| names_match(canonical, name))
    }

    fn create(&self, canonical: &str) -> Result<Box<dyn CodecImpl>> {
        let (_, endian) = VARIANTS
            .iter()
            .find(|(name, _)| names_match(canonical, name))
            .ok_or(Error::BadEncoding)?;
        Ok(Box::new(Buffered::new(Utf32 { endian: *endian })))
    }
}

#[derive(Debug)]
pub(crate) struct Utf32 {
    endian: Endian,
}

impl Scheme for Utf32 {
    fn step(&self, bytes: &[u8]) -> Step {
        let Some(&[a, b, c, d]) = bytes.first_chunk::<4>() else {
            return Step::Incomplete;
        };
        let value = match self.endian {
            Endian::Big => u32::from_be_bytes([a, b, c, d]),
            Endian::Little => u32::from_le_bytes([a, b, c, d]),
        };
        match char::from_u32(value) {
            Some(_) => Step::Scalar { cp: value, len: 4 },
            None => Step::Malformed { len: 4 },
        }
    }

    fn write(&self, ch: char, out: &mut [u8; MAX_SEQUENCE]) -> Option<usize> {
        *out = match self.endian {
            Endian::Big => u32::from(ch).to_be_bytes(),
            Endian::Little => u32::from(ch).to_le_bytes(),
        };
        Some(4)
    }
}
