use alloc::boxed::Box;

use super::{
    CodecFactory, CodecImpl,
    scheme::{Buffered, MAX_SEQUENCE, Scheme, Step},
};
use crate::{
    aliases::names_match,
    error::{Error, Result},
};

/// Byte order of a multi-byte code unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Endian {
    Big,
    Little,
}

/// Canonical names handled here. Unmarked UTF-16 is read big-endian; a
/// byte-order mark is dealt with by the input stream.
const VARIANTS: [(&str, Endian, bool); 4] = [
    ("UTF-16", Endian::Big, false),
    ("UTF-16BE", Endian::Big, false),
    ("UTF-16LE", Endian::Little, false),
    ("ISO-10646-UCS-2", Endian::Big, true),
];

pub(crate) struct Utf16Factory;

impl CodecFactory for Utf16Factory {
    fn handles(&self, canonical: &str) -> bool {
        VARIANTS.iter().any(|(name, ..)| names_match(canonical, name))
    }

    fn create(&self, canonical: &str) -> Result<Box<dyn CodecImpl>> {
        let (_, endian, ucs2) = VARIANTS
            .iter()
            .find(|(name, ..)| names_match(canonical, name))
            .ok_or(Error::BadEncoding)?;
        Ok(Box::new(Buffered::new(Utf16 {
            endian: *endian,
            ucs2: *ucs2,
        })))
    }
}

#[derive(Debug)]
pub(crate) struct Utf16 {
    pub endian: Endian,
    /// Restricts the repertoire to the Basic Multilingual Plane.
    pub ucs2: bool,
}

impl Utf16 {
    fn unit(&self, bytes: &[u8], at: usize) -> Option<u32> {
        let pair = bytes.get(at..at + 2)?;
        let pair = [pair[0], pair[1]];
        Some(u32::from(match self.endian {
            Endian::Big => u16::from_be_bytes(pair),
            Endian::Little => u16::from_le_bytes(pair),
        }))
    }
}

impl Scheme for Utf16 {
    fn step(&self, bytes: &[u8]) -> Step {
        let Some(unit) = self.unit(bytes, 0) else {
            return Step::Incomplete;
        };
        match unit {
            0xD800..=0xDBFF if !self.ucs2 => {
                let Some(low) = self.unit(bytes, 2) else {
                    return Step::Incomplete;
                };
                if (0xDC00..=0xDFFF).contains(&low) {
                    let cp = 0x1_0000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                    Step::Scalar { cp, len: 4 }
                } else {
                    Step::Malformed { len: 2 }
                }
            }
            0xD800..=0xDFFF => Step::Malformed { len: 2 },
            _ => Step::Scalar { cp: unit, len: 2 },
        }
    }

    fn write(&self, ch: char, out: &mut [u8; MAX_SEQUENCE]) -> Option<usize> {
        if self.ucs2 && u32::from(ch) > 0xFFFF {
            return None;
        }
        let mut units = [0u16; 2];
        let units = ch.encode_utf16(&mut units);
        for (unit, chunk) in units.iter().zip(out.chunks_exact_mut(2)) {
            let bytes = match self.endian {
                Endian::Big => unit.to_be_bytes(),
                Endian::Little => unit.to_le_bytes(),
            };
            chunk.copy_from_slice(&bytes);
        }
        Some(units.len() * 2)
    }
}
