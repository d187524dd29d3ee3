use alloc::boxed::Box;

use super::{
    CodecFactory, CodecImpl,
    scheme::{Buffered, MAX_SEQUENCE, Scheme, Step},
};
use crate::{
    aliases::names_match,
    error::{Error, Result},
};

pub(crate) struct Utf8Factory;

impl CodecFactory for Utf8Factory {
    fn handles(&self, canonical: &str) -> bool {
        names_match(canonical, "UTF-8")
    }

    fn create(&self, canonical: &str) -> Result<Box<dyn CodecImpl>> {
        if !self.handles(canonical) {
            return Err(Error::BadEncoding);
        }
        Ok(Box::new(Buffered::new(Utf8)))
    }
}

#[derive(Debug)]
pub(crate) struct Utf8;

impl Scheme for Utf8 {
    fn step(&self, bytes: &[u8]) -> Step {
        let lead = bytes[0];
        // Allowed range of the second byte; later bytes are 80..=BF.
        let (len, second) = match lead {
            0x00..=0x7F => {
                return Step::Scalar {
                    cp: u32::from(lead),
                    len: 1,
                };
            }
            0xC2..=0xDF => (2, 0x80..=0xBF),
            0xE0 => (3, 0xA0..=0xBF),
            0xE1..=0xEC | 0xEE..=0xEF => (3, 0x80..=0xBF),
            0xED => (3, 0x80..=0x9F),
            0xF0 => (4, 0x90..=0xBF),
            0xF1..=0xF3 => (4, 0x80..=0xBF),
            0xF4 => (4, 0x80..=0x8F),
            _ => return Step::Malformed { len: 1 },
        };

        let mut cp = u32::from(lead) & (0x7F >> len);
        for i in 1..len {
            let Some(&byte) = bytes.get(i) else {
                return Step::Incomplete;
            };
            let valid = if i == 1 {
                second.contains(&byte)
            } else {
                (0x80..=0xBF).contains(&byte)
            };
            if !valid {
                // Maximal subpart: everything before the bad byte.
                return Step::Malformed { len: i };
            }
            cp = (cp << 6) | u32::from(byte & 0x3F);
        }
        Step::Scalar { cp, len }
    }

    fn write(&self, ch: char, out: &mut [u8; MAX_SEQUENCE]) -> Option<usize> {
        Some(ch.encode_utf8(out).len())
    }
}

/// Byte length of the UTF-8 character starting `bytes`, judged from its
/// lead byte.
///
/// # Errors
///
/// [`Error::NeedMoreInput`] if `bytes` is empty or shorter than the
/// character, [`Error::Invalid`] if `bytes` does not start with a lead byte.
#[inline]
pub(crate) fn char_byte_length(bytes: &[u8]) -> Result<usize> {
    let Some(&lead) = bytes.first() else {
        return Err(Error::NeedMoreInput);
    };
    let len = match lead {
        0x00..=0x7F => return Ok(1),
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => return Err(Error::Invalid),
    };
    if bytes.len() < len {
        Err(Error::NeedMoreInput)
    } else {
        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lead_byte_lengths() {
        assert_eq!(char_byte_length(b"a"), Ok(1));
        assert_eq!(char_byte_length("é".as_bytes()), Ok(2));
        assert_eq!(char_byte_length("€".as_bytes()), Ok(3));
        assert_eq!(char_byte_length("😀".as_bytes()), Ok(4));
        assert_eq!(char_byte_length(b"\xE2\x82"), Err(Error::NeedMoreInput));
        assert_eq!(char_byte_length(b""), Err(Error::NeedMoreInput));
        assert_eq!(char_byte_length(b"\x82"), Err(Error::Invalid));
    }

    #[test]
    fn maximal_subparts() {
        assert_eq!(Utf8.step(b"\xE2\x82\xAC"), Step::Scalar { cp: 0x20AC, len: 3 });
        assert_eq!(Utf8.step(b"\xE2\x82"), Step::Incomplete);
        assert_eq!(Utf8.step(b"\xE2\x82A"), Step::Malformed { len: 2 });
        // Surrogates and overlongs fail on the second byte.
        assert_eq!(Utf8.step(b"\xED\xA0\x80"), Step::Malformed { len: 1 });
        assert_eq!(Utf8.step(b"\xC0\x80"), Step::Malformed { len: 1 });
        assert_eq!(Utf8.step(b"\xF4\x90\x80\x80"), Step::Malformed { len: 1 });
        assert_eq!(Utf8.step(b"\xF0\x9F\x98\x80"), Step::Scalar { cp: 0x1F600, len: 4 });
    }
}
