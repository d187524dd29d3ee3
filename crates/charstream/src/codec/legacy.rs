//! Fallback codec delegating to `encoding_rs`.
//!
//! Covers every charset `encoding_rs` can both decode and encode, which
//! excludes its UTF-16 decoders (handled natively) and the replacement
//! encoding. Decoding goes through a small UTF-8 scratch buffer; encoding
//! feeds one character at a time.

use alloc::boxed::Box;
use core::str;

use encoding_rs::{Decoder, DecoderResult, Encoder, EncoderResult, Encoding};

use super::{
    CodecFactory, CodecImpl, Policy, REPLACEMENT_CHARACTER,
    staging::{Staging, put, write_slice},
};
use crate::{
    error::{Error, Result},
    options::ErrorMode,
};

/// Upper bound on the UTF-8 scratch buffer used per decode round.
const SCRATCH: usize = 64;
/// Lower bound, so a decoder always has room for a whole character.
const MIN_SCRATCH: usize = 16;
/// Longest encoding of one character, escape sequences included.
const MAX_UNIT: usize = 16;

pub(crate) struct LegacyFactory;

fn lookup(canonical: &str) -> Option<&'static Encoding> {
    Encoding::for_label_no_replacement(canonical.as_bytes())
        .filter(|encoding| encoding.output_encoding() == *encoding)
}

impl CodecFactory for LegacyFactory {
    fn handles(&self, canonical: &str) -> bool {
        lookup(canonical).is_some()
    }

    fn create(&self, canonical: &str) -> Result<Box<dyn CodecImpl>> {
        let encoding = lookup(canonical).ok_or(Error::BadEncoding)?;
        Ok(Box::new(Legacy::new(encoding)))
    }
}

pub(crate) struct Legacy {
    encoding: &'static Encoding,
    decoder: Decoder,
    encoder: Encoder,
    /// Decoded code points that did not fit the previous destination.
    decoded: Staging<u32, MIN_SCRATCH>,
    /// Encoded bytes that did not fit the previous destination.
    encoded: Staging<u8, MAX_UNIT>,
}

impl core::fmt::Debug for Legacy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Legacy")
            .field("encoding", &self.encoding.name())
            .field("decoded", &self.decoded.len())
            .field("encoded", &self.encoded.len())
            .finish_non_exhaustive()
    }
}

impl Legacy {
    fn new(encoding: &'static Encoding) -> Self {
        Self {
            encoding,
            decoder: encoding.new_decoder_without_bom_handling(),
            encoder: encoding.new_encoder(),
            decoded: Staging::new(),
            encoded: Staging::new(),
        }
    }

    /// Delivers decoded text, parking what does not fit.
    fn emit(&mut self, text: &str, dst: &mut &mut [u32]) -> Result<()> {
        for ch in text.chars() {
            if !self.decoded.is_empty() || !put(dst, u32::from(ch)) {
                self.decoded.push(u32::from(ch))?;
            }
        }
        Ok(())
    }

    /// Encodes one character, returning `None` if it is unmappable.
    fn encode_char(&mut self, ch: char, out: &mut [u8; MAX_UNIT]) -> Result<Option<usize>> {
        let mut utf8 = [0u8; 4];
        let (result, _, written) =
            self.encoder
                .encode_from_utf8_without_replacement(ch.encode_utf8(&mut utf8), out, false);
        match result {
            EncoderResult::InputEmpty => Ok(Some(written)),
            EncoderResult::Unmappable(_) => Ok(None),
            EncoderResult::OutputFull => Err(Error::Internal("legacy encoder unit overflow")),
        }
    }
}

impl CodecImpl for Legacy {
    fn decode(&mut self, policy: Policy, src: &mut &[u8], dst: &mut &mut [u32]) -> Result<()> {
        if !self.decoded.drain_into(dst) {
            return Err(Error::OutOfSpace);
        }

        while !src.is_empty() {
            if dst.is_empty() {
                return Err(Error::OutOfSpace);
            }
            let mut scratch = [0u8; SCRATCH];
            let room = dst.len().clamp(MIN_SCRATCH, SCRATCH);
            let (result, read, written) =
                self.decoder
                    .decode_to_utf8_without_replacement(src, &mut scratch[..room], false);
            let text = str::from_utf8(&scratch[..written])
                .map_err(|_| Error::Internal("legacy decoder produced invalid UTF-8"))?;
            self.emit(text, dst)?;

            match result {
                DecoderResult::InputEmpty | DecoderResult::OutputFull => {
                    if read == 0 && written == 0 {
                        return Err(Error::Internal("legacy decoder made no progress"));
                    }
                    *src = &src[read..];
                }
                DecoderResult::Malformed(bad, extra) => {
                    if policy.mode == ErrorMode::Strict {
                        let start = read.saturating_sub(usize::from(bad) + usize::from(extra));
                        *src = &src[start..];
                        // Replay from the offending sequence with a clean state.
                        self.decoder = self.encoding.new_decoder_without_bom_handling();
                        return Err(Error::Invalid);
                    }
                    *src = &src[read..];
                    if !self.decoded.is_empty() || !put(dst, REPLACEMENT_CHARACTER) {
                        self.decoded.push(REPLACEMENT_CHARACTER)?;
                    }
                }
            }

            if !self.decoded.is_empty() {
                return Err(Error::OutOfSpace);
            }
        }
        Ok(())
    }

    fn encode(&mut self, policy: Policy, src: &mut &[u32], dst: &mut &mut [u8]) -> Result<()> {
        if !self.encoded.drain_into(dst) {
            return Err(Error::OutOfSpace);
        }

        while let Some(&cp) = src.first() {
            if dst.is_empty() {
                return Err(Error::OutOfSpace);
            }
            let mut unit = [0u8; MAX_UNIT];
            let encoded = match char::from_u32(cp) {
                Some(ch) => self.encode_char(ch, &mut unit)?,
                None => None,
            };
            let n = match encoded {
                Some(n) => n,
                None if policy.mode == ErrorMode::Strict => return Err(Error::Invalid),
                None => match self.encode_char(policy.replacement, &mut unit)? {
                    Some(n) => n,
                    None => self
                        .encode_char('?', &mut unit)?
                        .ok_or(Error::Internal("charset cannot encode a replacement"))?,
                },
            };
            *src = &src[1..];

            let written = write_slice(dst, &unit[..n]);
            if written < n {
                self.encoded.extend(&unit[written..n])?;
                return Err(Error::OutOfSpace);
            }
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.decoder = self.encoding.new_decoder_without_bom_handling();
        self.encoder = self.encoding.new_encoder();
        self.decoded.clear();
        self.encoded.clear();
    }

    fn has_pending_output(&self) -> bool {
        !self.decoded.is_empty() || !self.encoded.is_empty()
    }
}
