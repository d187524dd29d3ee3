//! Resumable driver shared by the built-in codecs.
//!
//! A built-in charset only has to describe how one character is laid out in
//! bytes ([`Scheme`]). [`Buffered`] turns that into a [`CodecImpl`] that
//! accepts input split at arbitrary byte boundaries and output buffers of
//! any size.

use core::cmp;

use super::{
    CodecImpl, Policy, REPLACEMENT_CHARACTER,
    staging::{Staging, put, write_slice},
};
use crate::{
    error::{Error, Result},
    options::ErrorMode,
};

/// Longest byte sequence any built-in scheme uses for one character.
pub(crate) const MAX_SEQUENCE: usize = 4;

/// Outcome of examining the bytes at the front of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// A complete character of `len` bytes.
    Scalar { cp: u32, len: usize },
    /// Well-formed so far but truncated.
    Incomplete,
    /// `len` bytes (at least one) form an illegal sequence.
    Malformed { len: usize },
}

pub(crate) trait Scheme: core::fmt::Debug + Send {
    /// Classifies the sequence at the front of `bytes`, which is non-empty.
    fn step(&self, bytes: &[u8]) -> Step;

    /// Writes the encoding of `ch`, or returns `None` if the charset has no
    /// representation for it.
    fn write(&self, ch: char, out: &mut [u8; MAX_SEQUENCE]) -> Option<usize>;
}

#[derive(Debug)]
pub(crate) struct Buffered<S> {
    scheme: S,
    /// Leading bytes of a sequence split across calls.
    stash: Staging<u8, { MAX_SEQUENCE - 1 }>,
    /// Encoded bytes that did not fit into the previous destination.
    pending: Staging<u8, MAX_SEQUENCE>,
}

impl<S: Scheme> Buffered<S> {
    pub fn new(scheme: S) -> Self {
        Self {
            scheme,
            stash: Staging::new(),
            pending: Staging::new(),
        }
    }

    /// Completes the stashed sequence with bytes from `src`.
    fn resume(&mut self, policy: Policy, src: &mut &[u8], dst: &mut &mut [u32]) -> Result<()> {
        while !self.stash.is_empty() && !src.is_empty() {
            let held = self.stash.len();
            let take = cmp::min(MAX_SEQUENCE - held, src.len());
            let mut joined = [0u8; MAX_SEQUENCE];
            joined[..held].copy_from_slice(self.stash.as_slice());
            joined[held..held + take].copy_from_slice(&src[..take]);

            match self.scheme.step(&joined[..held + take]) {
                Step::Incomplete if held + take == MAX_SEQUENCE => {
                    return Err(Error::Internal("incomplete sequence longer than any character"));
                }
                Step::Incomplete => {
                    self.stash.extend(&src[..take])?;
                    *src = &src[take..];
                }
                Step::Scalar { cp, len } => {
                    if !put(dst, cp) {
                        return Err(Error::OutOfSpace);
                    }
                    self.stash.skip(len);
                    *src = &src[len.saturating_sub(held)..];
                }
                Step::Malformed { len } => {
                    // Stashed bytes past the malformed prefix start the next
                    // sequence.
                    let from_src = len.saturating_sub(held);
                    if policy.mode == ErrorMode::Strict {
                        self.stash.skip(len);
                        return Err(Error::Invalid);
                    }
                    if !put(dst, REPLACEMENT_CHARACTER) {
                        return Err(Error::OutOfSpace);
                    }
                    self.stash.skip(len);
                    *src = &src[from_src..];
                }
            }
        }
        Ok(())
    }

    fn encode_one(&self, policy: Policy, cp: u32, out: &mut [u8; MAX_SEQUENCE]) -> Result<usize> {
        if let Some(n) = char::from_u32(cp).and_then(|ch| self.scheme.write(ch, out)) {
            return Ok(n);
        }
        if policy.mode == ErrorMode::Strict {
            return Err(Error::Invalid);
        }
        self.scheme
            .write(policy.replacement, out)
            .or_else(|| self.scheme.write('?', out))
            .ok_or(Error::Internal("charset cannot encode a replacement"))
    }
}

impl<S: Scheme> CodecImpl for Buffered<S> {
    fn decode(&mut self, policy: Policy, src: &mut &[u8], dst: &mut &mut [u32]) -> Result<()> {
        self.resume(policy, src, dst)?;

        while !src.is_empty() {
            match self.scheme.step(src) {
                Step::Scalar { cp, len } => {
                    if !put(dst, cp) {
                        return Err(Error::OutOfSpace);
                    }
                    *src = &src[len..];
                }
                Step::Incomplete => {
                    self.stash.extend(src)?;
                    *src = &[];
                }
                Step::Malformed { len } => {
                    if policy.mode == ErrorMode::Strict {
                        return Err(Error::Invalid);
                    }
                    if !put(dst, REPLACEMENT_CHARACTER) {
                        return Err(Error::OutOfSpace);
                    }
                    *src = &src[len..];
                }
            }
        }
        Ok(())
    }

    fn encode(&mut self, policy: Policy, src: &mut &[u32], dst: &mut &mut [u8]) -> Result<()> {
        if !self.pending.drain_into(dst) {
            return Err(Error::OutOfSpace);
        }

        while let Some(&cp) = src.first() {
            if dst.is_empty() {
                return Err(Error::OutOfSpace);
            }
            let mut unit = [0u8; MAX_SEQUENCE];
            let n = self.encode_one(policy, cp, &mut unit)?;
            *src = &src[1..];

            let written = write_slice(dst, &unit[..n]);
            if written < n {
                self.pending.extend(&unit[written..n])?;
                return Err(Error::OutOfSpace);
            }
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.stash.clear();
        self.pending.clear();
    }

    fn has_pending_output(&self) -> bool {
        !self.pending.is_empty()
    }
}
