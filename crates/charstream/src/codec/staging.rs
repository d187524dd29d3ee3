//! Fixed-capacity buffers for partial characters and undelivered output.
//!
//! Codecs hold at most one incomplete input sequence and at most one
//! character's worth of undelivered output between calls, so every buffer
//! here has a small compile-time capacity. Exceeding it is reported as
//! [`Error::Internal`].

use core::{cmp, mem};

use crate::error::{Error, Result};

/// A bounded queue of `N` values.
#[derive(Debug, Clone)]
pub(crate) struct Staging<T, const N: usize> {
    buffer: [T; N],
    start: usize,
    end: usize,
}

impl<T: Copy + Default, const N: usize> Staging<T, N> {
    pub fn new() -> Self {
        Self {
            buffer: [T::default(); N],
            start: 0,
            end: 0,
        }
    }

    pub fn clear(&mut self) {
        self.start = 0;
        self.end = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn as_slice(&self) -> &[T] {
        &self.buffer[self.start..self.end]
    }

    /// Discards up to `n` values from the front.
    pub fn skip(&mut self, n: usize) {
        self.start = cmp::min(self.start + n, self.end);
        if self.is_empty() {
            self.clear();
        }
    }

    pub fn push(&mut self, value: T) -> Result<()> {
        if self.end == N && self.start > 0 {
            self.buffer.copy_within(self.start..self.end, 0);
            self.end -= self.start;
            self.start = 0;
        }
        if self.end == N {
            return Err(Error::Internal("staging buffer overflow"));
        }
        self.buffer[self.end] = value;
        self.end += 1;
        Ok(())
    }

    pub fn extend(&mut self, values: &[T]) -> Result<()> {
        values.iter().try_for_each(|value| self.push(*value))
    }

    /// Moves as much as fits into `dst`, advancing it. Returns whether the
    /// buffer is now empty.
    pub fn drain_into(&mut self, dst: &mut &mut [T]) -> bool {
        let n = write_slice(dst, self.as_slice());
        self.start += n;
        if self.is_empty() {
            self.clear();
        }
        self.is_empty()
    }
}

/// Writes one value to the front of `dst` and advances it. Returns `false`
/// if `dst` is already full.
pub(crate) fn put<T>(dst: &mut &mut [T], value: T) -> bool {
    match mem::take(dst).split_first_mut() {
        Some((first, rest)) => {
            *first = value;
            *dst = rest;
            true
        }
        None => false,
    }
}

/// Copies the longest prefix of `src` that fits into `dst`, advancing `dst`.
/// Returns the number of values copied.
pub(crate) fn write_slice<T: Copy>(dst: &mut &mut [T], src: &[T]) -> usize {
    let n = cmp::min(dst.len(), src.len());
    let (head, tail) = mem::take(dst).split_at_mut(n);
    head.copy_from_slice(&src[..n]);
    *dst = tail;
    n
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overflow_is_internal_error() {
        let mut staging = Staging::<u8, 3>::new();
        staging.extend(b"abc").unwrap();
        assert_eq!(
            staging.push(b'd'),
            Err(Error::Internal("staging buffer overflow"))
        );
    }

    #[test]
    fn partial_drain_keeps_tail() {
        let mut staging = Staging::<u8, 4>::new();
        staging.extend(b"wxyz").unwrap();

        let mut out = [0u8; 3];
        let mut dst: &mut [u8] = &mut out;
        assert!(!staging.drain_into(&mut dst));
        assert!(dst.is_empty());
        assert_eq!(&out, b"wxy");
        assert_eq!(staging.as_slice(), b"z");

        // Space freed at the front is reused.
        staging.extend(b"123").unwrap();
        assert_eq!(staging.as_slice(), b"z123");
    }

    #[test]
    fn put_reports_full_destination() {
        let mut out = [0u32; 1];
        let mut dst: &mut [u32] = &mut out;
        assert!(put(&mut dst, 7));
        assert!(!put(&mut dst, 8));
        assert_eq!(out, [7]);
    }
}
