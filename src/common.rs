use std::env;
use std::mem::size_of;
use std::ops::Range;

use super::error::*;
use super::types::*;

/// Environment variable that turns tracing on in debug builds.
pub const TRACE_VAR: &str = "PDSA_TRACE";

macro_rules! trace {
    ($( $fmt:expr $( , $args:expr )* );*) => {
        if cfg!(debug_assertions) && $crate::common::tracing() {
            $( eprintln!($fmt $(, $args)*); )*
        }
    };
}

/// Test if tracing was requested.
#[inline]
pub fn tracing() -> bool {
    env::var_os(TRACE_VAR).is_some()
}

/// Naive suffix array construction that sorts tiny input.
#[cfg(test)]
pub fn saca_tiny(text: &[u8]) -> Vec<Index> {
    let mut suf = (0..text.len() as Index).collect::<Vec<_>>();
    suf.sort_by(|&i, &j| Ord::cmp(&text[i as usize..], &text[j as usize..]));
    suf
}

/// Validate the construction arguments and return the text to be sorted.
pub fn checked_text(text: &[u8], n: usize) -> Result<&[u8]> {
    if n > text.len() {
        return Err(Error::invalid(format!(
            "length {} exceeds the {} bytes of text",
            n,
            text.len()
        )));
    }
    if n > MAX_TEXT_LEN {
        return Err(Error::invalid(format!(
            "length {} exceeds the limit of {} bytes",
            n, MAX_TEXT_LEN
        )));
    }
    Ok(&text[..n])
}

/// Allocate an empty vector able to hold `len` elements without reallocation.
pub fn try_with_capacity<T>(len: usize) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| Error::AllocationFailure {
            bytes: len.saturating_mul(size_of::<T>()),
        })?;
    Ok(v)
}

/// Allocate a vector of `len` copies of `value`.
pub fn try_filled<T: Clone>(value: T, len: usize) -> Result<Vec<T>> {
    let mut v = try_with_capacity(len)?;
    v.resize(len, value);
    Ok(v)
}

/// Contiguous block of `0..n` owned by process `rank` out of `size`.
///
/// The first `n % size` blocks hold one extra element.
#[inline]
pub fn block_range(n: usize, size: usize, rank: usize) -> Range<usize> {
    let base = n / size;
    let extra = n % size;
    let start = rank * base + Ord::min(rank, extra);
    let len = base + if rank < extra { 1 } else { 0 };
    start..start + len
}

/// Lengths of all the blocks of `0..n`.
pub fn block_lens(n: usize, size: usize) -> Vec<usize> {
    (0..size).map(|r| block_range(n, size, r).len()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tablecheck_block_range() {
        let cases: &[(usize, usize, &[usize])] = &[
            (0, 3, &[0, 0, 0]),
            (2, 4, &[1, 1, 0, 0]),
            (10, 3, &[4, 3, 3]),
            (12, 4, &[3, 3, 3, 3]),
            (7, 1, &[7]),
        ];
        for &(n, size, lens) in cases.iter() {
            assert_eq!(block_lens(n, size), lens);
        }
    }

    #[quickcheck]
    fn quickcheck_block_range(n: u16, size: u8) -> bool {
        let n = n as usize;
        let size = size as usize % 16 + 1;
        let mut next = 0;
        for r in 0..size {
            let range = block_range(n, size, r);
            if range.start != next || range.len() > n / size + 1 || range.len() < n / size {
                return false;
            }
            next = range.end;
        }
        next == n
    }

    #[test]
    fn checked_text_rejects_overlong_length() {
        assert_eq!(checked_text(b"abc", 2), Ok(&b"ab"[..]));
        assert!(matches!(checked_text(b"abc", 4), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn saca_tiny_banana() {
        assert_eq!(saca_tiny(b"banana"), vec![5, 3, 1, 0, 4, 2]);
    }
}
