use super::types::*;

/// Test if `sa` is the suffix array of `text`.
///
/// It must be a permutation of `0..text.len()` listing the suffixes in strictly
/// increasing lexicographic order.
pub fn is_valid_suffix_array(text: &[u8], sa: &[Index]) -> bool {
    if sa.len() != text.len() {
        return false;
    }

    let mut seen = vec![0u64; (sa.len() + 63) / 64];
    for &x in sa.iter() {
        let x = x as usize;
        if x >= text.len() {
            return false;
        }
        let (word, bit) = (x / 64, 1u64 << (x % 64));
        if seen[word] & bit != 0 {
            return false;
        }
        seen[word] |= bit;
    }

    for i in 1..sa.len() {
        if text[sa[i - 1] as usize..] >= text[sa[i] as usize..] {
            return false;
        }
    }
    true
}
