use super::types::*;

/// Location of a repeated substring.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Repeat {
    /// Start of one occurrence in the text.
    pub position: usize,
    pub len: usize,
}

/// Find the longest repeated substring from the maximum of the lcp array.
///
/// Returns `None` if no substring occurs twice. When several suffixes share the
/// maximum, the first one in suffix array order wins.
pub fn longest_repeat(sa: &[Index], lcp: &[u32]) -> Option<Repeat> {
    assert_eq!(sa.len(), lcp.len());

    let mut max_lcp = 0;
    let mut max_index = 0;
    for i in 1..lcp.len() {
        if lcp[i] > max_lcp {
            max_lcp = lcp[i];
            max_index = i;
        }
    }

    if max_lcp == 0 {
        return None;
    }
    Some(Repeat {
        position: sa[max_index] as usize,
        len: max_lcp as usize,
    })
}

/// Get the longest repeated substring of `text`.
pub fn longest_repeated_substring<'a>(text: &'a [u8], sa: &[Index], lcp: &[u32]) -> Option<&'a [u8]> {
    longest_repeat(sa, lcp).map(|r| &text[r.position..r.position + r.len])
}
