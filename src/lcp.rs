use super::types::*;

/// Longest common prefix array by Kasai's algorithm.
///
/// `lcp[i]` is the length of the common prefix of the suffixes `sa[i - 1]` and
/// `sa[i]`, and `lcp[0] = 0`. Runs in `O(n)` since the matched length `h`
/// drops by at most one from one text position to the next.
pub fn lcp_array(text: &[u8], sa: &[Index]) -> Vec<u32> {
    assert_eq!(text.len(), sa.len());
    let n = text.len();

    let mut rank = vec![0usize; n];
    for (i, &x) in sa.iter().enumerate() {
        rank[x as usize] = i;
    }

    let mut lcp = vec![0u32; n];
    let mut h = 0;
    for i in 0..n {
        if rank[i] == 0 {
            h = 0;
            continue;
        }
        let j = sa[rank[i] - 1] as usize;
        while i + h < n && j + h < n && text[i + h] == text[j + h] {
            h += 1;
        }
        lcp[rank[i]] = h as u32;
        h = h.saturating_sub(1);
    }
    lcp
}
