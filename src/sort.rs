use super::types::*;

/// Threshold to sort rank pairs in parallel.
#[cfg(feature = "parallel")]
const PARALLEL_SORT_THRESHOLD: usize = 1 << 16;

/// How rank pairs are sorted by key.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SortPolicy {
    /// Unstable comparison sort, `O(n log n)`.
    Comparison,

    /// Stable two-pass counting sort over the rank alphabet, `O(n + alphabet)`.
    Radix,
}

impl Default for SortPolicy {
    fn default() -> Self {
        SortPolicy::Comparison
    }
}

/// Sort rank pairs by `(rank0, rank1)`.
///
/// Only the relative order of different keys is guaranteed.
pub fn sort_pairs(pairs: &mut [RankPair], policy: SortPolicy) {
    match policy {
        SortPolicy::Comparison => comparison_sort(pairs),
        SortPolicy::Radix => radix_sort(pairs),
    }
}

cfg_if! {
    if #[cfg(feature = "parallel")] {
        #[inline]
        fn comparison_sort(pairs: &mut [RankPair]) {
            use rayon::prelude::*;

            if pairs.len() < PARALLEL_SORT_THRESHOLD {
                pairs.sort_unstable_by_key(RankPair::key);
            } else {
                pairs.par_sort_unstable_by_key(RankPair::key);
            }
        }
    } else {
        #[inline]
        fn comparison_sort(pairs: &mut [RankPair]) {
            pairs.sort_unstable_by_key(RankPair::key);
        }
    }
}

/// Stable radix sort, less significant `rank1` first, then `rank0`.
pub fn radix_sort(pairs: &mut [RankPair]) {
    if pairs.len() < 2 {
        return;
    }

    // ranks are shifted by one so that the sentinel lands in bucket 0.
    let max = pairs
        .iter()
        .map(|p| Ord::max(p.rank0, p.rank1))
        .max()
        .unwrap_or(SENTINEL);
    let alphabet = (max + 2) as usize;

    let mut work = pairs.to_vec();
    let mut count = vec![0usize; alphabet + 1];
    counting_pass(pairs, &mut work, &mut count, |p| p.rank1);
    counting_pass(&work, pairs, &mut count, |p| p.rank0);
}

/// One stable counting sort pass from `src` into `dst` by the selected rank.
#[inline]
fn counting_pass<F>(src: &[RankPair], dst: &mut [RankPair], count: &mut [usize], rank: F)
where
    F: Fn(&RankPair) -> Rank,
{
    debug_assert_eq!(src.len(), dst.len());
    count.iter_mut().for_each(|c| *c = 0);

    // bucket heads in count[1..] shifted by one.
    for p in src.iter() {
        count[(rank(p) + 2) as usize] += 1;
    }
    count[1..].iter_mut().fold(0, |sum, c| {
        *c += sum;
        *c
    });

    for p in src.iter() {
        let head = &mut count[(rank(p) + 1) as usize];
        dst[*head] = *p;
        *head += 1;
    }
}
