use super::common::*;
use super::error::*;
use super::sort::*;
use super::types::*;

/// Sort suffix array by prefix doubling, on a single process.
///
/// Round `k` orders suffixes by their first `2k` characters, the loop stops as
/// soon as every rank is distinct.
pub fn build(text: &[u8], policy: SortPolicy) -> Result<Construction> {
    let n = text.len();
    if n <= 1 {
        return Ok(Construction::trivial(n));
    }

    let mut rank = try_with_capacity::<Rank>(n)?;
    rank.extend(text.iter().map(|&c| Rank::from(c)));
    let mut pairs = try_filled(RankPair::default(), n)?;

    let mut rounds = 0;
    let mut k = 1;
    while k < n {
        rounds += 1;
        for (i, p) in pairs.iter_mut().enumerate() {
            *p = RankPair::new(i, rank[i], table_rank(&rank, i + k));
        }
        sort_pairs(&mut pairs[..], policy);

        let max_rank = assign_ranks(&pairs[..], &mut rank[..]);
        trace!("doubling: round {}, k {}, distinct {}", rounds, k, max_rank + 1);
        if max_rank as usize == n - 1 {
            break;
        }
        k *= 2;
    }
    debug_assert!(k < n, "ranks never converged");

    let sa = pairs.iter().map(|p| p.index).collect();
    Ok(Construction { sa, rounds })
}

/// Assign dense ranks from sorted pairs into `rank`, returns the maximum rank.
#[inline]
pub fn assign_ranks(sorted: &[RankPair], rank: &mut [Rank]) -> Rank {
    let mut r = 0;
    rank[sorted[0].index as usize] = 0;
    for w in sorted.windows(2) {
        if w[0].key() != w[1].key() {
            r += 1;
        }
        rank[w[1].index as usize] = r;
    }
    r
}

#[cfg(test)]
mod tests {
    use super::super::common::saca_tiny;
    use super::*;

    #[test]
    fn tablecheck_doubling() {
        let texts: &[&[u8]] = &[
            b"",
            b"x",
            b"banana",
            b"aaaa",
            b"abcdef",
            b"mississippi",
            b"abracadabra",
            &[0, 0, 0, 0, 0, 0],
            &[255, 0, 255, 0, 255, 1, 4, 3],
            &[3, 2, 1, 3, 2, 3, 2, 1, 0, 1],
        ];

        for &text in texts.iter() {
            assert_eq!(sorted(text, SortPolicy::Comparison), saca_tiny(text));
            assert_eq!(sorted(text, SortPolicy::Radix), saca_tiny(text));
        }
    }

    #[test]
    fn banana_and_aaaa() {
        assert_eq!(sorted(b"banana", SortPolicy::Radix), vec![5, 3, 1, 0, 4, 2]);
        assert_eq!(sorted(b"aaaa", SortPolicy::Comparison), vec![3, 2, 1, 0]);
    }

    #[test]
    fn rounds_stop_early() {
        // all characters distinct: one round is enough.
        let c = build(b"abcdefgh", SortPolicy::Comparison).unwrap();
        assert_eq!(c.rounds, 1);

        // a run of equal characters needs every round.
        let c = build(&[7u8; 16], SortPolicy::Radix).unwrap();
        assert_eq!(c.rounds, 4);
    }

    #[quickcheck]
    fn quickcheck_doubling(text: Vec<u8>) -> bool {
        saca_tiny(&text[..]) == sorted(&text[..], SortPolicy::Comparison)
    }

    #[quickcheck]
    fn quickcheck_doubling_radix(text: Vec<u8>) -> bool {
        // small alphabet makes long repeats likely.
        let text = text.iter().map(|&c| c % 3).collect::<Vec<_>>();
        saca_tiny(&text[..]) == sorted(&text[..], SortPolicy::Radix)
    }

    #[quickcheck]
    fn quickcheck_rounds_bound(text: Vec<u8>) -> bool {
        let text = text.iter().map(|&c| c % 2).collect::<Vec<_>>();
        let c = build(&text[..], SortPolicy::Comparison).unwrap();
        text.len() < 2 || c.rounds <= ceil_log2(text.len())
    }

    fn sorted(text: &[u8], policy: SortPolicy) -> Vec<Index> {
        build(text, policy).unwrap().sa
    }

    fn ceil_log2(n: usize) -> usize {
        (usize::max_value().count_ones() - (n - 1).leading_zeros()) as usize
    }
}
