use std::mem;
use std::ops::Range;

use super::comm::*;
use super::common::*;
use super::doubling;
use super::error::*;
use super::sort::*;
use super::types::*;

/// Texts shorter than this are sorted on the coordinator alone.
pub const SEQUENTIAL_THRESHOLD: usize = 1 << 14;

/// How the keys of a round are sorted across processes.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Exchange {
    /// Parallel sort by regular sampling: every process ends up with one
    /// contiguous range of the key space.
    SampleSort,

    /// Every block is gathered and sorted on the coordinator.
    Centralized,
}

/// How the ranks of a round are published to every process.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RankSharing {
    AllGather,
    GatherBroadcast,
}

/// How the initial rank pairs reach their process.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Partition {
    /// Each process computes its own block from the shared text.
    Local,

    /// The coordinator computes every pair and scatters the blocks.
    Scatter,
}

/// Policies of the distributed construction.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Config {
    /// Below this length the coordinator sorts alone and broadcasts the result.
    pub threshold: usize,
    pub exchange: Exchange,
    /// Ignored by `Exchange::Centralized`, which always broadcasts.
    pub sharing: RankSharing,
    pub partition: Partition,
    pub local_sort: SortPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            threshold: SEQUENTIAL_THRESHOLD,
            exchange: Exchange::SampleSort,
            sharing: RankSharing::AllGather,
            partition: Partition::Local,
            local_sort: SortPolicy::Comparison,
        }
    }
}

impl Config {
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_exchange(mut self, exchange: Exchange) -> Self {
        self.exchange = exchange;
        self
    }

    pub fn with_sharing(mut self, sharing: RankSharing) -> Self {
        self.sharing = sharing;
        self
    }

    pub fn with_partition(mut self, partition: Partition) -> Self {
        self.partition = partition;
        self
    }

    pub fn with_local_sort(mut self, local_sort: SortPolicy) -> Self {
        self.local_sort = local_sort;
        self
    }
}

/// Sort suffix array by prefix doubling across all processes of `comm`.
///
/// Must be called by every process with the same text and config. Every
/// process returns the complete suffix array.
pub fn build<C: Communicator>(comm: &C, text: &[u8], config: &Config) -> Result<Construction> {
    let text = checked_text(text, text.len())?;
    let n = text.len();
    if n <= 1 {
        return Ok(Construction::trivial(n));
    }

    if comm.size() == 1 || n < config.threshold {
        return sequential_on_root(comm, text, config);
    }
    match config.exchange {
        Exchange::SampleSort => sample_sort(comm, text, config),
        Exchange::Centralized => centralized(comm, text, config),
    }
}

/// Broadcast the text held by the coordinator to every process.
pub fn share_text<C: Communicator>(comm: &C, text: Option<Vec<u8>>) -> Result<Vec<u8>> {
    let len = text.as_ref().map(|t| vec![t.len() as u64]);
    let len = comm.broadcast(ROOT, len, 1)?[0] as usize;
    comm.broadcast(ROOT, text, len)
}

/// Sort on the coordinator, then broadcast the suffix array.
fn sequential_on_root<C: Communicator>(comm: &C, text: &[u8], config: &Config) -> Result<Construction> {
    let built = if comm.is_root() {
        Some(doubling::build(text, config.local_sort)?)
    } else {
        None
    };

    let rounds = built.as_ref().map(|c| vec![c.rounds as u64]);
    let rounds = comm.broadcast(ROOT, rounds, 1)?[0] as usize;
    let sa = comm.broadcast(ROOT, built.map(|c| c.sa), text.len())?;
    Ok(Construction { sa, rounds })
}

/// Doubling rounds with a global sample sort of the keys.
fn sample_sort<C: Communicator>(comm: &C, text: &[u8], config: &Config) -> Result<Construction> {
    let n = text.len();
    let range = block_range(n, comm.size(), comm.rank());
    let mut block = initial_block(comm, text, config)?;

    let mut rounds = 0;
    let mut k = 2;
    loop {
        rounds += 1;

        // after the exchange this process owns one contiguous slice of the key space.
        sort_pairs(&mut block[..], config.local_sort);
        let pivots = select_pivots(comm, &block[..], n)?;
        let buckets = split_by_pivots(&block[..], &pivots[..], comm.size());
        let mut slice = comm.alltoallv(buckets)?.concat();
        sort_pairs(&mut slice[..], config.local_sort);

        let (ranked, distinct) = rank_slice(comm, &slice[..])?;
        trace!(
            "process {}: round {}, k {}, slice {}, distinct {}",
            comm.rank(),
            rounds,
            k,
            slice.len(),
            distinct
        );
        let table = share_ranks(comm, ranked, n, config.sharing)?;
        if distinct == n {
            return finalize(&table[..], rounds);
        }
        if k >= n {
            return Err(not_converged(comm, Op::Reduce, distinct, n));
        }

        refresh_block(range.clone(), &table[..], k, &mut block);
        k *= 2;
    }
}

/// Doubling rounds sorted on the coordinator, ranks broadcast back.
fn centralized<C: Communicator>(comm: &C, text: &[u8], config: &Config) -> Result<Construction> {
    let n = text.len();
    let counts = block_lens(n, comm.size());
    let range = block_range(n, comm.size(), comm.rank());
    let mut block = initial_block(comm, text, config)?;

    let mut rounds = 0;
    let mut k = 2;
    loop {
        rounds += 1;

        sort_pairs(&mut block[..], config.local_sort);
        let table = match comm.gatherv(ROOT, mem::take(&mut block), &counts[..])? {
            Some(mut all) => {
                sort_pairs(&mut all[..], config.local_sort);
                let mut table = try_filled(SENTINEL, n)?;
                doubling::assign_ranks(&all[..], &mut table[..]);
                Some(table)
            }
            None => None,
        };
        let table = comm.broadcast(ROOT, table, n)?;

        let distinct = table.iter().copied().max().map_or(0, |r| r as usize + 1);
        trace!("process {}: round {}, k {}, distinct {}", comm.rank(), rounds, k, distinct);
        if distinct == n {
            return finalize(&table[..], rounds);
        }
        if k >= n {
            return Err(not_converged(comm, Op::Broadcast, distinct, n));
        }

        refresh_block(range.clone(), &table[..], k, &mut block);
        k *= 2;
    }
}

/// Pairs of the first round for the block of this process.
fn initial_block<C: Communicator>(comm: &C, text: &[u8], config: &Config) -> Result<Vec<RankPair>> {
    let n = text.len();
    let initial = |i: usize| RankPair::new(i, char_rank(text, i), char_rank(text, i + 1));

    match config.partition {
        Partition::Local => {
            let range = block_range(n, comm.size(), comm.rank());
            let mut block = try_with_capacity(range.len())?;
            block.extend(range.map(initial));
            Ok(block)
        }
        Partition::Scatter => {
            let all = if comm.is_root() {
                let mut all = try_with_capacity(n)?;
                all.extend((0..n).map(initial));
                Some(all)
            } else {
                None
            };
            comm.scatterv(ROOT, all, &block_lens(n, comm.size())[..])
        }
    }
}

/// Rebuild the pairs of the block for the next round, the new prefixes are twice as long.
fn refresh_block(range: Range<usize>, table: &[Rank], k: usize, block: &mut Vec<RankPair>) {
    block.clear();
    block.extend(range.map(|i| RankPair::new(i, table[i], table_rank(table, i + k))));
}

/// Choose `size - 1` pivots from regular samples of every sorted block.
///
/// Each non-empty block contributes exactly `size` samples, so the gathered
/// length only depends on `n` and the group size.
fn select_pivots<C: Communicator>(comm: &C, sorted: &[RankPair], n: usize) -> Result<Vec<(Rank, Rank)>> {
    let size = comm.size();
    let samples = regular_samples(sorted, size);
    let counts = block_lens(n, size)
        .into_iter()
        .map(|len| if len > 0 { size } else { 0 })
        .collect::<Vec<_>>();

    let pivots = comm.gatherv(ROOT, samples, &counts[..])?.map(|mut all| {
        all.sort_unstable();
        (1..size).map(|i| all[i * all.len() / size]).collect::<Vec<_>>()
    });
    comm.broadcast(ROOT, pivots, size - 1)
}

/// Take `count` evenly spaced keys from a sorted block.
fn regular_samples(sorted: &[RankPair], count: usize) -> Vec<(Rank, Rank)> {
    if sorted.is_empty() {
        return Vec::new();
    }
    (0..count).map(|j| sorted[j * sorted.len() / count].key()).collect()
}

/// Split a sorted block into `size` buckets, a key goes to the first pivot not below it.
///
/// Equal keys always land in the same bucket.
fn split_by_pivots(sorted: &[RankPair], pivots: &[(Rank, Rank)], size: usize) -> Vec<Vec<RankPair>> {
    debug_assert_eq!(pivots.len() + 1, size);
    let mut buckets = vec![Vec::new(); size];
    let mut b = 0;
    for pair in sorted.iter() {
        while b < pivots.len() && pair.key() > pivots[b] {
            b += 1;
        }
        buckets[b].push(*pair);
    }
    buckets
}

/// Rank a sorted slice of the global key order.
///
/// Returns the ranks and the number of distinct keys over all processes.
fn rank_slice<C: Communicator>(comm: &C, sorted: &[RankPair]) -> Result<(Vec<IndexRank>, usize)> {
    let distinct = count_distinct(sorted) as u64;
    let offset = comm.exscan_sum(distinct)? as Rank;
    let total = comm.allreduce_sum(distinct)? as usize;

    let mut ranked = try_with_capacity(sorted.len())?;
    let mut rank = offset - 1;
    for (i, pair) in sorted.iter().enumerate() {
        if i == 0 || sorted[i - 1].key() != pair.key() {
            rank += 1;
        }
        ranked.push(IndexRank {
            index: pair.index,
            rank,
        });
    }
    Ok((ranked, total))
}

#[inline]
fn count_distinct(sorted: &[RankPair]) -> usize {
    if sorted.is_empty() {
        return 0;
    }
    1 + sorted.windows(2).filter(|w| w[0].key() != w[1].key()).count()
}

/// Make the rank of every suffix known to every process.
fn share_ranks<C: Communicator>(
    comm: &C,
    ranked: Vec<IndexRank>,
    n: usize,
    sharing: RankSharing,
) -> Result<Vec<Rank>> {
    match sharing {
        RankSharing::AllGather => {
            let blocks = comm.allgather(ranked)?;
            rank_table(comm, Op::AllGather, &blocks[..], n)
        }
        RankSharing::GatherBroadcast => {
            let table = match comm.gather(ROOT, ranked)? {
                Some(blocks) => Some(rank_table(comm, Op::Gather, &blocks[..], n)?),
                None => None,
            };
            comm.broadcast(ROOT, table, n)
        }
    }
}

/// Scatter published ranks into a table indexed by suffix, every suffix exactly once.
fn rank_table<C: Communicator>(comm: &C, op: Op, blocks: &[Vec<IndexRank>], n: usize) -> Result<Vec<Rank>> {
    let mut table = try_filled(SENTINEL, n)?;
    let mut filled = 0;
    for r in blocks.iter().flatten() {
        match table.get_mut(r.index as usize) {
            Some(slot) if *slot == SENTINEL => {
                *slot = r.rank;
                filled += 1;
            }
            _ => {
                return Err(Error::mismatch(
                    comm.rank(),
                    op,
                    format!("suffix {} ranked twice or out of range", r.index),
                ))
            }
        }
    }
    if filled != n {
        return Err(Error::mismatch(
            comm.rank(),
            op,
            format!("{} of {} suffixes ranked", filled, n),
        ));
    }
    Ok(table)
}

/// Invert the final rank table into the suffix array.
fn finalize(table: &[Rank], rounds: usize) -> Result<Construction> {
    let mut sa = try_filled(0 as Index, table.len())?;
    for (i, &r) in table.iter().enumerate() {
        sa[r as usize] = i as Index;
    }
    Ok(Construction { sa, rounds })
}

fn not_converged<C: Communicator>(comm: &C, op: Op, distinct: usize, n: usize) -> Error {
    Error::mismatch(
        comm.rank(),
        op,
        format!("only {} of {} suffixes distinct after the last round", distinct, n),
    )
}

#[cfg(test)]
mod tests {
    use super::super::common::saca_tiny;
    use super::super::group::ProcessGroup;
    use super::*;

    const GROUP_SIZES: [usize; 5] = [1, 2, 3, 4, 8];

    #[test]
    fn tablecheck_dist() {
        let texts: &[&[u8]] = &[
            b"",
            b"x",
            b"ab",
            b"banana",
            b"aaaa",
            b"abcdef",
            b"mississippi",
            b"abracadabra",
            &[0, 0, 0, 0, 0, 0, 0, 0, 0],
            &[2, 1, 1, 3, 3, 1, 1, 3, 3, 1, 2, 1],
        ];

        for config in configs().iter() {
            for &size in GROUP_SIZES.iter() {
                for &text in texts.iter() {
                    assert_eq!(run(text, size, config).sa, saca_tiny(text), "{:?} {}", config, size);
                }
            }
        }
    }

    #[test]
    fn every_process_holds_the_suffix_array() {
        let config = Config::default().with_threshold(0);
        let results = ProcessGroup::new(4).run(|comm| build(comm, b"banana", &config));
        for result in results {
            assert_eq!(result.unwrap().sa, vec![5, 3, 1, 0, 4, 2]);
        }
    }

    #[test]
    fn single_process_matches_sequential() {
        let text = random_text(3000, 4);
        let seq = doubling::build(&text[..], SortPolicy::Comparison).unwrap();
        let config = Config::default().with_threshold(0);
        assert_eq!(run(&text[..], 1, &config), seq);
    }

    #[test]
    fn small_text_is_sorted_on_root() {
        let text = random_text(500, 2);
        let config = Config::default();
        let seq = doubling::build(&text[..], config.local_sort).unwrap();
        assert_eq!(run(&text[..], 4, &config), seq);
    }

    #[test]
    fn deterministic() {
        let text = random_text(2000, 3);
        let config = Config::default().with_threshold(0);
        assert_eq!(run(&text[..], 3, &config), run(&text[..], 3, &config));
    }

    #[test]
    fn rounds_bound_on_large_text() {
        let n = 20000;
        let bound = ceil_log2(n) + 1;
        for &alphabet in [2, 4, 26].iter() {
            let text = random_text(n, alphabet);
            for config in configs().iter() {
                let c = run(&text[..], 4, config);
                assert_eq!(c.sa, saca_tiny(&text[..]));
                assert!(c.rounds <= bound, "{} rounds for {:?}", c.rounds, config);
            }
        }

        let periodic = b"abcab".iter().cycle().take(n).copied().collect::<Vec<_>>();
        let c = run(&periodic[..], 3, &Config::default().with_threshold(0));
        assert!(c.rounds <= bound);
    }

    #[test]
    fn more_processes_than_suffixes() {
        let config = Config::default().with_threshold(0);
        for &text in [&b"ab"[..], b"aba", b"zzz"].iter() {
            assert_eq!(run(text, 8, &config).sa, saca_tiny(text));
        }
    }

    #[test]
    fn share_text_copies_the_coordinator_text() {
        let results = ProcessGroup::new(3).run(|comm| {
            let text = if comm.is_root() { Some(b"banana".to_vec()) } else { None };
            share_text(comm, text)
        });
        for result in results {
            assert_eq!(result.unwrap(), b"banana".to_vec());
        }
    }

    #[quickcheck]
    fn quickcheck_dist(text: Vec<u8>, size: usize, variant: usize) -> bool {
        let text = text.iter().map(|&c| c % 4).collect::<Vec<_>>();
        let size = GROUP_SIZES[size % GROUP_SIZES.len()];
        let configs = configs();
        let config = &configs[variant % configs.len()];
        run(&text[..], size, config).sa == saca_tiny(&text[..])
    }

    // helper functions.

    fn configs() -> Vec<Config> {
        let base = Config::default().with_threshold(0);
        vec![
            base,
            base.with_local_sort(SortPolicy::Radix),
            base.with_sharing(RankSharing::GatherBroadcast),
            base.with_partition(Partition::Scatter),
            base.with_exchange(Exchange::Centralized),
            base.with_exchange(Exchange::Centralized)
                .with_local_sort(SortPolicy::Radix)
                .with_partition(Partition::Scatter),
        ]
    }

    fn run(text: &[u8], size: usize, config: &Config) -> Construction {
        ProcessGroup::new(size)
            .run_root(|comm| build(comm, text, config))
            .unwrap()
    }

    fn random_text(n: usize, alphabet: u8) -> Vec<u8> {
        let mut state = 0x2545_f491_4f6c_dd1du64;
        (0..n)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                b'a' + (state % alphabet as u64) as u8
            })
            .collect()
    }

    fn ceil_log2(n: usize) -> usize {
        (usize::max_value().count_ones() - (n - 1).leading_zeros()) as usize
    }
}
