/// Suffix index type.
pub type Index = u32;

/// Rank type, negative ranks are sentinels.
pub type Rank = i32;

/// Rank of an absent suffix, ordered before every real rank.
pub const SENTINEL: Rank = -1;

/// Longest text that could be ranked without overflow.
pub const MAX_TEXT_LEN: usize = Rank::MAX as usize;

/// Sorting key of a suffix during prefix doubling.
///
/// `rank0` ranks the current prefix of the suffix at `index`, `rank1` ranks the
/// prefix that starts `k` characters later (or `SENTINEL` past the end).
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct RankPair {
    pub index: Index,
    pub rank0: Rank,
    pub rank1: Rank,
}

impl RankPair {
    #[inline(always)]
    pub fn new(index: usize, rank0: Rank, rank1: Rank) -> Self {
        RankPair {
            index: index as Index,
            rank0,
            rank1,
        }
    }

    /// Key the suffixes are ordered by, the index is not part of it.
    #[inline(always)]
    pub fn key(&self) -> (Rank, Rank) {
        (self.rank0, self.rank1)
    }
}

/// Rank of a suffix, the record processes exchange to publish a round.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct IndexRank {
    pub index: Index,
    pub rank: Rank,
}

/// A finished suffix array, with the number of doubling rounds it took.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Construction {
    pub sa: Vec<Index>,
    pub rounds: usize,
}

impl Construction {
    /// Suffix array of a text too short to need any round.
    pub fn trivial(n: usize) -> Self {
        Construction {
            sa: (0..n as Index).collect(),
            rounds: 0,
        }
    }
}

/// Rank of the byte at `i`, or `SENTINEL` past the end.
#[inline(always)]
pub fn char_rank(text: &[u8], i: usize) -> Rank {
    match text.get(i) {
        Some(&c) => Rank::from(c),
        None => SENTINEL,
    }
}

/// Rank at `i` in a rank table, or `SENTINEL` past the end.
#[inline(always)]
pub fn table_rank(table: &[Rank], i: usize) -> Rank {
    match table.get(i) {
        Some(&r) => r,
        None => SENTINEL,
    }
}
