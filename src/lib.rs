//! Suffix arrays by prefix doubling, on one process or across a group of
//! processes that only talk through message passing.
//!
//! The distributed construction re-sorts the suffix keys of every doubling
//! round with a parallel sort by regular sampling, then agrees on global ranks
//! with a prefix sum. The LCP array and the longest repeated substring are
//! derived from the finished suffix array.

#[cfg(test)]
#[macro_use]
extern crate quickcheck_macros;

#[macro_use]
extern crate cfg_if;

#[macro_use]
mod common;
mod check;
mod comm;
mod dist;
mod doubling;
mod error;
mod group;
mod lcp;
mod lrs;
mod sort;
mod types;

pub use check::is_valid_suffix_array;
pub use comm::{Communicator, Envelope, Op, Tag, ROOT};
pub use dist::{share_text, Config, Exchange, Partition, RankSharing, SEQUENTIAL_THRESHOLD};
pub use error::{Error, Result};
pub use group::{ProcessGroup, ThreadComm};
pub use lcp::lcp_array;
pub use lrs::{longest_repeat, longest_repeated_substring, Repeat};
pub use sort::SortPolicy;
pub use types::{Construction, Index, Rank, MAX_TEXT_LEN};

/// Sort the suffix array of the first `n` bytes of `text`.
pub fn suffix_array(text: &[u8], n: usize) -> Result<Vec<Index>> {
    suffix_array_with(text, n, SortPolicy::default()).map(|c| c.sa)
}

/// Sort the suffix array of the first `n` bytes of `text` with the given sort,
/// reporting the number of doubling rounds.
pub fn suffix_array_with(text: &[u8], n: usize, policy: SortPolicy) -> Result<Construction> {
    let text = common::checked_text(text, n)?;
    doubling::build(text, policy)
}

/// Sort the suffix array of the first `n` bytes of `text` on every process of `comm`.
///
/// Every process must call it with the same arguments; every process gets the
/// complete suffix array.
pub fn distributed_suffix_array<C: Communicator>(
    comm: &C,
    text: &[u8],
    n: usize,
    config: &Config,
) -> Result<Vec<Index>> {
    distributed_suffix_array_with(comm, text, n, config).map(|c| c.sa)
}

/// Like `distributed_suffix_array`, reporting the number of doubling rounds.
pub fn distributed_suffix_array_with<C: Communicator>(
    comm: &C,
    text: &[u8],
    n: usize,
    config: &Config,
) -> Result<Construction> {
    let text = common::checked_text(text, n)?;
    dist::build(comm, text, config)
}

/// Sort the suffix array of the first `n` bytes of `text` with `processes`
/// in-process processes.
pub fn run_distributed(text: &[u8], n: usize, processes: usize, config: &Config) -> Result<Vec<Index>> {
    if processes == 0 {
        return Err(Error::InvalidInput("no processes to run on".into()));
    }
    let text = common::checked_text(text, n)?;
    ProcessGroup::new(processes).run_root(|comm| distributed_suffix_array(comm, text, n, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banana() {
        let text = b"banana";
        let sa = suffix_array(text, 6).unwrap();
        assert_eq!(sa, vec![5, 3, 1, 0, 4, 2]);
        assert!(is_valid_suffix_array(text, &sa[..]));

        let lcp = lcp_array(text, &sa[..]);
        assert_eq!(lcp, vec![0, 1, 3, 0, 0, 2]);
        assert_eq!(longest_repeated_substring(text, &sa[..], &lcp[..]), Some(&b"ana"[..]));
    }

    #[test]
    fn aaaa_and_abcdef() {
        let sa = suffix_array(b"aaaa", 4).unwrap();
        assert_eq!(sa, vec![3, 2, 1, 0]);
        let lcp = lcp_array(b"aaaa", &sa[..]);
        assert_eq!(longest_repeated_substring(b"aaaa", &sa[..], &lcp[..]), Some(&b"aaa"[..]));

        let sa = suffix_array(b"abcdef", 6).unwrap();
        let lcp = lcp_array(b"abcdef", &sa[..]);
        assert_eq!(longest_repeated_substring(b"abcdef", &sa[..], &lcp[..]), None);
    }

    #[test]
    fn boundaries() {
        assert_eq!(suffix_array(b"", 0).unwrap(), Vec::<Index>::new());
        assert_eq!(run_distributed(b"", 0, 3, &Config::default()).unwrap(), Vec::<Index>::new());

        let sa = suffix_array(b"q", 1).unwrap();
        assert_eq!(sa, vec![0]);
        let lcp = lcp_array(b"q", &sa[..]);
        assert_eq!(lcp, vec![0]);
        assert_eq!(longest_repeated_substring(b"q", &sa[..], &lcp[..]), None);
    }

    #[test]
    fn prefix_of_the_buffer() {
        assert_eq!(suffix_array(b"bananaXYZ", 6).unwrap(), vec![5, 3, 1, 0, 4, 2]);
        let config = Config::default().with_threshold(0);
        assert_eq!(run_distributed(b"bananaXYZ", 6, 2, &config).unwrap(), vec![5, 3, 1, 0, 4, 2]);
    }

    #[test]
    fn invalid_input() {
        assert!(matches!(suffix_array(b"abc", 4), Err(Error::InvalidInput(_))));
        assert!(matches!(
            run_distributed(b"abc", 4, 2, &Config::default()),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            run_distributed(b"abc", 3, 0, &Config::default()),
            Err(Error::InvalidInput(_))
        ));
    }

    #[quickcheck]
    fn quickcheck_sequential_equals_single_process(text: Vec<u8>) -> bool {
        let config = Config::default().with_threshold(0);
        suffix_array(&text[..], text.len()).unwrap()
            == run_distributed(&text[..], text.len(), 1, &config).unwrap()
    }

    #[quickcheck]
    fn quickcheck_distributed_is_valid(text: Vec<u8>, procs: u8) -> bool {
        let text = text.iter().map(|&c| c % 5).collect::<Vec<_>>();
        let config = Config::default().with_threshold(0);
        let procs = procs as usize % 8 + 1;
        let sa = run_distributed(&text[..], text.len(), procs, &config).unwrap();
        is_valid_suffix_array(&text[..], &sa[..])
    }
}
