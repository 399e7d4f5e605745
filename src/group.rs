use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};

use crossbeam::channel::{self, Receiver, Sender};
use scoped_threadpool::Pool;

use super::comm::*;
use super::error::*;

/// A group of processes running the same program on threads of a pool.
///
/// Processes share nothing but what the body borrows; they talk through one
/// channel per ordered pair of processes.
pub struct ProcessGroup {
    pool: Pool,
    size: usize,
}

impl ProcessGroup {
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "empty process group");
        let pool = Pool::new(size as u32);
        ProcessGroup { pool, size }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Run `body` on every process, returns the results indexed by rank.
    ///
    /// A process that fails hangs up its channels, so peers waiting on it fail
    /// with `Error::Aborted` instead of blocking forever. Panics are reported
    /// the same way.
    pub fn run<F, R>(&mut self, body: F) -> Vec<Result<R>>
    where
        F: Fn(&ThreadComm) -> Result<R> + Sync,
        R: Send,
    {
        let size = self.size;
        let comms = ThreadComm::wire(size);
        let (done_send, done_recv) = channel::unbounded();
        let body = &body;

        self.pool.scoped(|scope| {
            for comm in comms {
                let done = done_send.clone();
                scope.execute(move || {
                    let rank = comm.rank();
                    let result = panic::catch_unwind(AssertUnwindSafe(|| body(&comm)))
                        .unwrap_or_else(|_| Err(Error::Aborted { rank, peer: rank }));
                    drop(comm);
                    let _ = done.send((rank, result));
                });
            }
        });
        drop(done_send);

        let mut results = (0..size).map(|_| None).collect::<Vec<_>>();
        for (rank, result) in done_recv.iter() {
            results[rank] = Some(result);
        }
        results
            .into_iter()
            .enumerate()
            .map(|(rank, result)| result.unwrap_or(Err(Error::Aborted { rank, peer: rank })))
            .collect()
    }

    /// Run `body` on every process, returns the result of the coordinator.
    ///
    /// If any process failed, the root cause is returned instead: the first
    /// error that is not a mere consequence of a peer aborting.
    pub fn run_root<F, R>(&mut self, body: F) -> Result<R>
    where
        F: Fn(&ThreadComm) -> Result<R> + Sync,
        R: Send,
    {
        let mut results = self.run(body);
        let cause = results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .find(|err| !matches!(err, Error::Aborted { rank, peer } if rank != peer))
            .or_else(|| results.iter().filter_map(|r| r.as_ref().err()).next())
            .cloned();
        match cause {
            Some(err) => Err(err),
            None => results.swap_remove(ROOT),
        }
    }
}

/// Endpoint of one process in a `ProcessGroup`.
pub struct ThreadComm {
    rank: usize,
    /// Indexed by destination.
    outbox: Vec<Sender<Envelope>>,
    /// Indexed by source.
    inbox: Vec<Receiver<Envelope>>,
    seq: Cell<u64>,
}

impl ThreadComm {
    /// Connect `size` endpoints, one channel for each ordered pair.
    pub fn wire(size: usize) -> Vec<ThreadComm> {
        let mut outboxes = (0..size).map(|_| Vec::with_capacity(size)).collect::<Vec<_>>();
        let mut inboxes = (0..size).map(|_| Vec::with_capacity(size)).collect::<Vec<_>>();
        for src in 0..size {
            for dest in 0..size {
                let (send, recv) = channel::unbounded();
                outboxes[src].push(send);
                inboxes[dest].push(recv);
            }
        }

        outboxes
            .into_iter()
            .zip(inboxes)
            .enumerate()
            .map(|(rank, (outbox, inbox))| ThreadComm {
                rank,
                outbox,
                inbox,
                seq: Cell::new(0),
            })
            .collect()
    }
}

impl Communicator for ThreadComm {
    #[inline]
    fn rank(&self) -> usize {
        self.rank
    }

    #[inline]
    fn size(&self) -> usize {
        self.outbox.len()
    }

    fn open(&self, op: Op) -> Tag {
        let seq = self.seq.get();
        self.seq.set(seq + 1);
        Tag { op, seq }
    }

    fn post(&self, dest: usize, envelope: Envelope) -> Result<()> {
        self.outbox[dest].send(envelope).map_err(|_| Error::Aborted {
            rank: self.rank,
            peer: dest,
        })
    }

    fn fetch(&self, src: usize) -> Result<Envelope> {
        self.inbox[src].recv().map_err(|_| Error::Aborted {
            rank: self.rank,
            peer: src,
        })
    }
}
