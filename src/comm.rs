use std::any::Any;

use super::error::*;

/// Rank of the coordinator process.
pub const ROOT: usize = 0;

/// Kinds of collective operations.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Op {
    Broadcast,
    Scatter,
    Gather,
    AllGather,
    AllToAll,
    Scan,
    Reduce,
}

/// Identifies one collective call; all processes must open the same sequence.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Tag {
    pub op: Op,
    pub seq: u64,
}

/// A message between two processes, the payload is always a `Vec<T>`.
pub struct Envelope {
    pub tag: Tag,
    pub payload: Box<dyn Any + Send>,
}

/// Message passing between a fixed group of processes.
///
/// Implementors provide tagged point-to-point delivery, every collective is
/// built on top of it. Collectives block until this process's part is done and
/// must be issued by all processes in the same order.
pub trait Communicator {
    /// Rank of this process, in `0..size()`.
    fn rank(&self) -> usize;

    /// Number of processes in the group.
    fn size(&self) -> usize;

    /// Start a new collective.
    fn open(&self, op: Op) -> Tag;

    /// Deliver an envelope to `dest` without blocking.
    fn post(&self, dest: usize, envelope: Envelope) -> Result<()>;

    /// Wait for the next envelope from `src`.
    fn fetch(&self, src: usize) -> Result<Envelope>;

    #[inline]
    fn is_root(&self) -> bool {
        self.rank() == ROOT
    }

    fn send<T: Send + 'static>(&self, dest: usize, tag: Tag, data: Vec<T>) -> Result<()> {
        self.post(
            dest,
            Envelope {
                tag,
                payload: Box::new(data),
            },
        )
    }

    fn recv<T: Send + 'static>(&self, src: usize, tag: Tag) -> Result<Vec<T>> {
        let envelope = self.fetch(src)?;
        if envelope.tag != tag {
            return Err(Error::mismatch(
                self.rank(),
                tag.op,
                format!(
                    "expected call #{} from process {}, got {:?} call #{}",
                    tag.seq, src, envelope.tag.op, envelope.tag.seq
                ),
            ));
        }
        match envelope.payload.downcast::<Vec<T>>() {
            Ok(data) => Ok(*data),
            Err(_) => Err(Error::mismatch(
                self.rank(),
                tag.op,
                format!("unexpected payload type from process {}", src),
            )),
        }
    }

    /// Receive exactly `len` elements.
    fn recv_exact<T: Send + 'static>(&self, src: usize, tag: Tag, len: usize) -> Result<Vec<T>> {
        let data = self.recv(src, tag)?;
        expect_len(self.rank(), tag, src, len, data.len())?;
        Ok(data)
    }

    /// Copy `len` elements from `root` to every process.
    fn broadcast<T>(&self, root: usize, data: Option<Vec<T>>, len: usize) -> Result<Vec<T>>
    where
        T: Clone + Send + 'static,
    {
        let tag = self.open(Op::Broadcast);
        if self.rank() != root {
            return self.recv_exact(root, tag, len);
        }

        let data = data.ok_or_else(|| Error::mismatch(self.rank(), tag.op, "root has nothing to send"))?;
        expect_len(self.rank(), tag, root, len, data.len())?;
        for dest in (0..self.size()).filter(|&dest| dest != root) {
            self.send(dest, tag, data.clone())?;
        }
        Ok(data)
    }

    /// Split the data of `root` into blocks of `counts[i]` elements for process `i`.
    fn scatterv<T>(&self, root: usize, data: Option<Vec<T>>, counts: &[usize]) -> Result<Vec<T>>
    where
        T: Send + 'static,
    {
        let tag = self.open(Op::Scatter);
        expect_counts(self, tag, counts)?;
        if self.rank() != root {
            return self.recv_exact(root, tag, counts[self.rank()]);
        }

        let mut data = data.ok_or_else(|| Error::mismatch(self.rank(), tag.op, "root has nothing to send"))?;
        expect_len(self.rank(), tag, root, counts.iter().sum(), data.len())?;
        let mut own = Vec::new();
        for dest in (0..self.size()).rev() {
            let block = data.split_off(data.len() - counts[dest]);
            if dest == root {
                own = block;
            } else {
                self.send(dest, tag, block)?;
            }
        }
        Ok(own)
    }

    /// Concatenate blocks of `counts[i]` elements from every process `i` on `root`.
    fn gatherv<T>(&self, root: usize, data: Vec<T>, counts: &[usize]) -> Result<Option<Vec<T>>>
    where
        T: Send + 'static,
    {
        let tag = self.open(Op::Gather);
        expect_counts(self, tag, counts)?;
        expect_len(self.rank(), tag, self.rank(), counts[self.rank()], data.len())?;
        if self.rank() != root {
            self.send(root, tag, data)?;
            return Ok(None);
        }

        let mut own = data;
        let mut all = Vec::with_capacity(counts.iter().sum());
        for src in 0..self.size() {
            if src == root {
                all.append(&mut own);
            } else {
                all.append(&mut self.recv_exact(src, tag, counts[src])?);
            }
        }
        Ok(Some(all))
    }

    /// Collect blocks of any size on `root`, one per process.
    fn gather<T>(&self, root: usize, data: Vec<T>) -> Result<Option<Vec<Vec<T>>>>
    where
        T: Send + 'static,
    {
        let tag = self.open(Op::Gather);
        if self.rank() != root {
            self.send(root, tag, data)?;
            return Ok(None);
        }

        let mut own = Some(data);
        let mut blocks = Vec::with_capacity(self.size());
        for src in 0..self.size() {
            if src == root {
                blocks.push(own.take().unwrap_or_default());
            } else {
                blocks.push(self.recv(src, tag)?);
            }
        }
        Ok(Some(blocks))
    }

    /// Collect blocks of any size on every process, one per process.
    fn allgather<T>(&self, data: Vec<T>) -> Result<Vec<Vec<T>>>
    where
        T: Clone + Send + 'static,
    {
        let tag = self.open(Op::AllGather);
        exchange_all(self, tag, data)
    }

    /// Send `buckets[i]` to process `i`, returns the buckets received from each process.
    fn alltoallv<T>(&self, buckets: Vec<Vec<T>>) -> Result<Vec<Vec<T>>>
    where
        T: Send + 'static,
    {
        let tag = self.open(Op::AllToAll);
        expect_len(self.rank(), tag, self.rank(), self.size(), buckets.len())?;

        let mut own = Vec::new();
        for (dest, bucket) in buckets.into_iter().enumerate() {
            if dest == self.rank() {
                own = bucket;
            } else {
                self.send(dest, tag, bucket)?;
            }
        }

        let mut own = Some(own);
        let mut received = Vec::with_capacity(self.size());
        for src in 0..self.size() {
            if src == self.rank() {
                received.push(own.take().unwrap_or_default());
            } else {
                received.push(self.recv(src, tag)?);
            }
        }
        Ok(received)
    }

    /// Exclusive prefix sum over process ranks, process 0 gets 0.
    fn exscan_sum(&self, value: u64) -> Result<u64> {
        let tag = self.open(Op::Scan);
        let prefix = if self.rank() == 0 {
            0
        } else {
            self.recv_exact::<u64>(self.rank() - 1, tag, 1)?[0]
        };
        if self.rank() + 1 < self.size() {
            self.send(self.rank() + 1, tag, vec![prefix + value])?;
        }
        Ok(prefix)
    }

    /// Sum of `value` over all processes, known to all processes.
    fn allreduce_sum(&self, value: u64) -> Result<u64> {
        let tag = self.open(Op::Reduce);
        let all = exchange_all(self, tag, vec![value])?;
        Ok(all.iter().flatten().sum())
    }

    /// Maximum of `value` over all processes, known to all processes.
    fn allreduce_max(&self, value: u64) -> Result<u64> {
        let tag = self.open(Op::Reduce);
        let all = exchange_all(self, tag, vec![value])?;
        Ok(all.iter().flatten().copied().max().unwrap_or(value))
    }
}

/// Send `data` to every other process, then receive one block from each.
fn exchange_all<C, T>(comm: &C, tag: Tag, data: Vec<T>) -> Result<Vec<Vec<T>>>
where
    C: Communicator + ?Sized,
    T: Clone + Send + 'static,
{
    for dest in (0..comm.size()).filter(|&dest| dest != comm.rank()) {
        comm.send(dest, tag, data.clone())?;
    }

    let mut own = Some(data);
    let mut blocks = Vec::with_capacity(comm.size());
    for src in 0..comm.size() {
        if src == comm.rank() {
            blocks.push(own.take().unwrap_or_default());
        } else {
            blocks.push(comm.recv(src, tag)?);
        }
    }
    Ok(blocks)
}

#[inline]
fn expect_len(rank: usize, tag: Tag, peer: usize, expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(Error::mismatch(
            rank,
            tag.op,
            format!(
                "call #{} expected {} elements for process {}, got {}",
                tag.seq, expected, peer, got
            ),
        ));
    }
    Ok(())
}

#[inline]
fn expect_counts<C: Communicator + ?Sized>(comm: &C, tag: Tag, counts: &[usize]) -> Result<()> {
    if counts.len() != comm.size() {
        return Err(Error::mismatch(
            comm.rank(),
            tag.op,
            format!("{} counts for {} processes", counts.len(), comm.size()),
        ));
    }
    Ok(())
}
