// Thread-backed communicator: every rank is a thread of the current process.

use super::{Comm, Element, check_layout};
use crate::error::MvError;
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Instant;
use tracing::{debug, error};

enum Payload {
    Data(Box<dyn Any + Send>),
    Sync,
    Abort(i32),
}

struct Envelope {
    source: usize,
    seq: u64,
    payload: Payload,
}

/// Communicator handle owned by one rank of a [`ThreadUniverse`].
///
/// Every rank owns one mailbox; messages are tagged with the sender's rank and
/// the sequence number of the collective they belong to, so a root collecting
/// from several peers can accept them in any arrival order.
pub struct ThreadComm {
    rank: usize,
    size: usize,
    peers: Vec<Sender<Envelope>>,
    inbox: Receiver<Envelope>,
    // envelopes that arrived ahead of the collective currently being served
    stash: RefCell<Vec<Envelope>>,
    seq: Cell<u64>,
    // rank that aborted the run, `NO_ABORT` while healthy; shared by all ranks
    abort_origin: Arc<AtomicUsize>,
    epoch: Instant,
}

const NO_ABORT: usize = usize::MAX;

/// Launcher for a fixed set of thread ranks.
pub struct ThreadUniverse;

impl ThreadUniverse {
    /// Build `size` connected communicators, one per rank.
    pub fn communicators(size: usize) -> Vec<ThreadComm> {
        let epoch = Instant::now();
        let abort_origin = Arc::new(AtomicUsize::new(NO_ABORT));
        let (senders, receivers): (Vec<_>, Vec<_>) = (0..size).map(|_| mpsc::channel()).unzip();
        receivers
            .into_iter()
            .enumerate()
            .map(|(rank, inbox)| ThreadComm {
                rank,
                size,
                peers: senders.clone(),
                inbox,
                stash: RefCell::new(Vec::new()),
                seq: Cell::new(0),
                abort_origin: Arc::clone(&abort_origin),
                epoch,
            })
            .collect()
    }

    /// Run `f` on `size` ranks and wait for all of them.
    ///
    /// A rank whose closure returns an error or panics aborts the run, so its
    /// peers return instead of waiting on it, and a rank that finished its part
    /// of an aborted run reports [`MvError::Aborted`] too. Results are returned in
    /// rank order.
    pub fn launch<F, R>(size: usize, f: F) -> Vec<Result<R, MvError>>
    where
        F: Fn(&ThreadComm) -> Result<R, MvError> + Sync,
        R: Send,
    {
        let comms = Self::communicators(size);
        let abort_origin = comms.first().map(|c| Arc::clone(&c.abort_origin));
        let f = &f;
        let results: Vec<Result<R, MvError>> = std::thread::scope(|scope| {
            let handles: Vec<_> = comms
                .into_iter()
                .map(|comm| {
                    scope.spawn(move || {
                        let out = f(&comm);
                        if let Err(err) = &out {
                            if !matches!(err, MvError::Aborted { .. }) {
                                error!(rank = comm.rank, %err, "rank failed, aborting run");
                                comm.abort(1);
                            }
                        }
                        out
                    })
                })
                .collect();
            handles
                .into_iter()
                .enumerate()
                .map(|(rank, h)| {
                    h.join().unwrap_or_else(|_| {
                        Err(MvError::Collective {
                            rank,
                            op: "launch",
                            reason: "rank panicked".to_string(),
                        })
                    })
                })
                .collect()
        });
        // all ranks complete or none do
        match abort_origin.map(|a| a.load(Ordering::Acquire)) {
            Some(origin) if origin != NO_ABORT => results
                .into_iter()
                .map(|r| r.and(Err(MvError::Aborted { origin })))
                .collect(),
            _ => results,
        }
    }
}

impl ThreadComm {
    fn next_seq(&self) -> u64 {
        let s = self.seq.get();
        self.seq.set(s + 1);
        s
    }

    fn aborted(&self) -> Option<usize> {
        match self.abort_origin.load(Ordering::Acquire) {
            NO_ABORT => None,
            origin => Some(origin),
        }
    }

    fn send(
        &self,
        dest: usize,
        seq: u64,
        payload: Payload,
        op: &'static str,
    ) -> Result<(), MvError> {
        self.peers[dest]
            .send(Envelope { source: self.rank, seq, payload })
            .map_err(|_| match self.aborted() {
                // the peer left because the run was aborted
                Some(origin) => MvError::Aborted { origin },
                None => MvError::Collective {
                    rank: self.rank,
                    op,
                    reason: format!("rank {dest} is no longer reachable"),
                },
            })
    }

    fn send_data<T: Element>(
        &self,
        dest: usize,
        seq: u64,
        data: Vec<T>,
        op: &'static str,
    ) -> Result<(), MvError> {
        self.send(dest, seq, Payload::Data(Box::new(data)), op)
    }

    /// Block until the envelope of collective `seq` from `source` arrives.
    fn recv(&self, source: usize, seq: u64, op: &'static str) -> Result<Payload, MvError> {
        if let Some(origin) = self.aborted() {
            return Err(MvError::Aborted { origin });
        }
        {
            let mut stash = self.stash.borrow_mut();
            if let Some(i) = stash.iter().position(|e| e.source == source && e.seq == seq) {
                return Ok(stash.swap_remove(i).payload);
            }
        }
        loop {
            let env = self.inbox.recv().map_err(|_| MvError::Collective {
                rank: self.rank,
                op,
                reason: "all peers disconnected".to_string(),
            })?;
            match env.payload {
                Payload::Abort(code) => {
                    debug!(rank = self.rank, origin = env.source, code, "received abort");
                    let origin = self.aborted().unwrap_or(env.source);
                    return Err(MvError::Aborted { origin });
                }
                _ if env.source == source && env.seq == seq => return Ok(env.payload),
                _ if env.seq < self.seq.get().saturating_sub(1) => {
                    return Err(MvError::Collective {
                        rank: self.rank,
                        op,
                        reason: format!(
                            "stale message from rank {} (collective {})",
                            env.source, env.seq
                        ),
                    });
                }
                _ => self.stash.borrow_mut().push(env),
            }
        }
    }

    fn recv_data<T: Element>(
        &self,
        source: usize,
        seq: u64,
        expected: usize,
        op: &'static str,
    ) -> Result<Vec<T>, MvError> {
        let data = match self.recv(source, seq, op)? {
            Payload::Data(boxed) => boxed.downcast::<Vec<T>>().map_err(|_| MvError::Collective {
                rank: self.rank,
                op,
                reason: format!("element type mismatch in message from rank {source}"),
            })?,
            _ => {
                return Err(MvError::Collective {
                    rank: self.rank,
                    op,
                    reason: format!("unexpected control message from rank {source}"),
                });
            }
        };
        if data.len() != expected {
            return Err(MvError::ShapeMismatch { expected, found: data.len() });
        }
        Ok(*data)
    }

    fn check_root(&self, root: usize) -> Result<(), MvError> {
        if root >= self.size {
            return Err(MvError::InvalidArgument(format!(
                "root rank {root} outside communicator of size {}",
                self.size
            )));
        }
        Ok(())
    }
}

impl Comm for ThreadComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn barrier(&self) -> Result<(), MvError> {
        let seq = self.next_seq();
        if self.rank == 0 {
            for r in 1..self.size {
                self.recv(r, seq, "barrier")?;
            }
            for r in 1..self.size {
                self.send(r, seq, Payload::Sync, "barrier")?;
            }
        } else {
            self.send(0, seq, Payload::Sync, "barrier")?;
            self.recv(0, seq, "barrier")?;
        }
        Ok(())
    }

    fn broadcast<T: Element>(&self, buf: &mut [T], root: usize) -> Result<(), MvError> {
        self.check_root(root)?;
        let seq = self.next_seq();
        if self.rank == root {
            for r in (0..self.size).filter(|&r| r != root) {
                self.send_data(r, seq, buf.to_vec(), "broadcast")?;
            }
        } else {
            let data: Vec<T> = self.recv_data(root, seq, buf.len(), "broadcast")?;
            buf.copy_from_slice(&data);
        }
        Ok(())
    }

    fn scatterv<T: Element>(
        &self,
        global: Option<&[T]>,
        counts: &[usize],
        displs: &[usize],
        local: &mut [T],
        root: usize,
    ) -> Result<(), MvError> {
        self.check_root(root)?;
        let seq = self.next_seq();
        if self.rank == root {
            let global = global.ok_or_else(|| {
                MvError::InvalidArgument("scatter root must provide the global buffer".to_string())
            })?;
            check_layout(self.size, counts, displs, global.len())?;
            for r in 0..self.size {
                let block = &global[displs[r]..displs[r] + counts[r]];
                if r == root {
                    if local.len() != block.len() {
                        return Err(MvError::ShapeMismatch {
                            expected: block.len(),
                            found: local.len(),
                        });
                    }
                    local.copy_from_slice(block);
                } else {
                    self.send_data(r, seq, block.to_vec(), "scatter")?;
                }
            }
        } else {
            let data: Vec<T> = self.recv_data(root, seq, local.len(), "scatter")?;
            local.copy_from_slice(&data);
        }
        Ok(())
    }

    fn gatherv<T: Element>(
        &self,
        local: &[T],
        global: Option<&mut [T]>,
        counts: &[usize],
        displs: &[usize],
        root: usize,
    ) -> Result<(), MvError> {
        self.check_root(root)?;
        let seq = self.next_seq();
        if self.rank == root {
            let global = global.ok_or_else(|| {
                MvError::InvalidArgument("gather root must provide the global buffer".to_string())
            })?;
            check_layout(self.size, counts, displs, global.len())?;
            for r in 0..self.size {
                let dst = &mut global[displs[r]..displs[r] + counts[r]];
                if r == root {
                    if local.len() != dst.len() {
                        return Err(MvError::ShapeMismatch {
                            expected: dst.len(),
                            found: local.len(),
                        });
                    }
                    dst.copy_from_slice(local);
                } else {
                    let data: Vec<T> = self.recv_data(r, seq, counts[r], "gather")?;
                    dst.copy_from_slice(&data);
                }
            }
        } else {
            self.send_data(root, seq, local.to_vec(), "gather")?;
        }
        Ok(())
    }

    fn abort(&self, code: i32) {
        if self
            .abort_origin
            .compare_exchange(NO_ABORT, self.rank, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        for r in (0..self.size).filter(|&r| r != self.rank) {
            // a peer that already exited cannot be waiting on us
            let _ = self.peers[r].send(Envelope {
                source: self.rank,
                seq: u64::MAX,
                payload: Payload::Abort(code),
            });
        }
    }

    fn wtime(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }
}

impl Drop for ThreadComm {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.abort(101);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_reaches_every_rank() {
        let results = ThreadUniverse::launch(4, |comm| {
            let mut buf = if comm.rank() == 0 { vec![1.0, 2.0, 3.0] } else { vec![0.0; 3] };
            comm.broadcast(&mut buf[..], 0)?;
            Ok(buf)
        });
        for r in results {
            assert_eq!(r.unwrap(), vec![1.0, 2.0, 3.0]);
        }
    }

    #[test]
    fn scatter_then_gather_with_uneven_counts() {
        let counts = [3, 2, 0];
        let displs = [0, 3, 5];
        let results = ThreadUniverse::launch(3, |comm| {
            let global: Vec<u64> = (0..5).collect();
            let mut local = vec![0u64; counts[comm.rank()]];
            let src = comm.is_coordinator().then_some(global.as_slice());
            comm.scatterv(src, &counts, &displs, &mut local[..], 0)?;
            let doubled: Vec<u64> = local.iter().map(|v| v * 2).collect();
            let mut out = vec![0u64; if comm.is_coordinator() { 5 } else { 0 }];
            let dst = comm.is_coordinator().then_some(out.as_mut_slice());
            comm.gatherv(&doubled[..], dst, &counts, &displs, 0)?;
            Ok((local, out))
        });
        let results: Vec<_> = results.into_iter().map(Result::unwrap).collect();
        assert_eq!(results[0].0, vec![0, 1, 2]);
        assert_eq!(results[1].0, vec![3, 4]);
        assert!(results[2].0.is_empty());
        assert_eq!(results[0].1, vec![0, 2, 4, 6, 8]);
    }

    #[test]
    fn barrier_completes_repeatedly() {
        let results = ThreadUniverse::launch(3, |comm| {
            for _ in 0..5 {
                comm.barrier()?;
            }
            Ok(comm.rank())
        });
        assert_eq!(results.into_iter().map(Result::unwrap).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn failing_rank_aborts_peers() {
        let results = ThreadUniverse::launch(3, |comm| {
            if comm.rank() == 2 {
                return Err(MvError::Allocation { what: "row block", elements: 1 });
            }
            let mut buf = [0.0f64; 2];
            comm.broadcast(&mut buf[..], 0)?;
            comm.barrier()?;
            Ok(())
        });
        assert!(matches!(results[2], Err(MvError::Allocation { .. })));
        // rank 1 waits on the barrier that rank 2 never enters
        assert_eq!(results[1], Err(MvError::Aborted { origin: 2 }));
        assert_eq!(results[0], Err(MvError::Aborted { origin: 2 }));
    }

    #[test]
    fn panicking_rank_aborts_peers() {
        let results = ThreadUniverse::launch(2, |comm| {
            if comm.rank() == 1 {
                panic!("boom");
            }
            comm.barrier()?;
            Ok(())
        });
        assert_eq!(results[0], Err(MvError::Aborted { origin: 1 }));
        assert!(matches!(results[1], Err(MvError::Collective { op: "launch", .. })));
    }

    #[test]
    fn broadcast_length_mismatch_is_reported() {
        let results = ThreadUniverse::launch(2, |comm| {
            let mut buf = vec![0.0f64; 2 + comm.rank()];
            comm.broadcast(&mut buf[..], 0)
        });
        assert_eq!(results[1], Err(MvError::ShapeMismatch { expected: 3, found: 2 }));
        // the root finished its sends, but the run as a whole was aborted
        assert_eq!(results[0], Err(MvError::Aborted { origin: 1 }));
    }
}
