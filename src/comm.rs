//! Collective operations between cooperating ranks.
//!
//! Every rank calls the same collectives in the same order. Each call blocks
//! until all ranks of the group have contributed, and every rank leaves with
//! the same combined result.

use std::sync::Arc;
use std::thread;

use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::error::{ApspError, Result};

/// Element-wise combinator used by a reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceOp {
    Min,
    Max,
}

impl ReduceOp {
    fn combine(self, acc: &mut [u32], incoming: &[u32]) {
        match self {
            ReduceOp::Min => {
                for (a, &b) in acc.iter_mut().zip(incoming) {
                    *a = (*a).min(b);
                }
            }
            ReduceOp::Max => {
                for (a, &b) in acc.iter_mut().zip(incoming) {
                    *a = (*a).max(b);
                }
            }
        }
    }
}

/// Abstraction over the group of ranks taking part in a run.
///
/// Implementations: `SingleProcess`, `LocalComm` (threads), `MpiComm`
/// (via the mpi crate, behind the `mpi` feature).
pub trait Communicator: Send + Sync {
    /// This rank's index, in `0..size()`.
    fn rank(&self) -> usize;

    /// Number of ranks in the group.
    fn size(&self) -> usize;

    /// Combine `buf` element-wise across all ranks, in place.
    fn all_reduce(&self, buf: &mut [u32], op: ReduceOp) -> Result<()>;

    /// Logical AND of a flag across all ranks.
    fn all_reduce_and(&self, local: bool) -> Result<bool>;

    /// Synchronization barrier.
    fn barrier(&self) -> Result<()>;

    fn all_reduce_min(&self, buf: &mut [u32]) -> Result<()> {
        self.all_reduce(buf, ReduceOp::Min)
    }

    fn all_reduce_max(&self, buf: &mut [u32]) -> Result<()> {
        self.all_reduce(buf, ReduceOp::Max)
    }
}

/// Turn a rank-local outcome into a group decision.
///
/// Every rank learns whether all ranks succeeded. A rank that succeeded
/// locally still fails with `PeerFailed` when any other rank did not, so no
/// rank goes on to wait in a collective the others will never join.
pub fn agree<C, T>(comm: &C, local: Result<T>) -> Result<T>
where
    C: Communicator + ?Sized,
{
    let all_ok = comm.all_reduce_and(local.is_ok())?;
    match local {
        Ok(_) if !all_ok => Err(ApspError::PeerFailed),
        other => other,
    }
}

/// A group of one. Every collective is the identity.
#[derive(Debug, Default, Clone, Copy)]
pub struct SingleProcess;

impl Communicator for SingleProcess {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn all_reduce(&self, _buf: &mut [u32], _op: ReduceOp) -> Result<()> {
        Ok(())
    }

    fn all_reduce_and(&self, local: bool) -> Result<bool> {
        Ok(local)
    }

    fn barrier(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Default)]
struct State {
    acc: Vec<u32>,
    contributed: usize,
    read: usize,
    // ranks parked in the current rendezvous, and how many rendezvous have
    // completed so far
    waiting: usize,
    generation: u64,
    departed: usize,
    panicked: Option<usize>,
}

struct Shared {
    size: usize,
    state: Mutex<State>,
    cond: Condvar,
}

/// Ranks running as threads of one process, sharing memory.
///
/// A collective is two rendezvous: every rank folds its buffer into the
/// shared accumulator, then every rank copies the combined result back out.
/// The last reader clears the accumulator before anyone can start the next
/// collective. A rank that leaves `run_group` early, by returning or by
/// panicking, breaks every rendezvous it will never join.
#[derive(Clone)]
pub struct LocalComm {
    rank: usize,
    shared: Arc<Shared>,
}

/// Marks its rank as gone from the group when the rank body ends.
struct Departure<'a>(&'a LocalComm);

impl Drop for Departure<'_> {
    fn drop(&mut self) {
        let mut state = self.0.shared.state.lock();
        state.departed += 1;
        if thread::panicking() && state.panicked.is_none() {
            state.panicked = Some(self.0.rank);
        }
        self.0.shared.cond.notify_all();
    }
}

impl LocalComm {
    /// Create handles for a group of `size` ranks, in rank order.
    pub fn group(size: usize) -> Result<Vec<LocalComm>> {
        if size == 0 {
            return Err(ApspError::InvalidConfig(
                "a rank group needs at least one member".to_string(),
            ));
        }
        let shared = Arc::new(Shared {
            size,
            state: Mutex::new(State::default()),
            cond: Condvar::new(),
        });
        Ok((0..size)
            .map(|rank| LocalComm {
                rank,
                shared: Arc::clone(&shared),
            })
            .collect())
    }

    /// Run `f` once per rank on its own thread and collect the results in
    /// rank order.
    ///
    /// A panicking rank fails the whole group: the ranks still inside a
    /// collective get `Communication` errors and this returns `Err`.
    pub fn run_group<F, R>(size: usize, f: F) -> Result<Vec<R>>
    where
        F: Fn(LocalComm) -> R + Sync,
        R: Send,
    {
        let comms = LocalComm::group(size)?;
        let f = &f;
        thread::scope(|scope| -> Result<Vec<R>> {
            let handles: Vec<_> = comms
                .into_iter()
                .map(|comm| {
                    let rank = comm.rank;
                    thread::Builder::new()
                        .name(format!("rank-{}", rank))
                        .spawn_scoped(scope, move || {
                            let _departure = Departure(&comm);
                            f(comm.clone())
                        })
                        .map_err(|e| {
                            ApspError::Communication(format!("failed to spawn rank {}: {}", rank, e))
                        })
                })
                .collect::<Result<_>>()?;

            // join every rank before reporting so no panic goes unobserved
            let joined: Vec<Result<R>> = handles
                .into_iter()
                .enumerate()
                .map(|(rank, handle)| {
                    handle
                        .join()
                        .map_err(|_| ApspError::Communication(format!("rank {} panicked", rank)))
                })
                .collect();
            joined.into_iter().collect()
        })
    }

    fn broken(&self, state: &State) -> ApspError {
        match state.panicked {
            Some(rank) => ApspError::Communication(format!(
                "rank {} gave up on a collective: rank {} panicked",
                self.rank, rank
            )),
            None => ApspError::Communication(format!(
                "rank {} gave up on a collective: {} rank(s) left the group",
                self.rank, state.departed
            )),
        }
    }

    /// Block until every rank has reached the same rendezvous.
    fn rendezvous(&self, state: &mut MutexGuard<'_, State>) -> Result<()> {
        if state.departed > 0 {
            return Err(self.broken(state));
        }
        let generation = state.generation;
        state.waiting += 1;
        if state.waiting == self.shared.size {
            state.waiting = 0;
            state.generation += 1;
            self.shared.cond.notify_all();
            return Ok(());
        }
        while state.generation == generation && state.departed == 0 {
            self.shared.cond.wait(state);
        }
        if state.generation == generation {
            return Err(self.broken(state));
        }
        Ok(())
    }
}

impl Communicator for LocalComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.shared.size
    }

    fn all_reduce(&self, buf: &mut [u32], op: ReduceOp) -> Result<()> {
        let len = buf.len();
        let mut state = self.shared.state.lock();
        if state.contributed == 0 {
            state.acc = buf.to_vec();
        } else if state.acc.len() == len {
            op.combine(&mut state.acc, buf);
        } else {
            // every rank sees the mismatch
            state.acc.clear();
        }
        state.contributed += 1;
        self.rendezvous(&mut state)?;

        let agreed = state.acc.len();
        if agreed == len {
            buf.copy_from_slice(&state.acc);
        }
        state.read += 1;
        if state.read == self.shared.size {
            state.acc = Vec::new();
            state.contributed = 0;
            state.read = 0;
        }
        self.rendezvous(&mut state)?;

        if agreed != len {
            return Err(ApspError::Communication(format!(
                "rank {} reduced {} values but the group agreed on {}",
                self.rank, len, agreed
            )));
        }
        Ok(())
    }

    fn all_reduce_and(&self, local: bool) -> Result<bool> {
        let mut flag = [u32::from(local)];
        self.all_reduce(&mut flag, ReduceOp::Min)?;
        Ok(flag[0] == 1)
    }

    fn barrier(&self) -> Result<()> {
        let mut state = self.shared.state.lock();
        self.rendezvous(&mut state)
    }
}
