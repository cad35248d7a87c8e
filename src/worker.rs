use tracing::{debug, info};

use crate::comm::{agree, Communicator};
use crate::error::{ApspError, Result};
use crate::kernel::square;
use crate::matrix::DistanceMatrix;
use crate::partition::{compute_tile, GridShape, Tile};

/// Outcome of a converged run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Convergence {
    /// Squaring rounds executed, including the final one that changed nothing.
    pub rounds: usize,
}

/// One rank's share of the repeated squaring.
pub struct Worker<'c, C: Communicator + ?Sized> {
    rank: usize,
    comm: &'c C,
    tile: Tile,
}

impl<'c, C: Communicator + ?Sized> Worker<'c, C> {
    /// Create the worker for this rank, owning the tile its grid coordinate
    /// maps to in an `n x n` matrix.
    pub fn new(comm: &'c C, grid: GridShape, n: usize) -> Result<Self> {
        grid.check_size(comm.size())?;
        let rank = comm.rank();
        let tile = compute_tile(n, grid, grid.coord_of(rank)?)?;
        Ok(Worker { rank, comm, tile })
    }

    /// Create a worker with an explicit tile.
    pub fn with_tile(comm: &'c C, tile: Tile) -> Self {
        Worker {
            rank: comm.rank(),
            comm,
            tile,
        }
    }

    /// Get the worker's rank
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Turn the adjacency matrix `l` into all-pairs hop counts in place.
    ///
    /// Every rank must call this with a matrix of the same size. On return
    /// every rank holds the same converged matrix, with 0 for both the
    /// diagonal and unreachable pairs.
    pub fn shortest_paths(&self, l: &mut DistanceMatrix) -> Result<Convergence> {
        let n = l.n;
        let ready = if self.tile.row_max <= n && self.tile.col_max <= n {
            l.check_adjacency()
        } else {
            Err(ApspError::InvalidGrid(format!(
                "rank {} tile {:?} does not fit a {}x{} matrix",
                self.rank, self.tile, n, n
            )))
        };
        agree(self.comm, ready)?;

        info!(
            rank = self.rank,
            rows = ?self.tile.rows(),
            cols = ?self.tile.cols(),
            "starting repeated squaring"
        );

        l.infinitize();
        // every rank starts from the same matrix
        self.comm.all_reduce_max(&mut l.data)?;

        let mut next = l.clone();
        let mut rounds = 0;
        loop {
            next.data.copy_from_slice(&l.data);
            let local_done = square(&self.tile, l, &mut next)?;
            rounds += 1;

            let done = self.comm.all_reduce_and(local_done)?;
            self.comm.all_reduce_min(&mut next.data)?;
            std::mem::swap(l, &mut next);

            debug!(rank = self.rank, round = rounds, local_done, done, "round merged");
            if done {
                break;
            }
        }

        l.deinfinitize();
        info!(rank = self.rank, rounds, "converged");
        Ok(Convergence { rounds })
    }
}
