//! MPI backend for the rank group.
//!
//! Requires the `mpi` feature flag and an MPI installation. The caller must
//! keep the `mpi::environment::Universe` alive for as long as an `MpiComm`
//! is in use:
//!
//! ```ignore
//! let universe = mpi::initialize().expect("MPI init failed");
//! let comm = MpiComm::new();
//! ```

use mpi::collective::SystemOperation;
use mpi::topology::SimpleCommunicator;
use mpi::traits::*;

use crate::comm::{self, ReduceOp};
use crate::error::Result;

/// Ranks running as MPI processes on the world communicator.
///
/// The communicator handle is not `Send`, so it is looked up per call
/// rather than stored.
pub struct MpiComm {
    rank: usize,
    size: usize,
}

impl MpiComm {
    /// Bind to the world communicator of an initialized MPI universe.
    pub fn new() -> Self {
        let world = SimpleCommunicator::world();
        MpiComm {
            rank: world.rank() as usize,
            size: world.size() as usize,
        }
    }
}

impl Default for MpiComm {
    fn default() -> Self {
        Self::new()
    }
}

impl comm::Communicator for MpiComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn all_reduce(&self, buf: &mut [u32], op: ReduceOp) -> Result<()> {
        let world = SimpleCommunicator::world();
        let send = buf.to_vec();
        let op = match op {
            ReduceOp::Min => SystemOperation::min(),
            ReduceOp::Max => SystemOperation::max(),
        };
        world.all_reduce_into(&send[..], buf, op);
        Ok(())
    }

    fn all_reduce_and(&self, local: bool) -> Result<bool> {
        let world = SimpleCommunicator::world();
        let send = u32::from(local);
        let mut global = 0u32;
        world.all_reduce_into(&send, &mut global, SystemOperation::min());
        Ok(global == 1)
    }

    fn barrier(&self) -> Result<()> {
        SimpleCommunicator::world().barrier();
        Ok(())
    }
}
