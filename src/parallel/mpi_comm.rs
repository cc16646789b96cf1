//! MPI-based parallel communication module.
//!
//! This module provides an implementation of the `Comm` trait using the MPI
//! (Message Passing Interface) backend for distributed-memory parallelism. Each
//! rank is a separate process started by the MPI launcher
//! (`mpirun -n P scatmv N`); the number of ranks is therefore fixed by the
//! execution environment. Collective failures inside MPI are fatal to the job
//! (`MPI_ERRORS_ARE_FATAL`), so the collectives below only report argument errors
//! detected before entering MPI.
//!
//! # Usage
//!
//! - `MpiComm::new()` initializes MPI and keeps the universe alive until the
//!   communicator is dropped, which finalizes MPI.
//! - Variable-count collectives map to `MPI_Scatterv` / `MPI_Gatherv`.
//!
//! # References
//! - [MPI Standard](https://www.mpi-forum.org/)
//!
//! # Example
//! ```no_run
//! # #[cfg(feature = "mpi")]
//! # {
//! use scatmv::parallel::{Comm, MpiComm};
//! let comm = MpiComm::new().unwrap();
//! println!("Rank: {} / {}", comm.rank(), comm.size());
//! comm.barrier().unwrap();
//! # }
//! ```

use super::{Comm, Element, check_layout};
use crate::error::MvError;
use mpi::Count;
use mpi::datatype::{Partition, PartitionMut};
use mpi::environment::Universe;
use mpi::topology::SimpleCommunicator;
use mpi::traits::*;

/// MPI communicator wrapper for distributed parallelism.
///
/// Holds the MPI universe, the world communicator, the rank of the current process, and the total
/// number of processes.
pub struct MpiComm {
    /// The MPI world communicator (all processes in the job).
    pub world: SimpleCommunicator,
    /// The rank (ID) of this process within the communicator.
    pub rank: usize,
    /// The total number of processes in the communicator.
    pub size: usize,
    // dropped last: finalizes MPI
    _universe: Universe,
}

impl MpiComm {
    /// Initializes MPI and constructs a new `MpiComm` instance.
    ///
    /// Fails if MPI was already initialized in this process.
    pub fn new() -> Result<Self, MvError> {
        let universe = mpi::initialize().ok_or_else(|| MvError::Collective {
            rank: 0,
            op: "initialize",
            reason: "MPI is already initialized".to_string(),
        })?;
        let world = universe.world();
        let rank = world.rank() as usize;
        let size = world.size() as usize;
        Ok(MpiComm { world, rank, size, _universe: universe })
    }
}

fn to_counts(values: &[usize]) -> Result<Vec<Count>, MvError> {
    values
        .iter()
        .map(|&v| {
            Count::try_from(v).map_err(|_| {
                MvError::InvalidArgument(format!("{v} elements exceed the MPI count range"))
            })
        })
        .collect()
}

impl Comm for MpiComm {
    /// Returns the rank (ID) of this process.
    fn rank(&self) -> usize {
        self.rank
    }
    /// Returns the total number of processes in the communicator.
    fn size(&self) -> usize {
        self.size
    }
    /// Synchronizes all processes at a barrier.
    fn barrier(&self) -> Result<(), MvError> {
        self.world.barrier();
        Ok(())
    }

    /// Broadcasts `buf` from `root` to every process (`MPI_Bcast`).
    fn broadcast<T: Element>(&self, buf: &mut [T], root: usize) -> Result<(), MvError> {
        self.world.process_at_rank(root as i32).broadcast_into(buf);
        Ok(())
    }

    /// Distributes variable-sized chunks of a global array (`MPI_Scatterv`).
    ///
    /// - `global`: The full array to scatter (only used on the root process).
    /// - `counts`/`displs`: Element count and offset for each rank.
    /// - `local`: The buffer receiving this process' chunk.
    fn scatterv<T: Element>(
        &self,
        global: Option<&[T]>,
        counts: &[usize],
        displs: &[usize],
        local: &mut [T],
        root: usize,
    ) -> Result<(), MvError> {
        let root_process = self.world.process_at_rank(root as i32);
        if self.rank == root {
            let global = global.ok_or_else(|| {
                MvError::InvalidArgument("scatter root must provide the global buffer".to_string())
            })?;
            check_layout(self.size, counts, displs, global.len())?;
            let partition = Partition::new(global, to_counts(counts)?, to_counts(displs)?);
            root_process.scatter_varcount_into_root(&partition, local);
        } else {
            root_process.scatter_varcount_into(local);
        }
        Ok(())
    }

    /// Gathers variable-sized chunks onto the root process (`MPI_Gatherv`).
    ///
    /// - `local`: The array sent from each process.
    /// - `global`: The receive buffer (only used on the root process).
    fn gatherv<T: Element>(
        &self,
        local: &[T],
        global: Option<&mut [T]>,
        counts: &[usize],
        displs: &[usize],
        root: usize,
    ) -> Result<(), MvError> {
        let root_process = self.world.process_at_rank(root as i32);
        if self.rank == root {
            let global = global.ok_or_else(|| {
                MvError::InvalidArgument("gather root must provide the global buffer".to_string())
            })?;
            check_layout(self.size, counts, displs, global.len())?;
            let mut partition = PartitionMut::new(global, to_counts(counts)?, to_counts(displs)?);
            root_process.gather_varcount_into_root(local, &mut partition);
        } else {
            root_process.gather_varcount_into(local);
        }
        Ok(())
    }

    /// Terminates every process of the job (`MPI_Abort`).
    fn abort(&self, code: i32) {
        self.world.abort(code)
    }

    fn wtime(&self) -> f64 {
        mpi::time()
    }
}
