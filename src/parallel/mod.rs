//! Collective communication for SPMD runs.
//!
//! Every participating rank runs the same program and owns one communicator.
//! The [`Comm`] trait exposes the collectives the matrix-vector pipeline needs:
//! broadcast, variable-count scatter and gather, and a barrier. Two backends are
//! provided:
//!
//! - [`ThreadComm`]: ranks are threads of one process, connected by channels.
//! - `MpiComm` (feature `mpi`): ranks are MPI processes launched by `mpirun`.
//!
//! Collectives are blocking: a call returns once the caller's part of the
//! transfer is complete. A failure on any rank is fatal to the whole run; see
//! [`Comm::abort`].

use crate::error::MvError;

pub mod partition;
pub use partition::RowAssignment;

pub mod distribute;
pub use distribute::{replicate, scatter_rows};

pub mod collect;
pub use collect::gather_rows;

pub mod thread_comm;
pub use thread_comm::{ThreadComm, ThreadUniverse};

#[cfg(feature = "mpi")]
pub mod mpi_comm;
#[cfg(feature = "mpi")]
pub use mpi_comm::MpiComm;

/// Rank that owns the full problem, verifies and reports.
pub const COORDINATOR: usize = 0;

/// Plain-data element that can travel through a collective.
#[cfg(feature = "mpi")]
pub trait Element: Copy + Default + Send + 'static + mpi::datatype::Equivalence {}
#[cfg(feature = "mpi")]
impl<T: Copy + Default + Send + 'static + mpi::datatype::Equivalence> Element for T {}

/// Plain-data element that can travel through a collective.
#[cfg(not(feature = "mpi"))]
pub trait Element: Copy + Default + Send + 'static {}
#[cfg(not(feature = "mpi"))]
impl<T: Copy + Default + Send + 'static> Element for T {}

pub trait Comm {
    fn rank(&self) -> usize;
    fn size(&self) -> usize;
    fn is_coordinator(&self) -> bool {
        self.rank() == COORDINATOR
    }
    fn barrier(&self) -> Result<(), MvError>;
    /// Copy `buf` from `root` into `buf` on every other rank.
    ///
    /// All ranks must pass a buffer of the same length.
    fn broadcast<T: Element>(&self, buf: &mut [T], root: usize) -> Result<(), MvError>;
    /// Send `global[displs[r]..displs[r] + counts[r]]` from `root` to rank `r`.
    ///
    /// `global` is only read on `root`; `local` must hold exactly `counts[rank]` elements.
    fn scatterv<T: Element>(
        &self,
        global: Option<&[T]>,
        counts: &[usize],
        displs: &[usize],
        local: &mut [T],
        root: usize,
    ) -> Result<(), MvError>;
    /// Place each rank's `local` at `global[displs[r]..]` on `root`.
    ///
    /// `global` is only written on `root`; other ranks pass `None`.
    fn gatherv<T: Element>(
        &self,
        local: &[T],
        global: Option<&mut [T]>,
        counts: &[usize],
        displs: &[usize],
        root: usize,
    ) -> Result<(), MvError>;
    /// Terminate the run on every rank.
    ///
    /// Ranks blocked in (or later entering) a collective stop waiting for this rank.
    fn abort(&self, code: i32);
    /// Wall-clock seconds since an arbitrary, per-run fixed origin.
    fn wtime(&self) -> f64;
}

/// Check a `(counts, displs)` layout against the communicator size and a buffer length.
pub(crate) fn check_layout(
    size: usize,
    counts: &[usize],
    displs: &[usize],
    buf_len: usize,
) -> Result<(), MvError> {
    if counts.len() != size || displs.len() != size {
        return Err(MvError::InvalidArgument(format!(
            "layout describes {} ranks, communicator has {}",
            counts.len().min(displs.len()),
            size
        )));
    }
    for (&c, &d) in counts.iter().zip(displs) {
        if d + c > buf_len {
            return Err(MvError::ShapeMismatch {
                expected: d + c,
                found: buf_len,
            });
        }
    }
    Ok(())
}
