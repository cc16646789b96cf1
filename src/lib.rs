//! scatmv: distributed dense matrix–vector multiplication
//!
//! A coordinator rank splits the rows of an N×N matrix into uneven contiguous
//! blocks, scatters them with the replicated input vector to a fixed set of
//! ranks, gathers the partial products and verifies them against a sequential
//! baseline, reporting speedup and efficiency. Ranks are threads of one process
//! or, with the `mpi` feature, MPI processes.

pub mod parallel;

pub mod config;
pub mod context;
pub mod core;
pub mod error;
pub mod matrix;
pub mod utils;

// Re-exports for convenience
pub use config::*;
pub use context::*;
pub use crate::core::*;
pub use error::*;
pub use matrix::*;
pub use utils::*;

pub use parallel::{COORDINATOR, Comm, RowAssignment, ThreadComm, ThreadUniverse};
