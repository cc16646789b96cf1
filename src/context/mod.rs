//! Context module for scatmv.
//!
//! This module provides the run context, the single SPMD entry point every rank
//! executes. The context owns the configuration of one run; the coordinator
//! additionally owns the full problem for the duration of the run, while the
//! other ranks only ever hold their row block and the replicated vector.
//!
//! Modules:
//! - [`run_context`]: Contains the `RunContext` struct and the distributed product pipeline.
//!
//! # Example
//! ```rust
//! use scatmv::context::RunContext;
//! use scatmv::config::RunConfig;
//! use scatmv::parallel::ThreadUniverse;
//!
//! let ctx = RunContext::new(RunConfig::new(64));
//! let results = ThreadUniverse::launch(4, |comm| ctx.run(comm));
//! let report = results[0].as_ref().unwrap().as_ref().unwrap();
//! assert!(report.passed);
//! ```

pub mod run_context;
pub use run_context::{RunContext, distributed_matvec};
