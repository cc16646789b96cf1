//! Verification and reporting helpers.

pub mod verify;
pub use verify::{Report, Tolerance, max_abs_error, sequential_matvec};
