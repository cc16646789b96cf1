//! Local compute kernel.

pub mod kernel;

pub use kernel::{multiply_block, multiply_rows, sequential_rows};
