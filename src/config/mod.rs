//! Run configuration.

pub mod options;
pub use options::RunConfig;
