//! Matrix module: the row-major dense matrix, problem inputs and their deterministic fill.

pub mod dense;
pub use dense::DenseMatrix;
pub mod fill;
pub use fill::FillPattern;
pub mod problem;
pub use problem::Problem;
