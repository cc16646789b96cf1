//! Square dense matrix in row-major storage.
//!
//! Rows are contiguous, so the block of rows `[r0, r1)` is the single slice
//! `data[r0 * n .. r1 * n]`; this is what the scatter ships to a rank. The matrix
//! is immutable once built.

use crate::error::{MvError, try_zeroed};
use faer::Mat;
use std::ops::Range;

#[derive(Clone, Debug, PartialEq)]
pub struct DenseMatrix {
    n: usize,
    data: Vec<f64>,
}

impl DenseMatrix {
    /// Construct from raw row-major storage of length `n * n`.
    pub fn from_row_major(n: usize, data: Vec<f64>) -> Result<Self, MvError> {
        if n == 0 {
            return Err(MvError::InvalidDimension(n));
        }
        let expected = n.checked_mul(n).ok_or(MvError::InvalidDimension(n))?;
        if data.len() != expected {
            return Err(MvError::ShapeMismatch { expected, found: data.len() });
        }
        Ok(DenseMatrix { n, data })
    }

    /// Build an `n × n` matrix from `f(i, j)`.
    pub fn from_fn(n: usize, mut f: impl FnMut(usize, usize) -> f64) -> Result<Self, MvError> {
        if n == 0 {
            return Err(MvError::InvalidDimension(n));
        }
        let len = n.checked_mul(n).ok_or(MvError::InvalidDimension(n))?;
        let mut data = try_zeroed("matrix", len)?;
        for (k, v) in data.iter_mut().enumerate() {
            *v = f(k / n, k % n);
        }
        Ok(DenseMatrix { n, data })
    }

    /// `scale · I`.
    pub fn scaled_identity(n: usize, scale: f64) -> Result<Self, MvError> {
        Self::from_fn(n, |i, j| if i == j { scale } else { 0.0 })
    }

    /// Dimension `n` of the square matrix.
    pub fn dim(&self) -> usize {
        self.n
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    /// Contiguous storage of the rows in `rows`.
    pub fn rows(&self, rows: Range<usize>) -> &[f64] {
        &self.data[rows.start * self.n..rows.end * self.n]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Copy into a column-major faer matrix.
    pub fn to_faer(&self) -> Mat<f64> {
        Mat::from_fn(self.n, self.n, |i, j| self.get(i, j))
    }
}
