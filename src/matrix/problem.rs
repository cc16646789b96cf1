//! Inputs of one run, owned by the coordinator.

use super::dense::DenseMatrix;
use super::fill::FillPattern;
use crate::error::MvError;

/// The matrix `A` and vector `x` of the product `A · x`.
///
/// Built once on the coordinator and only ever read afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct Problem {
    matrix: DenseMatrix,
    vector: Vec<f64>,
}

impl Problem {
    pub fn new(matrix: DenseMatrix, vector: Vec<f64>) -> Result<Self, MvError> {
        if vector.len() != matrix.dim() {
            return Err(MvError::ShapeMismatch {
                expected: matrix.dim(),
                found: vector.len(),
            });
        }
        Ok(Problem { matrix, vector })
    }

    pub fn generate(n: usize, fill: FillPattern) -> Result<Self, MvError> {
        let (matrix, vector) = fill.generate(n)?;
        Self::new(matrix, vector)
    }

    pub fn dim(&self) -> usize {
        self.matrix.dim()
    }

    pub fn matrix(&self) -> &DenseMatrix {
        &self.matrix
    }

    pub fn vector(&self) -> &[f64] {
        &self.vector
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_length_must_match() {
        let m = DenseMatrix::scaled_identity(3, 1.0).unwrap();
        assert_eq!(
            Problem::new(m, vec![1.0; 2]),
            Err(MvError::ShapeMismatch { expected: 3, found: 2 })
        );
    }
}
