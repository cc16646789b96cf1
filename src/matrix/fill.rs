//! Deterministic problem fill.

use super::dense::DenseMatrix;
use crate::error::{MvError, try_zeroed};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Default seed of the random fill.
pub const DEFAULT_SEED: u64 = 42;

/// How the coordinator fills the matrix and the input vector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FillPattern {
    /// Uniform `[0, 1)` entries from a seeded generator, with `n` added to every
    /// diagonal entry so the matrix is strictly diagonally dominant. The vector
    /// is drawn from the same stream after the matrix.
    Random { seed: u64 },
    /// `scale · I` and the vector `[1, 2, …, n]`.
    ScaledIdentity(f64),
}

impl Default for FillPattern {
    fn default() -> Self {
        FillPattern::Random { seed: DEFAULT_SEED }
    }
}

impl FillPattern {
    /// Produce the `n × n` matrix and the length-`n` vector.
    pub fn generate(&self, n: usize) -> Result<(DenseMatrix, Vec<f64>), MvError> {
        match *self {
            FillPattern::Random { seed } => {
                let mut rng = StdRng::seed_from_u64(seed);
                let shift = n as f64;
                let matrix = DenseMatrix::from_fn(n, |i, j| {
                    let v: f64 = rng.r#gen();
                    if i == j { v + shift } else { v }
                })?;
                let mut vector: Vec<f64> = try_zeroed("vector", n)?;
                for v in vector.iter_mut() {
                    *v = rng.r#gen();
                }
                Ok((matrix, vector))
            }
            FillPattern::ScaledIdentity(scale) => {
                let matrix = DenseMatrix::scaled_identity(n, scale)?;
                let mut vector: Vec<f64> = try_zeroed("vector", n)?;
                for (i, v) in vector.iter_mut().enumerate() {
                    *v = (i + 1) as f64;
                }
                Ok((matrix, vector))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_fill_is_reproducible() {
        let a = FillPattern::Random { seed: 7 }.generate(6).unwrap();
        let b = FillPattern::Random { seed: 7 }.generate(6).unwrap();
        assert_eq!(a, b);
        let c = FillPattern::Random { seed: 8 }.generate(6).unwrap();
        assert_ne!(a.1, c.1);
    }

    #[test]
    fn random_fill_is_diagonally_dominant() {
        let (m, x) = FillPattern::default().generate(16).unwrap();
        for i in 0..16 {
            let off: f64 = (0..16).filter(|&j| j != i).map(|j| m.get(i, j).abs()).sum();
            assert!(m.get(i, i) > off);
        }
        assert!(x.iter().all(|v| (0.0..1.0).contains(v)));
    }

    #[test]
    fn scaled_identity_fill() {
        let (m, x) = FillPattern::ScaledIdentity(2.0).generate(4).unwrap();
        assert_eq!(m, DenseMatrix::scaled_identity(4, 2.0).unwrap());
        assert_eq!(x, vec![1.0, 2.0, 3.0, 4.0]);
    }
}
