//! Verification of the distributed product & performance report.
//!
//! The coordinator recomputes `A · x` on its own thread, summing each row in the
//! same order as the ranks do, so the distributed result is expected to match to
//! the last bit. The comparison nevertheless goes through a configurable
//! [`Tolerance`]; a mismatch is reported, never raised as an error. A NaN anywhere
//! in the difference fails the comparison.

use crate::core::kernel::sequential_rows;
use crate::error::{MvError, try_zeroed};
use crate::matrix::Problem;
use std::fmt;

/// Pass criterion for the maximum elementwise difference.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Tolerance {
    /// `max_error <= tol`.
    Absolute(f64),
    /// `max_error <= tol * max(1, max_i |sequential_i|)`.
    Relative(f64),
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance::Absolute(1e-9)
    }
}

impl Tolerance {
    pub fn value(&self) -> f64 {
        match *self {
            Tolerance::Absolute(t) | Tolerance::Relative(t) => t,
        }
    }

    /// Largest admissible error against `reference`.
    pub fn bound(&self, reference: &[f64]) -> f64 {
        match *self {
            Tolerance::Absolute(t) => t,
            Tolerance::Relative(t) => {
                let scale = reference.iter().fold(1.0f64, |m, v| m.max(v.abs()));
                t * scale
            }
        }
    }
}

impl fmt::Display for Tolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tolerance::Absolute(t) => write!(f, "absolute {t:e}"),
            Tolerance::Relative(t) => write!(f, "relative {t:e}"),
        }
    }
}

/// Single-threaded `A · x` over all rows, without partitioning.
pub fn sequential_matvec(problem: &Problem) -> Result<Vec<f64>, MvError> {
    let n = problem.dim();
    let mut y = try_zeroed("sequential result", n)?;
    sequential_rows(problem.matrix().as_slice(), n, problem.vector(), &mut y)?;
    Ok(y)
}

/// `max_i |a_i - b_i|`, NaN if any difference is NaN.
pub fn max_abs_error(a: &[f64], b: &[f64]) -> Result<f64, MvError> {
    if a.len() != b.len() {
        return Err(MvError::ShapeMismatch { expected: b.len(), found: a.len() });
    }
    let mut max = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let d = (x - y).abs();
        if d.is_nan() {
            return Ok(f64::NAN);
        }
        max = max.max(d);
    }
    Ok(max)
}

/// Timings, error and derived metrics of one run.
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    pub ranks: usize,
    pub n: usize,
    pub sequential_time: f64,
    pub parallel_time: f64,
    pub max_error: f64,
    pub speedup: f64,
    pub efficiency: f64,
    pub tolerance: Tolerance,
    pub passed: bool,
}

impl Report {
    /// Compare `distributed` against `sequential` and derive speedup and efficiency.
    ///
    /// A speedup below one is a valid outcome; a zero parallel time gives an
    /// infinite speedup.
    pub fn new(
        ranks: usize,
        sequential_time: f64,
        parallel_time: f64,
        distributed: &[f64],
        sequential: &[f64],
        tolerance: Tolerance,
    ) -> Result<Self, MvError> {
        let max_error = max_abs_error(distributed, sequential)?;
        let speedup = if parallel_time > 0.0 {
            sequential_time / parallel_time
        } else {
            f64::INFINITY
        };
        let efficiency = speedup / ranks.max(1) as f64;
        Ok(Report {
            ranks,
            n: sequential.len(),
            sequential_time,
            parallel_time,
            max_error,
            speedup,
            efficiency,
            tolerance,
            passed: max_error <= tolerance.bound(sequential),
        })
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Sequential time: {:.6} seconds", self.sequential_time)?;
        writeln!(f, "Parallel time: {:.6} seconds ({} ranks)", self.parallel_time, self.ranks)?;
        writeln!(
            f,
            "Maximum difference between parallel and sequential result: {:e}",
            self.max_error
        )?;
        writeln!(f, "Speedup: {:.2}", self.speedup)?;
        writeln!(f, "Efficiency: {:.2}%", self.efficiency * 100.0)?;
        if self.passed {
            write!(f, "✓ Results match ({} tolerance)", self.tolerance)
        } else {
            write!(f, "✗ Results differ ({} tolerance)", self.tolerance)
        }
    }
}
