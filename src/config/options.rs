//! Command-line or API options for a distributed product run.
//!
//! This module provides the `RunConfig` struct, which specifies the problem
//! dimension, how the coordinator fills the inputs, the verification tolerance
//! and the minimum number of ranks the run accepts. Every rank builds the same
//! configuration from the same arguments and validates it before entering any
//! collective, so a bad configuration stops all ranks consistently.

use crate::error::MvError;
use crate::matrix::FillPattern;
use crate::utils::verify::Tolerance;

/// Run parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig {
    /// Matrix dimension N (the matrix is N × N)
    pub n: usize,

    /// Matrix and vector fill used on the coordinator
    pub fill: FillPattern,

    /// Pass criterion for the verification
    pub tolerance: Tolerance,

    /// Fewest ranks the run is allowed to start with
    pub min_ranks: usize,
}

impl RunConfig {
    pub fn new(n: usize) -> Self {
        RunConfig {
            n,
            fill: FillPattern::default(),
            tolerance: Tolerance::default(),
            min_ranks: 1,
        }
    }

    /// Build from a signed dimension as read from the command line.
    pub fn from_dimension(n: i64) -> Result<Self, MvError> {
        match usize::try_from(n) {
            Ok(n) if n > 0 => Ok(Self::new(n)),
            _ => Err(MvError::InvalidArgument(format!(
                "matrix size must be a positive integer (got {n})"
            ))),
        }
    }

    pub fn with_fill(mut self, fill: FillPattern) -> Self {
        self.fill = fill;
        self
    }

    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_min_ranks(mut self, min_ranks: usize) -> Self {
        self.min_ranks = min_ranks;
        self
    }

    /// Check the configuration against the number of ranks of the run.
    pub fn validate(&self, ranks: usize) -> Result<(), MvError> {
        if self.n == 0 {
            return Err(MvError::InvalidDimension(self.n));
        }
        let required = self.min_ranks.max(1);
        if ranks < required {
            return Err(MvError::InsufficientRanks { ranks, required });
        }
        let t = self.tolerance.value();
        if !(t.is_finite() && t >= 0.0) {
            return Err(MvError::InvalidArgument(format!(
                "tolerance must be a non-negative number (got {t})"
            )));
        }
        Ok(())
    }
}
