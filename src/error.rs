use thiserror::Error;

// Unified error type for scatmv

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MvError {
    #[error("matrix dimension must be a positive integer (got {0})")]
    InvalidDimension(usize),
    #[error("insufficient ranks: {ranks} available, at least {required} required")]
    InsufficientRanks { ranks: usize, required: usize },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("failed to allocate {elements} elements for {what}")]
    Allocation { what: &'static str, elements: usize },
    #[error("{op} failed on rank {rank}: {reason}")]
    Collective {
        rank: usize,
        op: &'static str,
        reason: String,
    },
    #[error("run aborted by rank {origin}")]
    Aborted { origin: usize },
    #[error("shape mismatch: expected {expected} elements, found {found}")]
    ShapeMismatch { expected: usize, found: usize },
}

/// Allocate a zero-filled buffer, reporting failure instead of aborting the process.
pub fn try_zeroed<T: Copy + Default>(
    what: &'static str,
    elements: usize,
) -> Result<Vec<T>, MvError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(elements)
        .map_err(|_| MvError::Allocation { what, elements })?;
    buf.resize(elements, T::default());
    Ok(buf)
}
