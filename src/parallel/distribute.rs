//! Distribution layer: replicate the input vector, scatter the row blocks.

use super::partition::RowAssignment;
use super::{COORDINATOR, Comm};
use crate::error::{MvError, try_zeroed};
use crate::matrix::DenseMatrix;
use tracing::debug;

/// Give every rank its own copy of the coordinator's length-`n` vector.
///
/// `vector` is only read on the coordinator. Returns once this rank holds the
/// complete vector, so the compute phase never observes a partial copy.
pub fn replicate<C: Comm>(comm: &C, vector: Option<&[f64]>, n: usize) -> Result<Vec<f64>, MvError> {
    let mut buf = if comm.is_coordinator() {
        let v = vector.ok_or_else(|| {
            MvError::InvalidArgument("coordinator must provide the vector to replicate".to_string())
        })?;
        if v.len() != n {
            return Err(MvError::ShapeMismatch { expected: n, found: v.len() });
        }
        let mut buf: Vec<f64> = try_zeroed("vector", n)?;
        buf.copy_from_slice(v);
        buf
    } else {
        try_zeroed("vector", n)?
    };
    comm.broadcast(buf.as_mut_slice(), COORDINATOR)?;
    debug!(rank = comm.rank(), len = n, "vector replicated");
    Ok(buf)
}

/// Send each rank the rows the assignment gives it.
///
/// Rank `r` receives exactly `count(r) * n` elements, the rows
/// `offset(r) .. offset(r) + count(r)` in row-major order. `matrix` is only
/// read on the coordinator. A rank with no rows receives an empty block.
pub fn scatter_rows<C: Comm>(
    comm: &C,
    matrix: Option<&DenseMatrix>,
    assignment: &RowAssignment,
    n: usize,
) -> Result<Vec<f64>, MvError> {
    if assignment.len() != comm.size() {
        return Err(MvError::InvalidArgument(format!(
            "assignment covers {} ranks, communicator has {}",
            assignment.len(),
            comm.size()
        )));
    }
    let global = if comm.is_coordinator() {
        let m = matrix.ok_or_else(|| {
            MvError::InvalidArgument("coordinator must provide the matrix to scatter".to_string())
        })?;
        if m.dim() != n {
            return Err(MvError::ShapeMismatch { expected: n, found: m.dim() });
        }
        Some(m.as_slice())
    } else {
        None
    };
    let (counts, displs) = assignment.element_layout(n);
    let mut local: Vec<f64> = try_zeroed("row block", counts[comm.rank()])?;
    comm.scatterv(global, &counts, &displs, local.as_mut_slice(), COORDINATOR)?;
    debug!(
        rank = comm.rank(),
        rows = assignment.count(comm.rank()),
        first_row = assignment.offset(comm.rank()),
        "row block received"
    );
    Ok(local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::ThreadUniverse;

    #[test]
    fn every_rank_gets_its_rows() {
        let n = 5;
        let a = DenseMatrix::from_fn(n, |i, j| (i * n + j) as f64).unwrap();
        let assignment = RowAssignment::plan(n, 3).unwrap();
        let results = ThreadUniverse::launch(3, |comm| {
            let m = comm.is_coordinator().then_some(&a);
            scatter_rows(comm, m, &assignment, n)
        });
        for (r, block) in results.into_iter().enumerate() {
            assert_eq!(block.unwrap(), a.rows(assignment.range(r)).to_vec());
        }
    }

    #[test]
    fn vector_is_identical_everywhere() {
        let x = vec![0.5, -1.0, 3.25];
        let results = ThreadUniverse::launch(4, |comm| {
            let v = comm.is_coordinator().then_some(x.as_slice());
            replicate(comm, v, 3)
        });
        for r in results {
            assert_eq!(r.unwrap(), x);
        }
    }

    #[test]
    fn assignment_must_match_communicator() {
        let a = DenseMatrix::scaled_identity(4, 1.0).unwrap();
        let assignment = RowAssignment::plan(4, 2).unwrap();
        let results =
            ThreadUniverse::launch(1, |comm| scatter_rows(comm, Some(&a), &assignment, 4));
        assert!(matches!(results[0], Err(MvError::InvalidArgument(_))));
    }
}
