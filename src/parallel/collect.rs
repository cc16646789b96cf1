//! Collection layer: gather the partial results at the coordinator.

use super::partition::RowAssignment;
use super::{COORDINATOR, Comm};
use crate::error::{MvError, try_zeroed};
use tracing::debug;

/// Assemble the global result on the coordinator.
///
/// Rank `r`'s `local` lands at `offset(r) .. offset(r) + count(r)`; the
/// `assignment` must be the same table the rows were scattered with. Placement
/// follows the table, not message arrival. Returns `Some(result)` on the
/// coordinator and `None` on every other rank.
pub fn gather_rows<C: Comm>(
    comm: &C,
    local: &[f64],
    assignment: &RowAssignment,
) -> Result<Option<Vec<f64>>, MvError> {
    if assignment.len() != comm.size() {
        return Err(MvError::InvalidArgument(format!(
            "assignment covers {} ranks, communicator has {}",
            assignment.len(),
            comm.size()
        )));
    }
    let own = assignment.count(comm.rank());
    if local.len() != own {
        return Err(MvError::ShapeMismatch { expected: own, found: local.len() });
    }
    if comm.is_coordinator() {
        let mut global: Vec<f64> = try_zeroed("global result", assignment.total_rows())?;
        comm.gatherv(
            local,
            Some(global.as_mut_slice()),
            assignment.counts(),
            assignment.offsets(),
            COORDINATOR,
        )?;
        debug!(rows = global.len(), "partial results gathered");
        Ok(Some(global))
    } else {
        comm.gatherv(local, None, assignment.counts(), assignment.offsets(), COORDINATOR)?;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::ThreadUniverse;

    #[test]
    fn results_placed_by_rank_offset() {
        let assignment = RowAssignment::plan(7, 3).unwrap();
        let results = ThreadUniverse::launch(3, |comm| {
            let local: Vec<f64> = assignment.range(comm.rank()).map(|i| i as f64 * 10.0).collect();
            gather_rows(comm, &local, &assignment)
        });
        let mut results = results.into_iter().map(Result::unwrap);
        assert_eq!(
            results.next().unwrap(),
            Some(vec![0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0])
        );
        assert!(results.all(|r| r.is_none()));
    }

    #[test]
    fn local_length_is_checked() {
        let assignment = RowAssignment::plan(2, 1).unwrap();
        let results = ThreadUniverse::launch(1, |comm| gather_rows(comm, &[1.0], &assignment));
        assert_eq!(results[0], Err(MvError::ShapeMismatch { expected: 2, found: 1 }));
    }
}
