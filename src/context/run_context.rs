//! SPMD run context for the distributed matrix–vector product.
//!
//! Every rank calls [`RunContext::run`] with its communicator. The run proceeds in
//! the same phases on all ranks:
//!
//! 1. validate the configuration and plan the row assignment locally,
//! 2. (coordinator) build the problem and time the sequential baseline,
//! 3. replicate the vector and scatter the row blocks,
//! 4. multiply the local block,
//! 5. gather the partial results at the coordinator,
//! 6. (coordinator) verify against the baseline and build the report.
//!
//! The assignment planned in step 1 is the single table used by both the scatter
//! and the gather.

use crate::config::RunConfig;
use crate::core::kernel::multiply_block;
use crate::error::MvError;
use crate::matrix::Problem;
use crate::parallel::{Comm, RowAssignment, gather_rows, replicate, scatter_rows};
use crate::utils::verify::{Report, sequential_matvec};
use tracing::{debug, info, warn};

/// Distribute `A · x`, multiply on every rank and gather the result.
///
/// `problem` is only read on the coordinator, which receives `Some(result)` in
/// rank-assignment order; other ranks receive `None`.
pub fn distributed_matvec<C: Comm>(
    comm: &C,
    problem: Option<&Problem>,
    assignment: &RowAssignment,
    n: usize,
) -> Result<Option<Vec<f64>>, MvError> {
    let x = replicate(comm, problem.map(Problem::vector), n)?;
    let block = scatter_rows(comm, problem.map(Problem::matrix), assignment, n)?;
    let local = multiply_block(&block, n, &x)?;
    debug!(rank = comm.rank(), rows = local.len(), "local product computed");
    gather_rows(comm, &local, assignment)
}

/// Context and configuration of one run.
pub struct RunContext {
    config: RunConfig,
}

impl RunContext {
    pub fn new(config: RunConfig) -> Self {
        RunContext { config }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run this rank's part of the product.
    ///
    /// Returns the report on the coordinator and `None` on every other rank.
    pub fn run<C: Comm>(&self, comm: &C) -> Result<Option<Report>, MvError> {
        self.config.validate(comm.size())?;
        let assignment = RowAssignment::plan(self.config.n, comm.size())?;
        if comm.is_coordinator() {
            self.run_coordinator(comm, &assignment).map(Some)
        } else {
            self.run_worker(comm, &assignment).map(|_| None)
        }
    }

    fn run_coordinator<C: Comm>(
        &self,
        comm: &C,
        assignment: &RowAssignment,
    ) -> Result<Report, MvError> {
        let n = self.config.n;
        info!(n, ranks = comm.size(), fill = ?self.config.fill, "starting distributed product");
        let problem = Problem::generate(n, self.config.fill)?;

        let start = comm.wtime();
        let sequential = sequential_matvec(&problem)?;
        let sequential_time = comm.wtime() - start;
        debug!(sequential_time, "sequential baseline computed");

        comm.barrier()?;
        let start = comm.wtime();
        let distributed = distributed_matvec(comm, Some(&problem), assignment, n)?.ok_or_else(|| {
            MvError::InvalidArgument("coordinator did not receive the gathered result".to_string())
        })?;
        let parallel_time = comm.wtime() - start;

        let report = Report::new(
            comm.size(),
            sequential_time,
            parallel_time,
            &distributed,
            &sequential,
            self.config.tolerance,
        )?;
        if report.passed {
            info!(max_error = report.max_error, speedup = report.speedup, "verification passed");
        } else {
            warn!(
                max_error = report.max_error,
                tolerance = %report.tolerance,
                "distributed result differs from the sequential baseline"
            );
        }
        Ok(report)
    }

    fn run_worker<C: Comm>(&self, comm: &C, assignment: &RowAssignment) -> Result<(), MvError> {
        comm.barrier()?;
        distributed_matvec(comm, None, assignment, self.config.n)?;
        debug!(rank = comm.rank(), "worker done");
        Ok(())
    }
}
