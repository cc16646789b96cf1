//! scatmv — distributed dense matrix–vector product benchmark
//!
//! # Usage
//!
//! ```bash
//! # 4 thread ranks, 2000 × 2000 matrix
//! scatmv 2000 --ranks 4
//!
//! # MPI processes (build with `--features mpi`)
//! mpirun -n 4 scatmv 2000 --backend mpi
//!
//! # relative tolerance, other seed
//! scatmv 5000 --seed 7 --tolerance 1e-12 --relative
//! ```
//!
//! The coordinator prints the report on stdout, one metric per line. Logs go to
//! stderr (`RUST_LOG` or `--log-level`). Exit code 0 on completion, including a
//! failed verification; 1 on invalid arguments or a failed run.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use scatmv::config::RunConfig;
use scatmv::context::RunContext;
use scatmv::error::MvError;
use scatmv::matrix::FillPattern;
use scatmv::parallel::{COORDINATOR, ThreadUniverse};
use scatmv::utils::{Report, Tolerance};
use std::process::ExitCode;
use tracing::{debug, error};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// Ranks are threads of this process
    Threads,
    /// Ranks are MPI processes (started by mpirun)
    Mpi,
}

/// Distributed dense matrix–vector multiplication with verification
#[derive(Parser, Debug)]
#[command(name = "scatmv")]
#[command(version)]
struct Cli {
    /// Matrix dimension N (the matrix is N × N)
    #[arg(allow_negative_numbers = true)]
    n: i64,

    /// Communication backend
    #[arg(short, long, value_enum, default_value_t = Backend::Threads)]
    backend: Backend,

    /// Number of thread ranks (threads backend; defaults to the number of CPUs)
    #[arg(short = 'p', long)]
    ranks: Option<usize>,

    /// Seed of the random matrix and vector fill
    #[arg(short, long, default_value_t = scatmv::matrix::fill::DEFAULT_SEED)]
    seed: u64,

    /// Verification tolerance on the maximum elementwise difference
    #[arg(short, long, default_value_t = 1e-9)]
    tolerance: f64,

    /// Scale the tolerance by the magnitude of the result
    #[arg(long)]
    relative: bool,

    /// Refuse to run with fewer ranks than this
    #[arg(long, default_value_t = 1)]
    min_ranks: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build_config(cli: &Cli) -> Result<RunConfig, MvError> {
    let tolerance = if cli.relative {
        Tolerance::Relative(cli.tolerance)
    } else {
        Tolerance::Absolute(cli.tolerance)
    };
    Ok(RunConfig::from_dimension(cli.n)?
        .with_fill(FillPattern::Random { seed: cli.seed })
        .with_tolerance(tolerance)
        .with_min_ranks(cli.min_ranks))
}

fn run_threads(cli: &Cli) -> Result<()> {
    let ranks = cli.ranks.unwrap_or_else(num_cpus::get);
    let config = build_config(cli)?;
    config.validate(ranks)?;
    debug!(ranks, "launching thread ranks");
    let ctx = RunContext::new(config);
    let mut results = ThreadUniverse::launch(ranks, |comm| ctx.run(comm));
    // report the root cause, not the aborts it triggered on other ranks
    if let Some(pos) = results
        .iter()
        .position(|r| matches!(r, Err(e) if !matches!(e, MvError::Aborted { .. })))
        .or_else(|| results.iter().position(Result::is_err))
    {
        if let Err(err) = results.swap_remove(pos) {
            return Err(err).with_context(|| format!("rank {pos} failed"));
        }
    }
    let report = results
        .swap_remove(COORDINATOR)?
        .context("coordinator produced no report")?;
    print_report(&report);
    Ok(())
}

#[cfg(feature = "mpi")]
fn run_mpi(cli: &Cli) -> Result<()> {
    use scatmv::parallel::{Comm, MpiComm};
    let comm = MpiComm::new()?;
    let outcome = build_config(cli)
        .and_then(|config| config.validate(comm.size()).map(|_| config))
        .and_then(|config| RunContext::new(config).run(&comm));
    match outcome {
        Ok(Some(report)) => {
            print_report(&report);
            Ok(())
        }
        Ok(None) => Ok(()),
        // configuration errors are detected identically on every rank
        Err(
            e @ (MvError::InvalidArgument(_)
            | MvError::InvalidDimension(_)
            | MvError::InsufficientRanks { .. }),
        ) => {
            if comm.is_coordinator() {
                return Err(e.into());
            }
            drop(comm);
            std::process::exit(1);
        }
        Err(e) => {
            error!(rank = comm.rank(), %e, "aborting run");
            comm.abort(1);
            Err(e.into())
        }
    }
}

#[cfg(not(feature = "mpi"))]
fn run_mpi(_cli: &Cli) -> Result<()> {
    anyhow::bail!("this build has no MPI support; rebuild with `--features mpi`")
}

fn print_report(report: &Report) {
    println!("{report}");
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(1);
        }
    };
    init_tracing(&cli.log_level);

    let outcome = match cli.backend {
        Backend::Threads => run_threads(&cli),
        Backend::Mpi => run_mpi(&cli),
    };
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
