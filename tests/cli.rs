//! Tests for the `scatmv` binary: exit codes and the stdout report.
//!
//! Each test runs the built binary with thread ranks and checks the process
//! status and, for completed runs, the six report lines.

use std::process::{Command, Output};

fn scatmv(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_scatmv"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to start scatmv")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

/// A completed run exits 0 and prints exactly the six report lines.
#[test]
fn completed_run_prints_report() {
    let out = scatmv(&["16", "--ranks", "3"]);
    assert_eq!(out.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let text = stdout(&out);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 6, "report was:\n{text}");
    assert!(lines[0].starts_with("Sequential time: "));
    assert!(lines[0].ends_with(" seconds"));
    assert!(lines[1].starts_with("Parallel time: "));
    assert!(lines[1].ends_with(" seconds (3 ranks)"));
    assert_eq!(
        lines[2],
        "Maximum difference between parallel and sequential result: 0e0"
    );
    assert!(lines[3].starts_with("Speedup: "));
    assert!(lines[4].starts_with("Efficiency: ") && lines[4].ends_with('%'));
    assert_eq!(lines[5], "✓ Results match (absolute 1e-9 tolerance)");
}

/// Tolerance flags reach the report; more ranks than rows still completes.
#[test]
fn relative_tolerance_and_surplus_ranks() {
    let out = scatmv(&["3", "-p", "5", "--relative", "--tolerance", "1e-12", "--seed", "7"]);
    assert_eq!(out.status.code(), Some(0));
    let text = stdout(&out);
    assert!(text.contains("(5 ranks)"));
    assert!(text.trim_end().ends_with("✓ Results match (relative 1e-12 tolerance)"));
}

/// Missing or non-positive dimensions exit 1 without a report.
#[test]
fn invalid_dimension_exits_one() {
    for args in [&[][..], &["0"][..], &["-5"][..], &["abc"][..]] {
        let out = scatmv(args);
        assert_eq!(out.status.code(), Some(1), "args {args:?}");
        assert!(out.stdout.is_empty(), "args {args:?}");
        assert!(!out.stderr.is_empty(), "args {args:?}");
    }
}

/// Too few ranks, zero ranks included, exit 1.
#[test]
fn insufficient_ranks_exits_one() {
    for args in [&["8", "--ranks", "0"][..], &["8", "--ranks", "2", "--min-ranks", "3"][..]] {
        let out = scatmv(args);
        assert_eq!(out.status.code(), Some(1), "args {args:?}");
        assert!(out.stdout.is_empty(), "args {args:?}");
    }
}

/// A negative tolerance is a configuration error.
#[test]
fn negative_tolerance_exits_one() {
    let out = scatmv(&["8", "--ranks", "2", "--tolerance=-1"]);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn help_exits_zero() {
    let out = scatmv(&["--help"]);
    assert_eq!(out.status.code(), Some(0));
    assert!(stdout(&out).contains("--min-ranks"));
}

#[cfg(not(feature = "mpi"))]
#[test]
fn mpi_backend_without_feature_exits_one() {
    let out = scatmv(&["8", "--backend", "mpi"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("--features mpi"));
}
