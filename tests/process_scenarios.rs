// tests/process_scenarios.rs

//! End-to-end runs against real processes.

#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use tofail::engine::Supervisor;
use tofail::exec::ProcessExecutor;
use tofail::timer::TokioTimer;
use tofail::types::{AttemptTimeout, Command};
use tofail_test_utils::reporter::{RecordingReporter, Report};
use tofail_test_utils::{init_tracing, with_timeout};

fn files_in(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect()
}

fn sh(script: &str) -> Command {
    Command::new(["sh", "-c", script]).unwrap()
}

#[tokio::test]
async fn failing_shell_reports_its_exit_code() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let reporter = RecordingReporter::new();
    let (_tx, rx) = mpsc::channel(1);

    let summary = with_timeout(
        Supervisor::new(
            sh("exit 3"),
            1,
            AttemptTimeout::DISABLED,
            ProcessExecutor::new(dir.path(), ".tofail_oup"),
            TokioTimer,
            reporter.clone(),
        )
        .run(rx),
    )
    .await
    .unwrap();

    assert_eq!(summary.attempts, 1);
    assert_eq!(summary.failures, 1);
    assert!(reporter.reports().contains(&Report::Failure {
        index: 1,
        exit_code: 3,
        output: String::new(),
    }));
    assert!(files_in(dir.path()).is_empty());
}

#[tokio::test]
async fn failure_output_is_captured_in_order() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let reporter = RecordingReporter::new();
    let (_tx, rx) = mpsc::channel(1);

    with_timeout(
        Supervisor::new(
            sh("echo to-out; echo to-err >&2; exit 7"),
            1,
            AttemptTimeout::DISABLED,
            ProcessExecutor::new(dir.path(), ".tofail_oup"),
            TokioTimer,
            reporter.clone(),
        )
        .run(rx),
    )
    .await
    .unwrap();

    assert!(reporter.reports().contains(&Report::Failure {
        index: 1,
        exit_code: 7,
        output: "to-out\nto-err\n".to_string(),
    }));
}

#[tokio::test]
async fn hanging_command_times_out_and_keeps_its_file() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let reporter = RecordingReporter::new();
    let (_tx, rx) = mpsc::channel(1);

    let started = Instant::now();
    let summary = with_timeout(
        Supervisor::new(
            sh("echo waiting; sleep 2"),
            1,
            AttemptTimeout::from_secs(1),
            ProcessExecutor::new(dir.path(), ".tofail_oup"),
            TokioTimer,
            reporter.clone(),
        )
        .run(rx),
    )
    .await
    .unwrap();

    // The run only ends once the timed-out process has exited on its own.
    assert!(started.elapsed() >= Duration::from_secs(2));
    assert_eq!(summary.timeouts, 1);
    assert_eq!(summary.failures, 0);

    let timeout = reporter
        .reports()
        .into_iter()
        .find_map(|r| match r {
            Report::Timeout { pid, path } => Some((pid, path)),
            _ => None,
        })
        .expect("timeout reported");
    assert!(timeout.0 > 0);
    assert!(timeout.1.exists());
    assert_eq!(std::fs::read_to_string(&timeout.1).unwrap(), "waiting\n");
    assert_eq!(files_in(dir.path()), vec![timeout.1]);
}

#[tokio::test]
async fn missing_program_fails_to_execute_in_every_job() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let reporter = RecordingReporter::new();
    let (_tx, rx) = mpsc::channel(1);

    let summary = with_timeout(
        Supervisor::new(
            Command::new(["/nonexistent/tofail-test-program"]).unwrap(),
            3,
            AttemptTimeout::DISABLED,
            ProcessExecutor::new(dir.path(), ".tofail_oup"),
            TokioTimer,
            reporter.clone(),
        )
        .run(rx),
    )
    .await
    .unwrap();

    assert!(summary.failures >= 1);
    assert_eq!(summary.successes, 0);
    assert!(reporter.count(|r| *r == Report::FailedToExecute) >= 1);
    assert_eq!(reporter.count(|r| *r == Report::StoppingAll), 1);
    assert!(files_in(dir.path()).is_empty());
}

#[tokio::test]
async fn flaky_command_eventually_fails() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let counter = dir.path().join("count");
    let reporter = RecordingReporter::new();
    let (_tx, rx) = mpsc::channel(1);

    // Fails on the fifth run.
    let script = format!(
        "echo x >> '{}'; test $(wc -l < '{}') -lt 5",
        counter.display(),
        counter.display()
    );
    let out_dir = dir.path().join("out");
    std::fs::create_dir(&out_dir).unwrap();

    let summary = with_timeout(
        Supervisor::new(
            sh(&script),
            1,
            AttemptTimeout::DISABLED,
            ProcessExecutor::new(&out_dir, ".tofail_oup"),
            TokioTimer,
            reporter.clone(),
        )
        .run(rx),
    )
    .await
    .unwrap();

    assert_eq!(summary.attempts, 5);
    assert_eq!(summary.successes, 4);
    assert_eq!(summary.failures, 1);
    assert!(files_in(&out_dir).is_empty());
}
