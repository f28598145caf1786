// tests/supervisor_runs.rs

use std::path::Path;
use std::time::Duration;

use tokio::sync::mpsc;

use tofail::engine::{RunSummary, Supervisor};
use tofail::errors::TofailError;
use tofail::timer::TokioTimer;
use tofail::types::{AttemptTimeout, Command};
use tofail_test_utils::fake_executor::{FakeAttempt, FakeExecutor};
use tofail_test_utils::reporter::{RecordingReporter, Report};
use tofail_test_utils::timer::ManualTimer;
use tofail_test_utils::{init_tracing, with_timeout};

fn files_in(dir: &Path) -> Vec<std::path::PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect()
}

fn cmd(argv: &[&str]) -> Command {
    Command::new(argv.iter().copied()).unwrap()
}

/// An interrupt channel that never fires.
fn no_interrupts() -> (mpsc::Sender<()>, mpsc::Receiver<()>) {
    mpsc::channel(1)
}

#[tokio::test]
async fn failure_is_reported_with_output_and_all_sinks_are_removed() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let executor = FakeExecutor::new(dir.path(), |n| {
        if n < 2 {
            FakeAttempt::ok().with_output("fine\n")
        } else {
            FakeAttempt::exit(3).with_output("boom\n")
        }
    });
    let reporter = RecordingReporter::new();
    let (_tx, rx) = no_interrupts();

    let supervisor = Supervisor::new(
        cmd(&["sh", "-c", "exit 3"]),
        1,
        AttemptTimeout::DISABLED,
        executor,
        TokioTimer,
        reporter.clone(),
    );
    let summary = with_timeout(supervisor.run(rx)).await.unwrap();

    assert_eq!(
        summary,
        RunSummary {
            attempts: 3,
            successes: 2,
            failures: 1,
            timeouts: 0,
            interrupted: false,
        }
    );
    assert_eq!(
        reporter.reports(),
        vec![
            Report::Banner { jobs: 1 },
            Report::Failure {
                index: 1,
                exit_code: 3,
                output: "boom\n".to_string(),
            },
            Report::Summary(summary),
        ]
    );
    assert!(files_in(dir.path()).is_empty());
}

#[tokio::test]
async fn timeout_keeps_its_output_file() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let executor = FakeExecutor::always(
        dir.path(),
        FakeAttempt::ok()
            .with_output("still going\n")
            .after(Duration::from_millis(300)),
    );
    let timer = ManualTimer::new();
    timer.fire();
    let reporter = RecordingReporter::new();
    let (_tx, rx) = no_interrupts();

    let supervisor = Supervisor::new(
        cmd(&["sleep", "5"]),
        1,
        AttemptTimeout::from_secs(1),
        executor,
        timer.clone(),
        reporter.clone(),
    );
    let summary = with_timeout(supervisor.run(rx)).await.unwrap();

    assert_eq!(summary.timeouts, 1);
    assert_eq!(summary.failures, 0);
    assert!(summary.found_problem());

    let kept: Vec<_> = reporter
        .reports()
        .into_iter()
        .filter_map(|r| match r {
            Report::Timeout { pid, path } => Some((pid, path)),
            _ => None,
        })
        .collect();
    assert_eq!(kept.len(), 1);
    let (pid, path) = &kept[0];
    assert!(*pid > 0);
    assert!(path.exists(), "timed-out output must stay on disk");
    assert_eq!(std::fs::read_to_string(path).unwrap(), "still going\n");
    assert_eq!(files_in(dir.path()), vec![path.clone()]);
}

#[tokio::test]
async fn one_unlaunchable_attempt_stops_all_jobs_once() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let executor = FakeExecutor::new(dir.path(), |n| {
        if n == 0 {
            FakeAttempt::Unlaunchable
        } else {
            FakeAttempt::ok().after(Duration::from_millis(20))
        }
    });
    let stats = executor.stats();
    let reporter = RecordingReporter::new();
    let (_tx, rx) = no_interrupts();

    let supervisor = Supervisor::new(
        cmd(&["does-not-exist"]),
        3,
        AttemptTimeout::DISABLED,
        executor,
        TokioTimer,
        reporter.clone(),
    );
    let summary = with_timeout(supervisor.run(rx)).await.unwrap();

    assert_eq!(summary.failures, 1);
    assert_eq!(reporter.count(|r| *r == Report::FailedToExecute), 1);
    assert_eq!(reporter.count(|r| *r == Report::StoppingAll), 1);
    // The other two jobs finish at most what was already in flight.
    assert_eq!(stats.attempts(), summary.attempts);
    assert!(summary.attempts <= 5, "too many attempts: {summary:?}");
    assert!(files_in(dir.path()).is_empty());
}

#[tokio::test]
async fn every_unlaunchable_job_is_counted_but_stop_is_announced_once() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let executor = FakeExecutor::always(dir.path(), FakeAttempt::Unlaunchable);
    let reporter = RecordingReporter::new();
    let (_tx, rx) = no_interrupts();

    let supervisor = Supervisor::new(
        cmd(&["does-not-exist"]),
        3,
        AttemptTimeout::DISABLED,
        executor,
        TokioTimer,
        reporter.clone(),
    );
    let summary = with_timeout(supervisor.run(rx)).await.unwrap();

    // Each job's first attempt is already in flight when the stop arrives.
    assert!((1..=3).contains(&summary.failures));
    assert_eq!(summary.attempts, summary.failures as u64);
    assert_eq!(reporter.count(|r| *r == Report::StoppingAll), 1);
    assert!(files_in(dir.path()).is_empty());
}

#[tokio::test]
async fn interrupt_stops_an_always_passing_command() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let executor = FakeExecutor::always(dir.path(), FakeAttempt::ok().after(Duration::from_millis(5)));
    let reporter = RecordingReporter::new();
    let (tx, rx) = mpsc::channel(4);

    let supervisor = Supervisor::new(
        cmd(&["true"]),
        2,
        AttemptTimeout::DISABLED,
        executor,
        TokioTimer,
        reporter.clone(),
    );
    let run = tokio::spawn(supervisor.run(rx));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!run.is_finished(), "passing command must keep running");
    tx.send(()).await.unwrap();

    let summary = with_timeout(run).await.unwrap().unwrap();
    assert!(summary.interrupted);
    assert_eq!(summary.failures, 0);
    assert!(!summary.found_problem());
    assert!(summary.successes > 0);
    assert_eq!(reporter.count(|r| *r == Report::Interrupted), 1);
    // The interrupt message already says so; no extra notice.
    assert_eq!(reporter.count(|r| *r == Report::StoppingAll), 0);
    assert!(files_in(dir.path()).is_empty());
}

#[tokio::test]
async fn failure_and_interrupt_together_stop_once() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let executor = FakeExecutor::new(dir.path(), |n| {
        if n == 4 {
            FakeAttempt::exit(1)
        } else {
            FakeAttempt::ok().after(Duration::from_millis(10))
        }
    });
    let reporter = RecordingReporter::new();
    let (tx, rx) = mpsc::channel(4);
    // Queued before the run starts, so it races the failure.
    tx.send(()).await.unwrap();
    tx.send(()).await.unwrap();

    let supervisor = Supervisor::new(
        cmd(&["flaky"]),
        2,
        AttemptTimeout::DISABLED,
        executor,
        TokioTimer,
        reporter.clone(),
    );
    let summary = with_timeout(supervisor.run(rx)).await.unwrap();

    assert!(summary.interrupted);
    assert_eq!(reporter.count(|r| *r == Report::Interrupted), 2);
    assert!(reporter.count(|r| *r == Report::StoppingAll) <= 1);
    assert!(files_in(dir.path()).is_empty());
}

#[tokio::test]
async fn io_failure_counts_as_failure() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let executor = FakeExecutor::always(dir.path(), FakeAttempt::IoFailure);
    let reporter = RecordingReporter::new();
    let (_tx, rx) = no_interrupts();

    let supervisor = Supervisor::new(
        cmd(&["my-cmd"]),
        1,
        AttemptTimeout::DISABLED,
        executor,
        TokioTimer,
        reporter.clone(),
    );
    let summary = with_timeout(supervisor.run(rx)).await.unwrap();

    assert_eq!(summary.failures, 1);
    assert_eq!(
        reporter.count(|r| matches!(r, Report::Failure { exit_code: -1, .. })),
        1
    );
}

#[tokio::test]
async fn missing_output_dir_aborts_the_run() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("gone");
    let executor = FakeExecutor::always(&missing, FakeAttempt::ok());
    let (_tx, rx) = no_interrupts();

    let supervisor = Supervisor::new(
        cmd(&["true"]),
        2,
        AttemptTimeout::DISABLED,
        executor,
        TokioTimer,
        RecordingReporter::new(),
    );
    let err = with_timeout(supervisor.run(rx)).await.unwrap_err();
    assert!(matches!(err, TofailError::SinkUnavailable { .. }));
}

#[tokio::test]
async fn abort_waits_for_in_flight_attempts_and_cleans_their_files() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    // The first attempt ends at once, so its job opens the third sink and
    // aborts while the other job is still in a slow attempt.
    let executor = FakeExecutor::new(dir.path(), |n| {
        if n == 0 {
            FakeAttempt::ok()
        } else {
            FakeAttempt::ok().after(Duration::from_millis(200))
        }
    })
    .with_sink_limit(2);
    let stats = executor.stats();
    let (_tx, rx) = no_interrupts();

    let supervisor = Supervisor::new(
        cmd(&["true"]),
        2,
        AttemptTimeout::DISABLED,
        executor,
        TokioTimer,
        RecordingReporter::new(),
    );
    let err = with_timeout(supervisor.run(rx)).await.unwrap_err();

    assert!(matches!(err, TofailError::SinkUnavailable { .. }));
    assert_eq!(stats.attempts(), 2);
    assert!(
        files_in(dir.path()).is_empty(),
        "in-flight output files must be removed before returning"
    );
}
