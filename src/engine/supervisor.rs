// src/engine/supervisor.rs

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::engine::core::{CoreCommand, CoreEvent, SupervisorCore};
use crate::engine::job::{EVENT_BUFFER, Job, JobHandle};
use crate::engine::{JobEvent, RunResult, RunSummary};
use crate::errors::{Result, TofailError};
use crate::exec::{Executor, OutputSink};
use crate::report::Reporter;
use crate::timer::TimerSource;
use crate::types::{AttemptTimeout, Command};

/// Runs N jobs of the same command and reacts to what they report.
///
/// This is the async shell around [`SupervisorCore`]: it spawns the jobs,
/// waits on their events and the interrupt channel in a single `select!`, and
/// performs the commands the core returns (stopping jobs, reporting, deleting
/// or keeping sinks). Events are handled one at a time.
pub struct Supervisor<E: Executor, T: TimerSource, R: Reporter> {
    command: Command,
    jobs: usize,
    timeout: AttemptTimeout,
    executor: Arc<E>,
    timer: Arc<T>,
    reporter: R,
}

impl<E: Executor, T: TimerSource, R: Reporter> fmt::Debug for Supervisor<E, T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("command", &self.command)
            .field("jobs", &self.jobs)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl<E: Executor, T: TimerSource, R: Reporter> Supervisor<E, T, R> {
    pub fn new(
        command: Command,
        jobs: usize,
        timeout: AttemptTimeout,
        executor: E,
        timer: T,
        reporter: R,
    ) -> Self {
        Self {
            command,
            jobs,
            timeout,
            executor: Arc::new(executor),
            timer: Arc::new(timer),
            reporter,
        }
    }

    /// Run until every job has stopped.
    ///
    /// Each message on `interrupts` triggers stop-all. A closed interrupt
    /// channel is simply ignored from then on. When a job aborts, the other
    /// jobs are stopped and joined before the error is returned.
    pub async fn run(mut self, mut interrupts: mpsc::Receiver<()>) -> Result<RunSummary> {
        self.reporter.banner(&self.command, self.jobs);
        info!(
            cmd = %self.command,
            jobs = self.jobs,
            timeout = %self.timeout,
            "starting jobs"
        );

        let (events_tx, mut events_rx) = mpsc::channel::<JobEvent>(EVENT_BUFFER);
        let (handles, tasks): (Vec<JobHandle>, Vec<JoinHandle<()>>) = (0..self.jobs)
            .map(|id| {
                Job::new(
                    id,
                    self.command.clone(),
                    self.timeout,
                    Arc::clone(&self.executor),
                    Arc::clone(&self.timer),
                    events_tx.clone(),
                )
                .spawn()
            })
            .unzip();
        // Only the jobs hold senders now; the channel closes once all are gone.
        drop(events_tx);

        let mut core = SupervisorCore::new(self.jobs);
        let mut interrupts_open = true;
        let mut aborted: Option<TofailError> = None;

        loop {
            let (event, mut sink) = tokio::select! {
                maybe = events_rx.recv() => match maybe {
                    Some(JobEvent::Attempted { job, result }) => {
                        debug!(job, kind = ?result.kind(), "attempt reported");
                        (CoreEvent::Attempted(result.kind()), Some(result.into_sink()))
                    }
                    Some(JobEvent::Done { job }) => {
                        debug!(job, "job finished");
                        (CoreEvent::JobDone, None)
                    }
                    Some(JobEvent::Aborted { job, error }) => {
                        warn!(job, "job aborted; stopping all jobs");
                        for handle in &handles {
                            handle.stop();
                        }
                        aborted = Some(error);
                        break;
                    }
                    None => {
                        warn!(finished = core.finished_jobs(), "all jobs exited without reporting done");
                        break;
                    }
                },
                signal = interrupts.recv(), if interrupts_open => match signal {
                    Some(()) => {
                        info!("interrupt received");
                        (CoreEvent::Interrupted, None)
                    }
                    None => {
                        interrupts_open = false;
                        continue;
                    }
                },
            };

            let step = core.step(event);
            for command in step.commands {
                self.execute(command, &handles, &mut sink);
            }

            if !step.keep_running {
                break;
            }
        }

        if let Some(error) = aborted {
            Self::wind_down(events_rx, tasks).await;
            return Err(error);
        }

        for task in tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "job task did not finish cleanly");
            }
        }

        let summary = core.into_summary();
        info!(?summary, "all jobs finished");
        self.reporter.summary(&summary);
        Ok(summary)
    }

    /// After an abort: let in-flight attempts finish, clean up their sinks
    /// and join every job. Timed-out sinks are kept as usual.
    async fn wind_down(mut events_rx: mpsc::Receiver<JobEvent>, tasks: Vec<JoinHandle<()>>) {
        while let Some(event) = events_rx.recv().await {
            match event {
                JobEvent::Attempted { job, result } => match result {
                    RunResult::Timeout { pid, sink } => {
                        let path = sink.preserve();
                        warn!(job, pid, path = %path.display(), "keeping output file of timed-out attempt");
                    }
                    other => {
                        let sink = other.into_sink();
                        let path = sink.path().to_path_buf();
                        if let Err(e) = sink.dispose() {
                            warn!(path = %path.display(), error = %e, "failed to remove output file");
                        }
                    }
                },
                JobEvent::Done { job } => debug!(job, "job finished after abort"),
                JobEvent::Aborted { job, error } => {
                    debug!(job, error = %error, "further job aborted");
                }
            }
        }

        for task in tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "job task did not finish cleanly");
            }
        }
    }

    fn execute(
        &mut self,
        command: CoreCommand,
        handles: &[JobHandle],
        sink: &mut Option<OutputSink>,
    ) {
        match command {
            CoreCommand::StopAllJobs => {
                info!(jobs = handles.len(), "stopping all jobs");
                for handle in handles {
                    debug!(job = handle.id(), "sending stop");
                    handle.stop();
                }
            }
            CoreCommand::AnnounceStopping => self.reporter.stopping_all(),
            CoreCommand::ReportFailedExecuting => self.reporter.failed_to_execute(&self.command),
            CoreCommand::ReportFailure { index, exit_code } => {
                let output = match sink.as_ref().map(OutputSink::read_output) {
                    Some(Ok(output)) => output,
                    Some(Err(e)) => {
                        warn!(error = %e, "could not read captured output");
                        format!("<captured output unavailable: {e}>")
                    }
                    None => String::new(),
                };
                self.reporter.failure(index, exit_code, &output);
            }
            CoreCommand::ReportTimeout { pid } => match sink.as_ref() {
                Some(s) => self.reporter.timeout(pid, s.path()),
                None => warn!(pid, "timeout reported without an output file"),
            },
            CoreCommand::ReportInterrupted => self.reporter.interrupted(),
            CoreCommand::DisposeSink => {
                if let Some(s) = sink.take() {
                    let path = s.path().to_path_buf();
                    if let Err(e) = s.dispose() {
                        warn!(path = %path.display(), error = %e, "failed to remove output file");
                    }
                }
            }
            CoreCommand::PreserveSink => {
                if let Some(s) = sink.take() {
                    let path = s.preserve();
                    info!(path = %path.display(), "keeping output file of timed-out attempt");
                }
            }
        }
    }
}
