// src/engine/job.rs

//! One worker's attempt loop.
//!
//! A job runs the command over and over. Each attempt gets a fresh sink, is
//! started through the [`Executor`] in its own tokio task and then raced
//! against the attempt timeout. The job keeps going while attempts succeed
//! and stops after the first non-`Ok` result, or when a stop was requested
//! before the next attempt begins. A running attempt is never interrupted by
//! a stop request.

use std::io;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::engine::{JobEvent, JobId, RunResult};
use crate::errors::TofailError;
use crate::exec::{BoxFuture, Completion, Executor, IO_FAILURE_EXIT_CODE, OutputSink, Started};
use crate::timer::TimerSource;
use crate::types::{AttemptTimeout, Command};

/// Capacity of the job -> supervisor event channel.
pub const EVENT_BUFFER: usize = 1024;

/// Owner-side handle used to ask a job to stop.
///
/// Stopping is idempotent and never blocks.
#[derive(Debug, Clone)]
pub struct JobHandle {
    id: JobId,
    stop: CancellationToken,
}

impl JobHandle {
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Ask the job not to start another attempt.
    pub fn stop(&self) {
        if !self.stop.is_cancelled() {
            debug!(job = self.id, "stop requested");
        }
        self.stop.cancel();
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop.is_cancelled()
    }
}

/// What the loop does after an attempt.
enum Flow {
    Continue,
    Stop,
    Abort(TofailError),
}

pub struct Job<E: Executor, T: TimerSource> {
    id: JobId,
    command: Command,
    timeout: AttemptTimeout,
    executor: Arc<E>,
    timer: Arc<T>,
    events: mpsc::Sender<JobEvent>,
    stop: CancellationToken,
}

impl<E: Executor, T: TimerSource> Job<E, T> {
    pub fn new(
        id: JobId,
        command: Command,
        timeout: AttemptTimeout,
        executor: Arc<E>,
        timer: Arc<T>,
        events: mpsc::Sender<JobEvent>,
    ) -> Self {
        Self {
            id,
            command,
            timeout,
            executor,
            timer,
            events,
            stop: CancellationToken::new(),
        }
    }

    pub fn handle(&self) -> JobHandle {
        JobHandle {
            id: self.id,
            stop: self.stop.clone(),
        }
    }

    /// Run the job on the tokio runtime.
    pub fn spawn(self) -> (JobHandle, JoinHandle<()>) {
        let handle = self.handle();
        let task = tokio::spawn(self.run());
        (handle, task)
    }

    /// The attempt loop. Sends `Done` when it stops, or `Aborted` if no sink
    /// could be created.
    pub async fn run(self) {
        let mut attempt: u64 = 0;

        loop {
            if self.stop.is_cancelled() {
                debug!(job = self.id, attempts = attempt, "stop requested; not starting another attempt");
                break;
            }
            attempt += 1;

            let sink = match self.executor.open_sink() {
                Ok(sink) => sink,
                Err(error) => {
                    self.abort(attempt, error).await;
                    return;
                }
            };

            match self.attempt(attempt, sink).await {
                Flow::Continue => continue,
                Flow::Stop => break,
                Flow::Abort(error) => {
                    self.abort(attempt, error).await;
                    return;
                }
            }
        }

        debug!(job = self.id, "job done");
        if self.events.send(JobEvent::Done { job: self.id }).await.is_err() {
            debug!(job = self.id, "event receiver gone before done notification");
        }
    }

    async fn attempt(&self, attempt: u64, sink: OutputSink) -> Flow {
        let output = match sink.writer() {
            Ok(output) => output,
            Err(source) => return Flow::Abort(discard_unusable(sink, source)),
        };

        // Start and wait run in their own task; this loop only awaits channels.
        let (started_tx, started_rx) = oneshot::channel::<io::Result<u32>>();
        let (completed_tx, completed_rx) = oneshot::channel::<Completion>();
        let executor = Arc::clone(&self.executor);
        let command = self.command.clone();
        tokio::spawn(async move {
            match executor.start(command, output).await {
                Ok(Started { pid, process }) => {
                    let _ = started_tx.send(Ok(pid));
                    let completion = executor.wait(process).await;
                    let _ = completed_tx.send(completion);
                }
                Err(err) => {
                    let _ = started_tx.send(Err(err));
                }
            }
        });

        let pid = match started_rx.await {
            Ok(Ok(pid)) => pid,
            Ok(Err(err)) => {
                warn!(job = self.id, attempt, cmd = %self.command, error = %err, "failed to start command");
                self.emit(RunResult::FailedExecuting { sink }).await;
                return Flow::Stop;
            }
            Err(_) => {
                error!(job = self.id, attempt, "attempt task ended without reporting its start");
                self.emit(RunResult::FailedExecuting { sink }).await;
                return Flow::Stop;
            }
        };
        debug!(job = self.id, attempt, pid, "attempt started");

        let mut deadline: BoxFuture<'static, ()> = if self.timeout.is_enabled() {
            self.timer.timer(self.timeout.duration())
        } else {
            Box::pin(std::future::pending())
        };
        let mut completed_rx = completed_rx;

        let raced = tokio::select! {
            () = &mut deadline => None,
            completion = &mut completed_rx => Some(completion),
        };

        match raced {
            None => {
                warn!(job = self.id, attempt, pid, timeout = %self.timeout, "attempt timed out");
                self.emit(RunResult::Timeout { pid, sink }).await;
                // The process is still running and writing into the kept sink;
                // observe its exit before this job finishes.
                let _ = completed_rx.await;
                debug!(job = self.id, attempt, pid, "timed-out process finished");
                Flow::Stop
            }
            Some(Ok(Completion::Exited(0))) => {
                debug!(job = self.id, attempt, pid, "attempt succeeded");
                if self.emit(RunResult::Ok { sink }).await {
                    Flow::Continue
                } else {
                    Flow::Stop
                }
            }
            Some(Ok(Completion::Exited(exit_code))) => {
                info!(job = self.id, attempt, pid, exit_code, "attempt failed");
                self.emit(RunResult::Fail { exit_code, sink }).await;
                Flow::Stop
            }
            Some(Ok(Completion::IoFailure(err))) => {
                warn!(
                    job = self.id,
                    attempt,
                    pid,
                    cmd = %self.command,
                    error = %err,
                    "command likely encountered an I/O error"
                );
                self.emit(RunResult::Fail {
                    exit_code: IO_FAILURE_EXIT_CODE,
                    sink,
                })
                .await;
                Flow::Stop
            }
            Some(Err(_)) => {
                error!(job = self.id, attempt, pid, "attempt task ended without reporting completion");
                self.emit(RunResult::Fail {
                    exit_code: IO_FAILURE_EXIT_CODE,
                    sink,
                })
                .await;
                Flow::Stop
            }
        }
    }

    /// Send a result to the owner. Returns false when nobody listens anymore.
    async fn emit(&self, result: RunResult) -> bool {
        let kind = result.kind();
        match self
            .events
            .send(JobEvent::Attempted {
                job: self.id,
                result,
            })
            .await
        {
            Ok(()) => true,
            Err(_) => {
                debug!(job = self.id, ?kind, "event receiver gone; dropping result");
                false
            }
        }
    }

    async fn abort(&self, attempt: u64, error: TofailError) {
        error!(job = self.id, attempt, error = %error, "cannot create output sink");
        let _ = self
            .events
            .send(JobEvent::Aborted {
                job: self.id,
                error,
            })
            .await;
    }
}

/// Remove a sink that cannot be handed to a process and build the fatal error.
fn discard_unusable(sink: OutputSink, source: io::Error) -> TofailError {
    let dir = sink.path().parent().map(Path::to_path_buf).unwrap_or_default();
    let path = sink.path().to_path_buf();
    if let Err(e) = sink.dispose() {
        warn!(path = %path.display(), error = %e, "failed to remove unusable output file");
    }
    TofailError::SinkUnavailable { dir, source }
}
