// src/engine/mod.rs

//! Job and supervisor engine.
//!
//! - [`job`] runs one worker's attempt loop and reports each attempt.
//! - [`core`] is the pure decision logic of the supervisor: counters, the
//!   stop-all latch and the sink disposal policy. No tokio, no IO.
//! - [`supervisor`] is the async shell that spawns jobs, multiplexes their
//!   events with interrupts and carries out what the core decides.

use crate::errors::TofailError;
use crate::exec::OutputSink;

/// Index of a job within its supervisor, starting at 0.
pub type JobId = usize;

/// Classified outcome of one attempt. Every variant owns the attempt's sink.
#[derive(Debug)]
pub enum RunResult {
    /// Exit code 0.
    Ok { sink: OutputSink },
    /// The process could not be started.
    FailedExecuting { sink: OutputSink },
    /// Non-zero exit, or [`IO_FAILURE_EXIT_CODE`](crate::exec::IO_FAILURE_EXIT_CODE)
    /// when waiting for the process failed. On Unix a process killed by signal
    /// `n` reports `128 + n`, as a shell would.
    Fail { exit_code: i32, sink: OutputSink },
    /// The attempt ran out of time. The sink must be kept for inspection.
    Timeout { pid: u32, sink: OutputSink },
}

impl RunResult {
    pub fn kind(&self) -> AttemptKind {
        match self {
            RunResult::Ok { .. } => AttemptKind::Ok,
            RunResult::FailedExecuting { .. } => AttemptKind::FailedExecuting,
            RunResult::Fail { exit_code, .. } => AttemptKind::Fail(*exit_code),
            RunResult::Timeout { pid, .. } => AttemptKind::Timeout(*pid),
        }
    }

    pub fn sink(&self) -> &OutputSink {
        match self {
            RunResult::Ok { sink }
            | RunResult::FailedExecuting { sink }
            | RunResult::Fail { sink, .. }
            | RunResult::Timeout { sink, .. } => sink,
        }
    }

    pub fn into_sink(self) -> OutputSink {
        match self {
            RunResult::Ok { sink }
            | RunResult::FailedExecuting { sink }
            | RunResult::Fail { sink, .. }
            | RunResult::Timeout { sink, .. } => sink,
        }
    }
}

/// [`RunResult`] without the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptKind {
    Ok,
    FailedExecuting,
    Fail(i32),
    Timeout(u32),
}

/// Messages from a job to its owner.
#[derive(Debug)]
pub enum JobEvent {
    /// One attempt finished (or could not start).
    Attempted { job: JobId, result: RunResult },
    /// The job stopped and will not emit anything else.
    Done { job: JobId },
    /// The job could not create an output sink. Fatal for the whole run.
    Aborted { job: JobId, error: TofailError },
}

/// Totals of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub attempts: u64,
    pub successes: u64,
    /// `Fail` plus `FailedExecuting` results.
    pub failures: usize,
    pub timeouts: usize,
    pub interrupted: bool,
}

impl RunSummary {
    pub fn found_problem(&self) -> bool {
        self.failures > 0 || self.timeouts > 0
    }
}

pub mod core;
pub mod job;
pub mod supervisor;

pub use self::core::{CoreCommand, CoreEvent, CoreStep, SupervisorCore};
pub use job::{EVENT_BUFFER, Job, JobHandle};
pub use supervisor::Supervisor;
