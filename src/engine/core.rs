// src/engine/core.rs

//! Pure supervisor state machine.
//!
//! [`SupervisorCore`] consumes [`CoreEvent`]s and answers with a
//! [`CoreStep`]: the commands the async shell should carry out, in order, and
//! whether the event loop keeps running. It owns the failure counter and the
//! stop-all latch, so the shell never has to decide anything itself.
//!
//! No tokio, no IO.

use crate::engine::{AttemptKind, RunSummary};

/// Input to the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreEvent {
    /// A job reported an attempt.
    Attempted(AttemptKind),
    /// A job stopped.
    JobDone,
    /// The operator asked to stop (e.g. Ctrl-C).
    Interrupted,
}

/// Instructions for the shell. Sink commands refer to the sink of the attempt
/// that produced the step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreCommand {
    /// Call `stop()` on every job. Emitted at most once per core.
    StopAllJobs,
    /// Tell the operator all jobs are being stopped.
    AnnounceStopping,
    ReportFailedExecuting,
    ReportFailure { index: usize, exit_code: i32 },
    ReportTimeout { pid: u32 },
    ReportInterrupted,
    DisposeSink,
    PreserveSink,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    pub keep_running: bool,
}

#[derive(Debug)]
pub struct SupervisorCore {
    jobs: usize,
    finished: usize,
    stopping: bool,
    summary: RunSummary,
}

impl SupervisorCore {
    pub fn new(jobs: usize) -> Self {
        Self {
            jobs,
            finished: 0,
            stopping: false,
            summary: RunSummary::default(),
        }
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping
    }

    pub fn finished_jobs(&self) -> usize {
        self.finished
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn into_summary(self) -> RunSummary {
        self.summary
    }

    pub fn step(&mut self, event: CoreEvent) -> CoreStep {
        let mut commands = Vec::new();

        match event {
            CoreEvent::Attempted(kind) => self.on_attempt(kind, &mut commands),
            CoreEvent::JobDone => self.finished += 1,
            CoreEvent::Interrupted => {
                self.summary.interrupted = true;
                self.stop_all(&mut commands);
                commands.push(CoreCommand::ReportInterrupted);
            }
        }

        CoreStep {
            commands,
            keep_running: self.finished < self.jobs,
        }
    }

    fn on_attempt(&mut self, kind: AttemptKind, commands: &mut Vec<CoreCommand>) {
        self.summary.attempts += 1;

        match kind {
            AttemptKind::Ok => {
                self.summary.successes += 1;
                commands.push(CoreCommand::DisposeSink);
            }
            AttemptKind::FailedExecuting => {
                self.summary.failures += 1;
                commands.push(CoreCommand::ReportFailedExecuting);
                let fired = self.stop_all(commands);
                self.announce(fired, commands);
                commands.push(CoreCommand::DisposeSink);
            }
            AttemptKind::Fail(exit_code) => {
                self.summary.failures += 1;
                let fired = self.stop_all(commands);
                commands.push(CoreCommand::ReportFailure {
                    index: self.summary.failures,
                    exit_code,
                });
                self.announce(fired, commands);
                commands.push(CoreCommand::DisposeSink);
            }
            AttemptKind::Timeout(pid) => {
                self.summary.timeouts += 1;
                let fired = self.stop_all(commands);
                commands.push(CoreCommand::ReportTimeout { pid });
                self.announce(fired, commands);
                commands.push(CoreCommand::PreserveSink);
            }
        }
    }

    /// Latch the stop broadcast. Returns whether this call fired it.
    fn stop_all(&mut self, commands: &mut Vec<CoreCommand>) -> bool {
        if self.stopping {
            return false;
        }
        self.stopping = true;
        commands.push(CoreCommand::StopAllJobs);
        true
    }

    fn announce(&self, fired: bool, commands: &mut Vec<CoreCommand>) {
        if fired && self.jobs > 1 {
            commands.push(CoreCommand::AnnounceStopping);
        }
    }
}
