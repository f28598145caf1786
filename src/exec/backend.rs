// src/exec/backend.rs

//! Pluggable executor abstraction.
//!
//! A [`Job`](crate::engine::Job) never touches `tokio::process` directly; it
//! talks to an [`Executor`]. Production code uses
//! [`ProcessExecutor`](super::ProcessExecutor); tests provide executors whose
//! start results and completions are scripted.

use std::fs::File;
use std::future::Future;
use std::io;
use std::pin::Pin;

use crate::errors::Result;
use crate::exec::sink::OutputSink;
use crate::types::Command;

/// Boxed, sendable future used at the trait seams.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Exit code reported when waiting for the process failed with an I/O error.
///
/// This is not a real exit status; it means "exit code unknown".
pub const IO_FAILURE_EXIT_CODE: i32 = -1;

/// A process that was started successfully.
#[derive(Debug)]
pub struct Started<P> {
    pub pid: u32,
    pub process: P,
}

/// How a started process ended.
#[derive(Debug)]
pub enum Completion {
    Exited(i32),
    IoFailure(io::Error),
}

impl Completion {
    pub fn is_success(&self) -> bool {
        matches!(self, Completion::Exited(0))
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Completion::Exited(code) => *code,
            Completion::IoFailure(_) => IO_FAILURE_EXIT_CODE,
        }
    }
}

/// Capability to run the command under test.
pub trait Executor: Send + Sync + 'static {
    /// Handle to a running process, consumed by [`Executor::wait`].
    type Process: Send + 'static;

    /// Create a fresh sink for the next attempt.
    ///
    /// An error here is fatal for the whole run.
    fn open_sink(&self) -> Result<OutputSink>;

    /// Start `command` with stdout and stderr both redirected into `output`.
    fn start(
        &self,
        command: Command,
        output: File,
    ) -> BoxFuture<'_, io::Result<Started<Self::Process>>>;

    /// Wait until the process terminates.
    fn wait(&self, process: Self::Process) -> BoxFuture<'_, Completion>;
}
