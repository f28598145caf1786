// src/exec/process.rs

//! Real executor backed by `tokio::process`.

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use tokio::process::Child;
use tracing::debug;

use crate::errors::{Result, TofailError};
use crate::exec::backend::{BoxFuture, Completion, Executor, IO_FAILURE_EXIT_CODE, Started};
use crate::exec::sink::OutputSink;
use crate::types::Command;

/// Spawns the command as an OS process, writing sinks into `output_dir`.
///
/// Children are *not* killed when their handle is dropped: a timed-out
/// process is left running so the operator can inspect it.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    output_dir: PathBuf,
    prefix: String,
}

impl ProcessExecutor {
    pub fn new(output_dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            prefix: prefix.into(),
        }
    }
}

impl Executor for ProcessExecutor {
    type Process = Child;

    fn open_sink(&self) -> Result<OutputSink> {
        OutputSink::create_in(&self.output_dir, &self.prefix).map_err(|source| {
            TofailError::SinkUnavailable {
                dir: self.output_dir.clone(),
                source,
            }
        })
    }

    fn start(&self, command: Command, output: File) -> BoxFuture<'_, io::Result<Started<Child>>> {
        Box::pin(async move {
            let stderr = output.try_clone()?;

            let mut cmd = tokio::process::Command::new(command.program());
            cmd.args(command.args())
                .stdin(Stdio::null())
                .stdout(Stdio::from(output))
                .stderr(Stdio::from(stderr));

            let child = cmd.spawn()?;
            let pid = child
                .id()
                .ok_or_else(|| io::Error::other("process exited before its pid was read"))?;

            debug!(pid, cmd = %command, "spawned process");
            Ok(Started {
                pid,
                process: child,
            })
        })
    }

    fn wait(&self, mut child: Child) -> BoxFuture<'_, Completion> {
        Box::pin(async move {
            match child.wait().await {
                Ok(status) => Completion::Exited(exit_code_of(status)),
                Err(e) => Completion::IoFailure(e),
            }
        })
    }
}

/// Map an exit status to a single code. Signal deaths follow the shell
/// convention of `128 + signal`.
fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    IO_FAILURE_EXIT_CODE
}
