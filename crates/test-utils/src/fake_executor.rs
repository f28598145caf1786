use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use tofail::errors::{Result, TofailError};
use tofail::exec::{BoxFuture, Completion, Executor, OutputSink, Started};
use tofail::types::Command;

/// Behaviour of one fake attempt.
#[derive(Debug, Clone)]
pub enum FakeAttempt {
    /// Write `output`, sleep `after`, then exit with `code`.
    Exit {
        code: i32,
        output: String,
        after: Duration,
    },
    /// Start, then report an I/O failure while waiting.
    IoFailure,
    /// Fail to start.
    Unlaunchable,
}

impl FakeAttempt {
    pub fn ok() -> Self {
        Self::exit(0)
    }

    pub fn exit(code: i32) -> Self {
        FakeAttempt::Exit {
            code,
            output: String::new(),
            after: Duration::ZERO,
        }
    }

    pub fn with_output(self, text: &str) -> Self {
        match self {
            FakeAttempt::Exit { code, after, .. } => FakeAttempt::Exit {
                code,
                output: text.to_string(),
                after,
            },
            other => other,
        }
    }

    pub fn after(self, delay: Duration) -> Self {
        match self {
            FakeAttempt::Exit { code, output, .. } => FakeAttempt::Exit {
                code,
                output,
                after: delay,
            },
            other => other,
        }
    }
}

type Script = dyn Fn(u64) -> FakeAttempt + Send + Sync;

/// An executor that never spawns processes.
///
/// The script is called with a 0-based attempt counter shared by all jobs
/// using this executor and decides what that attempt does.
pub struct FakeExecutor {
    dir: PathBuf,
    script: Box<Script>,
    sink_limit: Option<u64>,
    stats: Arc<FakeStats>,
}

#[derive(Debug, Default)]
pub struct FakeStats {
    sinks: AtomicU64,
    attempts: AtomicU64,
    next_pid: AtomicU32,
}

impl FakeStats {
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl FakeExecutor {
    pub fn new<F>(dir: &Path, script: F) -> Self
    where
        F: Fn(u64) -> FakeAttempt + Send + Sync + 'static,
    {
        Self {
            dir: dir.to_path_buf(),
            script: Box::new(script),
            sink_limit: None,
            stats: Arc::new(FakeStats {
                sinks: AtomicU64::new(0),
                attempts: AtomicU64::new(0),
                next_pid: AtomicU32::new(1000),
            }),
        }
    }

    /// Every attempt behaves the same.
    pub fn always(dir: &Path, attempt: FakeAttempt) -> Self {
        Self::new(dir, move |_| attempt.clone())
    }

    /// Only the first `limit` sinks can be created; later ones fail as if
    /// the output directory had become unusable.
    pub fn with_sink_limit(mut self, limit: u64) -> Self {
        self.sink_limit = Some(limit);
        self
    }

    pub fn stats(&self) -> Arc<FakeStats> {
        Arc::clone(&self.stats)
    }
}

impl Executor for FakeExecutor {
    type Process = FakeAttempt;

    fn open_sink(&self) -> Result<OutputSink> {
        let n = self.stats.sinks.fetch_add(1, Ordering::SeqCst);
        if self.sink_limit.is_some_and(|limit| n >= limit) {
            return Err(TofailError::SinkUnavailable {
                dir: self.dir.clone(),
                source: io::Error::other("fake sink limit reached"),
            });
        }
        OutputSink::create_in(&self.dir, ".tofail_oup").map_err(|source| {
            TofailError::SinkUnavailable {
                dir: self.dir.clone(),
                source,
            }
        })
    }

    fn start(
        &self,
        _command: Command,
        mut output: File,
    ) -> BoxFuture<'_, io::Result<Started<FakeAttempt>>> {
        let n = self.stats.attempts.fetch_add(1, Ordering::SeqCst);
        let attempt = (self.script)(n);

        Box::pin(async move {
            match attempt {
                FakeAttempt::Unlaunchable => Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    "fake program not found",
                )),
                attempt => {
                    if let FakeAttempt::Exit { output: ref text, .. } = attempt {
                        output.write_all(text.as_bytes())?;
                        output.flush()?;
                    }
                    let pid = self.stats.next_pid.fetch_add(1, Ordering::SeqCst);
                    Ok(Started {
                        pid,
                        process: attempt,
                    })
                }
            }
        })
    }

    fn wait(&self, process: FakeAttempt) -> BoxFuture<'_, Completion> {
        Box::pin(async move {
            match process {
                FakeAttempt::Exit { code, after, .. } => {
                    if !after.is_zero() {
                        tokio::time::sleep(after).await;
                    }
                    Completion::Exited(code)
                }
                FakeAttempt::IoFailure => {
                    Completion::IoFailure(io::Error::other("fake broken pipe"))
                }
                FakeAttempt::Unlaunchable => {
                    Completion::IoFailure(io::Error::other("unlaunchable attempt waited on"))
                }
            }
        })
    }
}
