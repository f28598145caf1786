use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tofail::errors::{Result, TofailError};
use tofail::exec::{BoxFuture, Completion, Executor, OutputSink, Started};
use tofail::types::Command;

/// What the next `start` call returns.
#[derive(Debug)]
pub enum StartScript {
    Started { pid: u32 },
    Failed,
}

/// An executor whose every step is fed by the test.
///
/// `start` blocks until the test pushes a [`StartScript`], `wait` blocks until
/// the test pushes a [`Completion`]. This mirrors a process whose launch and
/// exit happen exactly when the test says so.
pub struct ScriptedExecutor {
    dir: PathBuf,
    starts: tokio::sync::Mutex<mpsc::UnboundedReceiver<StartScript>>,
    completions: tokio::sync::Mutex<mpsc::UnboundedReceiver<Completion>>,
    stats: Arc<ScriptStats>,
}

/// Test-side end of a [`ScriptedExecutor`].
#[derive(Clone)]
pub struct ScriptControl {
    starts: mpsc::UnboundedSender<StartScript>,
    completions: mpsc::UnboundedSender<Completion>,
    stats: Arc<ScriptStats>,
}

#[derive(Default)]
struct ScriptStats {
    commands: Mutex<Vec<Command>>,
    start_calls: AtomicUsize,
    wait_calls: AtomicUsize,
    completions_delivered: AtomicUsize,
}

impl ScriptedExecutor {
    /// Sinks are created inside `dir`, which the test owns.
    pub fn new(dir: &Path) -> (Self, ScriptControl) {
        let (start_tx, start_rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        let stats = Arc::new(ScriptStats::default());

        let executor = Self {
            dir: dir.to_path_buf(),
            starts: tokio::sync::Mutex::new(start_rx),
            completions: tokio::sync::Mutex::new(done_rx),
            stats: Arc::clone(&stats),
        };
        let control = ScriptControl {
            starts: start_tx,
            completions: done_tx,
            stats,
        };
        (executor, control)
    }
}

impl ScriptControl {
    pub fn start(&self, pid: u32) {
        self.starts
            .send(StartScript::Started { pid })
            .expect("scripted executor dropped");
    }

    pub fn fail_start(&self) {
        self.starts
            .send(StartScript::Failed)
            .expect("scripted executor dropped");
    }

    pub fn complete(&self, completion: Completion) {
        self.completions
            .send(completion)
            .expect("scripted executor dropped");
    }

    pub fn exit(&self, code: i32) {
        self.complete(Completion::Exited(code));
    }

    pub fn commands(&self) -> Vec<Command> {
        self.stats.commands.lock().unwrap().clone()
    }

    pub fn start_calls(&self) -> usize {
        self.stats.start_calls.load(Ordering::SeqCst)
    }

    pub fn wait_calls(&self) -> usize {
        self.stats.wait_calls.load(Ordering::SeqCst)
    }

    /// Completions that a `wait` call actually picked up.
    pub fn completions_delivered(&self) -> usize {
        self.stats.completions_delivered.load(Ordering::SeqCst)
    }
}

impl Executor for ScriptedExecutor {
    type Process = u32;

    fn open_sink(&self) -> Result<OutputSink> {
        OutputSink::create_in(&self.dir, "scripted").map_err(|source| {
            TofailError::SinkUnavailable {
                dir: self.dir.clone(),
                source,
            }
        })
    }

    fn start(&self, command: Command, _output: File) -> BoxFuture<'_, io::Result<Started<u32>>> {
        Box::pin(async move {
            self.stats.start_calls.fetch_add(1, Ordering::SeqCst);
            self.stats.commands.lock().unwrap().push(command);

            match self.starts.lock().await.recv().await {
                Some(StartScript::Started { pid }) => Ok(Started { pid, process: pid }),
                Some(StartScript::Failed) => Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    "could not launch",
                )),
                None => Err(io::Error::other("start script closed")),
            }
        })
    }

    fn wait(&self, _pid: u32) -> BoxFuture<'_, Completion> {
        Box::pin(async move {
            self.stats.wait_calls.fetch_add(1, Ordering::SeqCst);
            let next = self.completions.lock().await.recv().await;
            self.stats.completions_delivered.fetch_add(1, Ordering::SeqCst);
            next.unwrap_or_else(|| Completion::IoFailure(io::Error::other("completion script closed")))
        })
    }
}
