// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`backend`] defines the [`Executor`] capability used by jobs.
//! - [`process`] is the production implementation on `tokio::process`.
//! - [`sink`] owns the per-attempt output files.

pub mod backend;
pub mod process;
pub mod sink;

pub use backend::{BoxFuture, Completion, Executor, IO_FAILURE_EXIT_CODE, Started};
pub use process::ProcessExecutor;
pub use sink::{DEFAULT_SINK_PREFIX, OutputSink};
