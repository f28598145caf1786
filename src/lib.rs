// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod report;
pub mod timer;
pub mod types;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::{Settings, load_optional};
use crate::engine::{RunSummary, Supervisor};
use crate::errors::Result;
use crate::exec::ProcessExecutor;
use crate::report::ConsoleReporter;
use crate::timer::TokioTimer;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and settings resolution
/// - the process executor and wall-clock timer
/// - Ctrl-C handling
/// - the supervisor and its jobs
pub async fn run(args: CliArgs) -> Result<RunSummary> {
    let file = load_optional(args.config.as_deref())?;
    let settings = Settings::resolve(&args, file.as_ref())?;
    info!(
        cmd = %settings.command,
        jobs = settings.jobs,
        timeout = %settings.timeout,
        output_dir = %settings.output_dir.display(),
        "resolved settings"
    );

    let executor = ProcessExecutor::new(settings.output_dir, settings.output_prefix);

    // Ctrl-C -> stop-all. Every press is forwarded so each one is acknowledged.
    let (interrupt_tx, interrupt_rx) = mpsc::channel::<()>(8);
    tokio::spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            if interrupt_tx.send(()).await.is_err() {
                return;
            }
        }
    });

    let supervisor = Supervisor::new(
        settings.command,
        settings.jobs,
        settings.timeout,
        executor,
        TokioTimer,
        ConsoleReporter::stdout(),
    );
    supervisor.run(interrupt_rx).await
}
