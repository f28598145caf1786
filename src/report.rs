// src/report.rs

//! Operator-facing output.
//!
//! The supervisor tells a [`Reporter`] what happened; [`ConsoleReporter`]
//! prints it to stdout. Diagnostics go through `tracing` (stderr) instead.

use std::io::{self, Stdout, Write};
use std::path::Path;

use tracing::warn;

use crate::engine::RunSummary;
use crate::types::Command;

pub trait Reporter: Send {
    fn banner(&mut self, command: &Command, jobs: usize);
    fn failed_to_execute(&mut self, command: &Command);
    /// `output` is the complete captured stdout/stderr of the failed attempt.
    fn failure(&mut self, index: usize, exit_code: i32, output: &str);
    fn timeout(&mut self, pid: u32, output_file: &Path);
    fn stopping_all(&mut self);
    fn interrupted(&mut self);
    fn summary(&mut self, summary: &RunSummary);
}

/// Plain-text reporter.
#[derive(Debug)]
pub struct ConsoleReporter<W: Write + Send = Stdout> {
    out: W,
}

impl ConsoleReporter<Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write + Send> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        let res = self
            .out
            .write_all(text.as_bytes())
            .and_then(|()| self.out.flush());
        if let Err(e) = res {
            warn!(error = %e, "failed to write report");
        }
    }
}

impl<W: Write + Send> Reporter for ConsoleReporter<W> {
    fn banner(&mut self, command: &Command, jobs: usize) {
        self.emit(&format!(
            "Executing command {command} repeatedly in {jobs} job(s)\n"
        ));
    }

    fn failed_to_execute(&mut self, _command: &Command) {
        self.emit("Failed to execute command!\n");
    }

    fn failure(&mut self, index: usize, exit_code: i32, output: &str) {
        let mut text = format!(
            "\n>> Failure #{index} encountered! Exit code: {exit_code}. Output:\n{output}"
        );
        if !output.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&format!(
            "<< (#{index} output end, exit code {exit_code})\n"
        ));
        self.emit(&text);
    }

    fn timeout(&mut self, pid: u32, output_file: &Path) {
        self.emit(&format!(
            "\nTimeout encountered! PID is {pid}, process is connected to output file '{}'\n\
             The output file will not be deleted automatically.\n",
            output_file.display()
        ));
    }

    fn stopping_all(&mut self) {
        self.emit("Quitting all jobs.\n");
    }

    fn interrupted(&mut self) {
        self.emit(">> Ctrl-C signal, quitting all jobs.\n");
    }

    fn summary(&mut self, summary: &RunSummary) {
        self.emit(&format!(
            "Finished after {} attempt(s): {} succeeded, {} failed, {} timed out{}\n",
            summary.attempts,
            summary.successes,
            summary.failures,
            summary.timeouts,
            if summary.interrupted { " (interrupted)" } else { "" }
        ));
    }
}
