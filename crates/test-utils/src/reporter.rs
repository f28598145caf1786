use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tofail::engine::RunSummary;
use tofail::report::Reporter;
use tofail::types::Command;

/// Everything a [`RecordingReporter`] was told.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    Banner { jobs: usize },
    FailedToExecute,
    Failure { index: usize, exit_code: i32, output: String },
    Timeout { pid: u32, path: PathBuf },
    StoppingAll,
    Interrupted,
    Summary(RunSummary),
}

/// Reporter that records instead of printing. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    log: Arc<Mutex<Vec<Report>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<Report> {
        self.log.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Report) -> bool) -> usize {
        self.log.lock().unwrap().iter().filter(|r| pred(r)).count()
    }

    fn push(&self, report: Report) {
        self.log.lock().unwrap().push(report);
    }
}

impl Reporter for RecordingReporter {
    fn banner(&mut self, _command: &Command, jobs: usize) {
        self.push(Report::Banner { jobs });
    }

    fn failed_to_execute(&mut self, _command: &Command) {
        self.push(Report::FailedToExecute);
    }

    fn failure(&mut self, index: usize, exit_code: i32, output: &str) {
        self.push(Report::Failure {
            index,
            exit_code,
            output: output.to_string(),
        });
    }

    fn timeout(&mut self, pid: u32, output_file: &Path) {
        self.push(Report::Timeout {
            pid,
            path: output_file.to_path_buf(),
        });
    }

    fn stopping_all(&mut self) {
        self.push(Report::StoppingAll);
    }

    fn interrupted(&mut self) {
        self.push(Report::Interrupted);
    }

    fn summary(&mut self, summary: &RunSummary) {
        self.push(Report::Summary(*summary));
    }
}
