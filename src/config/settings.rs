// src/config/settings.rs

//! Effective run settings: CLI flags over config file over defaults.

use std::path::PathBuf;

use crate::cli::CliArgs;
use crate::config::model::ConfigFile;
use crate::config::validate::{validate_jobs, validate_output_dir, validate_prefix};
use crate::errors::Result;
use crate::exec::DEFAULT_SINK_PREFIX;
use crate::types::{AttemptTimeout, Command};

#[derive(Debug, Clone)]
pub struct Settings {
    pub command: Command,
    pub jobs: usize,
    pub timeout: AttemptTimeout,
    pub output_dir: PathBuf,
    pub output_prefix: String,
}

impl Settings {
    pub fn resolve(args: &CliArgs, file: Option<&ConfigFile>) -> Result<Self> {
        let command = Command::new(args.command.iter().cloned())?;

        let jobs = args
            .jobs
            .map(|j| j as usize)
            .or_else(|| file.and_then(|f| f.run.jobs))
            .unwrap_or(1);
        validate_jobs(jobs)?;

        let timeout_secs = args
            .timeout
            .or_else(|| file.and_then(|f| f.run.timeout))
            .unwrap_or(0);

        let output_dir = args
            .output_dir
            .clone()
            .or_else(|| file.and_then(|f| f.output.dir.clone()))
            .unwrap_or_else(|| PathBuf::from("."));
        validate_output_dir(&output_dir)?;

        let output_prefix = file
            .and_then(|f| f.output.prefix.clone())
            .unwrap_or_else(|| DEFAULT_SINK_PREFIX.to_string());
        validate_prefix(&output_prefix)?;

        Ok(Self {
            command,
            jobs,
            timeout: AttemptTimeout::from_secs(timeout_secs),
            output_dir,
            output_prefix,
        })
    }
}
