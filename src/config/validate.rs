// src/config/validate.rs

use std::path::Path;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, TofailError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = TofailError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.run, raw.output))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    if let Some(jobs) = cfg.run.jobs {
        validate_jobs(jobs)?;
    }
    if let Some(ref prefix) = cfg.output.prefix {
        validate_prefix(prefix)?;
    }
    if let Some(ref dir) = cfg.output.dir {
        validate_output_dir(dir)?;
    }
    Ok(())
}

pub fn validate_jobs(jobs: usize) -> Result<()> {
    if jobs == 0 {
        return Err(TofailError::ConfigError(
            "jobs must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() {
        return Err(TofailError::ConfigError(
            "[output].prefix must not be empty".to_string(),
        ));
    }
    if prefix.contains(['/', '\\']) {
        return Err(TofailError::ConfigError(format!(
            "[output].prefix must be a plain file name prefix (got '{prefix}')"
        )));
    }
    Ok(())
}

pub fn validate_output_dir(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Err(TofailError::ConfigError(format!(
            "output directory {:?} does not exist or is not a directory",
            dir
        )));
    }
    Ok(())
}
