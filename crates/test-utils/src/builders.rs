#![allow(dead_code)]

use std::path::Path;

use tofail::config::{ConfigFile, OutputSection, RawConfigFile, RunSection};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                run: RunSection::default(),
                output: OutputSection::default(),
            },
        }
    }

    pub fn jobs(mut self, jobs: usize) -> Self {
        self.config.run.jobs = Some(jobs);
        self
    }

    pub fn timeout(mut self, secs: u64) -> Self {
        self.config.run.timeout = Some(secs);
        self
    }

    pub fn output_dir(mut self, dir: &Path) -> Self {
        self.config.output.dir = Some(dir.to_path_buf());
        self
    }

    pub fn prefix(mut self, prefix: &str) -> Self {
        self.config.output.prefix = Some(prefix.to_string());
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
