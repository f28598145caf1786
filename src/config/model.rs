// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [run]
/// jobs = 4
/// timeout = 30
///
/// [output]
/// dir = "/tmp/flaky"
/// prefix = ".tofail_oup"
/// ```
///
/// Every section and key is optional; command-line flags win over the file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub run: RunSection,

    #[serde(default)]
    pub output: OutputSection,
}

/// `[run]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunSection {
    /// Number of concurrent jobs (>= 1).
    pub jobs: Option<usize>,

    /// Per-attempt timeout in seconds; 0 disables it.
    pub timeout: Option<u64>,
}

/// `[output]` section: where attempt output files go.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    pub dir: Option<PathBuf>,
    pub prefix: Option<String>,
}

/// A validated configuration file. Build it from a [`RawConfigFile`] via
/// `TryFrom`.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub run: RunSection,
    pub output: OutputSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(run: RunSection, output: OutputSection) -> Self {
        Self { run, output }
    }
}
