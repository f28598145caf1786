// src/types.rs

//! Small value types shared across the crate.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::{Result, TofailError};

/// The command under test: program path followed by its arguments.
///
/// Always non-empty. Cloning is cheap; all attempts of all jobs share the
/// same argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    argv: Arc<[String]>,
}

impl Command {
    pub fn new<I, S>(argv: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = argv.into_iter().map(Into::into).collect();
        if argv.is_empty() {
            return Err(TofailError::InvalidCommand(
                "missing command (at least the program is required)".to_string(),
            ));
        }
        if argv[0].is_empty() {
            return Err(TofailError::InvalidCommand(
                "program name must not be empty".to_string(),
            ));
        }
        Ok(Self { argv: argv.into() })
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.argv)
    }
}

/// Per-attempt time budget. `Duration::ZERO` disables it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AttemptTimeout(Duration);

impl AttemptTimeout {
    pub const DISABLED: AttemptTimeout = AttemptTimeout(Duration::ZERO);

    pub fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    pub fn duration(self) -> Duration {
        self.0
    }

    pub fn is_enabled(self) -> bool {
        !self.0.is_zero()
    }
}

impl fmt::Display for AttemptTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_enabled() {
            write!(f, "{:?}", self.0)
        } else {
            f.write_str("disabled")
        }
    }
}
