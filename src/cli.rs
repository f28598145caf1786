// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `tofail`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "tofail",
    version,
    about = "Run a command over and over until it fails or hangs.",
    long_about = None
)]
pub struct CliArgs {
    /// Number of concurrent jobs running the command.
    ///
    /// Default: 1 (or `[run].jobs` from the config file).
    #[arg(short = 'j', long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub jobs: Option<u32>,

    /// Seconds after which an attempt counts as stuck and its PID is printed.
    ///
    /// 0 disables the timeout (the default).
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Directory for the per-attempt output files (default: current directory).
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Path to a config file (TOML).
    ///
    /// Default: `Tofail.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TOFAIL_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// The command to run, followed by its arguments.
    #[arg(
        value_name = "COMMAND",
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_command_keeps_its_own_flags() {
        let args = CliArgs::try_parse_from(["tofail", "-j", "4", "sh", "-c", "exit 3"]).unwrap();
        assert_eq!(args.jobs, Some(4));
        assert_eq!(args.command, vec!["sh", "-c", "exit 3"]);
    }

    #[test]
    fn defaults_are_left_to_settings() {
        let args = CliArgs::try_parse_from(["tofail", "true"]).unwrap();
        assert_eq!(args.jobs, None);
        assert_eq!(args.timeout, None);
        assert_eq!(args.command, vec!["true"]);
    }

    #[test]
    fn timeout_is_parsed_in_seconds() {
        let args = CliArgs::try_parse_from(["tofail", "--timeout", "1", "sleep", "5"]).unwrap();
        assert_eq!(args.timeout, Some(1));
    }

    #[test]
    fn zero_jobs_is_rejected() {
        assert!(CliArgs::try_parse_from(["tofail", "-j", "0", "true"]).is_err());
    }

    #[test]
    fn command_is_required() {
        assert!(CliArgs::try_parse_from(["tofail", "-j", "2"]).is_err());
    }
}
