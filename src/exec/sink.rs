// src/exec/sink.rs

//! Output sinks: one file per attempt that receives both stdout and stderr.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

/// Prefix used for sink files unless configured otherwise.
pub const DEFAULT_SINK_PREFIX: &str = ".tofail_oup";

/// A freshly created, exclusively owned output file.
///
/// The file lives on disk until [`OutputSink::dispose`] is called. Dropping a
/// sink (or calling [`OutputSink::preserve`]) leaves the file in place, which
/// is what timed-out attempts rely on.
#[derive(Debug)]
pub struct OutputSink {
    path: PathBuf,
    file: File,
}

impl OutputSink {
    /// Create a uniquely named sink file in `dir`, named `<prefix><random>`.
    pub fn create_in(dir: &Path, prefix: &str) -> io::Result<Self> {
        let (file, path) = tempfile::Builder::new()
            .prefix(prefix)
            .tempfile_in(dir)?
            .keep()
            .map_err(|e| e.error)?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A new handle to the underlying file, for a child process to write to.
    pub fn writer(&self) -> io::Result<File> {
        self.file.try_clone()
    }

    /// Re-read everything written to the sink so far.
    pub fn read_output(&self) -> io::Result<String> {
        let bytes = fs::read(&self.path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Close and delete the file.
    pub fn dispose(self) -> io::Result<()> {
        let Self { path, file } = self;
        drop(file);
        fs::remove_file(path)
    }

    /// Close the file but keep it on disk, returning where it lives.
    pub fn preserve(self) -> PathBuf {
        self.path
    }
}
