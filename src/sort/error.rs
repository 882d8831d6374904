use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Problems detected before any file I/O begins
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unable to infer file format from '{0}'; specify one explicitly")]
    UnknownFormat(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid chunk size {0}: must be at least 1 record")]
    InvalidChunkSize(usize),

    #[error("Invalid thread count {0}: must be at least 1")]
    InvalidThreads(usize),

    #[error("Invalid merge fan-in {0}: must be at least 2")]
    InvalidFanIn(usize),

    #[error("Temporary directory {}: {reason}", path.display())]
    TempDirectory { path: PathBuf, reason: String },

    #[error("Input and output refer to the same file: {}", .0.display())]
    SameInputOutput(PathBuf),

    #[error("Invalid chromosome order: {0}")]
    ChromosomeOrder(String),

    #[error("Invalid column layout: {0}")]
    Columns(String),
}

/// Fatal errors of a sort run.
///
/// Every variant is reported only after the run has removed its spill files
/// and any partially written output.
#[derive(Error, Debug)]
pub enum SortError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Out of disk space writing {}: {source}", path.display())]
    OutOfSpace {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Corrupt spill file {}: {source}", path.display())]
    SpillCodec {
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },

    #[error("Sort cancelled")]
    Cancelled,
}

/// Coarse classification reported to callers in `failed` events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    IoFailure,
    OutOfSpace,
    Cancelled,
    ConfigurationError,
}

impl SortError {
    /// Wrap an I/O error for `path`, classifying a full disk as `OutOfSpace`.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::StorageFull {
            SortError::OutOfSpace { path, source }
        } else {
            SortError::Io { path, source }
        }
    }

    /// Wrap a bincode error; I/O failures underneath are reported as I/O.
    pub fn spill(path: impl Into<PathBuf>, source: bincode::Error) -> Self {
        match *source {
            bincode::ErrorKind::Io(e) => SortError::io(path, e),
            other => SortError::SpillCodec {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            SortError::Config(_) => ErrorKind::ConfigurationError,
            SortError::Io { .. } | SortError::SpillCodec { .. } => ErrorKind::IoFailure,
            SortError::OutOfSpace { .. } => ErrorKind::OutOfSpace,
            SortError::Cancelled => ErrorKind::Cancelled,
        }
    }
}

/// Attach a path to `io::Result`s, like `anyhow::Context` for [`SortError`].
pub trait IoResultExt<T> {
    /// # Errors
    ///
    /// Returns the wrapped error as a [`SortError`] naming `path`.
    fn at(self, path: &Path) -> Result<T, SortError>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn at(self, path: &Path) -> Result<T, SortError> {
        self.map_err(|e| SortError::io(path, e))
    }
}

/// A data line that could not be keyed; skipped, never fatal
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Malformed record on line {line_number}: {reason}")]
pub struct MalformedRecord {
    pub line_number: u64,
    pub reason: String,
}
