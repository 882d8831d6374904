use std::io::Write;
use std::path::{Path, PathBuf};

use crate::core::record::{LineEnding, LineRecord, RawLine};
use crate::core::types::LineEndingPolicy;
use crate::sort::error::{IoResultExt, SortError};

/// Writes header lines and records, applying the line-ending policy.
pub struct RecordWriter<W: Write> {
    inner: W,
    path: PathBuf,
    policy: LineEndingPolicy,
    /// Terminator for lines that had none in the input
    fallback: LineEnding,
    records: u64,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(inner: W, path: &Path, policy: LineEndingPolicy) -> Self {
        Self {
            inner,
            path: path.to_path_buf(),
            policy,
            fallback: LineEnding::Lf,
            records: 0,
        }
    }

    /// Set the terminator given to unterminated lines (the file's dominant one).
    pub fn set_fallback(&mut self, ending: LineEnding) {
        if ending != LineEnding::Missing {
            self.fallback = ending;
        }
    }

    fn ending(&self, ending: LineEnding) -> LineEnding {
        match self.policy {
            LineEndingPolicy::Lf => LineEnding::Lf,
            LineEndingPolicy::CrLf => LineEnding::CrLf,
            LineEndingPolicy::Preserve if ending == LineEnding::Missing => self.fallback,
            LineEndingPolicy::Preserve => ending,
        }
    }

    fn write_line(&mut self, content: &[u8], ending: LineEnding) -> Result<(), SortError> {
        let ending = self.ending(ending);
        self.inner.write_all(content).at(&self.path)?;
        self.inner.write_all(ending.as_bytes()).at(&self.path)
    }

    /// # Errors
    ///
    /// Returns `SortError::Io`/`OutOfSpace` if the write fails.
    pub fn write_header_line(&mut self, line: &RawLine) -> Result<(), SortError> {
        self.write_line(&line.content, line.ending)
    }

    /// # Errors
    ///
    /// Returns `SortError::Io`/`OutOfSpace` if the write fails.
    pub fn write_record(&mut self, record: &LineRecord) -> Result<(), SortError> {
        self.write_line(&record.text, record.ending)?;
        self.records += 1;
        Ok(())
    }

    /// Data records written so far.
    #[must_use]
    pub fn records_written(&self) -> u64 {
        self.records
    }

    /// Flush and hand back the inner writer.
    ///
    /// # Errors
    ///
    /// Returns `SortError::Io`/`OutOfSpace` if flushing fails.
    pub fn into_inner(mut self) -> Result<W, SortError> {
        self.inner.flush().at(&self.path)?;
        Ok(self.inner)
    }
}
