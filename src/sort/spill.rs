//! Spill files: one sorted chunk serialised to disk.
//!
//! Records are bincode-encoded back to back, keys included, so the merge
//! never re-tokenizes line text. Each file is written once by the worker that
//! produced its chunk and only read afterwards.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};

use flate2::read::DeflateDecoder;

use crate::core::record::LineRecord;
use crate::sort::error::{IoResultExt, SortError};
use crate::utils::io::{CompressedWriter, IO_BUFFER_SIZE};

/// A spill file on disk and how many records it holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpillFile {
    pub path: PathBuf,
    pub records: u64,
    pub compressed: bool,
}

/// Streaming writer for one spill file.
///
/// Records must be pushed in sorted order; [`SpillWriter::finish`] flushes
/// the file and returns its [`SpillFile`] descriptor.
pub struct SpillWriter {
    path: PathBuf,
    writer: CompressedWriter<BufWriter<File>>,
    records: u64,
    compressed: bool,
}

impl SpillWriter {
    /// # Errors
    ///
    /// Returns `SortError::Io`/`OutOfSpace` if the file cannot be created.
    pub fn create(path: &Path, compressed: bool) -> Result<Self, SortError> {
        let file = File::create(path).at(path)?;
        let buffered = BufWriter::with_capacity(IO_BUFFER_SIZE, file);
        let writer = if compressed {
            CompressedWriter::fast_deflate(buffered)
        } else {
            CompressedWriter::Plain(buffered)
        };
        Ok(Self {
            path: path.to_path_buf(),
            writer,
            records: 0,
            compressed,
        })
    }

    /// # Errors
    ///
    /// Returns `SortError::SpillCodec` if the record cannot be encoded, or
    /// an I/O error from the underlying file.
    pub fn push(&mut self, record: &LineRecord) -> Result<(), SortError> {
        bincode::serialize_into(&mut self.writer, record)
            .map_err(|e| SortError::spill(&self.path, e))?;
        self.records += 1;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an I/O error if the final flush fails.
    pub fn finish(self) -> Result<SpillFile, SortError> {
        self.writer.finish().at(&self.path)?;
        Ok(SpillFile {
            path: self.path,
            records: self.records,
            compressed: self.compressed,
        })
    }
}

/// Write already-sorted records to a new spill file at `path`.
///
/// # Errors
///
/// Returns `SortError::Io`/`OutOfSpace` if the file cannot be created or
/// written, or `SortError::SpillCodec` if a record cannot be encoded.
pub fn write_spill(
    path: &Path,
    records: &[LineRecord],
    compressed: bool,
) -> Result<SpillFile, SortError> {
    let mut writer = SpillWriter::create(path, compressed)?;
    for record in records {
        writer.push(record)?;
    }
    writer.finish()
}

/// Forward-only cursor over a spill file.
pub struct SpillReader {
    path: PathBuf,
    reader: Box<dyn Read + Send>,
    remaining: u64,
}

impl SpillReader {
    /// # Errors
    ///
    /// Returns `SortError::Io` if the file cannot be opened.
    pub fn open(spill: &SpillFile) -> Result<Self, SortError> {
        let file = File::open(&spill.path).at(&spill.path)?;
        let buffered = BufReader::with_capacity(IO_BUFFER_SIZE, file);
        let reader: Box<dyn Read + Send> = if spill.compressed {
            Box::new(DeflateDecoder::new(buffered))
        } else {
            Box::new(buffered)
        };

        Ok(Self {
            path: spill.path.clone(),
            reader,
            remaining: spill.records,
        })
    }

    /// Next record, or `None` once all records have been read.
    ///
    /// # Errors
    ///
    /// Returns `SortError::Io` or `SortError::SpillCodec` if the file is
    /// unreadable or truncated.
    pub fn next_record(&mut self) -> Result<Option<LineRecord>, SortError> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let record: LineRecord =
            bincode::deserialize_from(&mut self.reader).map_err(|e| SortError::spill(&self.path, e))?;
        self.remaining -= 1;
        Ok(Some(record))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
