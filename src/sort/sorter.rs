//! The sort orchestrator.
//!
//! # Algorithm
//!
//! 1. **Header phase**: copy the format's header block to the output
//! 2. **Chunk phase**: key, sort and spill bounded chunks of data lines
//! 3. **Merge phase**: k-way merge of the spill files after the header,
//!    preceded by intermediate passes when there are more than `merge_fan_in`
//!
//! # Resource discipline
//!
//! Spill files live in a per-run directory created with `tempfile::TempDir`,
//! so they are removed when the run returns on every path. Output is staged
//! in a `NamedTempFile` next to the destination and only renamed into place
//! after the last record is flushed; an aborted run leaves no output file.

use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::record::LineEnding;
use crate::parsing::extract::KeyExtractor;
use crate::parsing::header::split_header;
use crate::parsing::lines::LineReader;
use crate::sort::chunk::{ChunkOutcome, ChunkSorter, SkippedLine};
use crate::sort::config::SortConfig;
use crate::sort::error::{ConfigError, IoResultExt, SortError};
use crate::sort::merge::MergeEngine;
use crate::sort::output::RecordWriter;
use crate::sort::progress::{CancellationToken, ProgressReporter, SortEvent};
use crate::utils::io::{open_input, CompressedWriter, IO_BUFFER_SIZE};

/// Prefix of every file and directory a run creates.
pub const TEMP_PREFIX: &str = "interval-sort-";

/// Summary of a successful run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SortResult {
    /// Data records written to the output
    pub records_written: u64,
    /// Header lines copied to the output
    pub header_lines: u64,
    /// Malformed data lines excluded from the output
    pub skipped_count: u64,
    /// The first skipped lines, with their 1-based line numbers
    pub skipped: Vec<SkippedLine>,
    /// Spill files written (0 when the input fit in one chunk)
    pub chunks_spilled: u64,
    /// Wall-clock seconds spent sorting
    pub elapsed: f64,
}

/// External sorter for line-oriented interval files.
///
/// ```rust,no_run
/// use interval_sort::sort::{SortConfig, Sorter};
/// use std::path::Path;
///
/// let sorter = Sorter::new(SortConfig::default().chunk_size_limit(1_000_000));
/// let result = sorter.sort(Path::new("reads.sam"), Path::new("reads.sorted.sam")).unwrap();
/// println!("{} records, {} skipped", result.records_written, result.skipped_count);
/// ```
pub struct Sorter {
    config: SortConfig,
    events: Option<Sender<SortEvent>>,
    cancel: CancellationToken,
}

impl Sorter {
    #[must_use]
    pub fn new(config: SortConfig) -> Self {
        Self {
            config,
            events: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Deliver lifecycle events to `sender` (never blocks the sort).
    #[must_use]
    pub fn with_events(mut self, sender: Sender<SortEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Use a caller-held cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Sort `input` into `output`.
    ///
    /// On success the output holds the header block followed by every
    /// well-formed data line in order. On any error, including cancellation,
    /// no output file is created and no spill files remain.
    ///
    /// # Errors
    ///
    /// Returns `SortError::Config` before any I/O for invalid settings,
    /// `SortError::Io`/`OutOfSpace`/`SpillCodec` for I/O failures, and
    /// `SortError::Cancelled` if the run was cancelled.
    pub fn sort(&self, input: &Path, output: &Path) -> Result<SortResult, SortError> {
        let mut progress = ProgressReporter::new(self.events.clone());
        progress.emit(SortEvent::Started {
            input: input.to_path_buf(),
        });

        match self.run(input, output, &mut progress) {
            Ok(result) => {
                progress.emit(SortEvent::Completed(result.clone()));
                Ok(result)
            }
            Err(e) => {
                match &e {
                    SortError::Cancelled => info!("Sort cancelled; temporary files removed"),
                    other => warn!("Sort failed: {other}"),
                }
                progress.finish_with_error(&e);
                Err(e)
            }
        }
    }

    fn run(
        &self,
        input: &Path,
        output: &Path,
        progress: &mut ProgressReporter,
    ) -> Result<SortResult, SortError> {
        let started = Instant::now();
        let format = self.config.validate(input)?;
        if same_file(input, output) {
            return Err(ConfigError::SameInputOutput(output.to_path_buf()).into());
        }

        let extractor = KeyExtractor::new(&format, self.config.sort_mode);
        let comparator = self.config.comparator();

        info!(
            input = %input.display(),
            format = format.display_name(),
            mode = %self.config.sort_mode,
            chunk_size = self.config.chunk_size_limit,
            threads = self.config.threads,
            "Starting sort"
        );

        let spill_dir = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempdir_in(self.config.temp_root())
            .at(&self.config.temp_root())?;
        debug!(path = %spill_dir.path().display(), "Created spill directory");

        let input_size = std::fs::metadata(input).at(input)?.len();
        let consumed = Arc::new(AtomicU64::new(0));
        let mut lines = LineReader::new(open_input(input, Arc::clone(&consumed)).at(input)?);

        let output_dir = match output.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let staging = tempfile::Builder::new()
            .prefix(&format!(".{TEMP_PREFIX}"))
            .suffix(".partial")
            .tempfile_in(&output_dir)
            .at(&output_dir)?;

        let stream = CompressedWriter::for_path(
            output,
            BufWriter::with_capacity(IO_BUFFER_SIZE, staging.as_file()),
        );
        let mut writer = RecordWriter::new(stream, output, self.config.line_endings);

        // Header block
        let (header, first) = split_header(&mut lines, &format.header_rule()).at(input)?;
        let dominant = header
            .lines
            .first()
            .map(|l| l.ending)
            .or(first.as_ref().map(|l| l.ending))
            .unwrap_or(LineEnding::Lf);
        writer.set_fallback(dominant);
        for line in &header.lines {
            writer.write_header_line(line)?;
        }
        debug!(lines = header.len(), "Copied header block");

        // Chunk, sort, spill
        info!("Reading and sorting chunks...");
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .build()
            .map_err(|e| SortError::io(input, std::io::Error::other(e)))?;
        let chunker = ChunkSorter::new(&extractor, &comparator, spill_dir.path(), &self.cancel)
            .chunk_size(self.config.chunk_size_limit)
            .pool(&pool)
            .compress(self.config.compress_spills)
            .max_reported_skips(self.config.max_reported_skips);
        let phase = chunker.run(&mut lines, first, input, |_| {
            progress.report(consumed.load(Ordering::Relaxed), input_size, 0, 50);
        })?;
        info!(
            records = phase.records,
            skipped = phase.skipped.count,
            "Read all records"
        );

        // Merge
        let total = phase.records;
        let merger = MergeEngine::new(&comparator, &self.cancel);
        let mut report = |n: u64| progress.report(n, total, 50, 100);
        let chunks_spilled = match phase.outcome {
            ChunkOutcome::InMemory(records) => {
                info!("All records fit in memory, writing sorted chunk");
                merger.write_resident(records, &mut writer, &mut report)?;
                0
            }
            ChunkOutcome::Spilled(spills) => {
                let spilled = spills.len() as u64;
                let spills = merger.reduce(
                    spills,
                    self.config.merge_fan_in,
                    spill_dir.path(),
                    self.config.compress_spills,
                )?;
                info!("Merging {} chunks...", spills.len());
                merger.merge(&spills, &mut writer, &mut report)?;
                spilled
            }
        };
        let records_written = writer.records_written();

        writer.into_inner()?.finish().at(output)?.into_inner().map_err(|e| {
            let error = e.into_error();
            SortError::io(output, error)
        })?;
        self.cancel.check()?;
        staging
            .persist(output)
            .map_err(|e| SortError::io(output, e.error))?;

        if let Err(e) = spill_dir.close() {
            warn!("Failed to remove spill directory: {e}");
        }

        let result = SortResult {
            records_written,
            header_lines: header.len() as u64,
            skipped_count: phase.skipped.count,
            skipped: phase.skipped.lines,
            chunks_spilled,
            elapsed: started.elapsed().as_secs_f64(),
        };
        info!(
            records = result.records_written,
            skipped = result.skipped_count,
            chunks = result.chunks_spilled,
            "Sort complete"
        );
        Ok(result)
    }
}

/// Whether two paths name the same existing file.
fn same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Convenience wrapper: sort with `config` and no event listener.
///
/// # Errors
///
/// See [`Sorter::sort`].
pub fn sort_file(input: &Path, output: &Path, config: SortConfig) -> Result<SortResult, SortError> {
    Sorter::new(config).sort(input, output)
}
