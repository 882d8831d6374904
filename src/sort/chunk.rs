//! Chunked in-memory sorting with spill-to-disk.
//!
//! Records are accumulated up to the chunk limit, then sorted and spilled.
//! With a worker pool, up to one full chunk per pool thread are sorted and
//! written concurrently on the rayon pool, each to its own spill file. Spill
//! files are numbered in input order, which the merge relies on only for
//! reproducible file names; ordering itself comes from the comparator.

use std::io::BufRead;
use std::path::Path;

use rayon::prelude::*;
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::comparator::RecordComparator;
use crate::core::record::{LineRecord, RawLine};
use crate::parsing::extract::KeyExtractor;
use crate::parsing::lines::LineReader;
use crate::sort::config::{DEFAULT_CHUNK_SIZE, DEFAULT_MAX_REPORTED_SKIPS};
use crate::sort::error::{IoResultExt, MalformedRecord, SortError};
use crate::sort::progress::CancellationToken;
use crate::sort::spill::{write_spill, SpillFile};

/// Lines read between progress callbacks.
const PROGRESS_INTERVAL: u64 = 4096;

/// A data line excluded from the output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedLine {
    pub line_number: u64,
    pub reason: String,
}

/// Malformed-line bookkeeping: exact count plus a capped list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipLog {
    pub count: u64,
    pub lines: Vec<SkippedLine>,
    limit: usize,
}

impl SkipLog {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            count: 0,
            lines: Vec::new(),
            limit,
        }
    }

    pub fn record(&mut self, malformed: MalformedRecord) {
        self.count += 1;
        if self.lines.len() < self.limit {
            warn!(line = malformed.line_number, reason = %malformed.reason, "Skipping malformed record");
            self.lines.push(SkippedLine {
                line_number: malformed.line_number,
                reason: malformed.reason,
            });
        }
    }
}

/// Where the sorted data ended up
#[derive(Debug)]
pub enum ChunkOutcome {
    /// Everything fit in one chunk; sorted, never spilled
    InMemory(Vec<LineRecord>),
    /// Sorted spill files, in input order
    Spilled(Vec<SpillFile>),
}

/// Result of the chunking phase
#[derive(Debug)]
pub struct ChunkPhase {
    pub outcome: ChunkOutcome,
    pub records: u64,
    pub skipped: SkipLog,
}

pub struct ChunkSorter<'a> {
    extractor: &'a KeyExtractor,
    comparator: &'a RecordComparator,
    spill_dir: &'a Path,
    cancel: &'a CancellationToken,
    pool: Option<&'a ThreadPool>,
    chunk_size: usize,
    compress: bool,
    max_reported_skips: usize,
}

impl<'a> ChunkSorter<'a> {
    #[must_use]
    pub fn new(
        extractor: &'a KeyExtractor,
        comparator: &'a RecordComparator,
        spill_dir: &'a Path,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            extractor,
            comparator,
            spill_dir,
            cancel,
            pool: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            compress: false,
            max_reported_skips: DEFAULT_MAX_REPORTED_SKIPS,
        }
    }

    /// Set the maximum records per chunk.
    #[must_use]
    pub fn chunk_size(mut self, records: usize) -> Self {
        self.chunk_size = records.max(1);
        self
    }

    /// Sort and spill full chunks concurrently on `pool`.
    #[must_use]
    pub fn pool(mut self, pool: &'a ThreadPool) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Deflate spill files.
    #[must_use]
    pub fn compress(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    /// Cap the skipped lines listed individually.
    #[must_use]
    pub fn max_reported_skips(mut self, count: usize) -> Self {
        self.max_reported_skips = count;
        self
    }

    /// Chunks sorted per batch: one per pool thread.
    fn batch_width(&self) -> usize {
        self.pool.map_or(1, ThreadPool::current_num_threads).max(1)
    }

    /// Sort all data lines, starting with `first` and continuing from `lines`.
    ///
    /// `on_progress` is called periodically with the number of lines read.
    ///
    /// # Errors
    ///
    /// Returns `SortError::Cancelled` if cancellation is requested between
    /// chunks, or an I/O error reading input or writing spill files.
    pub fn run<R: BufRead>(
        &self,
        lines: &mut LineReader<R>,
        first: Option<RawLine>,
        input: &Path,
        mut on_progress: impl FnMut(u64),
    ) -> Result<ChunkPhase, SortError> {
        let mut skipped = SkipLog::new(self.max_reported_skips);
        let mut spills: Vec<SpillFile> = Vec::new();
        let width = self.batch_width();
        let mut pending: Vec<Vec<LineRecord>> = Vec::with_capacity(width);
        let mut current: Vec<LineRecord> = Vec::with_capacity(self.chunk_size.min(1 << 16));
        let mut records = 0u64;
        let mut next = first;

        while let Some(line) = next {
            match self.extractor.extract(line) {
                Ok(record) => {
                    // A full chunk is only set aside once another record
                    // arrives, so input that fits exactly is never spilled.
                    if current.len() >= self.chunk_size {
                        self.cancel.check()?;
                        pending.push(std::mem::take(&mut current));
                        if pending.len() >= width {
                            let batch = std::mem::take(&mut pending);
                            spills.extend(self.spill_batch(batch, spills.len())?);
                        }
                    }
                    current.push(record);
                    records += 1;
                }
                Err(malformed) => skipped.record(malformed),
            }

            if lines.lines_read() % PROGRESS_INTERVAL == 0 {
                on_progress(lines.lines_read());
            }
            next = lines.next_line().at(input)?;
        }
        on_progress(lines.lines_read());
        self.cancel.check()?;

        if !current.is_empty() {
            pending.push(current);
        }

        let outcome = if spills.is_empty() && pending.len() <= 1 {
            let mut chunk = pending.pop().unwrap_or_default();
            debug!(records = chunk.len(), "Input fits in one chunk, sorting in memory");
            self.sort_chunk(&mut chunk);
            ChunkOutcome::InMemory(chunk)
        } else {
            if !pending.is_empty() {
                spills.extend(self.spill_batch(pending, spills.len())?);
            }
            ChunkOutcome::Spilled(spills)
        };

        Ok(ChunkPhase {
            outcome,
            records,
            skipped,
        })
    }

    fn sort_chunk(&self, chunk: &mut [LineRecord]) {
        chunk.sort_unstable_by(|a, b| self.comparator.compare(a, b));
    }

    /// Sort and spill chunks concurrently; results keep batch order.
    fn spill_batch(
        &self,
        batch: Vec<Vec<LineRecord>>,
        first_index: usize,
    ) -> Result<Vec<SpillFile>, SortError> {
        let spill_one = |(offset, mut chunk): (usize, Vec<LineRecord>)| -> Result<SpillFile, SortError> {
            self.sort_chunk(&mut chunk);
            let path = self
                .spill_dir
                .join(format!("chunk_{:05}.spill", first_index + offset));
            let spill = write_spill(&path, &chunk, self.compress)?;
            debug!(
                path = %path.display(),
                records = spill.records,
                bytes = chunk.iter().map(LineRecord::heap_size).sum::<usize>(),
                "Spilled chunk"
            );
            Ok(spill)
        };

        match self.pool {
            Some(pool) if batch.len() > 1 => {
                pool.install(|| batch.into_par_iter().enumerate().map(spill_one).collect())
            }
            _ => batch.into_iter().enumerate().map(spill_one).collect(),
        }
    }
}
