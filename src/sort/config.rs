use std::path::{Path, PathBuf};

use crate::core::comparator::{ChromosomeOrder, RecordComparator};
use crate::core::types::{LineEndingPolicy, SortMode};
use crate::parsing::format::Format;
use crate::sort::error::ConfigError;
use crate::utils::validation::{
    validate_chunk_size, validate_merge_fan_in, validate_temp_directory, validate_threads,
};

/// Default maximum records held in memory per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 500_000;

/// Default maximum spill files open at once during a merge.
pub const DEFAULT_MERGE_FAN_IN: usize = 256;

/// Default number of skipped lines reported individually.
pub const DEFAULT_MAX_REPORTED_SKIPS: usize = 1_000;

/// Settings for one sort run.
///
/// Fixed for the whole run: every chunk and the merge see the same format,
/// mode and chromosome order.
#[derive(Debug, Clone)]
pub struct SortConfig {
    /// Input format; inferred from the input path when `None`
    pub format: Option<Format>,
    pub sort_mode: SortMode,
    /// Maximum records per in-memory chunk
    pub chunk_size_limit: usize,
    /// Where the run's spill directory is created; system temp dir when `None`
    pub temp_directory: Option<PathBuf>,
    pub chromosome_order: ChromosomeOrder,
    /// Chunks sorted and spilled concurrently
    pub threads: usize,
    pub line_endings: LineEndingPolicy,
    /// Deflate spill files at the fastest level
    pub compress_spills: bool,
    /// Spill files merged at once; more trigger intermediate merge passes
    pub merge_fan_in: usize,
    /// Skipped lines listed individually in the result (the count is always exact)
    pub max_reported_skips: usize,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            format: None,
            sort_mode: SortMode::Positional,
            chunk_size_limit: DEFAULT_CHUNK_SIZE,
            temp_directory: None,
            chromosome_order: ChromosomeOrder::Lexical,
            threads: 1,
            line_endings: LineEndingPolicy::Preserve,
            compress_spills: false,
            merge_fan_in: DEFAULT_MERGE_FAN_IN,
            max_reported_skips: DEFAULT_MAX_REPORTED_SKIPS,
        }
    }
}

impl SortConfig {
    #[must_use]
    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    #[must_use]
    pub fn sort_mode(mut self, mode: SortMode) -> Self {
        self.sort_mode = mode;
        self
    }

    #[must_use]
    pub fn chunk_size_limit(mut self, records: usize) -> Self {
        self.chunk_size_limit = records;
        self
    }

    #[must_use]
    pub fn temp_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.temp_directory = Some(path.into());
        self
    }

    #[must_use]
    pub fn chromosome_order(mut self, order: ChromosomeOrder) -> Self {
        self.chromosome_order = order;
        self
    }

    #[must_use]
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    #[must_use]
    pub fn line_endings(mut self, policy: LineEndingPolicy) -> Self {
        self.line_endings = policy;
        self
    }

    #[must_use]
    pub fn compress_spills(mut self, enabled: bool) -> Self {
        self.compress_spills = enabled;
        self
    }

    #[must_use]
    pub fn merge_fan_in(mut self, files: usize) -> Self {
        self.merge_fan_in = files;
        self
    }

    #[must_use]
    pub fn max_reported_skips(mut self, count: usize) -> Self {
        self.max_reported_skips = count;
        self
    }

    /// Directory under which spill files are created.
    #[must_use]
    pub fn temp_root(&self) -> PathBuf {
        self.temp_directory
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    #[must_use]
    pub fn comparator(&self) -> RecordComparator {
        RecordComparator::new(self.chromosome_order.clone())
    }

    /// Check the configuration and resolve the format for `input`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for an unknown or invalid format, a zero chunk
    /// size or thread count, a fan-in below 2, or a missing or unwritable
    /// temp directory.
    pub fn validate(&self, input: &Path) -> Result<Format, ConfigError> {
        let format = Format::resolve(self.format.as_ref(), input)?;
        format.validate()?;
        validate_chunk_size(self.chunk_size_limit)?;
        validate_threads(self.threads)?;
        validate_merge_fan_in(self.merge_fan_in)?;
        validate_temp_directory(&self.temp_root())?;
        Ok(format)
    }
}
