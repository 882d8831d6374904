//! Centralized validation and helper functions.

use std::path::Path;

use crate::sort::error::ConfigError;

/// Maximum number of names accepted in a chromosome order table (DOS protection)
pub const MAX_CHROMOSOMES: usize = 100_000;

/// Largest accepted column index for key extraction
pub const MAX_COLUMN_INDEX: usize = 1_000;

/// Check if adding another chromosome name would exceed the maximum allowed.
///
/// Call this with the current count BEFORE adding a new name.
/// Returns an error message if adding would exceed the limit, None if safe to add.
#[must_use]
pub fn check_chromosome_limit(count: usize) -> Option<String> {
    if count >= MAX_CHROMOSOMES {
        Some(format!(
            "Too many chromosomes: adding another would exceed maximum of {MAX_CHROMOSOMES}"
        ))
    } else {
        None
    }
}

/// Validate the per-chunk record limit.
///
/// # Errors
///
/// Returns `ConfigError::InvalidChunkSize` if `records` is zero.
pub fn validate_chunk_size(records: usize) -> Result<(), ConfigError> {
    if records == 0 {
        return Err(ConfigError::InvalidChunkSize(records));
    }
    Ok(())
}

/// Validate the worker thread count.
///
/// # Errors
///
/// Returns `ConfigError::InvalidThreads` if `threads` is zero.
pub fn validate_threads(threads: usize) -> Result<(), ConfigError> {
    if threads == 0 {
        return Err(ConfigError::InvalidThreads(threads));
    }
    Ok(())
}

/// Validate the number of spill files merged at once.
///
/// # Errors
///
/// Returns `ConfigError::InvalidFanIn` if `fan_in` is below 2.
pub fn validate_merge_fan_in(fan_in: usize) -> Result<(), ConfigError> {
    if fan_in < 2 {
        return Err(ConfigError::InvalidFanIn(fan_in));
    }
    Ok(())
}

/// Check that spill files can be created in `dir`.
///
/// Creates (and immediately deletes) an anonymous temporary file there.
///
/// # Errors
///
/// Returns `ConfigError::TempDirectory` if the directory does not exist, is
/// not a directory, or is not writable.
pub fn validate_temp_directory(dir: &Path) -> Result<(), ConfigError> {
    let fail = |reason: String| ConfigError::TempDirectory {
        path: dir.to_path_buf(),
        reason,
    };

    let metadata = std::fs::metadata(dir).map_err(|e| fail(e.to_string()))?;
    if !metadata.is_dir() {
        return Err(fail("not a directory".to_string()));
    }

    tempfile::tempfile_in(dir)
        .map(drop)
        .map_err(|e| fail(format!("not writable ({e})")))
}

/// Whether a path names a gzip-compressed file.
#[must_use]
pub fn is_gzip_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gz") || e.eq_ignore_ascii_case("bgz"))
}
