//! Verifying that a file is already in sort order.

use std::cmp::Ordering;
use std::path::Path;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::record::SortKey;
use crate::parsing::extract::KeyExtractor;
use crate::parsing::format::Format;
use crate::parsing::header::split_header;
use crate::parsing::lines::LineReader;
use crate::sort::config::SortConfig;
use crate::sort::error::{IoResultExt, SortError};
use crate::utils::io::open_input;

/// A data line that sorts before the record preceding it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderViolation {
    pub line_number: u64,
    pub previous_line_number: u64,
}

/// Outcome of [`check_sorted`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Well-formed data records examined
    pub records: u64,
    /// Malformed data lines ignored
    pub skipped_count: u64,
    pub first_violation: Option<OrderViolation>,
}

impl CheckResult {
    #[must_use]
    pub fn is_sorted(&self) -> bool {
        self.first_violation.is_none()
    }
}

/// Stream `input` and report the first pair of adjacent records out of order.
///
/// Uses the format, mode and chromosome order of `config`; chunking and temp
/// settings are ignored. Equal keys are never a violation. Stops at the first
/// violation.
///
/// # Errors
///
/// Returns `SortError::Config` for an unknown format or `SortError::Io` if the
/// input cannot be read.
pub fn check_sorted(input: &Path, config: &SortConfig) -> Result<CheckResult, SortError> {
    let format = Format::resolve(config.format.as_ref(), input)?;
    format.validate()?;
    let extractor = KeyExtractor::new(&format, config.sort_mode);
    let comparator = config.comparator();

    let mut lines = LineReader::new(open_input(input, Arc::new(AtomicU64::new(0))).at(input)?);
    let (header, first) = split_header(&mut lines, &format.header_rule()).at(input)?;
    debug!(lines = header.len(), "Skipped header block");

    let mut result = CheckResult::default();
    let mut previous: Option<(SortKey, u64)> = None;
    let mut next = first;

    while let Some(line) = next {
        match extractor.extract_key(&line.content) {
            Ok(key) => {
                result.records += 1;
                if let Some((prev_key, prev_line)) = &previous {
                    if comparator.compare_keys(&key, prev_key) == Ordering::Less {
                        result.first_violation = Some(OrderViolation {
                            line_number: line.number,
                            previous_line_number: *prev_line,
                        });
                        break;
                    }
                }
                previous = Some((key, line.number));
            }
            Err(_) => result.skipped_count += 1,
        }
        next = lines.next_line().at(input)?;
    }

    match &result.first_violation {
        None => info!(records = result.records, "Input is sorted"),
        Some(v) => info!(
            line = v.line_number,
            previous = v.previous_line_number,
            "Input is not sorted"
        ),
    }
    Ok(result)
}
