//! Sort-key extraction from raw data lines.
//!
//! Extraction is a pure function of the line and the configured columns, so
//! one [`KeyExtractor`] can be shared by any number of workers.

use crate::core::record::{LineRecord, RawLine, SortKey};
use crate::core::types::SortMode;
use crate::parsing::format::Format;
use crate::sort::error::MalformedRecord;

/// Field delimiter for every supported format.
pub const DELIMITER: u8 = b'\t';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyExtractor {
    mode: SortMode,
    chromosome_column: usize,
    start_column: usize,
}

impl KeyExtractor {
    #[must_use]
    pub fn new(format: &Format, mode: SortMode) -> Self {
        let (chromosome_column, start_column) = format.columns();
        Self {
            mode,
            chromosome_column,
            start_column,
        }
    }

    /// Key a line, consuming it into a [`LineRecord`].
    ///
    /// # Errors
    ///
    /// Returns `MalformedRecord` if the line is blank, lacks the key
    /// columns, or has a non-numeric start.
    pub fn extract(&self, line: RawLine) -> Result<LineRecord, MalformedRecord> {
        let key = self.extract_key(&line.content).map_err(|reason| MalformedRecord {
            line_number: line.number,
            reason,
        })?;
        Ok(LineRecord::new(line, key))
    }

    /// Key for a line's content, with a human-readable reason on failure.
    ///
    /// # Errors
    ///
    /// Returns the reason the line cannot be keyed.
    pub fn extract_key(&self, content: &[u8]) -> Result<SortKey, String> {
        if content.iter().all(u8::is_ascii_whitespace) {
            return Err("empty line".to_string());
        }

        match self.mode {
            SortMode::ByName => {
                let name = content
                    .split(u8::is_ascii_whitespace)
                    .find(|token| !token.is_empty())
                    .unwrap_or_default();
                Ok(SortKey::name(name))
            }
            SortMode::Positional => {
                let needed = self.chromosome_column.max(self.start_column) + 1;
                let mut chromosome = None;
                let mut start = None;
                let mut count = 0;

                for (i, field) in content.split(|&b| b == DELIMITER).enumerate().take(needed) {
                    if i == self.chromosome_column {
                        chromosome = Some(field);
                    }
                    if i == self.start_column {
                        start = Some(field);
                    }
                    count = i + 1;
                }

                let (Some(chromosome), Some(start)) = (chromosome, start) else {
                    return Err(format!(
                        "expected at least {needed} tab-delimited columns, found {count}"
                    ));
                };

                let start = parse_start(start).ok_or_else(|| {
                    format!(
                        "invalid start position '{}'",
                        String::from_utf8_lossy(start)
                    )
                })?;

                Ok(SortKey::position(chromosome, start))
            }
        }
    }
}

fn parse_start(field: &[u8]) -> Option<i64> {
    std::str::from_utf8(field).ok()?.trim().parse().ok()
}
