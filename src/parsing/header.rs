//! Splitting the leading header block off a line-oriented file.

use std::io::{self, BufRead};

use crate::core::record::RawLine;
use crate::parsing::format::HeaderRule;
use crate::parsing::lines::LineReader;

/// Header lines of an input, in original order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderBlock {
    pub lines: Vec<RawLine>,
}

impl HeaderBlock {
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Header content joined with `\n`, for parsers that want text.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for line in &self.lines {
            text.push_str(&String::from_utf8_lossy(&line.content));
            text.push('\n');
        }
        text
    }
}

/// Consume the header block and return it with the first data line.
///
/// Lines are taken while they match `rule`; with a title row, the first
/// non-matching line is also part of the header. The returned data line is
/// `None` when the input holds nothing but header.
///
/// # Errors
///
/// Returns any error from the underlying reader.
pub fn split_header<R: BufRead>(
    reader: &mut LineReader<R>,
    rule: &HeaderRule<'_>,
) -> io::Result<(HeaderBlock, Option<RawLine>)> {
    let mut header = HeaderBlock::default();

    while let Some(line) = reader.next_line()? {
        if rule.is_header_line(&line.content) {
            header.lines.push(line);
            continue;
        }

        if rule.title_row {
            header.lines.push(line);
            return Ok((header, reader.next_line()?));
        }
        return Ok((header, Some(line)));
    }

    Ok((header, None))
}
