use std::io::{self, BufRead};

use crate::core::record::{LineEnding, RawLine};

/// Forward-only reader yielding numbered [`RawLine`]s.
pub struct LineReader<R> {
    inner: R,
    line_number: u64,
    buf: Vec<u8>,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            line_number: 0,
            buf: Vec::with_capacity(256),
        }
    }

    /// Number of lines read so far.
    #[must_use]
    pub fn lines_read(&self) -> u64 {
        self.line_number
    }

    /// Read the next line, or `None` at end of input.
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying reader.
    pub fn next_line(&mut self) -> io::Result<Option<RawLine>> {
        self.buf.clear();
        if self.inner.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(None);
        }
        self.line_number += 1;

        let (content, ending) = LineEnding::split(&self.buf);
        Ok(Some(RawLine {
            number: self.line_number,
            content: content.to_vec(),
            ending,
        }))
    }
}
