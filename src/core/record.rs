use serde::{Deserialize, Serialize};

/// Line terminator observed on an input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LineEnding {
    /// `\n`
    #[default]
    Lf,
    /// `\r\n`
    CrLf,
    /// Final line of a file with no terminator
    Missing,
}

impl LineEnding {
    /// Split a raw line (as returned by `read_until(b'\n')`) into content and terminator.
    #[must_use]
    pub fn split(raw: &[u8]) -> (&[u8], LineEnding) {
        if let Some(rest) = raw.strip_suffix(b"\r\n") {
            (rest, LineEnding::CrLf)
        } else if let Some(rest) = raw.strip_suffix(b"\n") {
            (rest, LineEnding::Lf)
        } else {
            (raw, LineEnding::Missing)
        }
    }

    #[must_use]
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            LineEnding::Lf => b"\n",
            LineEnding::CrLf => b"\r\n",
            LineEnding::Missing => b"",
        }
    }
}

/// A single line read from the input, before key extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    /// 1-based line number in the input file
    pub number: u64,
    /// Line content without its terminator
    pub content: Vec<u8>,
    pub ending: LineEnding,
}

/// The key a record is ordered by.
///
/// Positional keys order by chromosome then start; name keys order by the
/// first whitespace-delimited token of the line. Chromosomes and names are
/// kept as raw bytes, so any encoding sorts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortKey {
    Position { chromosome: Vec<u8>, start: i64 },
    Name(Vec<u8>),
}

impl SortKey {
    #[must_use]
    pub fn position(chromosome: impl Into<Vec<u8>>, start: i64) -> Self {
        SortKey::Position {
            chromosome: chromosome.into(),
            start,
        }
    }

    #[must_use]
    pub fn name(name: impl Into<Vec<u8>>) -> Self {
        SortKey::Name(name.into())
    }
}

/// An input data line paired with its derived sort key.
///
/// The text is kept exactly as read and is never re-tokenized once the key
/// has been extracted. `line_number` breaks ties between equal keys so that
/// equal records keep their input order across chunks and spill files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRecord {
    pub line_number: u64,
    pub key: SortKey,
    pub text: Vec<u8>,
    pub ending: LineEnding,
}

impl LineRecord {
    /// Build a record from a raw line and an already extracted key.
    #[must_use]
    pub fn new(line: RawLine, key: SortKey) -> Self {
        Self {
            line_number: line.number,
            key,
            text: line.content,
            ending: line.ending,
        }
    }

    /// Approximate heap footprint, used for logging chunk sizes.
    #[must_use]
    pub fn heap_size(&self) -> usize {
        let key = match &self.key {
            SortKey::Position { chromosome, .. } => chromosome.capacity(),
            SortKey::Name(name) => name.capacity(),
        };
        self.text.capacity() + key
    }
}
