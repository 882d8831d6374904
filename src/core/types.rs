use serde::{Deserialize, Serialize};

/// Which key records are ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Chromosome, then numeric start coordinate
    #[default]
    Positional,
    /// First whitespace-delimited token of the line (e.g. read name)
    ByName,
}

impl std::fmt::Display for SortMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Positional => write!(f, "positional"),
            Self::ByName => write!(f, "by-name"),
        }
    }
}

/// How line terminators are written to the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LineEndingPolicy {
    /// Keep each line's own terminator
    #[default]
    Preserve,
    /// Rewrite every terminator as `\n`
    Lf,
    /// Rewrite every terminator as `\r\n`
    CrLf,
}
