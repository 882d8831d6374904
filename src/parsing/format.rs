use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::sort::error::ConfigError;
use crate::utils::validation::MAX_COLUMN_INDEX;

/// Supported line-oriented formats
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    /// SAM alignments (`@` header lines)
    Sam,
    /// BED, bedGraph and other BED-like tables
    Bed,
    /// GFF2/GFF3/GTF feature files
    Gff,
    /// VCF variant calls
    Vcf,
    /// BLAT PSL alignments
    Psl,
    /// IGV `.igv` data files
    Igv,
    /// Copy-number / SNP tables (`.cn`, `.xcn`, `.snp`)
    Cn,
    /// Caller-defined column layout
    Custom(CustomFormat),
}

/// Column layout for formats without a built-in plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomFormat {
    /// 0-based column holding the chromosome
    pub chromosome_column: usize,
    /// 0-based column holding the start coordinate
    pub start_column: usize,
    /// Leading lines beginning with any of these are header lines
    pub header_prefixes: Vec<String>,
}

impl Default for CustomFormat {
    fn default() -> Self {
        Self {
            chromosome_column: 0,
            start_column: 1,
            header_prefixes: vec!["#".to_string()],
        }
    }
}

/// How the header block at the top of a file is recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRule<'a> {
    /// Lines starting with any of these prefixes are header lines
    pub prefixes: Vec<&'a str>,
    /// Blank lines inside the header block belong to it
    pub blank_lines: bool,
    /// The first line after the prefixed lines is a column-title row
    pub title_row: bool,
}

impl<'a> HeaderRule<'a> {
    fn prefixed(prefixes: &[&'a str]) -> Self {
        Self {
            prefixes: prefixes.to_vec(),
            blank_lines: false,
            title_row: false,
        }
    }

    /// Whether `line` belongs to the header block by prefix (or blankness).
    #[must_use]
    pub fn is_header_line(&self, line: &[u8]) -> bool {
        if self.blank_lines && line.iter().all(u8::is_ascii_whitespace) {
            return true;
        }
        self.prefixes.iter().any(|p| line.starts_with(p.as_bytes()))
    }
}

impl Format {
    /// All built-in formats, for listings.
    #[must_use]
    pub fn builtin() -> [Format; 7] {
        [
            Format::Sam,
            Format::Bed,
            Format::Gff,
            Format::Vcf,
            Format::Psl,
            Format::Igv,
            Format::Cn,
        ]
    }

    /// Get the display name for this format
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Format::Sam => "SAM",
            Format::Bed => "BED",
            Format::Gff => "GFF/GTF",
            Format::Vcf => "VCF",
            Format::Psl => "PSL",
            Format::Igv => "IGV",
            Format::Cn => "CN/SNP",
            Format::Custom(_) => "Custom",
        }
    }

    /// File extensions recognised for this format.
    #[must_use]
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Format::Sam => &["sam"],
            Format::Bed => &["bed", "bedgraph", "bdg", "aligned"],
            Format::Gff => &["gff", "gff3", "gtf"],
            Format::Vcf => &["vcf"],
            Format::Psl => &["psl", "pslx"],
            Format::Igv => &["igv"],
            Format::Cn => &["cn", "xcn", "snp"],
            Format::Custom(_) => &[],
        }
    }

    /// 0-based `(chromosome, start)` columns.
    #[must_use]
    pub fn columns(&self) -> (usize, usize) {
        match self {
            Format::Sam => (2, 3),
            Format::Bed | Format::Vcf | Format::Igv => (0, 1),
            Format::Gff => (0, 3),
            Format::Psl => (13, 15),
            Format::Cn => (1, 2),
            Format::Custom(custom) => (custom.chromosome_column, custom.start_column),
        }
    }

    #[must_use]
    pub fn header_rule(&self) -> HeaderRule<'_> {
        match self {
            Format::Sam => HeaderRule::prefixed(&["@"]),
            Format::Bed => HeaderRule::prefixed(&["#", "track", "browser"]),
            Format::Gff | Format::Vcf => HeaderRule::prefixed(&["#"]),
            Format::Psl => HeaderRule {
                blank_lines: true,
                ..HeaderRule::prefixed(&["psLayout", "match", "-", "track", "browser", "#"])
            },
            Format::Igv | Format::Cn => HeaderRule {
                title_row: true,
                ..HeaderRule::prefixed(&["#"])
            },
            Format::Custom(custom) => HeaderRule {
                prefixes: custom.header_prefixes.iter().map(String::as_str).collect(),
                blank_lines: false,
                title_row: false,
            },
        }
    }

    /// Check a caller-defined layout.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Columns` if the chromosome and start columns
    /// coincide or are implausibly large.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (chromosome, start) = self.columns();
        if chromosome == start {
            return Err(ConfigError::Columns(format!(
                "chromosome and start both use column {chromosome}"
            )));
        }
        if chromosome.max(start) > MAX_COLUMN_INDEX {
            return Err(ConfigError::Columns(format!(
                "column index exceeds maximum of {MAX_COLUMN_INDEX}"
            )));
        }
        Ok(())
    }

    /// Infer the format from a file name, ignoring a trailing `.gz`.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Format> {
        let name = path.file_name()?.to_str()?.to_lowercase();
        let name = name
            .strip_suffix(".gz")
            .or_else(|| name.strip_suffix(".bgz"))
            .unwrap_or(&name);
        let extension = Path::new(name).extension()?.to_str()?;

        Format::builtin()
            .into_iter()
            .find(|format| format.extensions().contains(&extension))
    }

    /// Resolve an explicit format or infer one from `path`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownFormat` if no format was given and none
    /// matches the file name.
    pub fn resolve(explicit: Option<&Format>, path: &Path) -> Result<Format, ConfigError> {
        match explicit {
            Some(format) => Ok(format.clone()),
            None => Format::from_path(path)
                .ok_or_else(|| ConfigError::UnknownFormat(path.display().to_string())),
        }
    }
}

impl std::str::FromStr for Format {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Format::builtin()
            .into_iter()
            .find(|f| {
                f.display_name().eq_ignore_ascii_case(&lower) || f.extensions().contains(&lower.as_str())
            })
            .ok_or_else(|| ConfigError::UnsupportedFormat(s.to_string()))
    }
}
