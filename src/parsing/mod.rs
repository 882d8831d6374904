//! Format plugins for line-oriented interval files.
//!
//! Each supported [`Format`](format::Format) declares its key columns and how
//! its header block is recognised. This module provides:
//!
//! - **Format table**: column indices, header rules, inference from file names
//! - **Header splitting**: leading header/comment lines, copied verbatim
//! - **Key extraction**: `(chromosome, start)` or name keys from data lines
//! - **Chromosome orders**: rank tables from `.dict`, `.fai`, SAM headers or name lists
//!
//! ## Example
//!
//! ```rust
//! use interval_sort::core::types::SortMode;
//! use interval_sort::parsing::extract::KeyExtractor;
//! use interval_sort::parsing::format::Format;
//! use interval_sort::core::record::SortKey;
//!
//! let extractor = KeyExtractor::new(&Format::Sam, SortMode::Positional);
//! let key = extractor.extract_key(b"read1\t0\tchr1\t100\t60").unwrap();
//! assert_eq!(key, SortKey::position("chr1", 100));
//! ```
//!
//! ## Built-in layouts
//!
//! | Format | Chromosome | Start | Header lines |
//! |--------|------------|-------|--------------|
//! | SAM    | 2          | 3     | `@`          |
//! | BED    | 0          | 1     | `#`, `track`, `browser` |
//! | GFF    | 0          | 3     | `#`          |
//! | VCF    | 0          | 1     | `#`          |
//! | PSL    | 13         | 15    | `psLayout`, `match`, `-`, `track`, `browser`, `#`, blank |
//! | IGV    | 0          | 1     | `#` + title row |
//! | CN     | 1          | 2     | `#` + title row |

pub mod chrom_order;
pub mod extract;
pub mod format;
pub mod header;
pub mod lines;
