//! # interval-sort
//!
//! External sorting for line-oriented genomic interval files.
//!
//! SAM, BED, GFF, VCF and similar text formats are usually consumed in
//! coordinate order, but files produced by upstream tools often are not, and
//! are frequently larger than memory. `interval-sort` orders such files by
//! `(chromosome, start)` or by record name using a chunked external merge
//! sort with bounded memory.
//!
//! ## Features
//!
//! - **Bounded memory**: at most one chunk of records per worker is resident
//! - **Header preservation**: leading header lines are copied through verbatim
//! - **Stable order**: records with equal keys keep their input order
//! - **Lenient parsing**: malformed lines are skipped and reported, not fatal
//! - **Atomic output**: the destination only appears after a successful run
//! - **Chromosome orders**: lexical, natural, or from a `.fai`/`.dict`/SAM header
//!
//! ## Example
//!
//! ```rust,no_run
//! use interval_sort::core::comparator::ChromosomeOrder;
//! use interval_sort::sort::{SortConfig, Sorter};
//! use std::path::Path;
//!
//! let config = SortConfig::default()
//!     .chunk_size_limit(1_000_000)
//!     .chromosome_order(ChromosomeOrder::Natural)
//!     .threads(4);
//!
//! let result = Sorter::new(config)
//!     .sort(Path::new("peaks.bed"), Path::new("peaks.sorted.bed"))
//!     .unwrap();
//! println!("{} records, {} skipped", result.records_written, result.skipped_count);
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Records, sort keys and the record comparator
//! - [`parsing`]: Format table, header splitting, key extraction, chromosome orders
//! - [`sort`]: Configuration, chunking, spill files, merge and the sorter
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod core;
pub mod parsing;
pub mod sort;
pub mod utils;

// Re-export commonly used types for convenience
pub use crate::core::comparator::{ChromosomeOrder, ChromosomeRanks, RecordComparator};
pub use crate::core::types::*;
pub use crate::parsing::format::{CustomFormat, Format};
pub use crate::sort::{
    check_sorted, sort_file, CancellationToken, CheckResult, SortConfig, SortError, SortEvent,
    SortResult, Sorter,
};
