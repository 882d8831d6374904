//! External merge sort of interval files.
//!
//! [`Sorter`] drives a run: the header block is copied through, data lines
//! are keyed and sorted in bounded chunks (spilled to a private temp
//! directory when they do not fit), and the chunks are merged into a staged
//! output file that is renamed into place on success.

pub mod check;
pub mod chunk;
pub mod config;
pub mod error;
pub mod merge;
pub mod output;
pub mod progress;
pub mod sorter;
pub mod spill;

pub use check::{check_sorted, CheckResult, OrderViolation};
pub use chunk::SkippedLine;
pub use config::SortConfig;
pub use error::{ConfigError, ErrorKind, SortError};
pub use progress::{CancellationToken, SortEvent};
pub use sorter::{sort_file, SortResult, Sorter};
