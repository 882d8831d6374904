//! Core data types for sorting line-oriented interval files.
//!
//! - [`LineRecord`](record::LineRecord): an opaque input line plus its sort key
//! - [`SortKey`](record::SortKey): positional `(chromosome, start)` or name key
//! - [`RecordComparator`](comparator::RecordComparator): the total order used for a run
//! - [`ChromosomeOrder`](comparator::ChromosomeOrder): lexical, natural or ranked chromosome order

pub mod comparator;
pub mod record;
pub mod types;
