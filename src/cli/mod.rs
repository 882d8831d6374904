//! Command-line interface for interval-sort.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **sort**: Sort an interval file by chromosome and start, or by name
//! - **check**: Verify that a file is already sorted
//! - **formats**: List the built-in formats and their key columns
//!
//! ## Usage
//!
//! ```text
//! # Sort a BED file with natural chromosome order
//! interval-sort sort peaks.bed peaks.sorted.bed --chrom-order natural
//!
//! # Sort a SAM file in its own @SQ order, four worker threads
//! interval-sort sort reads.sam reads.sorted.sam --chrom-order header --threads 4
//!
//! # Sort a file with an unrecognised extension
//! interval-sort sort data.txt out.txt --format custom --chrom-column 2 --start-column 4
//!
//! # JSON summary for scripting
//! interval-sort --output-format json sort calls.vcf.gz calls.sorted.vcf.gz
//! ```

use clap::{Parser, Subcommand};

pub mod check;
pub mod common;
pub mod formats;
pub mod sort;

#[derive(Parser)]
#[command(name = "interval-sort")]
#[command(version)]
#[command(about = "Sort genomic interval files that do not fit in memory")]
#[command(
    long_about = "interval-sort orders line-oriented genomic files (SAM, BED, GFF, VCF, PSL, IGV, CN) by chromosome and start position, or by record name.\n\nInputs larger than memory are sorted in bounded chunks spilled to temporary files and merged. Header lines are kept at the top, malformed lines are skipped and reported, and the output only appears once the sort has fully succeeded."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Report format
    #[arg(short = 'o', long, global = true, default_value = "text")]
    pub output_format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sort an interval file
    Sort(sort::SortArgs),

    /// Check whether a file is already sorted
    Check(check::CheckArgs),

    /// List supported input formats
    Formats,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}
