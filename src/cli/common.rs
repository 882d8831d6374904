//! Arguments shared by `sort` and `check`.

use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};

use crate::core::comparator::ChromosomeOrder;
use crate::core::types::SortMode;
use crate::parsing::chrom_order::{load_chromosome_order, order_from_input_header};
use crate::parsing::format::{CustomFormat, Format};
use crate::sort::config::SortConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FormatChoice {
    Sam,
    Bed,
    Gff,
    Vcf,
    Psl,
    Igv,
    Cn,
    /// Columns and header prefixes given by --chrom-column, --start-column, --header-prefix
    Custom,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OrderChoice {
    /// Byte-wise comparison of names
    Lexical,
    /// chr2 before chr10
    Natural,
    /// The @SQ order in the input's own header
    Header,
}

#[derive(Args, Debug)]
pub struct KeyArgs {
    /// Input format (inferred from the file extension when omitted)
    #[arg(short, long)]
    pub format: Option<FormatChoice>,

    /// 0-based chromosome column for --format custom
    #[arg(long, default_value_t = 0)]
    pub chrom_column: usize,

    /// 0-based start column for --format custom
    #[arg(long, default_value_t = 1)]
    pub start_column: usize,

    /// Header line prefix for --format custom (repeatable)
    #[arg(long = "header-prefix")]
    pub header_prefixes: Vec<String>,

    /// Sort by the first column (e.g. read name) instead of position
    #[arg(long)]
    pub by_name: bool,

    /// Chromosome ordering
    #[arg(long, default_value = "lexical", conflicts_with = "chrom_order_file")]
    pub chrom_order: OrderChoice,

    /// Chromosome order from a .fai, .dict, SAM header or one-name-per-line file
    #[arg(long)]
    pub chrom_order_file: Option<PathBuf>,
}

impl KeyArgs {
    fn format(&self) -> Option<Format> {
        let format = match self.format? {
            FormatChoice::Sam => Format::Sam,
            FormatChoice::Bed => Format::Bed,
            FormatChoice::Gff => Format::Gff,
            FormatChoice::Vcf => Format::Vcf,
            FormatChoice::Psl => Format::Psl,
            FormatChoice::Igv => Format::Igv,
            FormatChoice::Cn => Format::Cn,
            FormatChoice::Custom => {
                let mut custom = CustomFormat {
                    chromosome_column: self.chrom_column,
                    start_column: self.start_column,
                    ..CustomFormat::default()
                };
                if !self.header_prefixes.is_empty() {
                    custom.header_prefixes.clone_from(&self.header_prefixes);
                }
                Format::Custom(custom)
            }
        };
        Some(format)
    }

    /// Apply the key options to `config` for sorting or checking `input`.
    pub fn apply(&self, config: SortConfig, input: &Path) -> anyhow::Result<SortConfig> {
        let mut config = config;
        if let Some(format) = self.format() {
            config = config.format(format);
        }
        if self.by_name {
            config = config.sort_mode(SortMode::ByName);
        }

        let order = if let Some(path) = &self.chrom_order_file {
            ChromosomeOrder::ranked(load_chromosome_order(path)?)
        } else {
            match self.chrom_order {
                OrderChoice::Lexical => ChromosomeOrder::Lexical,
                OrderChoice::Natural => ChromosomeOrder::Natural,
                OrderChoice::Header => {
                    let format = Format::resolve(config.format.as_ref(), input)?;
                    ChromosomeOrder::ranked(order_from_input_header(input, &format)?)
                }
            }
        };
        Ok(config.chromosome_order(order))
    }
}
