use std::path::PathBuf;
use std::thread;

use clap::{Args, ValueEnum};
use tracing::info;

use crate::cli::common::KeyArgs;
use crate::cli::OutputFormat;
use crate::core::types::LineEndingPolicy;
use crate::sort::config::{
    SortConfig, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_REPORTED_SKIPS, DEFAULT_MERGE_FAN_IN,
};
use crate::sort::progress::SortEvent;
use crate::sort::sorter::{SortResult, Sorter};

/// Capacity of the progress channel; later events are dropped while it is full
const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LineEndingChoice {
    Preserve,
    Lf,
    Crlf,
}

impl From<LineEndingChoice> for LineEndingPolicy {
    fn from(choice: LineEndingChoice) -> Self {
        match choice {
            LineEndingChoice::Preserve => LineEndingPolicy::Preserve,
            LineEndingChoice::Lf => LineEndingPolicy::Lf,
            LineEndingChoice::Crlf => LineEndingPolicy::CrLf,
        }
    }
}

#[derive(Args)]
pub struct SortArgs {
    /// Input file (may be gzip-compressed)
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output file (gzip-compressed when it ends in .gz)
    #[arg(required = true)]
    pub output: PathBuf,

    #[command(flatten)]
    pub keys: KeyArgs,

    /// Maximum records held in memory per chunk
    #[arg(short = 'm', long, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub max_records: usize,

    /// Directory for temporary spill files (default: system temp dir)
    #[arg(short = 't', long)]
    pub tmp_dir: Option<PathBuf>,

    /// Chunks sorted and spilled in parallel
    #[arg(short = 'j', long, default_value_t = 1)]
    pub threads: usize,

    /// Line terminators in the output
    #[arg(long, default_value = "preserve")]
    pub line_endings: LineEndingChoice,

    /// Compress spill files (less disk, more CPU)
    #[arg(long)]
    pub compress_spills: bool,

    /// Maximum spill files open at once while merging
    #[arg(long, default_value_t = DEFAULT_MERGE_FAN_IN)]
    pub merge_fan_in: usize,

    /// Malformed lines listed individually in the report
    #[arg(long, default_value_t = DEFAULT_MAX_REPORTED_SKIPS)]
    pub max_reported_skips: usize,
}

pub fn run(args: SortArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let mut config = SortConfig::default()
        .chunk_size_limit(args.max_records)
        .threads(args.threads)
        .line_endings(args.line_endings.into())
        .compress_spills(args.compress_spills)
        .merge_fan_in(args.merge_fan_in)
        .max_reported_skips(args.max_reported_skips);
    if let Some(dir) = &args.tmp_dir {
        config = config.temp_directory(dir);
    }
    let config = args.keys.apply(config, &args.input)?;

    let mut sorter = Sorter::new(config);
    let listener = if verbose {
        let (sender, receiver) = crossbeam_channel::bounded(EVENT_CHANNEL_CAPACITY);
        sorter = sorter.with_events(sender);
        Some(thread::spawn(move || {
            for event in receiver {
                if let SortEvent::Progress { percent } = event {
                    info!("Progress: {percent}%");
                }
            }
        }))
    } else {
        None
    };

    let result = sorter.sort(&args.input, &args.output);
    // Closes the channel so the listener drains and exits
    drop(sorter);
    if let Some(handle) = listener {
        let _ = handle.join();
    }
    let result = result?;

    match format {
        OutputFormat::Text => print_text_result(&args, &result),
        OutputFormat::Json => print_json_result(&args, &result)?,
        OutputFormat::Tsv => print_tsv_result(&result),
    }

    Ok(())
}

fn print_text_result(args: &SortArgs, result: &SortResult) {
    println!("Sort Results");
    println!("{}", "=".repeat(60));

    println!("\nInput:  {}", args.input.display());
    println!("Output: {}", args.output.display());
    println!("\n  Records written: {}", result.records_written);
    println!("  Header lines: {}", result.header_lines);
    println!("  Chunks spilled: {}", result.chunks_spilled);
    println!("  Elapsed: {:.2}s", result.elapsed);

    if result.skipped_count > 0 {
        println!("\nSkipped {} malformed line(s):", result.skipped_count);
        for skipped in &result.skipped {
            println!("  line {}: {}", skipped.line_number, skipped.reason);
        }
        let unlisted = result.skipped_count - result.skipped.len() as u64;
        if unlisted > 0 {
            println!("  ... and {unlisted} more");
        }
    }
}

fn print_json_result(args: &SortArgs, result: &SortResult) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "input": args.input.display().to_string(),
        "output": args.output.display().to_string(),
        "result": result,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv_result(result: &SortResult) {
    println!("records_written\theader_lines\tskipped_count\tchunks_spilled\telapsed");
    println!(
        "{}\t{}\t{}\t{}\t{:.3}",
        result.records_written,
        result.header_lines,
        result.skipped_count,
        result.chunks_spilled,
        result.elapsed,
    );
}
