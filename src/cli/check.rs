use std::path::PathBuf;

use clap::Args;

use crate::cli::common::KeyArgs;
use crate::cli::OutputFormat;
use crate::sort::check::{check_sorted, CheckResult};
use crate::sort::config::SortConfig;

#[derive(Args)]
pub struct CheckArgs {
    /// Input file (may be gzip-compressed)
    #[arg(required = true)]
    pub input: PathBuf,

    #[command(flatten)]
    pub keys: KeyArgs,
}

/// Exits with an error when the input is out of order.
pub fn run(args: CheckArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let config = args.keys.apply(SortConfig::default(), &args.input)?;
    let result = check_sorted(&args.input, &config)?;

    if verbose && result.skipped_count > 0 {
        eprintln!("Ignored {} malformed line(s)", result.skipped_count);
    }

    match format {
        OutputFormat::Text => print_text_result(&args, &result),
        OutputFormat::Json => {
            let output = serde_json::json!({
                "input": args.input.display().to_string(),
                "sorted": result.is_sorted(),
                "result": result,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("sorted\trecords\tskipped_count\tfirst_violation");
            println!(
                "{}\t{}\t{}\t{}",
                result.is_sorted(),
                result.records,
                result.skipped_count,
                result
                    .first_violation
                    .map_or_else(|| "-".to_string(), |v| v.line_number.to_string()),
            );
        }
    }

    if let Some(violation) = result.first_violation {
        anyhow::bail!(
            "{} is not sorted: line {} sorts before line {}",
            args.input.display(),
            violation.line_number,
            violation.previous_line_number
        );
    }
    Ok(())
}

fn print_text_result(args: &CheckArgs, result: &CheckResult) {
    match &result.first_violation {
        None => println!(
            "{}: sorted ({} records, {} skipped)",
            args.input.display(),
            result.records,
            result.skipped_count
        ),
        Some(v) => println!(
            "{}: NOT sorted (line {} sorts before line {})",
            args.input.display(),
            v.line_number,
            v.previous_line_number
        ),
    }
}
