use crate::cli::OutputFormat;
use crate::parsing::format::Format;

pub fn run(format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            println!("{:<10} {:<30} {:>6} {:>6}", "FORMAT", "EXTENSIONS", "CHROM", "START");
            println!("{}", "-".repeat(55));
            for f in Format::builtin() {
                let (chromosome, start) = f.columns();
                println!(
                    "{:<10} {:<30} {:>6} {:>6}",
                    f.display_name(),
                    f.extensions().join(", "),
                    chromosome,
                    start
                );
            }
            println!("\nColumns are 0-based. Use --format custom for other layouts.");
        }
        OutputFormat::Json => {
            let formats: Vec<_> = Format::builtin()
                .iter()
                .map(|f| {
                    let (chromosome, start) = f.columns();
                    serde_json::json!({
                        "name": f.display_name(),
                        "extensions": f.extensions(),
                        "chromosome_column": chromosome,
                        "start_column": start,
                        "header_prefixes": f.header_rule().prefixes,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&formats)?);
        }
        OutputFormat::Tsv => {
            println!("name\textensions\tchromosome_column\tstart_column");
            for f in Format::builtin() {
                let (chromosome, start) = f.columns();
                println!(
                    "{}\t{}\t{}\t{}",
                    f.display_name(),
                    f.extensions().join(","),
                    chromosome,
                    start
                );
            }
        }
    }
    Ok(())
}
