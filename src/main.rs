use clap::Parser;
use tracing_subscriber::EnvFilter;

use interval_sort::cli;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("interval_sort=debug,info")
    } else {
        EnvFilter::new("interval_sort=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        cli::Commands::Sort(args) => {
            cli::sort::run(args, cli.output_format, cli.verbose)?;
        }
        cli::Commands::Check(args) => {
            cli::check::run(args, cli.output_format, cli.verbose)?;
        }
        cli::Commands::Formats => {
            cli::formats::run(cli.output_format)?;
        }
    }

    Ok(())
}
