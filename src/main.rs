use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use report_compare::{ComparisonOutcome, Result, ToolError, compare_into};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose)?;

    let output_dir = cli.output_dir.unwrap_or_default();
    let outcome = compare_into(&cli.first, &cli.second, &output_dir)?;
    print_outcome(&outcome, cli.format)
}

fn init_logging(verbose: u8) -> Result<()> {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| ToolError::Logging(err.to_string()))
}

fn print_outcome(outcome: &ComparisonOutcome, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => println!("{}", outcome.message()),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(outcome)?;
            println!("{json}");
        }
    }
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Compare two report definitions and merge them into a workbook when they match."
)]
struct Cli {
    /// First report (.csv, .xml or .json).
    first: PathBuf,

    /// Second report (.csv, .xml or .json).
    second: PathBuf,

    /// Directory the merged workbook is written to. Defaults to the current
    /// directory.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// How the outcome is printed.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}
