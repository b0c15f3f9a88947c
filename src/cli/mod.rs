use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use fxstatement::rates::normalize_date;

pub mod formatters;
pub mod runner;

#[derive(Parser, Debug)]
#[command(name = "fxstatement")]
#[command(
    version,
    about = "Adds historical exchange rates and converted amounts to broker statements"
)]
#[command(
    long_about = "Reads broker statement workbooks (Account Activity, Closed Positions, Dividends), \
appends the exchange rate in effect on each transaction date with formula-based conversions, \
and adds a Tax Summary sheet. Rates come from the MNB rate table or a saved rates file."
)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Output results in JSON format
    #[arg(long = "json", global = true)]
    pub json: bool,

    /// Log progress to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Enrich statement workbooks (the default command)
    Enrich(EnrichArgs),

    /// Fetch and print the rate series for a date range
    Rates {
        /// First date (YYYY-MM-DD or DD/MM/YYYY)
        #[arg(long, value_parser = parse_cli_date)]
        from: NaiveDate,

        /// Last date (YYYY-MM-DD or DD/MM/YYYY)
        #[arg(long, value_parser = parse_cli_date)]
        to: NaiveDate,

        /// Currency to fetch instead of the configured source currency
        #[arg(long)]
        currency: Option<String>,
    },

    /// Show the sheets, bounds and header columns of a workbook
    Inspect {
        /// Path to the xlsx file
        file: PathBuf,
    },
}

#[derive(Args, Debug, Default, Clone)]
pub struct EnrichArgs {
    /// Statement files to process; defaults to every xlsx in the input directory
    pub files: Vec<PathBuf>,

    /// Directory scanned for statements when no files are given
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// Directory the enriched workbooks are written to
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Suffix appended to output file names
    #[arg(long)]
    pub suffix: Option<String>,

    /// Use rates from a JSON file (as printed by `rates --json`) instead of fetching
    #[arg(long)]
    pub rates_file: Option<PathBuf>,
}

fn parse_cli_date(raw: &str) -> Result<NaiveDate, String> {
    normalize_date(raw).map_err(|e| e.to_string())
}
