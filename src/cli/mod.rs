use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pit38")]
#[command(
    version,
    about = "Trading212 tax calculator for Polish PIT-38 filings"
)]
#[command(
    long_about = "Calculate Polish capital-gains and dividend tax from Trading212 CSV exports: \
FIFO lot matching for realized gains, per-country dividend aggregation, and PIT-38/PIT-ZG form data."
)]
pub struct Cli {
    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Output results in JSON format
    #[arg(long = "json", global = true)]
    pub json: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a TOML settings file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse Trading212 CSV exports and resolve exchange rates and countries
    Process {
        /// CSV file or directory containing CSV files
        input: PathBuf,

        /// Output path for the normalized CSV (default: data/processed_data.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Calculate FIFO gains and dividend tax from a normalized CSV
    Calculate {
        /// Normalized CSV produced by `process`
        input: PathBuf,

        /// Directory for the report files (default: output/)
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Restrict sales and dividends to one tax year (buys always count)
        #[arg(short = 'y', long)]
        year: Option<i32>,
    },

    /// Process and calculate in one run
    All {
        /// CSV file or directory containing CSV files
        input: PathBuf,

        /// Output path for the normalized CSV (default: data/processed_data.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory for the report files (default: output/)
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Restrict sales and dividends to one tax year (buys always count)
        #[arg(short = 'y', long)]
        year: Option<i32>,
    },
}
