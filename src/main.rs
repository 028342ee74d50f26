mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use pit38::config::Settings;
use pit38::importers;
use pit38::model::country::CountryRegistry;
use pit38::model::transaction::Transaction;
use pit38::reports;
use pit38::services::country::CountryResolver;
use pit38::services::rates::RateSource;
use pit38::tax::TaxCalculator;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; -v raises the default level to debug
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!cli.no_color)
        .init();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Process { input, output } => {
            let output = output.unwrap_or_else(|| settings.default_processed_file());
            handle_process(&settings, &input, &output).await?;
        }

        Commands::Calculate {
            input,
            report,
            year,
        } => {
            let transactions = importers::read_processed(&input)?;
            let report_dir = report.unwrap_or_else(|| settings.output_dir.clone());
            handle_calculate(&settings, &transactions, &report_dir, year, cli.json)?;
        }

        Commands::All {
            input,
            output,
            report,
            year,
        } => {
            let output = output.unwrap_or_else(|| settings.default_processed_file());
            let transactions = handle_process(&settings, &input, &output).await?;
            let report_dir = report.unwrap_or_else(|| settings.output_dir.clone());
            handle_calculate(&settings, &transactions, &report_dir, year, cli.json)?;
        }
    }

    Ok(())
}

/// Parse raw exports, resolve rates and countries, write the normalized CSV
async fn handle_process(
    settings: &Settings,
    input: &Path,
    output: &Path,
) -> Result<Vec<Transaction>> {
    info!("processing {:?} into {:?}", input, output);

    let records = importers::import_path(input)?;
    if records.is_empty() {
        println!("{} No rows found in {:?}", "!".yellow().bold(), input);
    }

    let rates = RateSource::from_env(&settings.nbp_base_url);
    let countries = CountryResolver::new(
        CountryRegistry::with_defaults(),
        settings.country_overrides.clone(),
    );

    let transactions = importers::resolve_transactions(records, &rates, &countries).await?;

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {:?}", parent))?;
        }
    }
    importers::write_processed(output, &transactions)?;

    println!(
        "\n{} Processed {} transactions into {:?}",
        "✓".green().bold(),
        transactions.len(),
        output
    );

    Ok(transactions)
}

/// Run the calculators, print the results, and write the report files
fn handle_calculate(
    settings: &Settings,
    transactions: &[Transaction],
    report_dir: &Path,
    year: Option<i32>,
    json: bool,
) -> Result<()> {
    info!(
        "calculating taxes for {} transactions (tax year: {:?})",
        transactions.len(),
        year
    );

    let calculator = TaxCalculator::new(settings.tax_rate);
    let result = calculator.run(transactions, year);
    let forms = calculator.forms(&result);

    if json {
        #[derive(serde::Serialize)]
        struct JsonOutput<'a> {
            fifo: &'a pit38::tax::FifoReport,
            dividends: &'a pit38::tax::DividendReport,
            forms: &'a pit38::tax::TaxFormData,
        }
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonOutput {
                fifo: &result.fifo,
                dividends: &result.dividends,
                forms: &forms,
            })?
        );
    } else {
        reports::print_issues("FIFO calculation issues", &result.fifo.issues);
        reports::print_issues("Dividend calculation issues", &result.dividends.issues);
        reports::print_fifo_report(&result.fifo);
        reports::print_dividend_report(&result.dividends);
        reports::print_summary(&forms);
    }

    reports::write_report_files(report_dir, &result.fifo, &result.dividends, &forms)?;
    if !json {
        println!(
            "\n{} Tax report saved to {:?}",
            "✓".green().bold(),
            report_dir
        );
    }

    Ok(())
}
