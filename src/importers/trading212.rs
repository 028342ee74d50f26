//! Trading212 CSV export parsing
//!
//! Parsing is split in two: reading the raw CSV rows as shipped by
//! Trading212, and resolving them into model transactions with exchange
//! rates and countries filled in. Rows that fail to parse are logged and
//! skipped; resolution failures leave the affected field `None` for the
//! calculators' validation to report.

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDateTime;
use csv::ReaderBuilder;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::model::transaction::{DividendDetails, TradeDetails, Transaction, TransactionKind};
use crate::services::country::CountryResolver;
use crate::services::rates::RateSource;

/// One row of a Trading212 history export
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "Action")]
    pub action: String,
    #[serde(rename = "Time")]
    pub time: String,
    #[serde(rename = "ISIN", default)]
    pub isin: String,
    #[serde(rename = "Ticker", default)]
    pub ticker: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "No. of shares", default)]
    pub quantity: Option<Decimal>,
    #[serde(rename = "Price / share", default)]
    pub price_per_share: Option<Decimal>,
    #[serde(rename = "Currency (Price / share)", default)]
    pub currency: Option<String>,
    #[serde(rename = "Withholding tax", default)]
    pub withholding_tax: Option<Decimal>,
    #[serde(rename = "Currency conversion fee", default)]
    pub conversion_fee: Option<Decimal>,
    #[serde(rename = "Currency (Currency conversion fee)", default)]
    pub conversion_fee_currency: Option<String>,
    #[serde(rename = "French transaction tax", default)]
    pub french_transaction_tax: Option<Decimal>,
    #[serde(rename = "Currency (French transaction tax)", default)]
    pub french_tax_currency: Option<String>,
}

/// Map a Trading212 action to a transaction kind. Deposits, withdrawals,
/// interest and other cash movements return `None` and are skipped.
fn classify_action(action: &str) -> Option<TransactionKind> {
    match action {
        "Market buy" | "Limit buy" => Some(TransactionKind::Buy),
        "Market sell" | "Limit sell" => Some(TransactionKind::Sell),
        _ if action.contains("Dividend") => Some(TransactionKind::Dividend),
        _ => None,
    }
}

fn parse_time(text: &str) -> Result<NaiveDateTime> {
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%d/%m/%Y %H:%M:%S"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(parsed);
        }
    }
    // Some exports carry date-only timestamps
    if let Ok(date) = chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight);
        }
    }
    Err(anyhow!("could not parse timestamp: {}", text))
}

fn parse_reader<R: Read>(reader: R, source: &str) -> Result<Vec<RawRecord>> {
    let mut csv_reader = ReaderBuilder::new().flexible(true).from_reader(reader);

    let mut records = Vec::new();
    for (idx, result) in csv_reader.deserialize::<RawRecord>().enumerate() {
        match result {
            Ok(record) => records.push(record),
            Err(err) => {
                warn!("{}: skipping row {}: {}", source, idx + 2, err);
            }
        }
    }

    Ok(records)
}

/// Parse a single Trading212 CSV file into raw rows
pub fn parse_file<P: AsRef<Path>>(file_path: P) -> Result<Vec<RawRecord>> {
    let path = file_path.as_ref();
    info!("Parsing Trading212 CSV file: {:?}", path);

    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open CSV file {:?}", path))?;
    parse_reader(file, &path.display().to_string())
}

/// Parse a file, or every `*.csv` inside a directory, into one raw batch
pub fn import_path(path: &Path) -> Result<Vec<RawRecord>> {
    if !path.is_dir() {
        return parse_file(path);
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(path)
        .with_context(|| format!("failed to read directory {:?}", path))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")))
        .collect();
    files.sort();

    if files.is_empty() {
        warn!("no CSV files found in {:?}", path);
    }

    let mut records = Vec::new();
    for file in &files {
        records.extend(parse_file(file)?);
    }

    info!("parsed {} rows from {} files", records.len(), files.len());
    Ok(records)
}

/// Resolve raw rows into model transactions.
///
/// Fills exchange rates (NBP rate of the previous business day), PLN
/// values, fees and the country of domicile. Rows with unclassified
/// actions are skipped; failed lookups leave the field `None`.
pub async fn resolve_transactions(
    records: Vec<RawRecord>,
    rates: &RateSource,
    countries: &CountryResolver,
) -> Result<Vec<Transaction>> {
    let mut transactions = Vec::new();

    for record in records {
        let kind = match classify_action(&record.action) {
            Some(kind) => kind,
            None => {
                debug!("skipping non-trade action: {}", record.action);
                continue;
            }
        };

        let date = match parse_time(&record.time) {
            Ok(date) => date,
            Err(err) => {
                warn!("skipping {} row for {}: {}", record.action, record.ticker, err);
                continue;
            }
        };

        let quantity = record.quantity.unwrap_or(Decimal::ZERO);
        let price_per_share = record.price_per_share.unwrap_or(Decimal::ZERO);
        let currency = record.currency.clone().unwrap_or_else(|| "PLN".to_string());

        let exchange_rate = rates.rate(date.date(), &currency).await?;
        if exchange_rate.is_none() {
            warn!(
                "no exchange rate for {} ({}) on {}",
                record.ticker,
                currency,
                date.date()
            );
        }

        let total_value_foreign = quantity * price_per_share;
        let total_value_pln = exchange_rate.map(|rate| total_value_foreign * rate);

        let mut fees_foreign = Decimal::ZERO;
        let mut fees_pln = Decimal::ZERO;

        if let Some(fee) = record.conversion_fee {
            match record.conversion_fee_currency.as_deref() {
                Some("PLN") | None => fees_pln += fee,
                Some(_) => fees_foreign += fee,
            }
        }
        if let Some(tax) = record.french_transaction_tax {
            match record.french_tax_currency.as_deref() {
                Some("PLN") | None => fees_pln += tax,
                Some(_) => fees_foreign += tax,
            }
        }
        if fees_foreign > Decimal::ZERO {
            if let Some(rate) = exchange_rate {
                fees_pln += fees_foreign * rate;
            }
        }

        let country = if record.isin.is_empty() {
            None
        } else {
            Some(countries.resolve(&record.isin, &record.name))
        };

        let details = TradeDetails {
            date,
            ticker: record.ticker,
            isin: record.isin,
            name: record.name,
            quantity,
            price_per_share,
            currency,
            exchange_rate,
            total_value_foreign: Some(total_value_foreign),
            total_value_pln,
            fees_foreign,
            fees_pln,
            country,
        };

        let transaction = match kind {
            TransactionKind::Buy => Transaction::Buy(details),
            TransactionKind::Sell => Transaction::Sell(details),
            TransactionKind::Dividend => {
                let withholding_tax_foreign = record.withholding_tax;
                let withholding_tax_pln = match (withholding_tax_foreign, exchange_rate) {
                    (Some(withheld), Some(rate)) => Some(withheld * rate),
                    _ => None,
                };
                Transaction::Dividend(DividendDetails {
                    trade: details,
                    withholding_tax_foreign,
                    withholding_tax_pln,
                })
            }
        };

        transactions.push(transaction);
    }

    info!("resolved {} transactions", transactions.len());
    Ok(transactions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::country::CountryRegistry;
    use crate::services::rates::FixedRates;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    const SAMPLE_CSV: &str = "\
Action,Time,ISIN,Ticker,Name,No. of shares,Price / share,Currency (Price / share),Withholding tax,Currency conversion fee,Currency (Currency conversion fee)
Market buy,2021-01-04 14:32:01,US0378331005,AAPL,Apple Inc.,4,120.25,USD,,0.55,PLN
Deposit,2021-01-02 09:00:00,,,,,,,,,
Market sell,2021-06-10 10:05:30,US0378331005,AAPL,Apple Inc.,2,130.00,USD,,,
Dividend (Ordinary),2021-05-07 16:20:00,US0378331005,AAPL,Apple Inc.,4,0.22,USD,0.13,,
";

    fn resolver() -> CountryResolver {
        CountryResolver::new(CountryRegistry::with_defaults(), HashMap::new())
    }

    #[test]
    fn test_classify_action() {
        assert_eq!(classify_action("Market buy"), Some(TransactionKind::Buy));
        assert_eq!(classify_action("Limit sell"), Some(TransactionKind::Sell));
        assert_eq!(
            classify_action("Dividend (Ordinary)"),
            Some(TransactionKind::Dividend)
        );
        assert_eq!(classify_action("Deposit"), None);
        assert_eq!(classify_action("Interest on cash"), None);
    }

    #[test]
    fn test_parse_time_formats() {
        assert!(parse_time("2021-01-04 14:32:01").is_ok());
        assert!(parse_time("2021-01-04 14:32:01.123").is_ok());
        assert!(parse_time("2021-01-04").is_ok());
        assert!(parse_time("not a date").is_err());
    }

    #[test]
    fn test_parse_reader_reads_all_rows() {
        let records = parse_reader(SAMPLE_CSV.as_bytes(), "sample").unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].action, "Market buy");
        assert_eq!(records[0].quantity, Some(dec!(4)));
        assert_eq!(records[1].action, "Deposit");
        assert_eq!(records[1].quantity, None);
    }

    #[tokio::test]
    async fn test_resolve_skips_cash_movements_and_fills_pln_values() {
        let records = parse_reader(SAMPLE_CSV.as_bytes(), "sample").unwrap();
        let rates = RateSource::Fixed(FixedRates::default());

        let transactions = resolve_transactions(records, &rates, &resolver())
            .await
            .unwrap();

        // Deposit row is dropped
        assert_eq!(transactions.len(), 3);

        let buy = transactions[0].details();
        assert_eq!(buy.quantity, dec!(4));
        assert_eq!(buy.exchange_rate, Some(dec!(4)));
        assert_eq!(buy.total_value_foreign, Some(dec!(481.00)));
        assert_eq!(buy.total_value_pln, Some(dec!(1924.00)));
        assert_eq!(buy.fees_pln, dec!(0.55));
        assert_eq!(buy.country.as_deref(), Some("United States (from ISIN)"));

        match &transactions[2] {
            Transaction::Dividend(dividend) => {
                assert_eq!(dividend.withholding_tax_foreign, Some(dec!(0.13)));
                assert_eq!(dividend.withholding_tax_pln, Some(dec!(0.52)));
            }
            other => panic!("expected dividend, got {:?}", other.kind()),
        }
    }
}
