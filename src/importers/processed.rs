//! Normalized transaction CSV
//!
//! The `process` command writes resolved transactions to a flat CSV so the
//! expensive lookups run once; `calculate` reads the same file back. The
//! round trip is lossless for every model field.

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDateTime;
use csv::{Reader, Writer};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::model::transaction::{DividendDetails, TradeDetails, Transaction, TransactionKind};

#[derive(Debug, Serialize, Deserialize)]
struct NormalizedRow {
    kind: String,
    date: NaiveDateTime,
    ticker: String,
    isin: String,
    name: String,
    quantity: Decimal,
    price_per_share: Decimal,
    currency: String,
    exchange_rate: Option<Decimal>,
    total_value_foreign: Option<Decimal>,
    total_value_pln: Option<Decimal>,
    fees_foreign: Decimal,
    fees_pln: Decimal,
    country: Option<String>,
    withholding_tax_foreign: Option<Decimal>,
    withholding_tax_pln: Option<Decimal>,
}

impl From<&Transaction> for NormalizedRow {
    fn from(tx: &Transaction) -> Self {
        let details = tx.details();
        let (withholding_tax_foreign, withholding_tax_pln) = match tx {
            Transaction::Dividend(dividend) => (
                dividend.withholding_tax_foreign,
                dividend.withholding_tax_pln,
            ),
            _ => (None, None),
        };

        Self {
            kind: tx.kind().as_str().to_string(),
            date: details.date,
            ticker: details.ticker.clone(),
            isin: details.isin.clone(),
            name: details.name.clone(),
            quantity: details.quantity,
            price_per_share: details.price_per_share,
            currency: details.currency.clone(),
            exchange_rate: details.exchange_rate,
            total_value_foreign: details.total_value_foreign,
            total_value_pln: details.total_value_pln,
            fees_foreign: details.fees_foreign,
            fees_pln: details.fees_pln,
            country: details.country.clone(),
            withholding_tax_foreign,
            withholding_tax_pln,
        }
    }
}

impl NormalizedRow {
    fn into_transaction(self) -> Result<Transaction> {
        let kind: TransactionKind = self
            .kind
            .parse()
            .map_err(|_| anyhow!("unknown transaction kind: {}", self.kind))?;

        let details = TradeDetails {
            date: self.date,
            ticker: self.ticker,
            isin: self.isin,
            name: self.name,
            quantity: self.quantity,
            price_per_share: self.price_per_share,
            currency: self.currency,
            exchange_rate: self.exchange_rate,
            total_value_foreign: self.total_value_foreign,
            total_value_pln: self.total_value_pln,
            fees_foreign: self.fees_foreign,
            fees_pln: self.fees_pln,
            country: self.country,
        };

        Ok(match kind {
            TransactionKind::Buy => Transaction::Buy(details),
            TransactionKind::Sell => Transaction::Sell(details),
            TransactionKind::Dividend => Transaction::Dividend(DividendDetails {
                trade: details,
                withholding_tax_foreign: self.withholding_tax_foreign,
                withholding_tax_pln: self.withholding_tax_pln,
            }),
        })
    }
}

/// Write resolved transactions to the normalized CSV
pub fn write_processed(path: &Path, transactions: &[Transaction]) -> Result<()> {
    let mut writer = Writer::from_path(path)
        .with_context(|| format!("failed to create {:?}", path))?;

    for tx in transactions {
        writer.serialize(NormalizedRow::from(tx))?;
    }
    writer.flush()?;

    info!("wrote {} transactions to {:?}", transactions.len(), path);
    Ok(())
}

/// Read transactions back from a normalized CSV
pub fn read_processed(path: &Path) -> Result<Vec<Transaction>> {
    let mut reader = Reader::from_path(path)
        .with_context(|| format!("failed to open {:?}", path))?;

    let mut transactions = Vec::new();
    for row in reader.deserialize::<NormalizedRow>() {
        let row = row.with_context(|| format!("invalid row in {:?}", path))?;
        transactions.push(row.into_transaction()?);
    }

    info!("read {} transactions from {:?}", transactions.len(), path);
    Ok(transactions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn sample_transactions() -> Vec<Transaction> {
        let details = TradeDetails {
            date: NaiveDate::from_ymd_opt(2021, 3, 15)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap(),
            ticker: "AAPL".to_string(),
            isin: "US0378331005".to_string(),
            name: "Apple Inc.".to_string(),
            quantity: dec!(4),
            price_per_share: dec!(120.25),
            currency: "USD".to_string(),
            exchange_rate: Some(dec!(3.95)),
            total_value_foreign: Some(dec!(481.00)),
            total_value_pln: Some(dec!(1899.95)),
            fees_foreign: Decimal::ZERO,
            fees_pln: dec!(1.50),
            country: Some("United States (from ISIN)".to_string()),
        };

        let mut unresolved = details.clone();
        unresolved.exchange_rate = None;
        unresolved.total_value_pln = None;
        unresolved.country = None;

        vec![
            Transaction::Buy(details.clone()),
            Transaction::Sell(unresolved),
            Transaction::Dividend(DividendDetails {
                trade: details,
                withholding_tax_foreign: Some(dec!(0.13)),
                withholding_tax_pln: Some(dec!(0.51)),
            }),
        ]
    }

    #[test]
    fn test_round_trip_is_lossless() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed.csv");

        let original = sample_transactions();
        write_processed(&path, &original).unwrap();
        let read_back = read_processed(&path).unwrap();

        assert_eq!(original, read_back);
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let row = NormalizedRow {
            kind: "SPLIT".to_string(),
            date: NaiveDate::from_ymd_opt(2021, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            ticker: String::new(),
            isin: String::new(),
            name: String::new(),
            quantity: Decimal::ONE,
            price_per_share: Decimal::ZERO,
            currency: "PLN".to_string(),
            exchange_rate: None,
            total_value_foreign: None,
            total_value_pln: None,
            fees_foreign: Decimal::ZERO,
            fees_pln: Decimal::ZERO,
            country: None,
            withholding_tax_foreign: None,
            withholding_tax_pln: None,
        };

        let err = row.into_transaction().unwrap_err();
        assert!(err.to_string().contains("unknown transaction kind"));
    }
}
