use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Transaction kind discriminant
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransactionKind {
    Buy,
    Sell,
    Dividend,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Buy => "BUY",
            TransactionKind::Sell => "SELL",
            TransactionKind::Dividend => "DIVIDEND",
        }
    }
}

impl FromStr for TransactionKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(TransactionKind::Buy),
            "SELL" => Ok(TransactionKind::Sell),
            "DIVIDEND" => Ok(TransactionKind::Dividend),
            _ => Err(()),
        }
    }
}

/// Fields shared by every transaction variant.
///
/// PLN-denominated fields are filled by the resolution step during import;
/// they stay `None` when a lookup fails, and validation reports them before
/// the transaction reaches the ledger or the dividend aggregator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeDetails {
    pub date: NaiveDateTime,
    pub ticker: String,
    pub isin: String,
    pub name: String,
    pub quantity: Decimal,
    pub price_per_share: Decimal,
    pub currency: String,
    pub exchange_rate: Option<Decimal>,
    pub total_value_foreign: Option<Decimal>,
    pub total_value_pln: Option<Decimal>,
    pub fees_foreign: Decimal,
    pub fees_pln: Decimal,
    pub country: Option<String>,
}

impl TradeDetails {
    /// Total value in the trade currency
    pub fn gross_value_foreign(&self) -> Decimal {
        self.quantity * self.price_per_share
    }
}

/// Dividend payment; withholding tax is deducted at source before payout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DividendDetails {
    pub trade: TradeDetails,
    pub withholding_tax_foreign: Option<Decimal>,
    pub withholding_tax_pln: Option<Decimal>,
}

/// A single brokerage transaction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Transaction {
    Buy(TradeDetails),
    Sell(TradeDetails),
    Dividend(DividendDetails),
}

impl Transaction {
    pub fn kind(&self) -> TransactionKind {
        match self {
            Transaction::Buy(_) => TransactionKind::Buy,
            Transaction::Sell(_) => TransactionKind::Sell,
            Transaction::Dividend(_) => TransactionKind::Dividend,
        }
    }

    pub fn details(&self) -> &TradeDetails {
        match self {
            Transaction::Buy(details) | Transaction::Sell(details) => details,
            Transaction::Dividend(dividend) => &dividend.trade,
        }
    }

    pub fn date(&self) -> NaiveDateTime {
        self.details().date
    }

    pub fn ticker(&self) -> &str {
        &self.details().ticker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn sample_details() -> TradeDetails {
        TradeDetails {
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
            country: Some("United States".to_string()),
        }
    }

    #[test]
    fn test_kind_conversions() {
        assert_eq!(TransactionKind::Buy.as_str(), "BUY");
        assert_eq!(TransactionKind::Sell.as_str(), "SELL");
        assert_eq!(TransactionKind::Dividend.as_str(), "DIVIDEND");

        assert_eq!("BUY".parse::<TransactionKind>().ok(), Some(TransactionKind::Buy));
        assert_eq!("sell".parse::<TransactionKind>().ok(), Some(TransactionKind::Sell));
        assert_eq!(
            "Dividend".parse::<TransactionKind>().ok(),
            Some(TransactionKind::Dividend)
        );
        assert_eq!("INVALID".parse::<TransactionKind>().ok(), None);
    }

    #[test]
    fn test_transaction_accessors() {
        let tx = Transaction::Buy(sample_details());
        assert_eq!(tx.kind(), TransactionKind::Buy);
        assert_eq!(tx.ticker(), "AAPL");
        assert_eq!(tx.details().quantity, dec!(4));

        let dividend = Transaction::Dividend(DividendDetails {
            trade: sample_details(),
            withholding_tax_foreign: Some(dec!(0.45)),
            withholding_tax_pln: Some(dec!(1.78)),
        });
        assert_eq!(dividend.kind(), TransactionKind::Dividend);
        assert_eq!(dividend.ticker(), "AAPL");
    }

    #[test]
    fn test_gross_value_foreign() {
        let details = sample_details();
        assert_eq!(details.gross_value_foreign(), dec!(481.00));
    }
}
