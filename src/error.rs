//! Error handling for the pit38 calculator
//!
//! Defines the typed ledger errors and establishes a unified Result type
//! using anyhow for context chaining and error propagation.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by the FIFO position ledger
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("cannot sell {ticker}: not in portfolio")]
    UnknownTicker { ticker: String },

    #[error("cannot sell {requested} shares of {ticker}: only {available} available")]
    InsufficientShares {
        ticker: String,
        requested: Decimal,
        available: Decimal,
    },

    #[error("sale of {ticker} has no PLN value")]
    MissingPlnValue { ticker: String },
}

/// Result type alias for calculator operations
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_formatting_is_readable() {
        let err = LedgerError::UnknownTicker {
            ticker: "AAPL".to_string(),
        };
        assert_eq!(err.to_string(), "cannot sell AAPL: not in portfolio");
    }

    #[test]
    fn test_insufficient_shares_reports_quantities() {
        let err = LedgerError::InsufficientShares {
            ticker: "TSLA".to_string(),
            requested: Decimal::from(21),
            available: Decimal::from(20),
        };
        let msg = err.to_string();
        assert!(msg.contains("21"));
        assert!(msg.contains("only 20 available"));
    }

    #[test]
    fn test_anyhow_context_chains_errors() {
        use anyhow::Context;
        let result: Result<()> =
            Err(anyhow::anyhow!("original error")).context("failed to process transaction");
        match result {
            Err(e) => {
                let msg = e.to_string();
                assert!(msg.contains("failed to process transaction"));
                let debug_msg = format!("{:?}", e);
                assert!(debug_msg.contains("original error") || msg.contains("original error"));
            }
            Ok(_) => panic!("expected error"),
        }
    }
}
