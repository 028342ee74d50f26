//! FIFO capital-gains calculation
//!
//! Drives the position ledger over a chronologically sorted transaction
//! batch. Buys always enter the ledger (cost basis is built from full
//! history); sells can be restricted to a single tax year. A sale that
//! cannot be matched becomes an issue on the report and processing
//! continues with the remaining transactions.

use chrono::Datelike;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use crate::model::portfolio::{FifoMatch, Portfolio};
use crate::model::transaction::Transaction;

/// Run-level counters for a FIFO calculation
#[derive(Debug, Clone, Default, Serialize)]
pub struct FifoStats {
    pub buy_count: usize,
    pub sell_count: usize,
    pub match_count: usize,
    pub tax_year: Option<i32>,
}

/// Result of a FIFO calculation run
#[derive(Debug, Clone, Serialize)]
pub struct FifoReport {
    pub matches: Vec<FifoMatch>,
    /// Open positions left after the run
    pub portfolio: Portfolio,
    pub stats: FifoStats,
    pub issues: Vec<String>,
}

impl FifoReport {
    fn from_issues(issues: Vec<String>, tax_year: Option<i32>) -> Self {
        Self {
            matches: Vec::new(),
            portfolio: Portfolio::new(),
            stats: FifoStats {
                tax_year,
                ..FifoStats::default()
            },
            issues,
        }
    }

    pub fn total_income(&self) -> Decimal {
        self.matches.iter().map(|m| m.income_pln).sum()
    }

    pub fn total_cost(&self) -> Decimal {
        self.matches.iter().map(|m| m.cost_pln).sum()
    }

    pub fn total_profit_loss(&self) -> Decimal {
        self.matches.iter().map(|m| m.profit_loss_pln).sum()
    }
}

/// Calculator for the FIFO method
#[derive(Debug, Default)]
pub struct FifoCalculator;

impl FifoCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Validate transaction data before the FIFO run. Returns all issues
    /// found, empty when the batch is usable.
    pub fn validate(&self, transactions: &[Transaction]) -> Vec<String> {
        let mut issues = Vec::new();

        if transactions.is_empty() {
            issues.push("No transactions to process".to_string());
            return issues;
        }

        for (i, tx) in transactions.iter().enumerate() {
            let kind = tx.kind().as_str();
            let details = tx.details();

            if details.ticker.is_empty() {
                issues.push(format!("Transaction #{i} ({kind}) has no ticker"));
            }
            if details.quantity <= Decimal::ZERO {
                issues.push(format!(
                    "Transaction #{i} ({kind}) has invalid quantity: {}",
                    details.quantity
                ));
            }
            if details.exchange_rate.is_none() && details.currency != "PLN" {
                issues.push(format!(
                    "Transaction #{i} ({kind}) has no exchange rate for currency: {}",
                    details.currency
                ));
            }
            if details.total_value_pln.is_none() {
                issues.push(format!("Transaction #{i} ({kind}) has no PLN value"));
            }
        }

        issues
    }

    /// Run the FIFO calculation, optionally restricting sales to `tax_year`.
    pub fn calculate(&self, transactions: &[Transaction], tax_year: Option<i32>) -> FifoReport {
        let mut issues = self.validate(transactions);
        if !issues.is_empty() {
            return FifoReport::from_issues(issues, tax_year);
        }

        let mut stats = FifoStats {
            tax_year,
            ..FifoStats::default()
        };
        let mut portfolio = Portfolio::new();
        let mut matches: Vec<FifoMatch> = Vec::new();

        // Chronological order; the stable sort keeps same-timestamp entries
        // in input order.
        let mut ordered: Vec<&Transaction> = transactions.iter().collect();
        ordered.sort_by_key(|tx| tx.date());

        for tx in ordered {
            match tx {
                Transaction::Buy(details) => {
                    portfolio.add_purchase(details.clone());
                    stats.buy_count += 1;
                }
                Transaction::Sell(details) => {
                    if let Some(year) = tax_year {
                        if details.date.year() != year {
                            continue;
                        }
                    }

                    match portfolio.process_sale(details) {
                        Ok(sale_matches) => {
                            stats.sell_count += 1;
                            stats.match_count += sale_matches.len();
                            matches.extend(sale_matches);
                        }
                        Err(err) => {
                            warn!("skipping sale of {}: {}", details.ticker, err);
                            issues.push(format!(
                                "Error processing sale of {}: {}",
                                details.ticker, err
                            ));
                        }
                    }
                }
                Transaction::Dividend(_) => {}
            }
        }

        info!(
            "FIFO run complete: {} buys, {} sells, {} matches",
            stats.buy_count, stats.sell_count, stats.match_count
        );

        FifoReport {
            matches,
            portfolio,
            stats,
            issues,
        }
    }
}
