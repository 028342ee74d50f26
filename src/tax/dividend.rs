//! Dividend tax aggregation
//!
//! Groups dividend payments by country of source, sums the gross PLN
//! amounts and the tax withheld abroad, and reconciles them against the
//! flat Polish dividend tax rate. Withholding can only reduce the Polish
//! liability to zero, never below.

use chrono::Datelike;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

use crate::model::transaction::{DividendDetails, Transaction};

/// Sentinel bucket for dividends whose country could not be resolved
pub const UNKNOWN_COUNTRY: &str = "Unknown";

/// Per-country dividend aggregate
#[derive(Debug, Clone, Serialize)]
pub struct DividendSummary {
    pub country: String,
    pub total_dividend_pln: Decimal,
    pub tax_paid_abroad_pln: Decimal,
    pub tax_due_poland: Decimal,
    /// Remaining Polish liability, floored at zero
    pub tax_to_pay: Decimal,
    pub count: usize,
}

impl DividendSummary {
    fn new(country: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            total_dividend_pln: Decimal::ZERO,
            tax_paid_abroad_pln: Decimal::ZERO,
            tax_due_poland: Decimal::ZERO,
            tax_to_pay: Decimal::ZERO,
            count: 0,
        }
    }
}

/// Run-level totals for a dividend calculation
#[derive(Debug, Clone, Default, Serialize)]
pub struct DividendStats {
    pub dividend_count: usize,
    pub total_dividend_pln: Decimal,
    pub total_tax_paid_abroad_pln: Decimal,
    pub total_tax_due_poland: Decimal,
    pub total_tax_to_pay: Decimal,
    pub tax_year: Option<i32>,
}

/// Result of a dividend calculation run
#[derive(Debug, Clone, Serialize)]
pub struct DividendReport {
    pub summaries: BTreeMap<String, DividendSummary>,
    pub stats: DividendStats,
    pub issues: Vec<String>,
}

impl DividendReport {
    fn empty(tax_year: Option<i32>, issues: Vec<String>) -> Self {
        Self {
            summaries: BTreeMap::new(),
            stats: DividendStats {
                tax_year,
                ..DividendStats::default()
            },
            issues,
        }
    }
}

/// Calculator for dividend tax
#[derive(Debug)]
pub struct DividendCalculator {
    tax_rate: Decimal,
}

impl DividendCalculator {
    /// `tax_rate` is the flat Polish dividend rate, e.g. 0.19
    pub fn new(tax_rate: Decimal) -> Self {
        Self { tax_rate }
    }

    /// Validate dividend data before aggregation. Returns all issues found.
    pub fn validate(&self, dividends: &[&DividendDetails]) -> Vec<String> {
        let mut issues = Vec::new();

        for (i, dividend) in dividends.iter().enumerate() {
            let trade = &dividend.trade;

            if trade.ticker.is_empty() {
                issues.push(format!("Dividend #{i} has no ticker"));
            }
            if trade.quantity <= Decimal::ZERO {
                issues.push(format!(
                    "Dividend #{i} has invalid quantity: {}",
                    trade.quantity
                ));
            }
            if trade.exchange_rate.is_none() && trade.currency != "PLN" {
                issues.push(format!(
                    "Dividend #{i} has no exchange rate for currency: {}",
                    trade.currency
                ));
            }
            if trade.total_value_pln.is_none() {
                issues.push(format!("Dividend #{i} has no PLN value"));
            }
            if trade.country.as_deref().unwrap_or("").is_empty() {
                issues.push(format!("Dividend #{i} has no country information"));
            }
        }

        issues
    }

    /// Aggregate dividends by country, optionally restricted to `tax_year`.
    pub fn calculate(&self, transactions: &[Transaction], tax_year: Option<i32>) -> DividendReport {
        if transactions.is_empty() {
            return DividendReport::empty(
                tax_year,
                vec!["No transactions to process".to_string()],
            );
        }

        let dividends: Vec<&DividendDetails> = transactions
            .iter()
            .filter_map(|tx| match tx {
                Transaction::Dividend(dividend) => Some(dividend),
                _ => None,
            })
            .filter(|dividend| tax_year.map_or(true, |year| dividend.trade.date.year() == year))
            .collect();

        // A batch without dividends is a benign empty result, not an error
        if dividends.is_empty() {
            return DividendReport::empty(tax_year, Vec::new());
        }

        let issues = self.validate(&dividends);
        if !issues.is_empty() {
            return DividendReport::empty(tax_year, issues);
        }

        let mut stats = DividendStats {
            dividend_count: dividends.len(),
            tax_year,
            ..DividendStats::default()
        };
        let mut summaries: BTreeMap<String, DividendSummary> = BTreeMap::new();

        for dividend in &dividends {
            let country = dividend
                .trade
                .country
                .clone()
                .unwrap_or_else(|| UNKNOWN_COUNTRY.to_string());

            let summary = summaries
                .entry(country.clone())
                .or_insert_with(|| DividendSummary::new(country));

            if let Some(value) = dividend.trade.total_value_pln {
                summary.total_dividend_pln += value;
                stats.total_dividend_pln += value;
            }

            // Absent withholding aggregates as zero
            if let Some(withheld) = dividend.withholding_tax_pln {
                summary.tax_paid_abroad_pln += withheld;
                stats.total_tax_paid_abroad_pln += withheld;
            }

            summary.count += 1;
        }

        for summary in summaries.values_mut() {
            summary.tax_due_poland = summary.total_dividend_pln * self.tax_rate;
            summary.tax_to_pay =
                Decimal::ZERO.max(summary.tax_due_poland - summary.tax_paid_abroad_pln);

            stats.total_tax_due_poland += summary.tax_due_poland;
            stats.total_tax_to_pay += summary.tax_to_pay;
        }

        info!(
            "dividend run complete: {} dividends across {} countries",
            stats.dividend_count,
            summaries.len()
        );

        DividendReport {
            summaries,
            stats,
            issues,
        }
    }
}
