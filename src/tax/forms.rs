//! PIT-38 and PIT-ZG form data
//!
//! Turns the FIFO and dividend reports into the figures entered on the
//! Polish tax forms. Tax base and tax due are rounded to whole złoty,
//! half away from zero; everything upstream stays unrounded.

use itertools::Itertools;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::tax::dividend::DividendReport;
use crate::tax::fifo::FifoReport;

/// Marker appended by the country resolver when the label came from the
/// ISIN prefix rather than an authoritative source
pub const FROM_ISIN_MARKER: &str = "(from ISIN)";

/// PIT-38 sections C/D - securities transactions
#[derive(Debug, Clone, Serialize)]
pub struct Pit38Summary {
    pub total_income: Decimal,
    pub total_cost: Decimal,
    pub profit: Decimal,
    pub loss: Decimal,
    /// Profit rounded to whole złoty (section D.29)
    pub tax_base: Decimal,
    /// Flat-rate tax on the base, whole złoty (sections D.31/D.33)
    pub tax_due: Decimal,
}

/// One PIT-38 section G row per dividend country
#[derive(Debug, Clone, Serialize)]
pub struct DividendFormRow {
    pub country: String,
    pub dividend_amount: Decimal,
    pub tax_due: Decimal,
    pub tax_paid_abroad: Decimal,
    pub tax_to_pay: Decimal,
}

/// PIT-ZG entry - income earned in one foreign country
#[derive(Debug, Clone, Serialize)]
pub struct PitZgEntry {
    pub country: String,
    pub include_in_official_form: bool,
    /// Set when the country label was derived from the ISIN prefix and
    /// should be double-checked before filing
    pub requires_verification: bool,
    pub securities_income: Decimal,
    pub securities_cost: Decimal,
    pub securities_profit: Decimal,
    pub tax_paid_abroad: Decimal,
}

/// Combined data for all generated forms
#[derive(Debug, Clone, Serialize)]
pub struct TaxFormData {
    pub pit38: Pit38Summary,
    pub dividend_rows: Vec<DividendFormRow>,
    pub pit_zg: Vec<PitZgEntry>,
}

impl TaxFormData {
    /// Total liability across securities and dividends, in whole złoty
    /// for the securities part
    pub fn total_tax_due(&self) -> Decimal {
        self.pit38.tax_due
            + self
                .dividend_rows
                .iter()
                .map(|row| row.tax_to_pay)
                .sum::<Decimal>()
    }
}

/// Round to whole złoty, half away from zero
fn round_pln(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Generate PIT-38 and PIT-ZG data from the two calculation reports.
pub fn generate_tax_forms(
    fifo: &FifoReport,
    dividends: &DividendReport,
    tax_rate: Decimal,
) -> TaxFormData {
    let total_income = fifo.total_income();
    let total_cost = fifo.total_cost();
    let balance = total_income - total_cost;

    let (profit, loss) = if balance >= Decimal::ZERO {
        (balance, Decimal::ZERO)
    } else {
        (Decimal::ZERO, balance.abs())
    };

    let tax_base = round_pln(profit);
    let tax_due = round_pln(tax_base * tax_rate);

    let dividend_rows = dividends
        .summaries
        .values()
        .map(|summary| DividendFormRow {
            country: summary.country.clone(),
            dividend_amount: summary.total_dividend_pln,
            tax_due: summary.tax_due_poland,
            tax_paid_abroad: summary.tax_paid_abroad_pln,
            tax_to_pay: summary.tax_to_pay,
        })
        .collect();

    let by_country = fifo
        .matches
        .iter()
        .map(|m| (m.country.clone(), m))
        .into_group_map();

    let pit_zg = by_country
        .into_iter()
        .sorted_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(country, matches)| {
            let income: Decimal = matches.iter().map(|m| m.income_pln).sum();
            let cost: Decimal = matches.iter().map(|m| m.cost_pln).sum();
            let profit = Decimal::ZERO.max(income - cost);

            PitZgEntry {
                include_in_official_form: profit > Decimal::ZERO,
                requires_verification: country.contains(FROM_ISIN_MARKER),
                country,
                securities_income: income,
                securities_cost: cost,
                securities_profit: profit,
                // Withholding on sale proceeds is not collected by brokers
                tax_paid_abroad: Decimal::ZERO,
            }
        })
        .collect();

    TaxFormData {
        pit38: Pit38Summary {
            total_income,
            total_cost,
            profit,
            loss,
            tax_base,
            tax_due,
        },
        dividend_rows,
        pit_zg,
    }
}
