// Tax module - Polish PIT-38 calculations (FIFO matching, dividends, form data)

pub mod dividend;
pub mod fifo;
pub mod forms;

pub use dividend::{DividendCalculator, DividendReport, DividendStats, DividendSummary};
pub use fifo::{FifoCalculator, FifoReport, FifoStats};
pub use forms::{generate_tax_forms, Pit38Summary, PitZgEntry, TaxFormData};

use rust_decimal::Decimal;
use serde::Serialize;

use crate::model::transaction::Transaction;

/// Combined output of one calculation run
#[derive(Debug, Clone, Serialize)]
pub struct TaxRunResult {
    pub fifo: FifoReport,
    pub dividends: DividendReport,
}

/// Drives both calculators over one immutable transaction batch.
///
/// The batch is sorted and filtered internally; running twice over the same
/// input yields identical results.
#[derive(Debug)]
pub struct TaxCalculator {
    tax_rate: Decimal,
}

impl TaxCalculator {
    pub fn new(tax_rate: Decimal) -> Self {
        Self { tax_rate }
    }

    pub fn run(&self, transactions: &[Transaction], tax_year: Option<i32>) -> TaxRunResult {
        let fifo = FifoCalculator::new().calculate(transactions, tax_year);
        let dividends = DividendCalculator::new(self.tax_rate).calculate(transactions, tax_year);
        TaxRunResult { fifo, dividends }
    }

    /// Form data for the combined run result
    pub fn forms(&self, result: &TaxRunResult) -> TaxFormData {
        generate_tax_forms(&result.fifo, &result.dividends, self.tax_rate)
    }
}
