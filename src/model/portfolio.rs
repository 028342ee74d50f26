//! Position ledger and FIFO matcher
//!
//! Open purchase lots are tracked per ticker, oldest first, and consumed
//! by sales in strict FIFO order. Matching is pure in-memory mutation;
//! all arithmetic stays in `Decimal`.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::LedgerError;
use crate::model::transaction::TradeDetails;

/// One FIFO match between a (possibly partial) sale and a (possibly partial) lot
#[derive(Debug, Clone, Serialize)]
pub struct FifoMatch {
    pub ticker: String,
    pub country: String,
    pub buy_date: NaiveDateTime,
    pub sell_date: NaiveDateTime,
    pub quantity: Decimal,
    pub income_pln: Decimal,
    pub cost_pln: Decimal,
    pub profit_loss_pln: Decimal,
}

/// An open purchase batch, consumed oldest-first as shares are sold.
///
/// The originating buy stays read-only. The remainders start at the buy's
/// full values and shrink with every consumption, so the cost charged over
/// the life of a lot sums exactly to the lot's original PLN value and fee.
#[derive(Debug, Clone, Serialize)]
pub struct Lot {
    purchase: TradeDetails,
    remaining_quantity: Decimal,
    remaining_value_pln: Decimal,
    remaining_fee_pln: Decimal,
}

impl Lot {
    fn new(purchase: TradeDetails) -> Self {
        let remaining_quantity = purchase.quantity;
        let remaining_value_pln = purchase.total_value_pln.unwrap_or(Decimal::ZERO);
        let remaining_fee_pln = purchase.fees_pln;
        Self {
            purchase,
            remaining_quantity,
            remaining_value_pln,
            remaining_fee_pln,
        }
    }

    pub fn purchase(&self) -> &TradeDetails {
        &self.purchase
    }

    pub fn remaining_quantity(&self) -> Decimal {
        self.remaining_quantity
    }

    /// Split `quantity` shares out of this lot, returning the proportional
    /// PLN purchase value and purchase fee. Consuming the whole remainder
    /// hands back the exact remaining amounts so nothing is lost to division.
    fn consume(&mut self, quantity: Decimal) -> (Decimal, Decimal) {
        if quantity == self.remaining_quantity {
            let value = self.remaining_value_pln;
            let fee = self.remaining_fee_pln;
            self.remaining_quantity = Decimal::ZERO;
            self.remaining_value_pln = Decimal::ZERO;
            self.remaining_fee_pln = Decimal::ZERO;
            return (value, fee);
        }

        let value = self.remaining_value_pln * quantity / self.remaining_quantity;
        let fee = self.remaining_fee_pln * quantity / self.remaining_quantity;
        self.remaining_quantity -= quantity;
        self.remaining_value_pln -= value;
        self.remaining_fee_pln -= fee;
        (value, fee)
    }

    fn is_exhausted(&self) -> bool {
        self.remaining_quantity <= Decimal::ZERO
    }
}

/// Open lots for a single ticker, oldest purchase first
#[derive(Debug, Clone, Serialize)]
pub struct Position {
    ticker: String,
    lots: Vec<Lot>,
}

impl Position {
    fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            lots: Vec::new(),
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn lots(&self) -> &[Lot] {
        &self.lots
    }

    /// Append a purchase lot and restore FIFO order. The sort is stable,
    /// so same-day purchases keep their insertion order.
    pub fn add_purchase(&mut self, buy: TradeDetails) {
        self.lots.push(Lot::new(buy));
        self.lots.sort_by_key(|lot| lot.purchase.date);
    }

    /// Total remaining shares across all open lots
    pub fn total_shares(&self) -> Decimal {
        self.lots.iter().map(|lot| lot.remaining_quantity).sum()
    }
}

/// Per-ticker ledger of open positions, created fresh per calculation run
#[derive(Debug, Clone, Default, Serialize)]
pub struct Portfolio {
    positions: BTreeMap<String, Position>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_purchase(&mut self, buy: TradeDetails) {
        let ticker = buy.ticker.clone();
        self.positions
            .entry(ticker.clone())
            .or_insert_with(|| Position::new(ticker))
            .add_purchase(buy);
    }

    /// Remaining shares for a ticker; zero when the ticker is unknown
    pub fn total_shares(&self, ticker: &str) -> Decimal {
        self.positions
            .get(ticker)
            .map(Position::total_shares)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Consume a sale against the open lots of its ticker, oldest lot first.
    ///
    /// Emits one match per lot touched. The emitted quantities sum exactly
    /// to the sale quantity and the incomes sum exactly to the sale's PLN
    /// value: the final slice takes the unallocated remainder instead of a
    /// fresh product, so repeated proportional splits cannot drift.
    pub fn process_sale(&mut self, sale: &TradeDetails) -> Result<Vec<FifoMatch>, LedgerError> {
        let position = self
            .positions
            .get_mut(&sale.ticker)
            .ok_or_else(|| LedgerError::UnknownTicker {
                ticker: sale.ticker.clone(),
            })?;

        let available = position.total_shares();
        if available < sale.quantity {
            return Err(LedgerError::InsufficientShares {
                ticker: sale.ticker.clone(),
                requested: sale.quantity,
                available,
            });
        }

        let sale_total_pln =
            sale.total_value_pln
                .ok_or_else(|| LedgerError::MissingPlnValue {
                    ticker: sale.ticker.clone(),
                })?;

        if sale.quantity <= Decimal::ZERO {
            return Ok(Vec::new());
        }

        let unit_sale_value = sale_total_pln / sale.quantity;
        let country = sale
            .country
            .clone()
            .unwrap_or_else(|| "Unknown".to_string());

        let mut matches = Vec::new();
        let mut remaining = sale.quantity;
        let mut income_left = sale_total_pln;
        let mut sale_fee_left = sale.fees_pln;

        while remaining > Decimal::ZERO {
            let lot = match position.lots.first_mut() {
                Some(lot) => lot,
                None => break,
            };

            let take = remaining.min(lot.remaining_quantity);

            let (income, sale_fee) = if take == remaining {
                (income_left, sale_fee_left)
            } else {
                (take * unit_sale_value, sale.fees_pln * take / sale.quantity)
            };
            income_left -= income;
            sale_fee_left -= sale_fee;

            let buy_date = lot.purchase.date;
            let (purchase_cost, purchase_fee) = lot.consume(take);
            let cost_pln = purchase_cost + purchase_fee + sale_fee;
            let profit_loss_pln = income - cost_pln;

            debug!(
                "FIFO match for {}: {} shares, income {} PLN, cost {} PLN, P/L {} PLN",
                sale.ticker, take, income, cost_pln, profit_loss_pln
            );

            matches.push(FifoMatch {
                ticker: sale.ticker.clone(),
                country: country.clone(),
                buy_date,
                sell_date: sale.date,
                quantity: take,
                income_pln: income,
                cost_pln,
                profit_loss_pln,
            });

            if lot.is_exhausted() {
                position.lots.remove(0);
            }

            remaining -= take;
        }

        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn buy(ticker: &str, date: (i32, u32, u32), qty: Decimal, total_pln: Decimal) -> TradeDetails {
        trade(ticker, date, qty, total_pln, Decimal::ZERO)
    }

    fn trade(
        ticker: &str,
        date: (i32, u32, u32),
        qty: Decimal,
        total_pln: Decimal,
        fees_pln: Decimal,
    ) -> TradeDetails {
        TradeDetails {
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            ticker: ticker.to_string(),
            isin: String::new(),
            name: String::new(),
            quantity: qty,
            price_per_share: Decimal::ZERO,
            currency: "PLN".to_string(),
            exchange_rate: Some(Decimal::ONE),
            total_value_foreign: Some(total_pln),
            total_value_pln: Some(total_pln),
            fees_foreign: Decimal::ZERO,
            fees_pln,
            country: Some("United States".to_string()),
        }
    }

    #[test]
    fn test_fifo_consumes_oldest_lot_first() {
        let mut portfolio = Portfolio::new();
        portfolio.add_purchase(buy("AAPL", (2021, 6, 1), dec!(10), dec!(1200)));
        portfolio.add_purchase(buy("AAPL", (2021, 1, 1), dec!(10), dec!(1000)));

        let sale = trade("AAPL", (2021, 9, 1), dec!(15), dec!(1800), Decimal::ZERO);
        let matches = portfolio.process_sale(&sale).unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].quantity, dec!(10));
        assert_eq!(
            matches[0].buy_date.date(),
            NaiveDate::from_ymd_opt(2021, 1, 1).unwrap()
        );
        assert_eq!(matches[1].quantity, dec!(5));
        assert_eq!(
            matches[1].buy_date.date(),
            NaiveDate::from_ymd_opt(2021, 6, 1).unwrap()
        );
        assert_eq!(portfolio.total_shares("AAPL"), dec!(5));
    }

    #[test]
    fn test_oversell_is_rejected() {
        let mut portfolio = Portfolio::new();
        portfolio.add_purchase(buy("TSLA", (2021, 1, 1), dec!(20), dec!(2000)));

        let sale = trade("TSLA", (2021, 2, 1), dec!(21), dec!(2100), Decimal::ZERO);
        let err = portfolio.process_sale(&sale).unwrap_err();

        assert_eq!(
            err,
            LedgerError::InsufficientShares {
                ticker: "TSLA".to_string(),
                requested: dec!(21),
                available: dec!(20),
            }
        );
        // The rejected sale must not have consumed anything
        assert_eq!(portfolio.total_shares("TSLA"), dec!(20));
    }

    #[test]
    fn test_unknown_ticker_is_rejected() {
        let mut portfolio = Portfolio::new();
        let sale = trade("MSFT", (2021, 2, 1), dec!(1), dec!(100), Decimal::ZERO);
        assert_eq!(
            portfolio.process_sale(&sale).unwrap_err(),
            LedgerError::UnknownTicker {
                ticker: "MSFT".to_string()
            }
        );
    }

    #[test]
    fn test_income_conservation_with_awkward_division() {
        // 10 PLN over 3 shares does not divide evenly; the remainder
        // assignment must keep the match incomes summing to the sale total.
        let mut portfolio = Portfolio::new();
        portfolio.add_purchase(buy("XYZ", (2021, 1, 1), dec!(1), dec!(2)));
        portfolio.add_purchase(buy("XYZ", (2021, 2, 1), dec!(1), dec!(2)));
        portfolio.add_purchase(buy("XYZ", (2021, 3, 1), dec!(1), dec!(2)));

        let sale = trade("XYZ", (2021, 4, 1), dec!(3), dec!(10), dec!(0.07));
        let matches = portfolio.process_sale(&sale).unwrap();

        let income: Decimal = matches.iter().map(|m| m.income_pln).sum();
        let quantity: Decimal = matches.iter().map(|m| m.quantity).sum();
        assert_eq!(income, dec!(10));
        assert_eq!(quantity, dec!(3));

        // Sale fee is fully distributed as well: cost = purchase cost + fee
        let cost: Decimal = matches.iter().map(|m| m.cost_pln).sum();
        assert_eq!(cost, dec!(6) + dec!(0.07));
    }

    #[test]
    fn test_partial_lot_charges_original_value_exactly_once() {
        // Consuming one lot across two sales must charge exactly the lot's
        // purchase value in total, not a fresh proportion of the full value
        // on each pass.
        let mut portfolio = Portfolio::new();
        portfolio.add_purchase(trade("ABC", (2021, 1, 1), dec!(10), dec!(100), dec!(3)));

        let first = trade("ABC", (2021, 2, 1), dec!(5), dec!(80), Decimal::ZERO);
        let second = trade("ABC", (2021, 3, 1), dec!(5), dec!(90), Decimal::ZERO);

        let m1 = portfolio.process_sale(&first).unwrap();
        let m2 = portfolio.process_sale(&second).unwrap();

        let total_cost: Decimal = m1.iter().chain(m2.iter()).map(|m| m.cost_pln).sum();
        assert_eq!(total_cost, dec!(103));
        assert_eq!(portfolio.total_shares("ABC"), Decimal::ZERO);
    }

    #[test]
    fn test_same_day_purchases_keep_insertion_order() {
        let mut portfolio = Portfolio::new();
        let mut first = buy("DUP", (2021, 5, 5), dec!(2), dec!(20));
        first.name = "first".to_string();
        let mut second = buy("DUP", (2021, 5, 5), dec!(2), dec!(40));
        second.name = "second".to_string();
        portfolio.add_purchase(first);
        portfolio.add_purchase(second);

        let sale = trade("DUP", (2021, 6, 1), dec!(2), dec!(30), Decimal::ZERO);
        let matches = portfolio.process_sale(&sale).unwrap();

        assert_eq!(matches.len(), 1);
        // Cost comes from the first-inserted lot (20), not the second (40)
        assert_eq!(matches[0].cost_pln, dec!(20));
    }

    #[test]
    fn test_profit_includes_proportional_fees() {
        let mut portfolio = Portfolio::new();
        portfolio.add_purchase(trade("FEE", (2021, 1, 1), dec!(10), dec!(100), dec!(2)));

        let sale = trade("FEE", (2021, 2, 1), dec!(4), dec!(60), dec!(1));
        let matches = portfolio.process_sale(&sale).unwrap();

        assert_eq!(matches.len(), 1);
        // cost = 100 * 4/10 + 2 * 4/10 + 1 (whole sale consumed) = 41.8
        assert_eq!(matches[0].cost_pln, dec!(41.8));
        assert_eq!(matches[0].profit_loss_pln, dec!(18.2));
    }

    #[test]
    fn test_total_shares_zero_for_unknown_ticker() {
        let portfolio = Portfolio::new();
        assert_eq!(portfolio.total_shares("NOPE"), Decimal::ZERO);
    }
}
