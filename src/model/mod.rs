// Domain model - transactions, the FIFO position ledger, country data

pub mod country;
pub mod portfolio;
pub mod transaction;

pub use country::{Country, CountryRegistry};
pub use portfolio::{FifoMatch, Lot, Portfolio, Position};
pub use transaction::{DividendDetails, TradeDetails, Transaction, TransactionKind};
