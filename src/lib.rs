//! pit38 - Trading212 tax calculator for Polish PIT-38 filings
//!
//! This library computes capital-gains and dividend tax data from
//! Trading212 transaction history: FIFO lot matching for realized gains
//! and losses, and per-country dividend aggregation reconciling foreign
//! withholding against the flat Polish rate.

pub mod config;
pub mod error;
pub mod importers;
pub mod model;
pub mod reports;
pub mod services;
pub mod tax;
pub mod utils;
