//! Exchange-rate lookup against the NBP (National Bank of Poland) API
//!
//! Polish tax law values foreign-currency transactions at the NBP table-A
//! mid rate of the last business day before the trade date. The client
//! walks back up to seven business days when no table was published for a
//! date, and caches every answer for the lifetime of the process.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::utils::previous_business_day;

/// How many business days to walk back before giving up
const MAX_LOOKBACK_DAYS: usize = 7;

/// NBP API response for a single currency
#[derive(Debug, Deserialize)]
struct NbpRateResponse {
    rates: Vec<NbpRate>,
}

#[derive(Debug, Deserialize)]
struct NbpRate {
    mid: Decimal,
}

/// Client for the NBP table-A exchange-rate API
pub struct NbpClient {
    base_url: String,
    client: Client,
    cache: Mutex<HashMap<(NaiveDate, String), Option<Decimal>>>,
}

impl NbpClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: Client::new(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Mid rate for `currency` applicable to a trade on `date`, or `None`
    /// when no table could be found within the lookback window.
    pub async fn rate(&self, date: NaiveDate, currency: &str) -> Result<Option<Decimal>> {
        if currency.is_empty() || currency == "PLN" {
            return Ok(Some(Decimal::ONE));
        }

        let cache_key = (date, currency.to_string());
        if let Some(cached) = self.cache.lock().unwrap().get(&cache_key) {
            return Ok(*cached);
        }

        // GBX is British pence; NBP only quotes GBP
        let (code, divisor) = if currency == "GBX" {
            ("GBP", Decimal::from(100))
        } else {
            (currency, Decimal::ONE)
        };

        let mut day = previous_business_day(date);
        let mut found = None;

        for _ in 0..MAX_LOOKBACK_DAYS {
            let url = format!(
                "{}/{}/{}/?format=json",
                self.base_url,
                code,
                day.format("%Y-%m-%d")
            );

            match self.client.get(&url).send().await {
                Ok(response) if response.status().is_success() => {
                    let body: NbpRateResponse = response
                        .json()
                        .await
                        .context("failed to decode NBP response")?;
                    if let Some(rate) = body.rates.first() {
                        found = Some(rate.mid / divisor);
                        break;
                    }
                }
                Ok(response) => {
                    debug!(
                        "no NBP rate for {} on {} (status {}), trying previous day",
                        code,
                        day,
                        response.status()
                    );
                }
                Err(err) => {
                    warn!("NBP request failed for {} on {}: {}", code, day, err);
                }
            }

            day = previous_business_day(day);
        }

        if found.is_none() {
            warn!(
                "could not find an NBP rate for {} within {} business days of {}",
                currency, MAX_LOOKBACK_DAYS, date
            );
        }

        self.cache.lock().unwrap().insert(cache_key, found);
        Ok(found)
    }
}

/// Fixed rate table for tests and offline runs
pub struct FixedRates {
    rates: HashMap<String, Decimal>,
}

impl Default for FixedRates {
    fn default() -> Self {
        let mut rates = HashMap::new();
        rates.insert("USD".to_string(), Decimal::from(4));
        rates.insert("EUR".to_string(), Decimal::new(45, 1));
        rates.insert("GBP".to_string(), Decimal::from(5));
        rates.insert("GBX".to_string(), Decimal::new(5, 2));
        rates.insert("PLN".to_string(), Decimal::ONE);
        Self { rates }
    }
}

impl FixedRates {
    pub fn new(rates: HashMap<String, Decimal>) -> Self {
        Self { rates }
    }

    fn rate(&self, currency: &str) -> Option<Decimal> {
        if currency.is_empty() || currency == "PLN" {
            return Some(Decimal::ONE);
        }
        self.rates.get(currency).copied()
    }
}

/// Where exchange rates come from for one run
pub enum RateSource {
    Nbp(NbpClient),
    Fixed(FixedRates),
}

impl RateSource {
    /// NBP client against `base_url`, or the fixed table when the
    /// `PIT38_OFFLINE` environment variable is set.
    pub fn from_env(base_url: &str) -> Self {
        if std::env::var("PIT38_OFFLINE").is_ok() {
            debug!("PIT38_OFFLINE set, using fixed exchange rates");
            RateSource::Fixed(FixedRates::default())
        } else {
            RateSource::Nbp(NbpClient::new(base_url))
        }
    }

    pub async fn rate(&self, date: NaiveDate, currency: &str) -> Result<Option<Decimal>> {
        match self {
            RateSource::Nbp(client) => client.rate(date, currency).await,
            RateSource::Fixed(fixed) => Ok(fixed.rate(currency)),
        }
    }
}
