//! Country-of-domicile resolution
//!
//! The calculators only see a resolved country label on each transaction.
//! Resolution order: explicit overrides from the settings file, then the
//! ISIN country prefix (flagged with a marker so the forms can request
//! manual verification), then the "Unknown" sentinel.

use std::collections::HashMap;
use tracing::debug;

use crate::model::country::CountryRegistry;
use crate::tax::forms::FROM_ISIN_MARKER;

/// Resolves an ISIN to the country label used for grouping and the forms
pub struct CountryResolver {
    registry: CountryRegistry,
    /// ISIN -> country label, from the settings file
    overrides: HashMap<String, String>,
}

impl CountryResolver {
    pub fn new(registry: CountryRegistry, overrides: HashMap<String, String>) -> Self {
        Self {
            registry,
            overrides,
        }
    }

    /// Country label for a security. Never fails; unresolvable securities
    /// get the "Unknown" sentinel and a debug log line.
    pub fn resolve(&self, isin: &str, name: &str) -> String {
        if let Some(country) = self.overrides.get(isin) {
            return country.clone();
        }

        if isin.len() >= 2 {
            if let Some(country) = self.registry.from_isin_prefix(&isin[..2]) {
                return format!("{} {}", country.name, FROM_ISIN_MARKER);
            }
        }

        debug!("could not determine country for {} ({})", isin, name);
        "Unknown".to_string()
    }
}
