//! Application settings
//!
//! Defaults match the Polish flat rate and the public NBP API; a TOML file
//! can override any field. Settings are plain values passed into whoever
//! needs them, there is no global configuration state.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Flat Polish capital-gains and dividend tax rate
    pub tax_rate: Decimal,
    /// NBP table-A exchange-rate API
    pub nbp_base_url: String,
    /// Default location of input data and the processed CSV
    pub data_dir: PathBuf,
    /// Default location of report files
    pub output_dir: PathBuf,
    /// Manual ISIN -> country labels, for securities whose ISIN prefix is
    /// misleading (e.g. Jersey-incorporated companies)
    pub country_overrides: HashMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tax_rate: Decimal::new(19, 2),
            nbp_base_url: "https://api.nbp.pl/api/exchangerates/rates/a".to_string(),
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("output"),
            country_overrides: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file, or the defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read settings file {:?}", path))?;
                toml::from_str(&text)
                    .with_context(|| format!("failed to parse settings file {:?}", path))
            }
            None => Ok(Self::default()),
        }
    }

    /// Default output of `process` / input of `calculate`
    pub fn default_processed_file(&self) -> PathBuf {
        self.data_dir.join("processed_data.csv")
    }
}
