use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;

/// Country of security domicile, as used on PIT-38 / PIT-ZG forms
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Country {
    /// ISO 3166-1 alpha-2 code (e.g. "US", "GB")
    pub code: &'static str,
    pub name: &'static str,
    /// Country name in Polish, for the tax forms
    pub name_pl: &'static str,
    /// ISIN country prefix, usually the same as the code
    pub isin_prefix: &'static str,
    /// Whether Poland has a double-taxation treaty with this country
    pub tax_treaty: bool,
    /// Standard dividend withholding rate in percent, when known
    pub withholding_rate: Option<f64>,
}

static DEFAULT_COUNTRIES: Lazy<Vec<Country>> = Lazy::new(|| {
    fn country(
        code: &'static str,
        name: &'static str,
        name_pl: &'static str,
        tax_treaty: bool,
        withholding_rate: f64,
    ) -> Country {
        Country {
            code,
            name,
            name_pl,
            isin_prefix: code,
            tax_treaty,
            withholding_rate: Some(withholding_rate),
        }
    }

    vec![
        country("US", "United States", "Stany Zjednoczone", true, 15.0),
        country("GB", "United Kingdom", "Wielka Brytania", true, 10.0),
        country("DE", "Germany", "Niemcy", true, 15.0),
        country("FR", "France", "Francja", true, 15.0),
        country("CH", "Switzerland", "Szwajcaria", true, 15.0),
        country("IE", "Ireland", "Irlandia", true, 15.0),
        country("NL", "Netherlands", "Holandia", true, 15.0),
        country("SE", "Sweden", "Szwecja", true, 15.0),
        country("ES", "Spain", "Hiszpania", true, 15.0),
        country("IT", "Italy", "Włochy", true, 15.0),
        country("JP", "Japan", "Japonia", true, 10.0),
        country("CA", "Canada", "Kanada", true, 15.0),
        country("AU", "Australia", "Australia", true, 15.0),
        country("DK", "Denmark", "Dania", true, 15.0),
        country("FI", "Finland", "Finlandia", true, 15.0),
        country("NO", "Norway", "Norwegia", true, 15.0),
        country("BE", "Belgium", "Belgia", true, 15.0),
        country("LU", "Luxembourg", "Luksemburg", true, 15.0),
        country("HK", "Hong Kong", "Hongkong", false, 0.0),
        country("SG", "Singapore", "Singapur", true, 10.0),
        country("KR", "South Korea", "Korea Południowa", true, 10.0),
        country("CN", "China", "Chiny", true, 10.0),
        country("IN", "India", "Indie", true, 10.0),
        country("BR", "Brazil", "Brazylia", true, 15.0),
        country("ZA", "South Africa", "Republika Południowej Afryki", true, 10.0),
        country("AT", "Austria", "Austria", true, 15.0),
        country("PT", "Portugal", "Portugalia", true, 15.0),
        country("GR", "Greece", "Grecja", true, 10.0),
        country("PL", "Poland", "Polska", false, 19.0),
    ]
});

/// Lookup table of countries, indexed by code, English name, and ISIN prefix.
///
/// Built explicitly and handed to whoever needs it; there is no process-wide
/// registry instance.
#[derive(Debug, Clone)]
pub struct CountryRegistry {
    by_key: HashMap<&'static str, Country>,
}

impl CountryRegistry {
    /// Registry preloaded with countries commonly seen in stock trading
    pub fn with_defaults() -> Self {
        let mut by_key = HashMap::new();
        for country in DEFAULT_COUNTRIES.iter() {
            by_key.insert(country.code, country.clone());
            if country.name != country.code {
                by_key.insert(country.name, country.clone());
            }
            if country.isin_prefix != country.code {
                by_key.insert(country.isin_prefix, country.clone());
            }
        }
        Self { by_key }
    }

    /// Look up a country by code, English name, or ISIN prefix
    pub fn get(&self, identifier: &str) -> Option<&Country> {
        self.by_key.get(identifier)
    }

    /// Country for the first two letters of an ISIN
    pub fn from_isin_prefix(&self, prefix: &str) -> Option<&Country> {
        self.by_key.get(prefix.to_ascii_uppercase().as_str())
    }
}
