// External lookup services - NBP exchange rates, country resolution.
// The tax core never calls these; transactions arrive fully resolved.

pub mod country;
pub mod rates;

pub use country::CountryResolver;
pub use rates::{FixedRates, NbpClient, RateSource};
