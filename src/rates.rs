//! Live exchange-rate table from openexchangerates.org

use std::collections::BTreeMap;
use std::env;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::RATES_API_URL;

/// Environment variable carrying the openexchangerates.org app id.
pub const API_KEY_VAR: &str = "API_KEY";

#[derive(Debug, Error)]
pub enum RateFetchError {
    #[error("{API_KEY_VAR} environment variable is not set (get a free key at https://openexchangerates.org/)")]
    MissingCredential,
    #[error("rate request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed rate response: {0}")]
    Malformed(String),
}

/// Spot rates relative to one base currency, fetched once per run and passed
/// by value into the normalizer. Never cached across runs.
#[derive(Debug, Clone)]
pub struct ExchangeRateTable {
    pub base: String,
    rates: BTreeMap<String, Decimal>,
    pub fetched_at: DateTime<Utc>,
}

impl ExchangeRateTable {
    /// Build a table from raw entries. The base currency is ensured to be
    /// present with rate 1, matching what the API omits.
    pub fn new(base: &str, entries: impl IntoIterator<Item = (String, Decimal)>) -> Self {
        let mut rates: BTreeMap<String, Decimal> = entries.into_iter().collect();
        rates.entry(base.to_string()).or_insert(Decimal::ONE);
        ExchangeRateTable {
            base: base.to_string(),
            rates,
            fetched_at: Utc::now(),
        }
    }

    pub fn rate(&self, currency: &str) -> Option<Decimal> {
        self.rates.get(currency).copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }
}

#[derive(Debug, Deserialize)]
struct RatesResponse {
    base: Option<String>,
    // Numbers kept as their raw JSON text (arbitrary_precision) so they
    // reach Decimal without an f64 detour.
    rates: Option<BTreeMap<String, serde_json::Number>>,
    description: Option<String>,
}

/// Fetch the current spot table. One blocking call per run. Any failure here
/// is fatal to the conversion stage: without a trustworthy table there is
/// nothing sensible to convert with.
pub fn fetch_rates(base: &str) -> Result<ExchangeRateTable, RateFetchError> {
    let key = env::var(API_KEY_VAR).map_err(|_| RateFetchError::MissingCredential)?;
    let url = format!("{}{}", RATES_API_URL, key);
    let tail: String = key.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    println!("Fetching exchange rates with key ...{}", tail);

    let response: RatesResponse = reqwest::blocking::Client::new()
        .get(&url)
        .send()?
        .json()?;

    let Some(raw) = response.rates else {
        let why = response
            .description
            .unwrap_or_else(|| "no `rates` object in response".to_string());
        return Err(RateFetchError::Malformed(why));
    };

    let mut entries = Vec::with_capacity(raw.len());
    for (code, number) in raw {
        let rate = Decimal::from_str(&number.to_string())
            .map_err(|e| RateFetchError::Malformed(format!("rate for {}: {}", code, e)))?;
        entries.push((code, rate));
    }

    let reported_base = response.base.as_deref().unwrap_or(base);
    if reported_base != base {
        return Err(RateFetchError::Malformed(format!(
            "expected base {}, API returned {}",
            base, reported_base
        )));
    }

    let table = ExchangeRateTable::new(base, entries);
    println!("Fetched {} rates (base {})", table.len(), table.base);
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_rate_is_ensured() {
        let table = ExchangeRateTable::new(
            "USD",
            vec![("CNY".to_string(), Decimal::from_str("7.25").unwrap())],
        );
        assert_eq!(table.rate("USD"), Some(Decimal::ONE));
        assert_eq!(table.rate("CNY"), Some(Decimal::from_str("7.25").unwrap()));
        assert_eq!(table.rate("XXX"), None);
    }

    #[test]
    fn rate_precision_survives_json_parsing() {
        // More significant digits than an f64 can carry; the raw JSON text
        // must reach Decimal intact.
        let response: RatesResponse = serde_json::from_str(
            r#"{"base":"USD","rates":{"VEF":248209.123456789012345678}}"#,
        )
        .unwrap();
        let number = response.rates.unwrap().remove("VEF").unwrap();
        assert_eq!(
            Decimal::from_str(&number.to_string()).unwrap(),
            Decimal::from_str("248209.123456789012345678").unwrap()
        );
    }

    #[test]
    fn explicit_base_entry_is_not_clobbered() {
        let table = ExchangeRateTable::new(
            "USD",
            vec![("USD".to_string(), Decimal::ONE)],
        );
        assert_eq!(table.len(), 1);
    }
}
