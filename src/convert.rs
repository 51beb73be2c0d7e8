//! Price-string parsing and currency normalization.

use std::fs;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use chrono::Local;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::catalog;
use crate::rates::{self, ExchangeRateTable};
use crate::report;
use crate::types::{ConvertedPlan, NormalizedRecord, RawSnapshot};
use crate::{archive, ARCHIVE_DIR, REFERENCE_PLAN, REPORT_PREFIX};

/// Currency symbols to ISO codes, longest symbol first so `US$` wins over
/// `$`. Only consulted when a record arrives without a catalog currency.
const CURRENCY_SYMBOLS: &[(&str, &str)] = &[
    ("US$", "USD"),
    ("CA$", "CAD"),
    ("HK$", "HKD"),
    ("MX$", "MXN"),
    ("NZ$", "NZD"),
    ("NT$", "TWD"),
    ("R$", "BRL"),
    ("C$", "CAD"),
    ("A$", "AUD"),
    ("S$", "SGD"),
    ("zł", "PLN"),
    ("Kč", "CZK"),
    ("Ft", "HUF"),
    ("kr", "SEK"),
    ("€", "EUR"),
    ("£", "GBP"),
    ("¥", "JPY"),
    ("￥", "JPY"),
    ("₹", "INR"),
    ("₱", "PHP"),
    ("₪", "ILS"),
    ("₨", "PKR"),
    ("₦", "NGN"),
    ("₵", "GHS"),
    ("₡", "CRC"),
    ("₩", "KRW"),
    ("₴", "UAH"),
    ("₽", "RUB"),
    ("₺", "TRY"),
    ("₫", "VND"),
    ("$", "USD"),
];

/// Guess the currency from symbols embedded in a price string.
pub fn detect_currency(price: &str) -> Option<&'static str> {
    CURRENCY_SYMBOLS
        .iter()
        .find(|(symbol, _)| price.contains(symbol))
        .map(|(_, code)| *code)
}

/// Parse the numeric amount out of a localized price string.
///
/// Storefronts format prices with local conventions: `1,234.56` (US),
/// `1.234,56` (EU), `5,99` (comma decimal), `2.499` (dot thousands). The
/// heuristics disambiguate by separator position and fraction length.
pub fn parse_amount(price: &str) -> Option<Decimal> {
    let token_re = Regex::new(r"[\d.,]+").unwrap();
    let token = token_re
        .find_iter(price)
        .map(|m| m.as_str())
        .filter(|t| t.chars().any(|c| c.is_ascii_digit()))
        .max_by_key(|t| t.len())?;

    let has_comma = token.contains(',');
    let has_dot = token.contains('.');

    let cleaned = if has_comma && has_dot {
        let comma_pos = token.rfind(',').unwrap();
        let dot_pos = token.rfind('.').unwrap();
        if comma_pos > dot_pos {
            // European: dot groups thousands, comma is the decimal point.
            token.replace('.', "").replace(',', ".")
        } else {
            token.replace(',', "")
        }
    } else if has_comma {
        let parts: Vec<&str> = token.split(',').collect();
        if parts.len() == 2 && parts[1].len() <= 2 {
            // "5,99" reads as a decimal, "2,499" as a thousands group.
            token.replace(',', ".")
        } else {
            token.replace(',', "")
        }
    } else if has_dot {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() == 2 && parts[1].len() <= 2 {
            token.to_string()
        } else {
            token.replace('.', "")
        }
    } else {
        token.to_string()
    };

    let cleaned = cleaned.trim_matches(|c| c == '.' || c == ',');
    Decimal::from_str(cleaned).ok()
}

/// Convert an amount into CNY via the base-relative rate table, rounded
/// half-up to cents. `None` marks the conversion as failed; the caller keeps
/// the plan around rather than dropping or zeroing it.
pub fn convert_to_cny(
    amount: Decimal,
    currency: &str,
    table: &ExchangeRateTable,
) -> Option<Decimal> {
    let round = |d: Decimal| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if currency == "CNY" {
        return Some(round(amount));
    }
    let cny_rate = table.rate("CNY")?;
    let original_rate = table.rate(currency)?;
    if original_rate.is_zero() {
        return None;
    }
    Some(round(amount / original_rate * cny_rate))
}

/// Attach converted prices to every snapshot record. Exactly one output
/// record per input record, including records whose currency has no rate.
pub fn normalize(snapshot: &RawSnapshot, table: &ExchangeRateTable) -> Vec<NormalizedRecord> {
    let mut records = Vec::with_capacity(snapshot.countries.len());

    for (code, prices) in &snapshot.countries {
        let name = catalog::lookup(code)
            .map(|c| c.name.to_string())
            .unwrap_or_else(|| code.clone());
        let currency = if prices.currency.is_empty() {
            prices
                .plans
                .iter()
                .find_map(|(_, price)| detect_currency(price))
                .unwrap_or("USD")
                .to_string()
        } else {
            prices.currency.clone()
        };

        let plans = prices
            .plans
            .iter()
            .map(|(plan, price)| {
                let amount = parse_amount(price);
                let price_cny = amount.and_then(|a| convert_to_cny(a, &currency, table));
                ConvertedPlan {
                    plan: plan.to_string(),
                    price: price.to_string(),
                    amount,
                    price_cny,
                }
            })
            .collect();

        records.push(NormalizedRecord {
            country_code: code.clone(),
            country_name: name,
            currency,
            plans,
        });
    }

    records
}

pub fn run_convert(input: &str, output: &str, top: usize) -> Result<()> {
    let raw = fs::read_to_string(input)
        .with_context(|| format!("Failed to read snapshot: {}", input))?;
    let snapshot: RawSnapshot =
        serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", input))?;
    println!("Loaded {} countries from {}", snapshot.countries.len(), input);

    let table = rates::fetch_rates("USD").context("Cannot convert without a rate table")?;
    if table.rate("CNY").is_none() {
        bail!("Rate table has no CNY entry; refusing to emit garbage conversions");
    }

    let mut records = normalize(&snapshot, &table);
    report::rank(&mut records, REFERENCE_PLAN);

    let report_json = report::to_json(&records)?;
    fs::write(output, &report_json).with_context(|| format!("Failed to write {}", output))?;
    println!("Report written to {}", output);

    // Keep a stamped copy in the archive so price changes can be diffed
    // against it later.
    let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let filename = format!("{}{}.json", REPORT_PREFIX, stamp);
    archive::store_snapshot(ARCHIVE_DIR, &filename, report_json.as_bytes())?;

    report::print_top(&records, REFERENCE_PLAN, top);

    let ranked = records
        .iter()
        .filter(|r| r.reference_price(REFERENCE_PLAN).is_some())
        .count();
    let failed = snapshot.failed.len();
    println!(
        "\n{} countries ranked, {} without a {} price, {} scrape failures",
        ranked,
        records.len() - ranked,
        REFERENCE_PLAN,
        failed
    );
    if ranked == 0 {
        bail!("No country produced a rankable {} price", REFERENCE_PLAN);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CountryPrices, PlanMap};
    use std::collections::BTreeMap;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn fixture_table() -> ExchangeRateTable {
        ExchangeRateTable::new(
            "USD",
            vec![
                ("CNY".to_string(), dec("7.2")),
                ("NGN".to_string(), dec("1500")),
                ("INR".to_string(), dec("83")),
                ("EUR".to_string(), dec("0.9")),
            ],
        )
    }

    #[test]
    fn parses_us_format() {
        assert_eq!(parse_amount("$1,234.56"), Some(dec("1234.56")));
        assert_eq!(parse_amount("US$16.99 / month"), Some(dec("16.99")));
    }

    #[test]
    fn parses_european_format() {
        assert_eq!(parse_amount("€1.234,56"), Some(dec("1234.56")));
        assert_eq!(parse_amount("5,99 € per month"), Some(dec("5.99")));
    }

    #[test]
    fn bare_separators_read_as_thousands_groups() {
        assert_eq!(parse_amount("Rp 2,499"), Some(dec("2499")));
        assert_eq!(parse_amount("2.499 kr"), Some(dec("2499")));
    }

    #[test]
    fn picks_the_longest_numeric_token() {
        // "per 1 month" style noise must not shadow the actual price.
        assert_eq!(parse_amount("₦900 for 1 month"), Some(dec("900")));
    }

    #[test]
    fn unparseable_prices_yield_none() {
        assert_eq!(parse_amount("free"), None);
        assert_eq!(parse_amount(""), None);
    }

    #[test]
    fn detects_prefixed_symbols_before_bare_dollar() {
        assert_eq!(detect_currency("US$11.99"), Some("USD"));
        assert_eq!(detect_currency("NT$149"), Some("TWD"));
        assert_eq!(detect_currency("₦900"), Some("NGN"));
        assert_eq!(detect_currency("12.99"), None);
    }

    #[test]
    fn converts_through_usd_base() {
        let table = fixture_table();
        // 900 NGN / 1500 = 0.60 USD * 7.2 = 4.32 CNY
        assert_eq!(convert_to_cny(dec("900"), "NGN", &table), Some(dec("4.32")));
        // CNY passes through with rounding only
        assert_eq!(convert_to_cny(dec("10.005"), "CNY", &table), Some(dec("10.01")));
        // Missing rate is a failure marker, not a zero
        assert_eq!(convert_to_cny(dec("10"), "XXX", &table), None);
    }

    fn snapshot_of(entries: &[(&str, &str, &[(&str, &str)])]) -> RawSnapshot {
        let mut countries = BTreeMap::new();
        for (code, currency, plans) in entries {
            let plan_map: PlanMap = plans
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            countries.insert(
                code.to_string(),
                CountryPrices {
                    currency: currency.to_string(),
                    plans: plan_map,
                },
            );
        }
        RawSnapshot {
            captured_at: "2025-06-30T14:30:25+00:00".to_string(),
            countries,
            failed: BTreeMap::new(),
        }
    }

    #[test]
    fn one_normalized_record_per_input_record() {
        let snapshot = snapshot_of(&[
            ("NG", "NGN", &[("Premium Family", "₦900")]),
            ("ZZ", "ZZZ", &[("Premium Family", "999")]),
            ("US", "USD", &[("Premium Family", "not a price")]),
        ]);
        let records = normalize(&snapshot, &fixture_table());
        assert_eq!(records.len(), 3);

        let ng = records.iter().find(|r| r.country_code == "NG").unwrap();
        assert_eq!(ng.plans[0].price_cny, Some(dec("4.32")));

        // Missing rate: amount parses, conversion fails, plan is kept.
        let zz = records.iter().find(|r| r.country_code == "ZZ").unwrap();
        assert_eq!(zz.plans[0].amount, Some(dec("999")));
        assert_eq!(zz.plans[0].price_cny, None);

        // Unparseable price: plan is kept with both markers unset.
        let us = records.iter().find(|r| r.country_code == "US").unwrap();
        assert_eq!(us.plans[0].amount, None);
        assert_eq!(us.plans[0].price_cny, None);
    }

    #[test]
    fn missing_snapshot_currency_falls_back_to_symbol_detection() {
        let snapshot = snapshot_of(&[("IN", "", &[("Premium Family", "₹179")])]);
        let records = normalize(&snapshot, &fixture_table());
        assert_eq!(records[0].currency, "INR");
        // 179 / 83 * 7.2 = 15.5277... -> 15.53
        assert_eq!(records[0].plans[0].price_cny, Some(dec("15.53")));
    }

    #[test]
    fn normalization_is_deterministic() {
        let snapshot = snapshot_of(&[
            ("NG", "NGN", &[("Premium Family", "₦900")]),
            ("IN", "INR", &[("Premium Family", "₹179")]),
        ]);
        let table = fixture_table();
        let mut a = normalize(&snapshot, &table);
        let mut b = normalize(&snapshot, &table);
        report::rank(&mut a, "Premium Family");
        report::rank(&mut b, "Premium Family");
        assert_eq!(report::to_json(&a).unwrap(), report::to_json(&b).unwrap());
    }
}
