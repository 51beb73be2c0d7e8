//! Ranking and report rendering.

use std::cmp::Ordering;

use anyhow::Result;

use crate::types::{NormalizedRecord, ReportEntry};

/// Sort records ascending by the converted price of the reference plan.
/// Records without that price (plan absent or conversion failed) sort after
/// every priced record so the report still accounts for them; ties break by
/// country code to keep the order deterministic.
pub fn rank(records: &mut [NormalizedRecord], reference_plan: &str) {
    records.sort_by(|a, b| {
        let pa = a.reference_price(reference_plan);
        let pb = b.reference_price(reference_plan);
        match (pa, pb) {
            (Some(x), Some(y)) => x
                .cmp(&y)
                .then_with(|| a.country_code.cmp(&b.country_code)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.country_code.cmp(&b.country_code),
        }
    });
}

/// Serialize a ranked record sequence into the report file format: an
/// ordered JSON array, one entry per country.
pub fn to_json(records: &[NormalizedRecord]) -> Result<String> {
    let entries: Vec<ReportEntry> = records.iter().map(ReportEntry::from).collect();
    Ok(serde_json::to_string_pretty(&entries)?)
}

/// Truncating view of the cheapest N records. Never reorders or filters
/// beyond cutting the tail.
pub fn top(records: &[NormalizedRecord], n: usize) -> &[NormalizedRecord] {
    &records[..records.len().min(n)]
}

/// Condensed human-readable table of the cheapest N reference-plan prices.
pub fn print_top(records: &[NormalizedRecord], reference_plan: &str, n: usize) {
    println!("\nCheapest {} markets for {}:", n, reference_plan);
    println!("{}", "-".repeat(60));
    for (i, rec) in top(records, n).iter().enumerate() {
        match rec.reference_price(reference_plan) {
            Some(cny) => {
                let original = rec
                    .plans
                    .iter()
                    .find(|p| p.plan.contains(reference_plan))
                    .map(|p| p.price.as_str())
                    .unwrap_or("");
                println!(
                    "{:2}. {:30} ({}): ¥{:>8} ({} {})",
                    i + 1,
                    rec.country_name,
                    rec.country_code,
                    cny,
                    rec.currency,
                    original
                );
            }
            None => println!(
                "{:2}. {:30} ({}): no {} price",
                i + 1,
                rec.country_name,
                rec.country_code,
                reference_plan
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ConvertedPlan;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn record(code: &str, name: &str, currency: &str, cny: Option<&str>) -> NormalizedRecord {
        NormalizedRecord {
            country_code: code.to_string(),
            country_name: name.to_string(),
            currency: currency.to_string(),
            plans: vec![ConvertedPlan {
                plan: "Premium Family".to_string(),
                price: "x".to_string(),
                amount: cny.map(|_| dec("1")),
                price_cny: cny.map(dec),
            }],
        }
    }

    #[test]
    fn ranks_ascending_with_unpriced_at_the_end() {
        let mut records = vec![
            record("US", "USA", "USD", Some("122.33")),
            record("ZZ", "Nowhere", "ZZZ", None),
            record("NG", "Nigeria", "NGN", Some("4.32")),
            record("IN", "India", "INR", Some("15.53")),
        ];
        rank(&mut records, "Premium Family");
        let codes: Vec<&str> = records.iter().map(|r| r.country_code.as_str()).collect();
        assert_eq!(codes, vec!["NG", "IN", "US", "ZZ"]);

        // Monotonic over the priced prefix.
        let prices: Vec<Decimal> = records
            .iter()
            .filter_map(|r| r.reference_price("Premium Family"))
            .collect();
        assert!(prices.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn equal_prices_break_ties_by_country_code() {
        let mut records = vec![
            record("CA", "Canada", "CAD", Some("50.00")),
            record("AU", "Australia", "AUD", Some("50.00")),
        ];
        rank(&mut records, "Premium Family");
        assert_eq!(records[0].country_code, "AU");
        assert_eq!(records[1].country_code, "CA");
    }

    #[test]
    fn top_truncates_without_reordering() {
        let mut records = vec![
            record("NG", "Nigeria", "NGN", Some("4.32")),
            record("IN", "India", "INR", Some("15.53")),
            record("US", "USA", "USD", Some("122.33")),
        ];
        rank(&mut records, "Premium Family");
        let view = top(&records, 2);
        assert_eq!(view.len(), 2);
        assert_eq!(view[0].country_code, "NG");
        assert_eq!(view[1].country_code, "IN");
        // Asking for more than exists is just the whole slice.
        assert_eq!(top(&records, 10).len(), 3);
    }

    #[test]
    fn report_json_is_an_ordered_array() {
        let mut records = vec![
            record("US", "USA", "USD", Some("122.33")),
            record("NG", "Nigeria", "NGN", Some("4.32")),
        ];
        rank(&mut records, "Premium Family");
        let json = to_json(&records).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        let array = parsed.as_array().unwrap();
        assert_eq!(array[0]["country_code"], "NG");
        assert_eq!(array[1]["country_code"], "US");
        assert_eq!(array[0]["converted_prices_cny"]["Premium Family"], "4.32");
    }
}
