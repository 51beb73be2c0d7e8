//! Snapshot and report data types with JSON serialization support

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use rust_decimal::Decimal;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A JSON-object map that preserves insertion order.
///
/// Storefront pages list plans in a meaningful order (Individual, Duo,
/// Family, ...) and the snapshot format keeps that order, so a sorted map
/// won't do here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderedMap<V>(Vec<(String, V)>);

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        OrderedMap(Vec::new())
    }

    /// Insert a key, replacing the value if the key is already present.
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        if let Some(slot) = self.0.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.0.push((key, value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<V> FromIterator<(String, V)> for OrderedMap<V> {
    fn from_iter<T: IntoIterator<Item = (String, V)>>(iter: T) -> Self {
        let mut map = OrderedMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MapVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for MapVisitor<V> {
            type Value = OrderedMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = OrderedMap::new();
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    map.insert(key, value);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(MapVisitor(PhantomData))
    }
}

/// Plan name -> raw price string, in page order.
pub type PlanMap = OrderedMap<String>;

/// One country's scraped prices inside a snapshot file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryPrices {
    /// ISO 4217 code the storefront bills in.
    pub currency: String,
    pub plans: PlanMap,
}

/// A complete raw capture across all countries at one point in time.
///
/// This is the unit of archival; its `captured_at` timestamp doubles as the
/// archive filename stamp and dedup key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSnapshot {
    /// ISO 8601 capture time.
    pub captured_at: String,
    pub countries: BTreeMap<String, CountryPrices>,
    /// Countries that exhausted their retries, code -> display name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub failed: BTreeMap<String, String>,
}

impl RawSnapshot {
    /// Archive filename stamp (`YYYYMMDD_HHMMSS`) derived from `captured_at`,
    /// so the name on disk and the embedded timestamp can never disagree.
    /// `None` if `captured_at` is not valid RFC 3339.
    pub fn filename_stamp(&self) -> Option<String> {
        chrono::DateTime::parse_from_rfc3339(&self.captured_at)
            .ok()
            .map(|t| t.format("%Y%m%d_%H%M%S").to_string())
    }
}

/// One plan after conversion. `price_cny` of `None` marks a per-plan
/// conversion failure (unparseable price or missing rate); the plan is kept
/// so the report accounts for it.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedPlan {
    pub plan: String,
    pub price: String,
    pub amount: Option<Decimal>,
    pub price_cny: Option<Decimal>,
}

/// A country record with converted prices attached. Exactly one of these is
/// produced per snapshot country, even when every plan failed to convert.
#[derive(Debug, Clone)]
pub struct NormalizedRecord {
    pub country_code: String,
    pub country_name: String,
    pub currency: String,
    pub plans: Vec<ConvertedPlan>,
}

impl NormalizedRecord {
    /// Converted price of the named reference plan (substring match, the way
    /// the storefront labels it, e.g. "Premium Family").
    pub fn reference_price(&self, reference_plan: &str) -> Option<Decimal> {
        self.plans
            .iter()
            .find(|p| p.plan.contains(reference_plan))
            .and_then(|p| p.price_cny)
    }
}

/// One entry in the ranked report file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    pub country_code: String,
    pub country_name: String,
    pub currency: String,
    pub original_prices: PlanMap,
    pub converted_prices_cny: OrderedMap<Option<Decimal>>,
}

impl From<&NormalizedRecord> for ReportEntry {
    fn from(rec: &NormalizedRecord) -> Self {
        let original_prices = rec
            .plans
            .iter()
            .map(|p| (p.plan.clone(), p.price.clone()))
            .collect();
        let converted_prices_cny = rec
            .plans
            .iter()
            .map(|p| (p.plan.clone(), p.price_cny))
            .collect();
        ReportEntry {
            country_code: rec.country_code.clone(),
            country_name: rec.country_name.clone(),
            currency: rec.currency.clone(),
            original_prices,
            converted_prices_cny,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordered_map_preserves_insertion_order() {
        let mut map = PlanMap::new();
        map.insert("Premium Individual", "US$11.99".to_string());
        map.insert("Premium Duo", "US$16.99".to_string());
        map.insert("Premium Family", "US$19.99".to_string());

        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(
            json,
            r#"{"Premium Individual":"US$11.99","Premium Duo":"US$16.99","Premium Family":"US$19.99"}"#
        );

        let back: PlanMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn ordered_map_insert_replaces_duplicates() {
        let mut map = PlanMap::new();
        map.insert("Premium Family", "€10.99".to_string());
        map.insert("Premium Family", "€11.99".to_string());
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("Premium Family").map(String::as_str), Some("€11.99"));
    }

    #[test]
    fn snapshot_round_trips_without_failed_field() {
        let json = r#"{
            "captured_at": "2025-06-30T14:30:25+00:00",
            "countries": {
                "US": {
                    "currency": "USD",
                    "plans": { "Premium Family": "$19.99" }
                }
            }
        }"#;
        let snap: RawSnapshot = serde_json::from_str(json).unwrap();
        assert!(snap.failed.is_empty());
        assert_eq!(snap.countries["US"].currency, "USD");

        // failed is omitted on output when empty
        let out = serde_json::to_string(&snap).unwrap();
        assert!(!out.contains("failed"));
    }

    #[test]
    fn filename_stamp_derives_from_captured_at() {
        let snap = RawSnapshot {
            captured_at: "2024-12-31T23:59:59+00:00".to_string(),
            countries: BTreeMap::new(),
            failed: BTreeMap::new(),
        };
        let stamp = snap.filename_stamp().unwrap();
        assert_eq!(stamp, "20241231_235959");

        // The year partition follows the embedded capture time, even right
        // at a year boundary.
        let filename = format!("{}{}.json", crate::SNAPSHOT_PREFIX, stamp);
        assert_eq!(
            crate::archive::year_from_filename(&filename),
            Some("2024".to_string())
        );

        let bad = RawSnapshot {
            captured_at: "yesterday-ish".to_string(),
            countries: BTreeMap::new(),
            failed: BTreeMap::new(),
        };
        assert_eq!(bad.filename_stamp(), None);
    }

    #[test]
    fn reference_price_uses_substring_match() {
        let rec = NormalizedRecord {
            country_code: "US".into(),
            country_name: "USA".into(),
            currency: "USD".into(),
            plans: vec![ConvertedPlan {
                plan: "Premium Family Plan".into(),
                price: "$19.99".into(),
                amount: Some(Decimal::new(1999, 2)),
                price_cny: Some(Decimal::new(14000, 2)),
            }],
        };
        assert_eq!(
            rec.reference_price("Premium Family"),
            Some(Decimal::new(14000, 2))
        );
        assert_eq!(rec.reference_price("Premium Duo"), None);
    }
}
