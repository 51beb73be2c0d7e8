//! Price-change detection between the current report and the archive.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use rust_decimal::Decimal;

use crate::types::ReportEntry;
use crate::{archive, REPORT_PREFIX};

/// One detected difference between two report generations.
#[derive(Debug, Clone, PartialEq)]
pub enum PriceChange {
    Changed {
        country: String,
        plan: String,
        old_cny: Decimal,
        new_cny: Decimal,
    },
    Added {
        country: String,
        plan: String,
        new_cny: Decimal,
    },
    Removed {
        country: String,
        plan: String,
        old_cny: Decimal,
    },
}

/// Every listed plan, with its converted price when conversion succeeded.
fn price_index(entries: &[ReportEntry]) -> BTreeMap<(String, String), Option<Decimal>> {
    let mut index = BTreeMap::new();
    for entry in entries {
        for (plan, cny) in entry.converted_prices_cny.iter() {
            index.insert((entry.country_code.clone(), plan.to_string()), *cny);
        }
    }
    index
}

/// Compare two report generations plan-by-plan. A plan that is still listed
/// but failed to convert this run is neither a removal nor a change; deltas
/// are only reported between two successfully converted prices.
pub fn compare_reports(old: &[ReportEntry], new: &[ReportEntry]) -> Vec<PriceChange> {
    let old_index = price_index(old);
    let new_index = price_index(new);
    let mut changes = Vec::new();

    for ((country, plan), new_cny) in &new_index {
        let Some(new_cny) = new_cny else { continue };
        match old_index.get(&(country.clone(), plan.clone())) {
            Some(Some(old_cny)) if old_cny != new_cny => changes.push(PriceChange::Changed {
                country: country.clone(),
                plan: plan.clone(),
                old_cny: *old_cny,
                new_cny: *new_cny,
            }),
            // Unchanged, or previously listed without a usable price: no
            // delta to report either way.
            Some(_) => {}
            None => changes.push(PriceChange::Added {
                country: country.clone(),
                plan: plan.clone(),
                new_cny: *new_cny,
            }),
        }
    }
    for ((country, plan), old_cny) in &old_index {
        let Some(old_cny) = old_cny else { continue };
        if !new_index.contains_key(&(country.clone(), plan.clone())) {
            changes.push(PriceChange::Removed {
                country: country.clone(),
                plan: plan.clone(),
                old_cny: *old_cny,
            });
        }
    }
    changes
}

/// Newest archived report whose content differs from `current_bytes`. The
/// current run's own archived copy is skipped that way.
pub fn find_previous_report(archive_dir: &str, current_bytes: &[u8]) -> Result<Option<PathBuf>> {
    let root = Path::new(archive_dir);
    if !root.is_dir() {
        return Ok(None);
    }

    let mut candidates = Vec::new();
    for year_entry in fs::read_dir(root)? {
        let year_path = year_entry?.path();
        if !year_path.is_dir() {
            continue;
        }
        for entry in fs::read_dir(&year_path)? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.starts_with(REPORT_PREFIX) && archive::year_from_filename(name).is_some() {
                candidates.push(path);
            }
        }
    }

    // Filename stamps sort lexicographically in time order.
    candidates.sort_by(|a, b| b.file_name().cmp(&a.file_name()));
    for path in candidates {
        if fs::read(&path)? != current_bytes {
            return Ok(Some(path));
        }
    }
    Ok(None)
}

fn render_changelog_section(changes: &[PriceChange]) -> String {
    let mut out = format!("## {}\n\n", Local::now().format("%Y-%m-%d %H:%M:%S"));
    let mut changed = Vec::new();
    let mut added = Vec::new();
    let mut removed = Vec::new();

    for change in changes {
        match change {
            PriceChange::Changed { country, plan, old_cny, new_cny } => {
                let delta = new_cny - old_cny;
                let sign = if delta.is_sign_positive() { "+" } else { "" };
                changed.push(format!(
                    "- {} {}: ¥{} -> ¥{} ({}{})",
                    country, plan, old_cny, new_cny, sign, delta
                ));
            }
            PriceChange::Added { country, plan, new_cny } => {
                added.push(format!("- {} {}: ¥{}", country, plan, new_cny));
            }
            PriceChange::Removed { country, plan, old_cny } => {
                removed.push(format!("- {} {}: was ¥{}", country, plan, old_cny));
            }
        }
    }

    for (title, lines) in [
        ("Price changes", changed),
        ("New plans", added),
        ("Disappeared plans", removed),
    ] {
        if !lines.is_empty() {
            out.push_str(&format!("### {}\n{}\n\n", title, lines.join("\n")));
        }
    }
    out
}

pub fn run_diff(current: &str, archive_dir: &str, changelog: &str) -> Result<()> {
    let current_bytes =
        fs::read(current).with_context(|| format!("Failed to read report: {}", current))?;
    let new_entries: Vec<ReportEntry> = serde_json::from_slice(&current_bytes)
        .with_context(|| format!("Failed to parse {}", current))?;

    let Some(previous_path) = find_previous_report(archive_dir, &current_bytes)? else {
        println!("No previous archived report to compare against");
        return Ok(());
    };
    println!("Comparing against {}", previous_path.display());

    let old_bytes = fs::read(&previous_path)?;
    let old_entries: Vec<ReportEntry> = serde_json::from_slice(&old_bytes)
        .with_context(|| format!("Failed to parse {}", previous_path.display()))?;

    let changes = compare_reports(&old_entries, &new_entries);
    if changes.is_empty() {
        println!("No price changes detected");
        return Ok(());
    }

    let section = render_changelog_section(&changes);
    print!("{}", section);

    let mut existing = fs::read_to_string(changelog).unwrap_or_default();
    if !existing.is_empty() && !existing.ends_with('\n') {
        existing.push('\n');
    }
    existing.push_str(&section);
    fs::write(changelog, existing)
        .with_context(|| format!("Failed to update {}", changelog))?;
    println!("{} changes appended to {}", changes.len(), changelog);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OrderedMap, PlanMap};
    use std::str::FromStr;
    use tempfile::TempDir;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn entry(code: &str, plans: &[(&str, Option<&str>)]) -> ReportEntry {
        let mut original = PlanMap::new();
        let mut converted: OrderedMap<Option<Decimal>> = OrderedMap::new();
        for (plan, cny) in plans {
            original.insert(plan.to_string(), "raw".to_string());
            converted.insert(plan.to_string(), cny.map(dec));
        }
        ReportEntry {
            country_code: code.to_string(),
            country_name: code.to_string(),
            currency: "USD".to_string(),
            original_prices: original,
            converted_prices_cny: converted,
        }
    }

    #[test]
    fn detects_changes_additions_and_removals() {
        let old = vec![
            entry("US", &[("Premium Family", Some("122.33")), ("Premium Duo", Some("100.00"))]),
        ];
        let new = vec![
            entry("US", &[("Premium Family", Some("130.00")), ("Premium Student", Some("50.00"))]),
        ];
        let changes = compare_reports(&old, &new);
        assert_eq!(changes.len(), 3);
        assert!(changes.contains(&PriceChange::Changed {
            country: "US".into(),
            plan: "Premium Family".into(),
            old_cny: dec("122.33"),
            new_cny: dec("130.00"),
        }));
        assert!(changes.contains(&PriceChange::Added {
            country: "US".into(),
            plan: "Premium Student".into(),
            new_cny: dec("50.00"),
        }));
        assert!(changes.contains(&PriceChange::Removed {
            country: "US".into(),
            plan: "Premium Duo".into(),
            old_cny: dec("100.00"),
        }));
    }

    #[test]
    fn conversion_failures_are_not_removals() {
        let old = vec![entry("US", &[("Premium Family", Some("122.33"))])];
        let new = vec![entry("US", &[("Premium Family", None)])];
        // The plan is still listed, it just failed to convert this run.
        assert!(compare_reports(&old, &new).is_empty());
    }

    #[test]
    fn identical_reports_produce_no_changes() {
        let report = vec![entry("US", &[("Premium Family", Some("122.33"))])];
        assert!(compare_reports(&report, &report).is_empty());
    }

    #[test]
    fn previous_report_skips_the_current_copy() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().to_str().unwrap();

        archive::store_snapshot(dir, "spotify_prices_cny_sorted_20250101_000000.json", b"old")
            .unwrap();
        archive::store_snapshot(dir, "spotify_prices_cny_sorted_20250601_000000.json", b"current")
            .unwrap();

        let found = find_previous_report(dir, b"current").unwrap().unwrap();
        assert!(found
            .to_str()
            .unwrap()
            .ends_with("spotify_prices_cny_sorted_20250101_000000.json"));

        // Nothing but our own copy: no previous report.
        let tmp2 = TempDir::new().unwrap();
        let dir2 = tmp2.path().to_str().unwrap();
        archive::store_snapshot(dir2, "spotify_prices_cny_sorted_20250601_000000.json", b"current")
            .unwrap();
        assert!(find_previous_report(dir2, b"current").unwrap().is_none());
    }
}
