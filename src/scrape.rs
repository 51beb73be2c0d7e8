//! Per-country storefront scraping and raw snapshot writing.

use std::collections::BTreeMap;
use std::fs;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Local;
use regex::Regex;
use scraper::{Html, Selector};

use crate::browser::{Browser, HttpBrowser, NavStatus};
use crate::catalog::{self, CountryEntry};
use crate::types::{CountryPrices, PlanMap, RawSnapshot};
use crate::{archive, ARCHIVE_DIR, LATEST_SNAPSHOT, SNAPSHOT_PREFIX};

/// Selector the scraper waits on before extraction. Prices render into
/// class-tagged containers (or ship in the Next.js data blob), so plain page
/// load is not enough to know they are present.
const PRICE_WAIT_SELECTOR: &str =
    r#"script#__NEXT_DATA__, [class*="price"], [class*="plan"], [class*="subscription"]"#;

const CURRENCY_CHARS: &str = "€$£¥￥₹₱₪₨₦₵₡₩₴₽₺₫";

/// Knobs for retry, pacing and waits. Tests zero the delays out.
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    /// Additional attempts after the first failure.
    pub retries: u32,
    /// Delay before each retry.
    pub backoff: Duration,
    /// Delay between countries. Etiquette, not an optimization: going too
    /// fast trips the storefront's rate limiting and turns into 429s.
    pub pacing: Duration,
    pub wait_timeout: Duration,
    /// Suppress per-country progress output.
    pub quiet: bool,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        ScrapeOptions {
            retries: 2,
            backoff: Duration::from_millis(1500),
            pacing: Duration::from_millis(2000),
            wait_timeout: Duration::from_secs(5),
            quiet: false,
        }
    }
}

/// Extract plan-name/price pairs from a rendered storefront page.
///
/// Three strategies, most reliable first: the structured `__NEXT_DATA__`
/// JSON blob, then pricing table rows, then a regex sweep over the page
/// text. Whichever strategy yields plans first wins.
pub fn extract_plans(html: &str) -> PlanMap {
    let document = Html::parse_document(html);

    let mut plans = extract_structured(&document);
    if plans.is_empty() {
        plans = extract_tables(&document);
    }
    if plans.is_empty() {
        plans = extract_regex(&document);
    }

    // Drop zero-price artifacts ("$0.", "0,00 €") the page sometimes renders
    // as placeholders.
    let zero = Regex::new(r"^[€$£¥￥₹₱₪₨₦₵₡\s]*0[.,]?0*\s*[€$£¥￥₹₱₪₨₦₵₡]*$").unwrap();
    plans
        .iter()
        .filter(|(_, price)| price.chars().any(|c| c.is_ascii_digit()) && !zero.is_match(price))
        .map(|(name, price)| (name.to_string(), price.to_string()))
        .collect()
}

fn extract_structured(document: &Html) -> PlanMap {
    let mut plans = PlanMap::new();
    let sel = Selector::parse("script#__NEXT_DATA__").unwrap();
    let Some(script) = document.select(&sel).next() else {
        return plans;
    };
    let text: String = script.text().collect();
    let Ok(data) = serde_json::from_str::<serde_json::Value>(&text) else {
        return plans;
    };
    let Some(entries) = data
        .pointer("/props/pageProps/components/storefront/plans")
        .and_then(|v| v.as_array())
    else {
        return plans;
    };
    for entry in entries {
        let header = entry
            .get("header")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .trim();
        if header.is_empty() {
            continue;
        }
        // The secondary price is the post-promo recurring price; prefer it
        // over the primary (often an intro offer) when both are present.
        let secondary = entry
            .get("secondaryPriceDescription")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .trim();
        let primary = entry
            .get("primaryPriceDescription")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .trim();
        let price = if !secondary.is_empty() { secondary } else { primary };
        if !price.is_empty() {
            plans.insert(header, price.to_string());
        }
    }
    plans
}

fn extract_tables(document: &Html) -> PlanMap {
    let mut plans = PlanMap::new();
    let table_sel = Selector::parse("table").unwrap();
    let row_sel = Selector::parse("tr").unwrap();
    let cell_sel = Selector::parse("td, th").unwrap();

    for table in document.select(&table_sel) {
        for row in table.select(&row_sel).skip(1) {
            let cells: Vec<String> = row
                .select(&cell_sel)
                .map(|c| {
                    c.text()
                        .collect::<Vec<_>>()
                        .join(" ")
                        .split_whitespace()
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .collect();
            if cells.len() < 2 {
                continue;
            }
            let plan = cells[0].clone();
            let price = cells[cells.len() - 1].clone();
            let pricey = price
                .chars()
                .any(|c| c.is_ascii_digit() || CURRENCY_CHARS.contains(c));
            if !plan.is_empty() && pricey {
                plans.insert(plan, price);
            }
        }
    }
    plans
}

fn extract_regex(document: &Html) -> PlanMap {
    let mut plans = PlanMap::new();
    let text: String = document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ");
    let pattern = Regex::new(
        r"(?i)(Premium\s+(?:Family|Individual|Student|Duo))\s*[:\-]?\s*([€$£¥￥₹₱₪₨₦₵₡]\s?[\d.,]+|[\d.,]+\s?[€$£¥￥₹₱₪₨₦₵₡])",
    )
    .unwrap();
    for cap in pattern.captures_iter(&text) {
        plans.insert(cap[1].trim().to_string(), cap[2].trim().to_string());
    }
    plans
}

/// Scrape one country. Returns `None` once retries are exhausted; a single
/// country failing never aborts the run.
pub fn scrape_country(
    browser: &dyn Browser,
    entry: &CountryEntry,
    opts: &ScrapeOptions,
) -> Option<CountryPrices> {
    for attempt in 0..=opts.retries {
        if attempt > 0 {
            thread::sleep(opts.backoff);
            if !opts.quiet {
                println!("    retry {}/{} for {}", attempt, opts.retries, entry.code);
            }
        }
        match scrape_attempt(browser, entry, opts) {
            Ok(Some(plans)) => {
                return Some(CountryPrices {
                    currency: entry.currency.to_string(),
                    plans,
                })
            }
            Ok(None) => continue,
            Err(e) => {
                eprintln!("    {}: attempt failed: {}", entry.code, e);
                continue;
            }
        }
    }
    None
}

/// One attempt: fresh isolated context, preferred URL then fallback.
/// `Ok(None)` means a clean miss worth retrying (rate limit, no plans).
fn scrape_attempt(
    browser: &dyn Browser,
    entry: &CountryEntry,
    opts: &ScrapeOptions,
) -> Result<Option<PlanMap>> {
    let mut ctx = browser.open_context()?;
    let mut found = None;

    for url in entry.storefront_urls() {
        let status = match ctx.navigate(&url) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("    {}: {} unreachable: {}", entry.code, url, e);
                continue;
            }
        };
        match status {
            NavStatus::Redirect | NavStatus::NotFound => continue,
            NavStatus::RateLimited => {
                // Back off and retry the whole country rather than hammering
                // the fallback URL too.
                break;
            }
            NavStatus::Other(code) => {
                eprintln!("    {}: status {} on {}", entry.code, code, url);
                continue;
            }
            NavStatus::Ok => {}
        }

        // Prices render asynchronously on a real engine; page load alone is
        // not extraction-ready. A miss is still worth an extraction attempt,
        // some storefront variants render prices without the usual class
        // names.
        if let Err(e) = ctx.wait_for(PRICE_WAIT_SELECTOR, opts.wait_timeout) {
            if !opts.quiet {
                println!("    {}: {}", entry.code, e);
            }
        }
        let html = match ctx.extract_text("html") {
            Ok(h) => h,
            Err(_) => continue,
        };
        let plans = extract_plans(&html);
        if !plans.is_empty() {
            if !opts.quiet {
                println!("    {}: {} plans from {}", entry.code, plans.len(), url);
            }
            found = Some(plans);
            break;
        }
    }

    ctx.close();
    Ok(found)
}

/// Scrape every catalog country into one snapshot. Sequential with pacing
/// between countries; each country gets its own isolated context.
pub fn scrape_all(
    browser: &dyn Browser,
    countries: &[CountryEntry],
    opts: &ScrapeOptions,
) -> RawSnapshot {
    let mut results = BTreeMap::new();
    let mut failed = BTreeMap::new();
    let total = countries.len();

    for (i, entry) in countries.iter().enumerate() {
        if !opts.quiet {
            println!("[{}/{}] {} ({})", i + 1, total, entry.code, entry.name);
        }
        match scrape_country(browser, entry, opts) {
            Some(prices) => {
                results.insert(entry.code.to_string(), prices);
            }
            None => {
                eprintln!("    {}: giving up", entry.code);
                failed.insert(entry.code.to_string(), entry.name.to_string());
            }
        }
        if i + 1 < total {
            thread::sleep(opts.pacing);
        }
    }

    RawSnapshot {
        captured_at: Local::now().to_rfc3339(),
        countries: results,
        failed,
    }
}

pub fn run_scrape(quiet: bool) -> Result<()> {
    if !quiet {
        println!(
            "Scraping Spotify Premium prices for {} countries...",
            catalog::all().len()
        );
    }

    let opts = ScrapeOptions { quiet, ..ScrapeOptions::default() };
    let browser = HttpBrowser::new(Duration::from_secs(15));
    let snapshot = scrape_all(&browser, catalog::all(), &opts);

    let ok = snapshot.countries.len();
    let bad = snapshot.failed.len();
    println!("\nScrape complete: {} succeeded, {} failed", ok, bad);
    if bad > 0 {
        let names: Vec<String> = snapshot
            .failed
            .iter()
            .map(|(code, name)| format!("{} ({})", code, name))
            .collect();
        println!("Failed countries: {}", names.join(", "));
    }

    // Write the snapshot before deciding success or failure, so even a bad
    // run leaves whatever was captured on disk. The filename stamp comes
    // from the snapshot's own capture time, never a second clock read.
    let stamp = snapshot
        .filename_stamp()
        .context("Snapshot carries an unparseable captured_at timestamp")?;
    let filename = format!("{}{}.json", SNAPSHOT_PREFIX, stamp);
    let json = serde_json::to_string_pretty(&snapshot)?;

    fs::write(LATEST_SNAPSHOT, &json)
        .with_context(|| format!("Failed to write {}", LATEST_SNAPSHOT))?;
    println!("Latest snapshot written to {}", LATEST_SNAPSHOT);

    archive::migrate_legacy(ARCHIVE_DIR)?;
    let archived = archive::store_snapshot(ARCHIVE_DIR, &filename, json.as_bytes())?;
    println!("Archived to {}", archived.display());
    archive::print_statistics(ARCHIVE_DIR)?;

    if ok == 0 {
        bail!("Scrape produced zero successful countries");
    }
    Ok(())
}
