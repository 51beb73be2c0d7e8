//! Year-partitioned snapshot archive.
//!
//! Layout: `archive/<year>/<stamped filename>`. The year comes from the
//! `YYYYMMDD_HHMMSS` stamp embedded in the filename, never from filesystem
//! metadata, which does not survive checkouts. The archive is append-only:
//! nothing here ever deletes or overwrites an existing file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;

/// Year component of a stamped archive filename like
/// `spotify_prices_all_countries_20250630_143025.json`.
pub fn year_from_filename(filename: &str) -> Option<String> {
    let stamp = Regex::new(r"(\d{8})_\d{6}\.json$").unwrap();
    let caps = stamp.captures(filename)?;
    Some(caps[1][..4].to_string())
}

/// Place stamped bytes into the correct year partition.
///
/// Idempotent: an identical file already in place is a skip. A different
/// file under the same stamp is a conflict; the original is preserved and a
/// warning surfaced, because losing a historical capture is worse than
/// keeping a stale one.
pub fn store_snapshot(archive_dir: &str, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
    let year = year_from_filename(filename)
        .with_context(|| format!("No timestamp in archive filename: {}", filename))?;
    let year_dir = Path::new(archive_dir).join(&year);
    fs::create_dir_all(&year_dir)
        .with_context(|| format!("Failed to create {}", year_dir.display()))?;

    let target = year_dir.join(filename);
    if target.exists() {
        let existing = fs::read(&target)
            .with_context(|| format!("Failed to read {}", target.display()))?;
        if existing == bytes {
            println!("  {} already archived, skipping", filename);
        } else {
            eprintln!(
                "  WARNING: {} already archived with different content; keeping the original",
                filename
            );
        }
        return Ok(target);
    }

    fs::write(&target, bytes).with_context(|| format!("Failed to write {}", target.display()))?;
    Ok(target)
}

/// Relocate legacy unpartitioned files from the archive root into their year
/// partitions. Runs on every scrape so a freshly adopted checkout heals
/// itself. Returns the number of files moved.
pub fn migrate_legacy(archive_dir: &str) -> Result<usize> {
    let root = Path::new(archive_dir);
    if !root.is_dir() {
        return Ok(0);
    }

    let mut migrated = 0;
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(filename) = path.file_name().and_then(|n| n.to_str()).map(String::from) else {
            continue;
        };
        let Some(year) = year_from_filename(&filename) else {
            continue;
        };

        let year_dir = root.join(&year);
        fs::create_dir_all(&year_dir)?;
        let target = year_dir.join(&filename);
        if target.exists() {
            // Same stamp already partitioned; leave both untouched rather
            // than clobber either copy.
            eprintln!(
                "  WARNING: {} exists in partition {}, leaving the root copy in place",
                filename, year
            );
            continue;
        }
        fs::rename(&path, &target)
            .with_context(|| format!("Failed to move {} into {}", filename, year))?;
        println!("  migrated {} -> {}/", filename, year);
        migrated += 1;
    }

    if migrated > 0 {
        println!("Migrated {} legacy archive files into year partitions", migrated);
    }
    Ok(migrated)
}

/// Per-year file counts for the whole archive tree.
pub fn statistics(archive_dir: &str) -> Result<BTreeMap<String, usize>> {
    let mut stats = BTreeMap::new();
    let root = Path::new(archive_dir);
    if !root.is_dir() {
        return Ok(stats);
    }

    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !path.is_dir() || name.len() != 4 || !name.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        let count = fs::read_dir(&path)?
            .flatten()
            .filter(|e| {
                e.path().extension().map_or(false, |ext| ext == "json") && e.path().is_file()
            })
            .count();
        stats.insert(name.to_string(), count);
    }
    Ok(stats)
}

pub fn print_statistics(archive_dir: &str) -> Result<()> {
    let stats = statistics(archive_dir)?;
    let total: usize = stats.values().sum();
    println!(
        "Archive: {} files across {} year partitions",
        total,
        stats.len()
    );
    for (year, count) in stats.iter().rev() {
        println!("  {}: {} files", year, count);
    }
    Ok(())
}

/// Standalone `archive` subcommand: heal the tree and report its shape.
pub fn run_archive(archive_dir: &str) -> Result<()> {
    let migrated = migrate_legacy(archive_dir)?;
    if migrated == 0 {
        println!("No legacy archive files to migrate");
    }
    print_statistics(archive_dir)
}
