use anyhow::Result;
use clap::{Parser, Subcommand};

mod archive;
mod browser;
mod catalog;
mod convert;
mod diff;
mod rates;
mod report;
mod scrape;
mod types;

pub const RATES_API_URL: &str = "https://openexchangerates.org/api/latest.json?app_id=";
pub const ARCHIVE_DIR: &str = "archive";
pub const SNAPSHOT_PREFIX: &str = "spotify_prices_all_countries_";
pub const LATEST_SNAPSHOT: &str = "spotify_prices_all_countries.json";
pub const REPORT_PREFIX: &str = "spotify_prices_cny_sorted_";
pub const LATEST_REPORT: &str = "spotify_prices_cny_sorted.json";

/// Plan used as the ranking sort key. Storefronts label it
/// "Premium Family" (sometimes with suffixes), so substring match.
pub const REFERENCE_PLAN: &str = "Premium Family";

#[derive(Parser)]
#[command(name = "spotify-prices")]
#[command(about = "Scrape Spotify Premium prices per country and rank them by CNY cost")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape all storefronts into a raw snapshot and archive it
    Scrape {
        /// Quiet mode - suppress progress output
        #[arg(short, long)]
        quiet: bool,
    },
    /// Convert the latest snapshot to CNY and write the ranked report
    Convert {
        /// Input raw snapshot file
        #[arg(short, long, default_value = LATEST_SNAPSHOT)]
        input: String,
        /// Output ranked report file
        #[arg(short, long, default_value = LATEST_REPORT)]
        output: String,
        /// How many of the cheapest markets to print
        #[arg(short, long, default_value_t = 10)]
        top: usize,
    },
    /// Migrate legacy archive files and show per-year statistics
    Archive,
    /// Detect price changes against the newest archived report
    Diff {
        /// Current ranked report file
        #[arg(short, long, default_value = LATEST_REPORT)]
        report: String,
        /// Changelog file to append detected changes to
        #[arg(short, long, default_value = "CHANGELOG.md")]
        changelog: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scrape { quiet } => scrape::run_scrape(quiet),
        Commands::Convert { input, output, top } => convert::run_convert(&input, &output, top),
        Commands::Archive => archive::run_archive(ARCHIVE_DIR),
        Commands::Diff { report, changelog } => diff::run_diff(&report, ARCHIVE_DIR, &changelog),
    }
}
