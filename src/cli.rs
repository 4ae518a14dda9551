//! Command-line interface definitions for Hydrogen News.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Paths can also be provided via environment variables.

use chrono::NaiveDate;
use clap::Parser;

/// Command-line arguments for one store update.
///
/// By default a run scrapes every configured source. `--input` merges a JSON
/// batch instead, and `--offline` only re-derives the views from `all.json`.
///
/// # Examples
///
/// ```sh
/// # Scrape and update ./data
/// hydrogen_news
///
/// # Merge a prepared batch into another directory
/// hydrogen_news -d ./site/data -i batch.json
///
/// # Rebuild the views for a fixed day, without network access
/// hydrogen_news --offline --as-of 2025-06-07
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory holding all.json and the derived views
    #[arg(short, long, env = "NEWS_DATA_DIR", default_value = "data")]
    pub data_dir: String,

    /// Optional path to config.yaml file
    #[arg(short, long, env = "NEWS_CONFIG")]
    pub config: Option<String>,

    /// JSON array of records to merge instead of scraping
    #[arg(short, long, conflicts_with = "offline")]
    pub input: Option<String>,

    /// Skip scraping; only rebuild views from the existing store
    #[arg(long)]
    pub offline: bool,

    /// Treat this date (YYYY-MM-DD) as today
    #[arg(long)]
    pub as_of: Option<NaiveDate>,

    /// Last day (YYYY-MM-DD) of the weekly window; defaults to the newest stored date
    #[arg(long)]
    pub week_ending: Option<NaiveDate>,
}
