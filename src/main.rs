//! # Hydrogen News
//!
//! A news aggregation pipeline for Korean energy-trade newspapers. It scrapes
//! article listings, tags articles by hydrogen and energy keywords, writes a
//! short extractive summary, and keeps a deduplicated, date-partitioned JSON
//! store for a static web page.
//!
//! ## Features
//!
//! - Scrapes 에너지신문, 가스신문 and 전기신문 (any CMS sharing their layout
//!   can be added in `config.yaml`)
//! - Keyword tagging and extractive summaries, no external services
//! - Last-write-wins store keyed by url, partitioned by date
//! - `latest.json` and a weekly rollup (`weekly.json`, `weekly.md`)
//!
//! ## Usage
//!
//! ```sh
//! hydrogen_news -d ./data -c config.yaml
//! ```
//!
//! ## Architecture
//!
//! 1. **Collecting**: scrape every source, or read an `--input` batch
//! 2. **Enriching**: resolve dates, tag, summarize; skipped records are counted
//! 3. **Merging**: fold the batch into `all.json`, url by url
//! 4. **Output**: rewrite per-date files, the latest view, and the weekly rollup

use clap::Parser;
use std::error::Error;
use std::path::Path;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod enrich;
mod fetch;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
mod store;
mod utils;
mod weekly;

use cli::Cli;
use config::Config;
use models::RecordOutcome;
use outputs::{OutputPaths, json};
use utils::ensure_writable_dir;

#[tokio::main(flavor = "current_thread")]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("hydrogen_news starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let config = Config::load(args.config.as_deref()).await?;
    let today = args.as_of.unwrap_or_else(|| config.today());
    info!(%today, offset = %config.offset(), policy = ?config.date_policy, "Resolved run date");

    // Early check: ensure the data dir is writable
    if let Err(e) = ensure_writable_dir(&args.data_dir).await {
        error!(
            path = %args.data_dir,
            error = %e,
            "Data directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let incoming = collect_incoming(&args, &config, today).await?;

    let paths = OutputPaths::new(&args.data_dir);
    let report = match pipeline::update_store(&paths, incoming, &config, today, args.week_ending).await {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "Failed to persist article store");
            return Err(e);
        }
    };

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        stored = report.stored,
        added_or_updated = report.incoming.kept,
        skipped = report.incoming.skipped_total(),
        off_topic = report.incoming.skipped_for("no_keyword_match"),
        dropped_from_store = report.existing.skipped_total(),
        date_files = report.date_files,
        latest_date = ?report.latest_date,
        latest_count = report.latest_count,
        weekly_total = report.weekly_total,
        "Run complete"
    );

    Ok(())
}

/// The batch for this run: an input file, nothing (offline), or a fresh scrape.
async fn collect_incoming(
    args: &Cli,
    config: &Config,
    today: chrono::NaiveDate,
) -> Result<Vec<RecordOutcome>, Box<dyn Error>> {
    if let Some(input) = &args.input {
        return json::load_batch(Path::new(input)).await;
    }
    if args.offline {
        info!("Offline run; rebuilding views from the existing store");
        return Ok(Vec::new());
    }

    let fetcher = fetch::from_config(config)?;
    let raw = scrapers::scrape_all(&fetcher, config).await;
    info!(count = raw.len(), "Scraped articles");

    Ok(raw
        .into_iter()
        .map(|article| enrich::build_article(article, config, today))
        .collect())
}
