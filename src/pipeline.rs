//! One run of the store update: load, admit, merge, derive, persist.
//!
//! ```text
//! all.json ─ load_collection ─ admit ─┐
//!                                     ├─ merge ─ sort ─┬─ all.json
//! incoming outcomes ───────── admit ──┘                ├─ by_date/<date>.json + index.json
//!                                                      ├─ latest.json
//!                                                      └─ weekly.json + weekly.md
//! ```
//!
//! Both the existing store and the incoming batch pass through
//! [`crate::enrich::admit`], so the date policy applies to every record the
//! same way. Any failed write aborts the run with the error.

use crate::config::Config;
use crate::enrich::admit;
use crate::models::{BatchReport, RecordOutcome};
use crate::outputs::{OutputPaths, indexes, json, markdown};
use crate::store::{latest_view, merge, partition_by_date, sort_collection};
use crate::weekly::{default_window_end, weekly_rollup};
use chrono::NaiveDate;
use std::error::Error;
use tracing::{info, instrument, warn};

/// What a run did, for the final log line and for tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub existing: BatchReport,
    pub incoming: BatchReport,
    pub stored: usize,
    pub date_files: usize,
    pub latest_date: Option<String>,
    pub latest_count: usize,
    pub weekly_total: usize,
}

/// Merge `incoming` into the store under `paths` and rewrite every view.
///
/// `week_ending` pins the weekly window; otherwise it ends at the newest
/// stored date.
#[instrument(level = "info", skip_all, fields(root = %paths.root.display(), %today))]
pub async fn update_store(
    paths: &OutputPaths,
    incoming: Vec<RecordOutcome>,
    config: &Config,
    today: NaiveDate,
    week_ending: Option<NaiveDate>,
) -> Result<RunReport, Box<dyn Error>> {
    let policy = config.date_policy;
    let admit_all = |outcomes: Vec<RecordOutcome>| {
        BatchReport::collect(
            outcomes
                .into_iter()
                .map(|outcome| outcome.and_then(|a| admit(a, policy, today))),
        )
    };

    let (existing, existing_report) = admit_all(json::load_collection(&paths.all).await);
    if existing_report.skipped_total() > 0 {
        warn!(
            skipped = existing_report.skipped_total(),
            reasons = ?existing_report.skipped,
            "Dropped unusable records from existing store"
        );
    }

    let (incoming, incoming_report) = admit_all(incoming);
    info!(
        existing = existing.len(),
        incoming = incoming.len(),
        skipped = incoming_report.skipped_total(),
        reasons = ?incoming_report.skipped,
        "Admitted records"
    );

    let mut merged = merge(existing, incoming);
    sort_collection(&mut merged);

    let by_date = partition_by_date(&merged);
    let latest = latest_view(&by_date);
    let latest_date = by_date.last_key_value().map(|(date, _)| date.clone());

    let window_end = week_ending.unwrap_or_else(|| default_window_end(&merged, today));
    let weekly = weekly_rollup(&merged, window_end, &config.weekly, &config.source_priority);

    json::write_collection(&paths.all, &merged).await?;
    let date_files = json::write_by_date(&paths.by_date_dir, &by_date).await?;
    indexes::write_date_index(&paths.date_index, &by_date).await?;
    json::write_json(&paths.latest, &latest).await?;
    info!(date = ?latest_date, count = latest.len(), "Wrote latest view");
    json::write_json(&paths.weekly_json, &weekly).await?;
    markdown::write_weekly_markdown(&paths.weekly_md, &weekly).await?;
    info!(
        from = %weekly.range.from,
        to = %weekly.range.to,
        total = weekly.total,
        "Wrote weekly summary"
    );

    Ok(RunReport {
        existing: existing_report,
        incoming: incoming_report,
        stored: merged.len(),
        date_files,
        latest_date,
        latest_count: latest.len(),
        weekly_total: weekly.total,
    })
}
