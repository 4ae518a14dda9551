//! Index file for navigating the per-date files.
//!
//! `by_date/index.json` lists every date that has a file, newest first, so
//! the static page can build its date picker without listing the directory:
//!
//! ```text
//! [
//!   { "date": "2025-06-07", "count": 12 },
//!   { "date": "2025-06-06", "count": 9 }
//! ]
//! ```
//!
//! The index is rebuilt from the date partition on every run.

use crate::models::{Article, DateIndexEntry};
use crate::outputs::json::write_json;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::error::Error;
use std::path::Path;
use tracing::{info, instrument};

/// Build the index rows, newest date first. Invalid date keys are left out,
/// matching the files [`crate::outputs::json::write_by_date`] actually writes.
pub fn date_index(by_date: &BTreeMap<String, Vec<Article>>) -> Vec<DateIndexEntry> {
    by_date
        .iter()
        .rev()
        .filter(|(date, _)| NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok())
        .map(|(date, group)| DateIndexEntry {
            date: date.clone(),
            count: group.len(),
        })
        .collect()
}

#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_date_index(
    path: &Path,
    by_date: &BTreeMap<String, Vec<Article>>,
) -> Result<(), Box<dyn Error>> {
    let index = date_index(by_date);
    write_json(path, &index).await?;
    info!(dates = index.len(), "Updated date index");
    Ok(())
}
