//! JSON persistence for the article store and its derived views.
//!
//! All files are pretty-printed UTF-8 with Hangul kept literal, so the static
//! page and a human reading the repo see the same text.
//!
//! # Failure Policy
//!
//! - Reading the accumulated store never fails: a missing, unreadable or
//!   corrupt `all.json` is logged and treated as an empty collection.
//! - Reading an explicit input batch fails loudly.
//! - Every write is surfaced to the caller. Files are written to a sibling
//!   `.tmp` file first and renamed into place, so a crash mid-write leaves
//!   the previous version intact.

use crate::models::{Article, RecordOutcome};
use crate::utils::looks_truncated;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::error::Error;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument, warn};

/// Load the accumulated store. Never fails; see the module docs.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn load_collection(path: &Path) -> Vec<RecordOutcome> {
    let text = match fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!("No existing store; starting empty");
            return Vec::new();
        }
        Err(e) => {
            warn!(error = %e, "Existing store unreadable; starting empty");
            return Vec::new();
        }
    };

    match parse_records(&text) {
        Ok(outcomes) => {
            info!(count = outcomes.len(), "Loaded existing store");
            outcomes
        }
        Err(e) => {
            warn!(error = %e, "Existing store is corrupt; starting empty");
            Vec::new()
        }
    }
}

/// Load a batch of records supplied on the command line.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn load_batch(path: &Path) -> Result<Vec<RecordOutcome>, Box<dyn Error>> {
    let text = fs::read_to_string(path).await?;
    let outcomes = parse_records(&text)?;
    info!(count = outcomes.len(), "Loaded input batch");
    Ok(outcomes)
}

/// Parse a JSON array into per-element outcomes.
///
/// Only the top level must be an array; bad elements become skipped outcomes.
pub fn parse_records(text: &str) -> Result<Vec<RecordOutcome>, Box<dyn Error>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let value: Value = serde_json::from_str(text).map_err(|e| {
        if looks_truncated(&e) {
            format!("truncated JSON: {e}")
        } else {
            format!("invalid JSON: {e}")
        }
    })?;
    match value {
        Value::Array(items) => Ok(items.into_iter().map(Article::from_value).collect()),
        Value::Null => Ok(Vec::new()),
        other => Err(format!("expected a JSON array, found {}", json_kind(&other)).into()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Serialize `value` as pretty JSON and write it atomically.
pub async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(value)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = Path::new(&tmp);

    if let Err(e) = fs::write(tmp, json.as_bytes()).await {
        error!(path = %tmp.display(), error = %e, "Failed to write temporary file");
        return Err(e.into());
    }
    fs::rename(tmp, path).await?;
    Ok(())
}

/// Write the accumulated store.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = records.len()))]
pub async fn write_collection(path: &Path, records: &[Article]) -> Result<(), Box<dyn Error>> {
    write_json(path, records).await?;
    info!("Wrote article store");
    Ok(())
}

/// Write one `<date>.json` per group into `dir`. Returns the number of files.
///
/// Keys that are not valid `YYYY-MM-DD` dates are never used as file names.
#[instrument(level = "info", skip_all, fields(dir = %dir.display(), groups = by_date.len()))]
pub async fn write_by_date(
    dir: &Path,
    by_date: &BTreeMap<String, Vec<Article>>,
) -> Result<usize, Box<dyn Error>> {
    fs::create_dir_all(dir).await?;
    let mut written = 0;
    for (date, group) in by_date {
        if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
            warn!(%date, count = group.len(), "Skipping date file for invalid date key");
            continue;
        }
        write_json(&dir.join(format!("{date}.json")), group).await?;
        written += 1;
    }
    info!(written, "Wrote per-date files");
    Ok(written)
}
