//! Data models for scraped articles, stored records, and derived views.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Listing`] and [`RawArticle`]: what the scrapers hand to enrichment
//! - [`Article`]: the stored record, keyed by `url`
//! - [`Skipped`] / [`SkipReason`]: why a record did not make it into the store
//! - [`WeeklySummary`]: the aggregate written to `weekly.json`
//!
//! Stored records are read back from disk on every run, so [`Article`]
//! deserializes leniently: anything but `url` may be missing or mistyped.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// One entry of a newspaper list page, before the article body is fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    /// Publisher display name (e.g. `"가스신문"`).
    pub source: String,
    /// Headline text as shown on the list page.
    pub title: String,
    /// Absolute article URL.
    pub url: String,
    /// Date text as printed next to the headline; normalized later.
    pub raw_date: String,
}

/// A listing together with the body text extracted from the article page.
///
/// `body` is empty when the article page could not be fetched; keyword
/// tagging then runs on the title alone.
#[derive(Debug, Clone, PartialEq)]
pub struct RawArticle {
    pub listing: Listing,
    pub body: String,
}

/// A stored news record.
///
/// # JSON Schema
///
/// ```text
/// {
///   "title": "...", "subtitle": "...", "date": "2025-06-01",
///   "source": "에너지신문", "url": "https://...", "tags": ["수소"],
///   "is_important": true
/// }
/// ```
///
/// `subtitle` also accepts the key `summary` on input. Text fields read
/// `null` as empty and other scalars as their JSON text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, alias = "summary", deserialize_with = "lenient_string")]
    pub subtitle: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub source: String,
    pub url: String,
    #[serde(default, deserialize_with = "lenient_tags")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub is_important: bool,
}

impl Article {
    /// Parse one element of a stored JSON array.
    ///
    /// Non-object elements and elements without a usable `url` are reported
    /// as skipped instead of failing the whole collection.
    pub fn from_value(value: Value) -> RecordOutcome {
        let url = value
            .get("url")
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default()
            .to_string();

        if !value.is_object() {
            return Err(Skipped::new(url, SkipReason::Malformed("not a JSON object".into())));
        }
        if url.is_empty() {
            return Err(Skipped::new(url, SkipReason::MissingUrl));
        }

        serde_json::from_value::<Article>(value)
            .map_err(|e| Skipped::new(url, SkipReason::Malformed(e.to_string())))
    }
}

/// Accept any JSON value for `tags`; arrays keep their string elements.
fn lenient_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Older files stored `is_important` as `0`/`1`.
fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    })
}

/// `null` reads as empty; numbers and other values keep their JSON text.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Why a record was left out of the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The extracted or supplied title was empty after trimming.
    EmptyTitle,
    /// No `url` to key the record on.
    MissingUrl,
    /// Neither title nor body mentioned a configured keyword.
    NoKeywordMatch,
    /// The date could not be resolved and the policy is to drop.
    UnresolvableDate(String),
    /// The stored element could not be read as a record.
    Malformed(String),
}

impl SkipReason {
    /// Stable short name, used as the counter key in [`BatchReport`].
    pub fn kind(&self) -> &'static str {
        match self {
            SkipReason::EmptyTitle => "empty_title",
            SkipReason::MissingUrl => "missing_url",
            SkipReason::NoKeywordMatch => "no_keyword_match",
            SkipReason::UnresolvableDate(_) => "unresolvable_date",
            SkipReason::Malformed(_) => "malformed",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::EmptyTitle => write!(f, "title is empty"),
            SkipReason::MissingUrl => write!(f, "url is missing"),
            SkipReason::NoKeywordMatch => write!(f, "no keyword in title or body"),
            SkipReason::UnresolvableDate(raw) => write!(f, "cannot resolve date {raw:?}"),
            SkipReason::Malformed(detail) => write!(f, "malformed record: {detail}"),
        }
    }
}

/// A record that was dropped, with the url it carried (possibly empty).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub url: String,
    pub reason: SkipReason,
}

impl Skipped {
    pub fn new(url: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            url: url.into(),
            reason,
        }
    }
}

/// Outcome of processing a single record.
pub type RecordOutcome = Result<Article, Skipped>;

/// Tally of a batch of [`RecordOutcome`]s.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub kept: usize,
    pub skipped: BTreeMap<&'static str, usize>,
}

impl BatchReport {
    /// Split outcomes into kept records and a report, logging each skip.
    pub fn collect(outcomes: impl IntoIterator<Item = RecordOutcome>) -> (Vec<Article>, Self) {
        let mut report = Self::default();
        let mut kept = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(article) => {
                    report.kept += 1;
                    kept.push(article);
                }
                Err(skipped) => {
                    tracing::debug!(url = %skipped.url, reason = %skipped.reason, "Skipping record");
                    *report.skipped.entry(skipped.reason.kind()).or_insert(0) += 1;
                }
            }
        }
        (kept, report)
    }

    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }

    pub fn skipped_for(&self, kind: &str) -> usize {
        self.skipped.get(kind).copied().unwrap_or(0)
    }
}

/// Inclusive date range of a weekly rollup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCount {
    pub source: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCount {
    pub date: String,
    pub count: usize,
}

/// Trimmed-down article shown in the weekly highlights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopArticle {
    pub date: String,
    pub source: String,
    pub title: String,
    pub url: String,
    pub tags: Vec<String>,
}

/// Aggregate statistics over a trailing window of days.
///
/// Serialized field order is fixed by declaration order, so two summaries
/// built from the same input render to identical bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySummary {
    pub range: DateRange,
    pub total: usize,
    pub by_source: Vec<SourceCount>,
    pub top_keywords: Vec<TagCount>,
    pub by_day: Vec<DayCount>,
    pub top_articles: Vec<TopArticle>,
    pub one_liner: String,
}

/// One row of `by_date/index.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateIndexEntry {
    pub date: String,
    pub count: usize,
}
