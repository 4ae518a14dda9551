//! The accumulated article store: merge, date partition, and latest view.
//!
//! All functions here are pure and operate on in-memory collections. Loading
//! and persisting the backing files lives in [`crate::outputs::json`].
//!
//! # Lifecycle
//!
//! ```text
//! all.json ──load──┐
//!                  ├─ merge ─ partition_by_date ─┬─ by_date/<date>.json
//! scraped batch ───┘                             └─ latest_view ─ latest.json
//! ```
//!
//! The store only grows or has entries replaced by url; derived views are
//! recomputed from it on every run.

use crate::models::Article;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Merge `incoming` into `existing`, keyed by `url`, last write wins.
///
/// Records are inserted in order, `existing` first, so a url present in both
/// ends up with the `incoming` version. The result holds one record per
/// distinct url, ordered by url; callers re-sort for presentation.
pub fn merge(existing: Vec<Article>, incoming: Vec<Article>) -> Vec<Article> {
    let mut by_url: BTreeMap<String, Article> = BTreeMap::new();
    for article in existing.into_iter().chain(incoming) {
        by_url.insert(article.url.clone(), article);
    }
    by_url.into_values().collect()
}

/// Rank of `source` in `priority`; unlisted sources rank after all listed ones.
pub fn source_rank(source: &str, priority: &[String]) -> usize {
    priority
        .iter()
        .position(|p| p == source)
        .unwrap_or(priority.len())
}

/// Ordering within a single date group: important first, then source, title, url.
pub fn group_order(a: &Article, b: &Article) -> Ordering {
    b.is_important
        .cmp(&a.is_important)
        .then_with(|| a.source.cmp(&b.source))
        .then_with(|| a.title.cmp(&b.title))
        .then_with(|| a.url.cmp(&b.url))
}

pub fn sort_group(records: &mut [Article]) {
    records.sort_by(group_order);
}

/// Order for the accumulated `all.json`: newest date first, then [`group_order`].
pub fn sort_collection(records: &mut [Article]) {
    records.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| group_order(a, b)));
}

/// Group records by their literal `date` string; each group is sorted.
pub fn partition_by_date(records: &[Article]) -> BTreeMap<String, Vec<Article>> {
    let mut groups: BTreeMap<String, Vec<Article>> = BTreeMap::new();
    for article in records {
        groups
            .entry(article.date.clone())
            .or_default()
            .push(article.clone());
    }
    for group in groups.values_mut() {
        sort_group(group);
    }
    groups
}

/// The group under the greatest date key, or empty when there are no groups.
///
/// Zero-padded `YYYY-MM-DD` keys sort lexicographically in date order.
pub fn latest_view(by_date: &BTreeMap<String, Vec<Article>>) -> Vec<Article> {
    by_date
        .last_key_value()
        .map(|(_, group)| group.clone())
        .unwrap_or_default()
}
