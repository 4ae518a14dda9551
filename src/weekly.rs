//! Weekly rollup over the accumulated store.
//!
//! Produces the [`WeeklySummary`] behind `weekly.json` and `weekly.md`: counts
//! per source, tag and day over a trailing window, a handful of highlight
//! articles, and a one-line synopsis.
//!
//! # Ordering
//!
//! Every list in the summary has a total order, so identical input always
//! serializes to identical bytes regardless of input order:
//!
//! | List | Order |
//! |------|-------|
//! | `by_source` | count desc, source priority, name |
//! | `top_keywords` | count desc, first seen |
//! | `by_day` | date asc, every day of the window present |
//! | `top_articles` | tag count desc, source priority, title, url |
//!
//! "First seen" walks the window's records by date, source priority, title,
//! then url.

use crate::config::{MAX_WINDOW_DAYS, WeeklySettings};
use crate::models::{
    Article, DateRange, DayCount, SourceCount, TagCount, TopArticle, WeeklySummary,
};
use crate::store::source_rank;
use chrono::{Days, Duration, NaiveDate};
use itertools::Itertools;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, instrument};

const UNKNOWN_SOURCE: &str = "미상";

fn parse_ymd(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// End of the default window: the newest parseable record date, else `today`.
///
/// Anchoring on the data rather than the clock keeps the window stable when
/// runs are irregular.
pub fn default_window_end(records: &[Article], today: NaiveDate) -> NaiveDate {
    records
        .iter()
        .filter_map(|a| parse_ymd(&a.date))
        .max()
        .unwrap_or(today)
}

/// Aggregate `records` over the `settings.window_days` days ending at `window_end`.
///
/// `window_days` is clamped to `1..=MAX_WINDOW_DAYS`. Records with
/// unparseable dates or dates outside the window are ignored.
/// An empty window yields `total == 0` and a no-data synopsis.
#[instrument(level = "info", skip_all, fields(%window_end, records = records.len()))]
pub fn weekly_rollup(
    records: &[Article],
    window_end: NaiveDate,
    settings: &WeeklySettings,
    source_priority: &[String],
) -> WeeklySummary {
    let span = settings.window_days.clamp(1, MAX_WINDOW_DAYS);
    let window_start = window_end
        .checked_sub_days(Days::new(u64::from(span - 1)))
        .unwrap_or(NaiveDate::MIN);
    let days = (window_end - window_start).num_days() + 1;

    let window: Vec<(NaiveDate, &Article)> = records
        .iter()
        .filter_map(|a| parse_ymd(&a.date).map(|d| (d, a)))
        .filter(|(d, _)| *d >= window_start && *d <= window_end)
        .sorted_by(|(da, a), (db, b)| {
            da.cmp(db)
                .then_with(|| {
                    source_rank(&a.source, source_priority)
                        .cmp(&source_rank(&b.source, source_priority))
                })
                .then_with(|| a.title.cmp(&b.title))
                .then_with(|| a.url.cmp(&b.url))
        })
        .collect();
    debug!(in_window = window.len(), %window_start, "Selected weekly window");

    let by_source = count_sources(&window, source_priority);
    let top_keywords = count_tags(&window, settings.top_tags);
    let by_day = count_days(&window, window_start, days);
    let top_articles = pick_top_articles(&window, settings, source_priority);

    let range = DateRange {
        from: window_start.format("%Y-%m-%d").to_string(),
        to: window_end.format("%Y-%m-%d").to_string(),
    };
    let one_liner = synopsis(&range, window.len(), &by_source, &top_keywords, &by_day);

    WeeklySummary {
        range,
        total: window.len(),
        by_source,
        top_keywords,
        by_day,
        top_articles,
        one_liner,
    }
}

fn source_label(article: &Article) -> &str {
    let s = article.source.trim();
    if s.is_empty() { UNKNOWN_SOURCE } else { s }
}

fn count_sources(window: &[(NaiveDate, &Article)], priority: &[String]) -> Vec<SourceCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for (_, a) in window {
        *counts.entry(source_label(a)).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .sorted_by(|(sa, ca), (sb, cb)| {
            cb.cmp(ca)
                .then_with(|| source_rank(sa, priority).cmp(&source_rank(sb, priority)))
                .then_with(|| sa.cmp(sb))
        })
        .map(|(source, count)| SourceCount {
            source: source.to_string(),
            count,
        })
        .collect()
}

fn count_tags(window: &[(NaiveDate, &Article)], top_n: usize) -> Vec<TagCount> {
    // Vec keeps first-seen order; the index maps tag -> slot.
    let mut slots: Vec<TagCount> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for (_, a) in window {
        for tag in a.tags.iter().map(String::as_str).unique() {
            match index.get(tag) {
                Some(&i) => slots[i].count += 1,
                None => {
                    index.insert(tag, slots.len());
                    slots.push(TagCount {
                        tag: tag.to_string(),
                        count: 1,
                    });
                }
            }
        }
    }
    // stable: equal counts stay in first-seen order
    slots.sort_by(|a, b| b.count.cmp(&a.count));
    slots.truncate(top_n);
    slots
}

fn count_days(window: &[(NaiveDate, &Article)], start: NaiveDate, days: i64) -> Vec<DayCount> {
    let mut counts: HashMap<NaiveDate, usize> = HashMap::new();
    for (d, _) in window {
        *counts.entry(*d).or_insert(0) += 1;
    }
    (0..days)
        .map(|offset| {
            let day = start + Duration::days(offset);
            DayCount {
                date: day.format("%Y-%m-%d").to_string(),
                count: counts.get(&day).copied().unwrap_or(0),
            }
        })
        .collect()
}

fn pick_top_articles(
    window: &[(NaiveDate, &Article)],
    settings: &WeeklySettings,
    priority: &[String],
) -> Vec<TopArticle> {
    window
        .iter()
        .map(|(_, a)| *a)
        .sorted_by(|a, b| {
            b.tags
                .len()
                .cmp(&a.tags.len())
                .then_with(|| source_rank(&a.source, priority).cmp(&source_rank(&b.source, priority)))
                .then_with(|| a.title.cmp(&b.title))
                .then_with(|| a.url.cmp(&b.url))
        })
        .take(settings.top_articles)
        .map(|a| TopArticle {
            date: a.date.clone(),
            source: source_label(a).to_string(),
            title: a.title.clone(),
            url: a.url.clone(),
            tags: a.tags.iter().take(settings.tags_per_article).cloned().collect(),
        })
        .collect()
}

/// Busiest day; the earliest one wins a tie.
fn peak_day(by_day: &[DayCount]) -> Option<&DayCount> {
    by_day.iter().fold(None, |best: Option<&DayCount>, day| match best {
        Some(b) if b.count >= day.count => Some(b),
        _ => Some(day),
    })
}

fn synopsis(
    range: &DateRange,
    total: usize,
    by_source: &[SourceCount],
    top_keywords: &[TagCount],
    by_day: &[DayCount],
) -> String {
    if total == 0 {
        return format!("{} ~ {} 기간에 수집된 기사가 없습니다.", range.from, range.to);
    }

    let (source, source_count) = by_source
        .first()
        .map(|s| (s.source.as_str(), s.count))
        .unwrap_or((UNKNOWN_SOURCE, 0));
    let (peak, peak_count) = peak_day(by_day)
        .map(|d| (d.date.as_str(), d.count))
        .unwrap_or((range.to.as_str(), 0));

    match top_keywords.first() {
        Some(top) => format!(
            "이번 주는 ‘{}’ 이슈가 가장 두드러졌고, {} 비중이 높았으며({}건), 기사량 피크는 {}({}건)입니다.",
            top.tag, source, source_count, peak, peak_count
        ),
        None => format!(
            "이번 주는 {} 비중이 높았으며({}건), 기사량 피크는 {}({}건)입니다.",
            source, source_count, peak, peak_count
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn priority() -> Vec<String> {
        vec!["에너지신문".into(), "가스신문".into(), "전기신문".into()]
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn article(url: &str, date: &str, source: &str, title: &str, tags: &[&str]) -> Article {
        Article {
            title: title.into(),
            subtitle: String::new(),
            date: date.into(),
            source: source.into(),
            url: url.into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            is_important: !tags.is_empty(),
        }
    }

    fn sample() -> Vec<Article> {
        vec![
            article("u1", "2025-06-01", "가스신문", "수소 충전소", &["수소", "충전소"]),
            article("u2", "2025-06-07", "에너지신문", "ESS 화재", &["ESS"]),
            article("u3", "2025-06-07", "가스신문", "암모니아 혼소", &["암모니아", "수소"]),
            article("u4", "2025-05-20", "전기신문", "지난 기사", &["수소"]),
            article("u5", "not-a-date", "전기신문", "날짜 없음", &["수소"]),
        ]
    }

    #[test]
    fn test_window_and_zero_fill() {
        let summary = weekly_rollup(&sample(), day(7), &WeeklySettings::default(), &priority());
        assert_eq!(summary.range.from, "2025-06-01");
        assert_eq!(summary.range.to, "2025-06-07");
        assert_eq!(summary.total, 3);
        assert_eq!(summary.by_day.len(), 7);
        assert_eq!(summary.by_day[0].count, 1);
        assert!(summary.by_day[1..6].iter().all(|d| d.count == 0));
        assert_eq!(summary.by_day[6].count, 2);
        assert_eq!(summary.by_day[3].date, "2025-06-04");
    }

    #[test]
    fn test_source_and_tag_ordering() {
        let summary = weekly_rollup(&sample(), day(7), &WeeklySettings::default(), &priority());
        let sources: Vec<(&str, usize)> = summary
            .by_source
            .iter()
            .map(|s| (s.source.as_str(), s.count))
            .collect();
        assert_eq!(sources, vec![("가스신문", 2), ("에너지신문", 1)]);

        let tags: Vec<(&str, usize)> = summary
            .top_keywords
            .iter()
            .map(|t| (t.tag.as_str(), t.count))
            .collect();
        // 충전소 is seen on 06-01, before ESS and 암모니아 on 06-07
        assert_eq!(tags, vec![("수소", 2), ("충전소", 1), ("ESS", 1), ("암모니아", 1)]);
    }

    #[test]
    fn test_source_tie_uses_priority() {
        let records = vec![
            article("a", "2025-06-02", "전기신문", "a", &[]),
            article("b", "2025-06-02", "에너지신문", "b", &[]),
            article("c", "2025-06-02", "기타신문", "c", &[]),
        ];
        let summary = weekly_rollup(&records, day(7), &WeeklySettings::default(), &priority());
        let names: Vec<&str> = summary.by_source.iter().map(|s| s.source.as_str()).collect();
        assert_eq!(names, vec!["에너지신문", "전기신문", "기타신문"]);
    }

    #[test]
    fn test_top_articles_order_and_truncation() {
        let settings = WeeklySettings {
            top_articles: 2,
            tags_per_article: 1,
            ..WeeklySettings::default()
        };
        let summary = weekly_rollup(&sample(), day(7), &settings, &priority());
        let picked: Vec<&str> = summary.top_articles.iter().map(|a| a.url.as_str()).collect();
        // u1 and u3 both have two tags; 가스신문 ties, so title decides
        assert_eq!(picked, vec!["u1", "u3"]);
        assert_eq!(summary.top_articles[0].tags, vec!["수소"]);
    }

    #[test]
    fn test_top_keywords_limited() {
        let settings = WeeklySettings {
            top_tags: 2,
            ..WeeklySettings::default()
        };
        let summary = weekly_rollup(&sample(), day(7), &settings, &priority());
        assert_eq!(summary.top_keywords.len(), 2);
    }

    #[test]
    fn test_one_liner_mentions_aggregates() {
        let summary = weekly_rollup(&sample(), day(7), &WeeklySettings::default(), &priority());
        assert_eq!(
            summary.one_liner,
            "이번 주는 ‘수소’ 이슈가 가장 두드러졌고, 가스신문 비중이 높았으며(2건), 기사량 피크는 2025-06-07(2건)입니다."
        );
    }

    #[test]
    fn test_one_liner_without_tags() {
        let records = vec![article("a", "2025-06-02", "", "a", &[])];
        let summary = weekly_rollup(&records, day(7), &WeeklySettings::default(), &priority());
        assert_eq!(summary.by_source[0].source, "미상");
        assert_eq!(
            summary.one_liner,
            "이번 주는 미상 비중이 높았으며(1건), 기사량 피크는 2025-06-02(1건)입니다."
        );
    }

    #[test]
    fn test_empty_window() {
        let summary = weekly_rollup(&[], day(7), &WeeklySettings::default(), &priority());
        assert_eq!(summary.total, 0);
        assert!(summary.by_source.is_empty());
        assert!(summary.top_keywords.is_empty());
        assert_eq!(summary.by_day.len(), 7);
        assert!(summary.by_day.iter().all(|d| d.count == 0));
        assert_eq!(summary.one_liner, "2025-06-01 ~ 2025-06-07 기간에 수집된 기사가 없습니다.");
    }

    #[test]
    fn test_deterministic_and_order_independent() {
        let settings = WeeklySettings::default();
        let forward = weekly_rollup(&sample(), day(7), &settings, &priority());
        let again = weekly_rollup(&sample(), day(7), &settings, &priority());
        let mut reversed_input = sample();
        reversed_input.reverse();
        let reversed = weekly_rollup(&reversed_input, day(7), &settings, &priority());

        let a = serde_json::to_string_pretty(&forward).unwrap();
        assert_eq!(a, serde_json::to_string_pretty(&again).unwrap());
        assert_eq!(a, serde_json::to_string_pretty(&reversed).unwrap());
    }

    #[test]
    fn test_zero_window_days_treated_as_one() {
        let settings = WeeklySettings {
            window_days: 0,
            ..WeeklySettings::default()
        };
        let summary = weekly_rollup(&sample(), day(7), &settings, &priority());
        assert_eq!(summary.by_day.len(), 1);
        assert_eq!(summary.total, 2);
    }

    #[test]
    fn test_oversized_window_is_clamped() {
        let settings = WeeklySettings {
            window_days: u32::MAX,
            ..WeeklySettings::default()
        };
        let summary = weekly_rollup(&sample(), day(7), &settings, &priority());
        assert_eq!(summary.by_day.len(), MAX_WINDOW_DAYS as usize);
        assert_eq!(summary.total, 4);

        let summary = weekly_rollup(&[], NaiveDate::MIN, &settings, &priority());
        assert_eq!(summary.by_day.len(), 1);
        assert_eq!(summary.total, 0);
    }

    #[test]
    fn test_default_window_end() {
        assert_eq!(default_window_end(&sample(), day(30)), day(7));
        assert_eq!(default_window_end(&[], day(30)), day(30));
    }

    #[test]
    fn test_peak_day_tie_takes_earliest() {
        let by_day = vec![
            DayCount { date: "d1".into(), count: 2 },
            DayCount { date: "d2".into(), count: 2 },
            DayCount { date: "d3".into(), count: 1 },
        ];
        assert_eq!(peak_day(&by_day).unwrap().date, "d1");
    }
}
