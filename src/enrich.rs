//! Turning scraped text into stored records.
//!
//! Every record that enters the store passes through one of two functions
//! here, and both return a [`RecordOutcome`]:
//!
//! - [`build_article`] for freshly scraped [`RawArticle`]s: resolves the date,
//!   tags the article by keyword, and cuts an extractive summary.
//! - [`admit`] for records that are already structured (an input batch or the
//!   existing `all.json`): normalizes them under the same date policy.
//!
//! # Date Policy
//!
//! Dates are resolved by [`resolve_date`]. When the text cannot be read as a
//! date, [`DatePolicy::FallbackToday`] assigns `today` and [`DatePolicy::Drop`]
//! skips the record with [`SkipReason::UnresolvableDate`].

use crate::config::{Config, DatePolicy};
use crate::models::{Article, RawArticle, RecordOutcome, SkipReason, Skipped};
use crate::utils::{collapse_whitespace, take_chars};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;

const FULL_DATE_FORMATS: &[&str] = &["%Y.%m.%d", "%Y-%m-%d"];
const FULL_DATETIME_FORMATS: &[&str] = &["%Y.%m.%d %H:%M", "%Y-%m-%d %H:%M"];

/// `2025.12.10` / `2025-12-10` / `2025/12/10` anywhere in a longer string.
static EMBEDDED_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})[.\-/](\d{1,2})[.\-/](\d{1,2})").unwrap());

static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+").unwrap());

const SUMMARY_FALLBACK_CHARS: usize = 160;

/// Parse the date text printed on a list page.
///
/// Accepts `YYYY.MM.DD[ HH:MM]`, `YYYY-MM-DD[ HH:MM]`, and the short forms
/// `MM.DD[ HH:MM]`, which take the year of `today`. As a last resort a full
/// date embedded in surrounding text (`입력 2025.12.10 09:30`) is used.
pub fn normalize_date(raw: &str, today: NaiveDate) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    parse_full(raw)
        .or_else(|| parse_full(&format!("{}.{}", today.year(), raw)))
        .or_else(|| {
            let caps = EMBEDDED_DATE.captures(raw)?;
            NaiveDate::from_ymd_opt(
                caps[1].parse().ok()?,
                caps[2].parse().ok()?,
                caps[3].parse().ok()?,
            )
        })
}

fn parse_full(s: &str) -> Option<NaiveDate> {
    FULL_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok().map(|dt| dt.date()))
        .or_else(|| {
            FULL_DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        })
}

/// Resolve raw date text to `YYYY-MM-DD` under `policy`.
pub fn resolve_date(raw: &str, policy: DatePolicy, today: NaiveDate) -> Result<String, SkipReason> {
    match (normalize_date(raw, today), policy) {
        (Some(date), _) => Ok(date.format("%Y-%m-%d").to_string()),
        (None, DatePolicy::FallbackToday) => Ok(today.format("%Y-%m-%d").to_string()),
        (None, DatePolicy::Drop) => Err(SkipReason::UnresolvableDate(raw.to_string())),
    }
}

/// Keywords found in `text`, case-insensitive, in keyword-list order.
pub fn find_keywords(text: &str, keywords: &[String]) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let lower = text.to_lowercase();
    keywords
        .iter()
        .filter(|k| !k.is_empty() && lower.contains(&k.to_lowercase()))
        .cloned()
        .collect()
}

/// Title matches first, then body matches, without duplicates.
pub fn tag_article(title: &str, body: &str, keywords: &[String]) -> Vec<String> {
    find_keywords(title, keywords)
        .into_iter()
        .chain(find_keywords(body, keywords))
        .unique()
        .collect()
}

/// Split `text` into sentences.
///
/// Korean news prose ends sentences with `다.`, often without a following
/// space, so that ending is split first; the rest splits on `.`, `!` or `?`
/// followed by whitespace.
pub fn split_sentences(text: &str) -> Vec<String> {
    let cleaned = collapse_whitespace(text);
    let marked = cleaned.replace("다. ", "다.\n").replace("다.", "다.\n");

    let mut parts = Vec::new();
    for chunk in marked.split('\n').map(str::trim).filter(|c| !c.is_empty()) {
        let mut start = 0;
        for m in SENTENCE_END.find_iter(chunk) {
            // punctuation is one byte wide
            let end = m.start() + 1;
            let sentence = chunk[start..end].trim();
            if !sentence.is_empty() {
                parts.push(sentence.to_string());
            }
            start = m.end();
        }
        let tail = chunk[start..].trim();
        if !tail.is_empty() {
            parts.push(tail.to_string());
        }
    }
    parts
}

/// First `max_sentences` sentences of `text`, joined with a space.
pub fn summarize(text: &str, max_sentences: usize) -> String {
    let cleaned = collapse_whitespace(text);
    if cleaned.is_empty() {
        return String::new();
    }
    let sentences = split_sentences(&cleaned);
    if sentences.is_empty() {
        return take_chars(&cleaned, SUMMARY_FALLBACK_CHARS);
    }
    sentences
        .into_iter()
        .take(max_sentences.max(1))
        .join(" ")
}

/// Build a stored record from a scraped article.
pub fn build_article(raw: RawArticle, config: &Config, today: NaiveDate) -> RecordOutcome {
    let RawArticle { listing, body } = raw;
    let url = listing.url.trim().to_string();
    let title = collapse_whitespace(&listing.title);

    if title.is_empty() {
        return Err(Skipped::new(url, SkipReason::EmptyTitle));
    }
    if url.is_empty() {
        return Err(Skipped::new(url, SkipReason::MissingUrl));
    }

    let date = resolve_date(&listing.raw_date, config.date_policy, today)
        .map_err(|reason| Skipped::new(url.clone(), reason))?;

    let tags = tag_article(&title, &body, &config.keywords);
    if tags.is_empty() && config.require_keyword_match {
        return Err(Skipped::new(url, SkipReason::NoKeywordMatch));
    }

    Ok(Article {
        subtitle: summarize(&body, config.summary_sentences),
        is_important: !tags.is_empty(),
        title,
        date,
        source: listing.source,
        url,
        tags,
    })
}

/// Normalize an already-structured record before it enters the store.
///
/// Trims text fields, resolves `date` under `policy`, drops blank and
/// repeated tags, and recomputes `is_important` from the tags. The title is
/// not re-checked here; empty titles are rejected when scraping.
pub fn admit(article: Article, policy: DatePolicy, today: NaiveDate) -> RecordOutcome {
    let url = article.url.trim().to_string();
    if url.is_empty() {
        return Err(Skipped::new(url, SkipReason::MissingUrl));
    }

    let date = resolve_date(&article.date, policy, today)
        .map_err(|reason| Skipped::new(url.clone(), reason))?;

    let tags: Vec<String> = article
        .tags
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unique()
        .collect();

    Ok(Article {
        is_important: !tags.is_empty(),
        title: article.title.trim().to_string(),
        subtitle: article.subtitle.trim().to_string(),
        date,
        source: article.source.trim().to_string(),
        url,
        tags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Listing;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 3).unwrap()
    }

    fn keywords(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn raw(title: &str, raw_date: &str, body: &str) -> RawArticle {
        RawArticle {
            listing: Listing {
                source: "가스신문".into(),
                title: title.into(),
                url: "https://www.gasnews.com/news/articleView.html?idxno=7".into(),
                raw_date: raw_date.into(),
            },
            body: body.into(),
        }
    }

    #[test]
    fn test_normalize_date_full_forms() {
        let d = NaiveDate::from_ymd_opt(2025, 12, 10).unwrap();
        assert_eq!(normalize_date("2025.12.10 09:30", today()), Some(d));
        assert_eq!(normalize_date("2025.12.10", today()), Some(d));
        assert_eq!(normalize_date("2025-12-10", today()), Some(d));
        assert_eq!(normalize_date(" 2025-12-10 18:05 ", today()), Some(d));
    }

    #[test]
    fn test_normalize_date_short_forms_use_current_year() {
        let d = NaiveDate::from_ymd_opt(2025, 5, 30).unwrap();
        assert_eq!(normalize_date("05.30 09:30", today()), Some(d));
        assert_eq!(normalize_date("05.30", today()), Some(d));
    }

    #[test]
    fn test_normalize_date_embedded_and_invalid() {
        let d = NaiveDate::from_ymd_opt(2025, 12, 10).unwrap();
        assert_eq!(normalize_date("입력 2025.12.10 09:30", today()), Some(d));
        assert_eq!(normalize_date("", today()), None);
        assert_eq!(normalize_date("어제", today()), None);
        assert_eq!(normalize_date("2025.13.40", today()), None);
    }

    #[test]
    fn test_resolve_date_policies() {
        assert_eq!(
            resolve_date("2025.06.01", DatePolicy::Drop, today()),
            Ok("2025-06-01".to_string())
        );
        assert_eq!(
            resolve_date("unknown", DatePolicy::FallbackToday, today()),
            Ok("2025-06-03".to_string())
        );
        assert_eq!(
            resolve_date("unknown", DatePolicy::Drop, today()),
            Err(SkipReason::UnresolvableDate("unknown".into()))
        );
    }

    #[test]
    fn test_find_keywords_case_insensitive_in_list_order() {
        let kw = keywords(&["수소", "ESS", "PEM"]);
        assert_eq!(find_keywords("pem 수전해와 ess 연계", &kw), vec!["ESS", "PEM"]);
        assert!(find_keywords("", &kw).is_empty());
    }

    #[test]
    fn test_tag_article_unions_title_and_body() {
        let kw = keywords(&["수소", "충전소", "ESS"]);
        let tags = tag_article("ESS 보급 확대", "수소 충전소와 ESS를 함께", &kw);
        assert_eq!(tags, vec!["ESS", "수소", "충전소"]);
    }

    #[test]
    fn test_summarize_korean_sentences() {
        let body = "정부가 수소 로드맵을 발표했다. 충전소를 늘린다.업계는 환영했다. 세부안은 연말에 나온다.";
        assert_eq!(summarize(body, 2), "정부가 수소 로드맵을 발표했다. 충전소를 늘린다.");
        assert_eq!(
            summarize(body, 3),
            "정부가 수소 로드맵을 발표했다. 충전소를 늘린다. 업계는 환영했다."
        );
    }

    #[test]
    fn test_summarize_english_punctuation() {
        let body = "Hydrogen demand rose! Prices fell? Analysts agree. More later.";
        assert_eq!(summarize(body, 2), "Hydrogen demand rose! Prices fell?");
    }

    #[test]
    fn test_summarize_empty_and_unsplittable() {
        assert_eq!(summarize("   ", 2), "");
        assert_eq!(summarize("한 문장뿐", 2), "한 문장뿐");
    }

    #[test]
    fn test_build_article_success() {
        let config = Config::default();
        let article = build_article(
            raw("  수소버스 300대 보급  ", "2025.06.01 10:00", "환경부가 발표했다. 예산은 늘었다. 셋째."),
            &config,
            today(),
        )
        .unwrap();
        assert_eq!(article.title, "수소버스 300대 보급");
        assert_eq!(article.date, "2025-06-01");
        assert_eq!(article.tags, vec!["수소", "수소버스"]);
        assert!(article.is_important);
        assert_eq!(article.subtitle, "환경부가 발표했다. 예산은 늘었다.");
        assert_eq!(article.source, "가스신문");
    }

    #[test]
    fn test_build_article_skip_reasons() {
        let config = Config::default();

        let err = build_article(raw("  ", "2025.06.01", "수소"), &config, today()).unwrap_err();
        assert_eq!(err.reason, SkipReason::EmptyTitle);

        let err = build_article(raw("전력시장 개편", "2025.06.01", "요금 논의"), &config, today())
            .unwrap_err();
        assert_eq!(err.reason, SkipReason::NoKeywordMatch);

        let drop = Config {
            date_policy: DatePolicy::Drop,
            ..Config::default()
        };
        let err = build_article(raw("수소 소식", "", ""), &drop, today()).unwrap_err();
        assert_eq!(err.reason, SkipReason::UnresolvableDate(String::new()));
    }

    #[test]
    fn test_build_article_without_keyword_gate() {
        let config = Config {
            require_keyword_match: false,
            ..Config::default()
        };
        let article = build_article(raw("전력시장 개편", "", ""), &config, today()).unwrap();
        assert!(article.tags.is_empty());
        assert!(!article.is_important);
        assert_eq!(article.date, "2025-06-03");
    }

    #[test]
    fn test_admit_normalizes_record() {
        let article = Article {
            title: " 제목 ".into(),
            subtitle: String::new(),
            date: "2025.6.1".into(),
            source: "에너지신문".into(),
            url: " u1 ".into(),
            tags: vec!["수소".into(), " ".into(), "수소".into(), "ESS".into()],
            is_important: false,
        };
        let admitted = admit(article, DatePolicy::Drop, today()).unwrap();
        assert_eq!(admitted.url, "u1");
        assert_eq!(admitted.title, "제목");
        assert_eq!(admitted.date, "2025-06-01");
        assert_eq!(admitted.tags, vec!["수소", "ESS"]);
        assert!(admitted.is_important);
    }

    #[test]
    fn test_admit_applies_date_policy_uniformly() {
        let article = Article {
            title: "t".into(),
            subtitle: String::new(),
            date: "bogus".into(),
            source: String::new(),
            url: "u1".into(),
            tags: vec![],
            is_important: true,
        };
        let kept = admit(article.clone(), DatePolicy::FallbackToday, today()).unwrap();
        assert_eq!(kept.date, "2025-06-03");
        assert!(!kept.is_important);

        let err = admit(article, DatePolicy::Drop, today()).unwrap_err();
        assert_eq!(err.url, "u1");
        assert_eq!(err.reason.kind(), "unresolvable_date");
    }

    #[test]
    fn test_admit_requires_url_only() {
        let article = Article {
            title: String::new(),
            subtitle: String::new(),
            date: "2025-06-01".into(),
            source: String::new(),
            url: "u1".into(),
            tags: vec!["수소".into()],
            is_important: false,
        };
        assert!(admit(article.clone(), DatePolicy::Drop, today()).is_ok());

        let no_url = Article { url: "  ".into(), ..article };
        let err = admit(no_url, DatePolicy::Drop, today()).unwrap_err();
        assert_eq!(err.reason, SkipReason::MissingUrl);
    }
}
