//! Markdown rendering of the weekly report.
//!
//! Produces `weekly.md` from the same [`WeeklySummary`] as `weekly.json`, so
//! the two never disagree.

use crate::models::WeeklySummary;
use crate::utils::slugify_title;
use std::error::Error;
use std::fmt::{self, Write};
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

const SECTION_SOURCES: &str = "신문사별 기사 수";
const SECTION_KEYWORDS: &str = "주요 키워드";
const SECTION_DAYS: &str = "일자별 기사 수";
const SECTION_ARTICLES: &str = "대표 기사";

/// Escape text placed inside a table cell.
fn escape_cell(text: &str) -> String {
    text.replace('\\', "\\\\").replace('|', "\\|")
}

/// Escape text placed inside `[...]` link text.
fn escape_link_text(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('[', "\\[")
        .replace(']', "\\]")
}

/// Render a weekly summary as Markdown.
pub fn weekly_to_markdown(summary: &WeeklySummary) -> String {
    let mut md = String::new();
    // Writing into a String cannot fail.
    let _ = render(&mut md, summary);
    md
}

fn render(md: &mut String, summary: &WeeklySummary) -> fmt::Result {
    writeln!(
        md,
        "# 주간 뉴스 리포트 ({} ~ {})\n",
        summary.range.from, summary.range.to
    )?;
    writeln!(md, "> {}\n", summary.one_liner)?;
    writeln!(md, "총 **{}**건\n", summary.total)?;

    for section in [SECTION_SOURCES, SECTION_KEYWORDS, SECTION_DAYS, SECTION_ARTICLES] {
        writeln!(md, "- [{}](#{})", section, slugify_title(section))?;
    }
    writeln!(md)?;

    writeln!(md, "## {SECTION_SOURCES}\n")?;
    if summary.by_source.is_empty() {
        writeln!(md, "_없음_\n")?;
    } else {
        writeln!(md, "| 신문사 | 기사 수 |\n|---|---:|")?;
        for s in &summary.by_source {
            writeln!(md, "| {} | {} |", escape_cell(&s.source), s.count)?;
        }
        writeln!(md)?;
    }

    writeln!(md, "## {SECTION_KEYWORDS}\n")?;
    if summary.top_keywords.is_empty() {
        writeln!(md, "_없음_\n")?;
    } else {
        for (rank, t) in summary.top_keywords.iter().enumerate() {
            writeln!(md, "{}. **{}** {}건", rank + 1, t.tag, t.count)?;
        }
        writeln!(md)?;
    }

    writeln!(md, "## {SECTION_DAYS}\n")?;
    writeln!(md, "| 날짜 | 기사 수 |\n|---|---:|")?;
    for d in &summary.by_day {
        writeln!(md, "| {} | {} |", d.date, d.count)?;
    }
    writeln!(md)?;

    writeln!(md, "## {SECTION_ARTICLES}\n")?;
    if summary.top_articles.is_empty() {
        writeln!(md, "_없음_")?;
    }
    for a in &summary.top_articles {
        writeln!(md, "### [{}](<{}>)\n", escape_link_text(&a.title), a.url)?;
        writeln!(md, "<small>`{}` · {}</small>\n", a.source, a.date)?;
        if !a.tags.is_empty() {
            let tags = a.tags.iter().map(|t| format!("`{t}`")).collect::<Vec<_>>().join(" ");
            writeln!(md, "태그: {tags}\n")?;
        }
    }
    Ok(())
}

#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_weekly_markdown(path: &Path, summary: &WeeklySummary) -> Result<(), Box<dyn Error>> {
    fs::write(path, weekly_to_markdown(summary)).await?;
    info!("Wrote weekly Markdown report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DateRange, DayCount, SourceCount, TagCount, TopArticle};

    fn summary() -> WeeklySummary {
        WeeklySummary {
            range: DateRange {
                from: "2025-06-01".into(),
                to: "2025-06-07".into(),
            },
            total: 2,
            by_source: vec![SourceCount { source: "가스신문".into(), count: 2 }],
            top_keywords: vec![TagCount { tag: "수소".into(), count: 2 }],
            by_day: vec![
                DayCount { date: "2025-06-01".into(), count: 1 },
                DayCount { date: "2025-06-02".into(), count: 1 },
            ],
            top_articles: vec![TopArticle {
                date: "2025-06-01".into(),
                source: "가스신문".into(),
                title: "수소 충전소".into(),
                url: "https://www.gasnews.com/a".into(),
                tags: vec!["수소".into(), "충전소".into()],
            }],
            one_liner: "이번 주는 ‘수소’ 이슈가 가장 두드러졌습니다.".into(),
        }
    }

    #[test]
    fn test_weekly_markdown_sections() {
        let md = weekly_to_markdown(&summary());
        assert!(md.starts_with("# 주간 뉴스 리포트 (2025-06-01 ~ 2025-06-07)\n"));
        assert!(md.contains("> 이번 주는 ‘수소’ 이슈가 가장 두드러졌습니다."));
        assert!(md.contains("- [주요 키워드](#주요-키워드)"));
        assert!(md.contains("| 가스신문 | 2 |"));
        assert!(md.contains("1. **수소** 2건"));
        assert!(md.contains("| 2025-06-02 | 1 |"));
        assert!(md.contains("### [수소 충전소](<https://www.gasnews.com/a>)"));
        assert!(md.contains("태그: `수소` `충전소`"));
    }

    #[test]
    fn test_weekly_markdown_escapes_table_and_link_text() {
        let mut s = summary();
        s.by_source[0].source = "A|B".into();
        s.top_articles[0].title = "[단독] 수소|ESS".into();
        let md = weekly_to_markdown(&s);
        assert!(md.contains("| A\\|B | 2 |"));
        assert!(md.contains("### [\\[단독\\] 수소|ESS](<https://www.gasnews.com/a>)"));
    }

    #[test]
    fn test_weekly_markdown_empty() {
        let mut empty = summary();
        empty.total = 0;
        empty.by_source.clear();
        empty.top_keywords.clear();
        empty.top_articles.clear();
        let md = weekly_to_markdown(&empty);
        assert!(md.contains("총 **0**건"));
        assert_eq!(md.matches("_없음_").count(), 3);
    }
}
