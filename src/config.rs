//! Runtime configuration loaded from YAML.
//!
//! Every field has a default, so a config file only needs the keys it wants
//! to change. Without a file the built-in defaults reproduce the standard
//! three-newspaper hydrogen/energy setup.
//!
//! ```yaml
//! keywords: ["수소", "연료전지", "ESS"]
//! max_pages: 2
//! date_policy: drop
//! weekly:
//!   window_days: 7
//!   top_tags: 5
//! ```

use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use serde::Deserialize;
use std::error::Error;
use std::path::Path;
use tracing::{info, instrument};

/// What to do with a record whose date cannot be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePolicy {
    /// Assign today's date in the configured timezone.
    #[default]
    FallbackToday,
    /// Leave the record out of the store.
    Drop,
}

/// One newspaper to scrape. All three defaults run on the same CMS, so they
/// share selectors.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub base: String,
    /// List page URL with a `{page}` placeholder.
    pub list_url: String,
    pub list_item_selector: String,
    pub title_selector_candidates: Vec<String>,
    pub date_selector_candidates: Vec<String>,
}

impl SourceConfig {
    fn cms_default(name: &str, base: &str) -> Self {
        Self {
            name: name.to_string(),
            base: base.to_string(),
            list_url: format!("{base}/news/articleList.html?page={{page}}&view_type=sm"),
            list_item_selector: "#section-list .type1 li".to_string(),
            title_selector_candidates: vec!["h2.titles a".into(), "h4.titles a".into()],
            date_selector_candidates: vec![
                "em.info.dated".into(),
                "span.date".into(),
                "li span.date".into(),
            ],
        }
    }

    pub fn page_url(&self, page: usize) -> String {
        self.list_url.replace("{page}", &page.to_string())
    }
}

/// Longest weekly window accepted from config.
pub const MAX_WINDOW_DAYS: u32 = 366;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WeeklySettings {
    pub window_days: u32,
    pub top_tags: usize,
    pub top_articles: usize,
    pub tags_per_article: usize,
}

impl Default for WeeklySettings {
    fn default() -> Self {
        Self {
            window_days: 7,
            top_tags: 5,
            top_articles: 5,
            tags_per_article: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub keywords: Vec<String>,
    pub sources: Vec<SourceConfig>,
    /// Ranking used to break ties between publishers; unlisted sources sort last.
    pub source_priority: Vec<String>,
    pub max_pages: usize,
    pub timeout_secs: u64,
    pub fetch_retries: usize,
    pub retry_base_delay_ms: u64,
    pub summary_sentences: usize,
    pub require_keyword_match: bool,
    pub date_policy: DatePolicy,
    /// Offset used to decide what "today" is.
    pub utc_offset_hours: i32,
    pub weekly: WeeklySettings,
}

impl Default for Config {
    fn default() -> Self {
        let sources = vec![
            SourceConfig::cms_default("에너지신문", "https://www.energy-news.co.kr"),
            SourceConfig::cms_default("가스신문", "https://www.gasnews.com"),
            SourceConfig::cms_default("전기신문", "https://www.electimes.com"),
        ];
        let source_priority = sources.iter().map(|s| s.name.clone()).collect();

        Self {
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            sources,
            source_priority,
            max_pages: 3,
            timeout_secs: 12,
            fetch_retries: 2,
            retry_base_delay_ms: 500,
            summary_sentences: 2,
            require_keyword_match: true,
            date_policy: DatePolicy::FallbackToday,
            utc_offset_hours: 9,
            weekly: WeeklySettings::default(),
        }
    }
}

const DEFAULT_KEYWORDS: &[&str] = &[
    "수소", "연료전지", "그린수소", "청정수소", "블루수소", "핑크수소",
    "PAFC", "SOFC", "MCFC", "PEM",
    "수전해", "전해조", "PEMEC", "AEM", "알카라인",
    "암모니아", "암모니아크래킹", "CCU", "CCUS",
    "수소생산", "수소저장", "액화수소", "충전소", "수소차", "수소버스",
    "한수원", "두산퓨얼셀", "한화임팩트", "현대차",
    "REC", "RPS", "PPA", "ESS",
];

impl Config {
    /// Load from `path`, or fall back to defaults when no path is given.
    #[instrument(level = "info")]
    pub async fn load(path: Option<&str>) -> Result<Self, Box<dyn Error>> {
        let Some(path) = path else {
            info!("No config file given; using built-in defaults");
            return Ok(Self::default());
        };
        let text = tokio::fs::read_to_string(Path::new(path)).await?;
        let config = Self::from_yaml(&text)?;
        info!(
            path,
            sources = config.sources.len(),
            keywords = config.keywords.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self, Box<dyn Error>> {
        let config: Config = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), Box<dyn Error>> {
        if self.utc_offset_hours.unsigned_abs() > 23 {
            return Err(format!("utc_offset_hours out of range: {}", self.utc_offset_hours).into());
        }
        if !(1..=MAX_WINDOW_DAYS).contains(&self.weekly.window_days) {
            return Err(format!(
                "weekly.window_days must be between 1 and {MAX_WINDOW_DAYS}, got {}",
                self.weekly.window_days
            )
            .into());
        }
        for source in &self.sources {
            if !source.list_url.contains("{page}") {
                return Err(format!("list_url for {} has no {{page}} placeholder", source.name).into());
            }
        }
        Ok(())
    }

    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix())
    }

    /// Current date in the configured timezone.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.offset()).date_naive()
    }
}
