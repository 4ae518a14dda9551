//! News source scrapers.
//!
//! Each source follows a two-phase pattern:
//!
//! 1. **Indexing**: read list pages `1..=max_pages` and collect [`Listing`]s
//! 2. **Fetching**: download each article page and extract its body text
//!
//! # Supported Sources
//!
//! | Source | Site | Notes |
//! |--------|------|-------|
//! | 에너지신문 | energy-news.co.kr | article-list CMS |
//! | 가스신문 | gasnews.com | article-list CMS |
//! | 전기신문 | electimes.com | article-list CMS |
//!
//! Sources come from [`Config::sources`]; adding another site on the same
//! CMS is a config change only.
//!
//! [`Listing`]: crate::models::Listing

pub mod article_list;

use crate::config::Config;
use crate::fetch::PageFetcher;
use crate::models::RawArticle;
use article_list::{CompiledSource, scrape_source};
use tracing::{error, info, instrument};

/// Scrape every configured source, one after another.
///
/// A source whose selectors do not compile is logged and skipped.
#[instrument(level = "info", skip_all, fields(sources = config.sources.len()))]
pub async fn scrape_all<F: PageFetcher>(fetcher: &F, config: &Config) -> Vec<RawArticle> {
    let mut all = Vec::new();
    for source_config in &config.sources {
        let source = match CompiledSource::compile(source_config) {
            Ok(source) => source,
            Err(e) => {
                error!(source = %source_config.name, error = %e, "Invalid source configuration; skipping");
                continue;
            }
        };
        let articles = scrape_source(fetcher, &source, config.max_pages).await;
        info!(source = %source.name(), count = articles.len(), "Scraped source");
        all.extend(articles);
    }
    info!(total = all.len(), "Scraped all sources");
    all
}
