//! Scraper for the article-list CMS shared by the default newspapers.
//!
//! All three default sources publish through the same CMS, so one scraper
//! driven by [`SourceConfig`] selectors covers them.
//!
//! # URL Pattern
//!
//! List pages live at `/news/articleList.html?page=N&view_type=sm` and link
//! articles relative to the site root, e.g.
//! `/news/articleView.html?idxno=123456`.

use crate::config::SourceConfig;
use crate::fetch::PageFetcher;
use crate::models::{Listing, RawArticle};
use crate::utils::{collapse_whitespace, truncate_for_log};
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

static BODY_CONTAINER: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(
        "div#article-view-content-div, div#articleBody, div.article-body, \
         div.article-text, article .article-body, div[itemprop='articleBody']",
    )
    .unwrap()
});
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());

/// Paragraphs shorter than this are navigation or captions on fallback pages.
const MIN_FALLBACK_PARAGRAPH_CHARS: usize = 30;
const MAX_FALLBACK_PARAGRAPHS: usize = 20;

/// A [`SourceConfig`] with its selectors parsed once.
#[derive(Debug)]
pub struct CompiledSource {
    pub config: SourceConfig,
    base: Url,
    item: Selector,
    titles: Vec<Selector>,
    dates: Vec<Selector>,
}

impl CompiledSource {
    pub fn compile(config: &SourceConfig) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            base: Url::parse(&config.base)?,
            item: parse_selector(&config.list_item_selector)?,
            titles: config
                .title_selector_candidates
                .iter()
                .map(|s| parse_selector(s))
                .collect::<Result<_, _>>()?,
            dates: config
                .date_selector_candidates
                .iter()
                .map(|s| parse_selector(s))
                .collect::<Result<_, _>>()?,
            config: config.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Resolve a list-page href against the site base.
    fn resolve(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }
        self.base.join(href).ok().map(|u| u.to_string())
    }
}

fn parse_selector(css: &str) -> Result<Selector, Box<dyn Error>> {
    Selector::parse(css).map_err(|e| format!("invalid selector {css:?}: {e:?}").into())
}

fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

fn first_match<'a>(candidates: &[Selector], root: ElementRef<'a>) -> Option<ElementRef<'a>> {
    candidates.iter().find_map(|sel| root.select(sel).next())
}

/// Extract listings from one list page.
///
/// Items without a title anchor or href are ignored; a missing date element
/// yields an empty `raw_date`, which the date policy handles later.
pub fn parse_listing_page(html: &str, source: &CompiledSource) -> Vec<Listing> {
    let document = Html::parse_document(html);
    let mut listings = Vec::new();

    for item in document.select(&source.item) {
        let Some(anchor) = first_match(&source.titles, item) else {
            continue;
        };
        let Some(url) = anchor.value().attr("href").and_then(|h| source.resolve(h)) else {
            continue;
        };
        let raw_date = first_match(&source.dates, item)
            .map(element_text)
            .unwrap_or_default();

        listings.push(Listing {
            source: source.config.name.clone(),
            title: element_text(anchor),
            url,
            raw_date,
        });
    }
    listings
}

/// Extract the article text from an article page.
///
/// Uses the first known body container when present; otherwise falls back to
/// the page's longer paragraphs.
pub fn extract_article_body(html: &str) -> String {
    let document = Html::parse_document(html);

    let body = match document.select(&BODY_CONTAINER).next() {
        Some(container) => {
            let paragraphs: Vec<String> = container
                .select(&PARAGRAPH)
                .map(element_text)
                .filter(|t| !t.is_empty())
                .collect();
            if paragraphs.is_empty() {
                element_text(container)
            } else {
                paragraphs.join(" ")
            }
        }
        None => document
            .select(&PARAGRAPH)
            .map(element_text)
            .filter(|t| t.chars().count() >= MIN_FALLBACK_PARAGRAPH_CHARS)
            .take(MAX_FALLBACK_PARAGRAPHS)
            .collect::<Vec<_>>()
            .join(" "),
    };
    collapse_whitespace(&body)
}

/// Scrape list pages `1..=max_pages` of one source, then fetch each article.
///
/// A list page that fails to load is logged and skipped. An article page that
/// fails to load keeps its listing with an empty body.
#[instrument(level = "info", skip_all, fields(source = %source.name()))]
pub async fn scrape_source<F: PageFetcher>(
    fetcher: &F,
    source: &CompiledSource,
    max_pages: usize,
) -> Vec<RawArticle> {
    let mut listings = Vec::new();
    for page in 1..=max_pages {
        let url = source.config.page_url(page);
        info!(page, %url, "Fetching list page");

        let html = match fetcher.fetch(&url).await {
            Ok(html) => html,
            Err(e) => {
                error!(page, %url, error = %e, "List page fetch failed");
                continue;
            }
        };

        let found = parse_listing_page(&html, source);
        if found.is_empty() {
            warn!(page, %url, "No list items found (check selectors)");
            continue;
        }
        debug!(page, count = found.len(), "Parsed list page");
        listings.extend(found);
    }
    info!(count = listings.len(), "Indexed article listings");

    let articles: Vec<RawArticle> = stream::iter(listings)
        .then(|listing| async move {
            let body = match fetcher.fetch(&listing.url).await {
                Ok(html) => extract_article_body(&html),
                Err(e) => {
                    warn!(url = %listing.url, error = %e, "Article fetch failed; using title only");
                    String::new()
                }
            };
            debug!(
                url = %listing.url,
                title = %truncate_for_log(&listing.title, 40),
                bytes = body.len(),
                "Extracted article body"
            );
            RawArticle { listing, body }
        })
        .collect()
        .await;

    info!(count = articles.len(), "Fetched article bodies");
    articles
}
