use crate::fetcher::Fetcher;
use crate::traits::SourceFetcher;
use crate::types::{AggregatorError, Item, LinkMeta, Result, SourceBatch, SourceDetails, SourceTag};
use crate::utils::text;
use crate::utils::url::{extract_domain, make_absolute};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

pub const DEFAULT_URL: &str = "https://hype.replicate.dev/";
pub const MAX_ITEMS: usize = 10;
/// Stop trying further selectors once this many entries are in hand
pub const ENOUGH_ENTRIES: usize = 5;

/// Tried in order; the last one also catches bare outbound links
pub const ENTRY_SELECTORS: &[&str] = &[
    "article",
    "[class*=\"post\"]",
    "[class*=\"article\"]",
    "[class*=\"item\"]",
    "[class*=\"card\"]",
    "a[href*=\"http\"]",
];
const TITLE_SELECTOR: &str = "h1, h2, h3, h4, [class*=\"title\"]";
const LINK_SELECTOR: &str = "a[href]";
const DESCRIPTION_SELECTOR: &str = "p, [class*=\"desc\"], [class*=\"summary\"]";

const MIN_TITLE_CHARS: usize = 5;
const MAX_TITLE_CHARS: usize = 200;
const LINK_TEXT_MIN_CHARS: usize = 20;
const LINK_TEXT_MAX_CHARS: usize = 300;
const IGNORED_HOSTS: &[&str] = &[
    "twitter.com",
    "x.com",
    "github.com",
    "linkedin.com",
    "discord.com",
    "discord.gg",
];

/// Which pass produced the entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeStrategy {
    Structural,
    LinkScan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedEntry {
    pub title: String,
    pub url: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ScrapeResult {
    pub entries: Vec<ScrapedEntry>,
    pub strategy: Option<ScrapeStrategy>,
}

/// Trending entries scraped from a page with no feed or API
pub struct ScrapeSource {
    page_url: String,
    fetcher: Fetcher,
}

impl ScrapeSource {
    pub fn new(page_url: impl Into<String>, fetcher: Fetcher) -> Self {
        Self {
            page_url: page_url.into(),
            fetcher,
        }
    }
}

#[async_trait]
impl SourceFetcher for ScrapeSource {
    fn tag(&self) -> SourceTag {
        SourceTag::Hype
    }

    async fn pull(&self, now: DateTime<Utc>) -> Result<SourceBatch> {
        info!("Scraping {}", self.page_url);

        let page_url = Url::parse(&self.page_url)?;
        let html = self.fetcher.fetch_page_slow(page_url.as_str()).await?;
        let result = scrape_entries(&html, &page_url)?;

        match result.strategy {
            Some(strategy) => {
                info!(
                    "Scraped {} entries via {:?}",
                    result.entries.len(),
                    strategy
                );
                Ok(SourceBatch::new(scraped_items(result.entries, now)))
            }
            None => Ok(SourceBatch::no_match(
                "neither entry selectors nor link scan found entries",
            )),
        }
    }
}

/// Extract up to `MAX_ITEMS` entries with distinct titles: ordered structural
/// selectors first, a scan of descriptive links when those find nothing.
pub fn scrape_entries(html: &str, page_url: &Url) -> Result<ScrapeResult> {
    let document = Html::parse_document(html);
    let title_selector = selector(TITLE_SELECTOR)?;
    let link_selector = selector(LINK_SELECTOR)?;
    let description_selector = selector(DESCRIPTION_SELECTOR)?;

    let mut entries: Vec<ScrapedEntry> = Vec::new();
    let mut seen_titles = HashSet::new();

    for css in ENTRY_SELECTORS {
        let entry_selector = selector(css)?;
        for element in document.select(&entry_selector) {
            if entries.len() >= MAX_ITEMS {
                break;
            }

            let title = entry_title(element, &title_selector);
            if title.chars().count() <= MIN_TITLE_CHARS || seen_titles.contains(&title) {
                continue;
            }

            let href = if element.value().name() == "a" {
                element.value().attr("href")
            } else {
                first_descendant(element, &link_selector).and_then(|a| a.value().attr("href"))
            };
            let description = first_descendant(element, &description_selector)
                .map(element_text)
                .filter(|d| !d.is_empty());

            seen_titles.insert(title.clone());
            entries.push(ScrapedEntry {
                title,
                url: href.and_then(|h| make_absolute(page_url, h)),
                description,
            });
        }

        if entries.len() >= ENOUGH_ENTRIES {
            debug!("Selector {} brought entries to {}", css, entries.len());
            break;
        }
    }

    if !entries.is_empty() {
        return Ok(ScrapeResult {
            entries,
            strategy: Some(ScrapeStrategy::Structural),
        });
    }

    for anchor in document.select(&link_selector) {
        if entries.len() >= MAX_ITEMS {
            break;
        }

        let link_text = element_text(anchor);
        let text_chars = link_text.chars().count();
        if text_chars <= LINK_TEXT_MIN_CHARS || text_chars >= LINK_TEXT_MAX_CHARS {
            continue;
        }

        let Some(href) = anchor
            .value()
            .attr("href")
            .and_then(|h| make_absolute(page_url, h))
        else {
            continue;
        };
        if is_ignored_link(&href) {
            continue;
        }

        let title = text::clip(&link_text, MAX_TITLE_CHARS);
        if !seen_titles.insert(title.clone()) {
            continue;
        }
        entries.push(ScrapedEntry {
            title,
            url: Some(href),
            description: None,
        });
    }

    let strategy = (!entries.is_empty()).then_some(ScrapeStrategy::LinkScan);
    Ok(ScrapeResult { entries, strategy })
}

/// Scraped pages carry no dates, so every entry is stamped with `now`
pub fn scraped_items(entries: Vec<ScrapedEntry>, now: DateTime<Utc>) -> Vec<Item> {
    entries
        .into_iter()
        .take(MAX_ITEMS)
        .map(|entry| {
            let identity = format!("{}{}", entry.url.as_deref().unwrap_or_default(), entry.title);
            let summary = entry
                .description
                .as_deref()
                .map(text::summarize_plain)
                .unwrap_or_else(|| text::tweet_truncate(&entry.title));

            Item {
                id: format!(
                    "hype-{}",
                    Uuid::new_v5(&Uuid::NAMESPACE_URL, identity.as_bytes()).simple()
                ),
                title: entry.title,
                summary,
                details: SourceDetails::Hype(LinkMeta {
                    domain: entry.url.as_deref().and_then(extract_domain),
                }),
                url: entry.url,
                posted_at: now,
            }
        })
        .collect()
}

fn entry_title(element: ElementRef<'_>, title_selector: &Selector) -> String {
    let raw = if element.value().name() == "a" {
        element_text(element)
    } else {
        first_descendant(element, title_selector)
            .map(element_text)
            .unwrap_or_default()
    };
    text::clip(&raw, MAX_TITLE_CHARS)
}

/// First match strictly below `element`
fn first_descendant<'a>(element: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    let own_id = element.id();
    element.select(selector).find(|found| found.id() != own_id)
}

fn element_text(element: ElementRef<'_>) -> String {
    text::collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

fn is_ignored_link(href: &str) -> bool {
    if href.to_ascii_lowercase().starts_with("mailto:") {
        return true;
    }
    let Ok(parsed) = Url::parse(href) else {
        return true;
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return true;
    }
    let host = parsed.host_str().unwrap_or_default().to_ascii_lowercase();
    IGNORED_HOSTS
        .iter()
        .any(|ignored| host == *ignored || host.ends_with(&format!(".{}", ignored)))
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| AggregatorError::Parse(format!("selector {}: {}", css, e)))
}
