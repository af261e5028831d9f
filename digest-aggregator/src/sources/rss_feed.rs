use crate::fetcher::Fetcher;
use crate::parser::{FeedParser, ParsedEntry};
use crate::traits::SourceFetcher;
use crate::types::{AggregatorError, Item, LinkMeta, Result, SourceBatch, SourceDetails, SourceTag};
use crate::utils::{text, time, url};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::{info, warn};
use uuid::Uuid;

pub const PRODUCT_HUNT_FEED: &str = "https://www.producthunt.com/feed";
pub const PRODUCT_HUNT_FALLBACK_FEED: &str = "https://www.producthunt.com/feed?category=undefined";
pub const PRODUCT_HUNT_SITE: &str = "https://www.producthunt.com";
pub const MAX_ITEMS: usize = 10;

/// Launch feed read over RSS/Atom, with an optional secondary URL tried when
/// the primary errors or yields nothing.
pub struct RssFeedSource {
    pub feed_url: String,
    pub fallback_url: Option<String>,
    /// Link used for entries that carry none
    pub site_url: String,
    fetcher: Fetcher,
    parser: FeedParser,
}

impl RssFeedSource {
    pub fn new(
        feed_url: impl Into<String>,
        fallback_url: Option<String>,
        site_url: impl Into<String>,
        fetcher: Fetcher,
    ) -> Self {
        Self {
            feed_url: feed_url.into(),
            fallback_url,
            site_url: site_url.into(),
            fetcher,
            parser: FeedParser::new(MAX_ITEMS),
        }
    }

    async fn pull_feed(&self, feed_url: &str, now: DateTime<Utc>) -> Result<Vec<Item>> {
        let content = self.fetcher.fetch_feed(feed_url).await?;
        let entries = self.parser.parse_entries(&content)?;
        Ok(feed_items(entries, &self.site_url, now))
    }
}

#[async_trait]
impl SourceFetcher for RssFeedSource {
    fn tag(&self) -> SourceTag {
        SourceTag::ProductHunt
    }

    async fn pull(&self, now: DateTime<Utc>) -> Result<SourceBatch> {
        info!("Pulling RSS feed: {}", self.feed_url);

        let primary_error = match self.pull_feed(&self.feed_url, now).await {
            Ok(items) if !items.is_empty() => {
                info!("Pulled {} items from RSS feed {}", items.len(), self.feed_url);
                return Ok(SourceBatch::new(items));
            }
            Ok(_) => {
                warn!("RSS feed {} yielded no items", self.feed_url);
                None
            }
            Err(e) => {
                warn!("RSS feed {} failed: {}", self.feed_url, e);
                Some(e)
            }
        };

        let Some(fallback_url) = &self.fallback_url else {
            return match primary_error {
                Some(e) => Err(e),
                None => Ok(SourceBatch::new(Vec::new())),
            };
        };

        info!("Falling back to secondary feed: {}", fallback_url);
        match self.pull_feed(fallback_url, now).await {
            Ok(items) => {
                info!("Pulled {} items from RSS feed {}", items.len(), fallback_url);
                Ok(SourceBatch::new(items))
            }
            Err(fallback_error) => Err(match primary_error {
                Some(primary_error) => AggregatorError::NoUsableResponse(format!(
                    "primary feed: {}; fallback feed: {}",
                    primary_error, fallback_error
                )),
                None => fallback_error,
            }),
        }
    }
}

/// Normalize parsed entries, keeping document order
pub fn feed_items(entries: Vec<ParsedEntry>, site_url: &str, now: DateTime<Utc>) -> Vec<Item> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter_map(|entry| feed_item(entry, site_url, now))
        .filter(|item| seen.insert(item.id.clone()))
        .take(MAX_ITEMS)
        .collect()
}

fn feed_item(entry: ParsedEntry, site_url: &str, now: DateTime<Utc>) -> Option<Item> {
    let title = text::strip_markup(entry.title.as_deref()?);
    if title.is_empty() {
        return None;
    }

    let posted_at = entry.published_at.unwrap_or(now);
    if !time::within_window(posted_at, now) {
        return None;
    }

    let link = entry.url.unwrap_or_else(|| site_url.to_string());
    let summary = entry
        .description
        .as_deref()
        .map(text::summarize)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| text::tweet_truncate(&title));

    let identity = entry.guid.as_deref().unwrap_or(link.as_str());
    let id = format!(
        "ph-{}",
        Uuid::new_v5(&Uuid::NAMESPACE_URL, identity.as_bytes()).simple()
    );

    Some(Item {
        id,
        title,
        summary,
        details: SourceDetails::ProductHunt(LinkMeta {
            domain: url::extract_domain(&link),
        }),
        url: Some(link),
        posted_at,
    })
}
