use crate::types::{AggregatorError, Result};
use chrono::{DateTime, Utc};
use feed_rs::parser;
use tracing::debug;

/// One syndication entry, before it is normalized into an item
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEntry {
    pub guid: Option<String>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Thin wrapper over feed-rs. Accepts RSS 0.9x/1.0/2.0, Atom and JSON Feed.
pub struct FeedParser {
    max_entries: usize,
}

impl FeedParser {
    pub fn new(max_entries: usize) -> Self {
        Self { max_entries }
    }

    /// Entries in document order, capped at `max_entries`
    pub fn parse_entries(&self, content: &str) -> Result<Vec<ParsedEntry>> {
        debug!("Parsing feed content ({} bytes)", content.len());

        let feed = parser::parse(content.as_bytes())
            .map_err(|e| AggregatorError::Parse(format!("Failed to parse feed: {}", e)))?;

        let entries: Vec<ParsedEntry> = feed
            .entries
            .into_iter()
            .take(self.max_entries)
            .map(Self::parse_entry)
            .collect();

        debug!("Parsed feed with {} entries", entries.len());
        Ok(entries)
    }

    fn parse_entry(entry: feed_rs::model::Entry) -> ParsedEntry {
        let title = entry
            .title
            .map(|t| t.content.trim().to_string())
            .filter(|t| !t.is_empty());

        let url = entry
            .links
            .first()
            .map(|link| link.href.trim().to_string())
            .filter(|href| !href.is_empty());

        let guid = if entry.id.is_empty() {
            None
        } else {
            Some(entry.id)
        };

        // Prefer the short summary; fall back to the full body
        let description = entry
            .summary
            .map(|s| s.content)
            .or_else(|| entry.content.and_then(|c| c.body))
            .filter(|d| !d.trim().is_empty());

        ParsedEntry {
            guid,
            url,
            title,
            description,
            published_at: entry.published.or(entry.updated),
        }
    }
}

impl Default for FeedParser {
    fn default() -> Self {
        Self::new(50)
    }
}
