use crate::utils::time::within_window;
use chrono::{DateTime, Utc};
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of upstream integrations. The serialized form is wire-stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceTag {
    #[serde(rename = "hackernews")]
    HackerNews,
    #[serde(rename = "showhn")]
    ShowHn,
    #[serde(rename = "producthunt")]
    ProductHunt,
    #[serde(rename = "telegram")]
    Telegram,
    #[serde(rename = "hype")]
    Hype,
    #[serde(rename = "hn-comments")]
    HnComments,
}

impl SourceTag {
    pub const ALL: [SourceTag; 6] = [
        SourceTag::HackerNews,
        SourceTag::ShowHn,
        SourceTag::ProductHunt,
        SourceTag::Telegram,
        SourceTag::Hype,
        SourceTag::HnComments,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::HackerNews => "hackernews",
            SourceTag::ShowHn => "showhn",
            SourceTag::ProductHunt => "producthunt",
            SourceTag::Telegram => "telegram",
            SourceTag::Hype => "hype",
            SourceTag::HnComments => "hn-comments",
        }
    }

    /// Display label shown next to every item
    pub fn label(&self) -> &'static str {
        match self {
            SourceTag::HackerNews => "Hacker News",
            SourceTag::ShowHn => "Show HN",
            SourceTag::ProductHunt => "Product Hunt",
            SourceTag::Telegram => "Telegram",
            SourceTag::Hype => "Hype",
            SourceTag::HnComments => "HN Comment",
        }
    }

    /// Auxiliary sources are left out of the default feed and only reachable
    /// through an explicit filter.
    pub fn is_auxiliary(&self) -> bool {
        matches!(self, SourceTag::Hype | SourceTag::HnComments)
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceTag {
    type Err = AggregatorError;

    fn from_str(s: &str) -> Result<Self> {
        SourceTag::ALL
            .iter()
            .copied()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| AggregatorError::UnknownSource(s.to_string()))
    }
}

/// Metadata for ranked discussion-site stories
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryMeta {
    pub upvotes: i64,
    pub comments: u64,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_story: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upvotes: Option<i64>,
}

/// Metadata for link-style entries (feed launches, scraped links)
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

/// Metadata for messaging-channel posts
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelMeta {
    pub channel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    pub full_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rich_text: Option<String>,
}

/// Source-specific part of an item. The variant decides the item's source tag,
/// so metadata that does not belong to a source cannot be attached to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SourceDetails {
    HackerNews(StoryMeta),
    ShowHn(StoryMeta),
    ProductHunt(LinkMeta),
    Telegram(ChannelMeta),
    Hype(LinkMeta),
    HnComments(CommentMeta),
}

impl SourceDetails {
    pub fn tag(&self) -> SourceTag {
        match self {
            SourceDetails::HackerNews(_) => SourceTag::HackerNews,
            SourceDetails::ShowHn(_) => SourceTag::ShowHn,
            SourceDetails::ProductHunt(_) => SourceTag::ProductHunt,
            SourceDetails::Telegram(_) => SourceTag::Telegram,
            SourceDetails::Hype(_) => SourceTag::Hype,
            SourceDetails::HnComments(_) => SourceTag::HnComments,
        }
    }
}

/// One normalized piece of content in the feed
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub url: Option<String>,
    pub posted_at: DateTime<Utc>,
    pub details: SourceDetails,
}

impl Item {
    pub fn source(&self) -> SourceTag {
        self.details.tag()
    }
}

impl Serialize for Item {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let tag = self.source();
        let mut state = serializer.serialize_struct("Item", 8)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("title", &self.title)?;
        state.serialize_field("summary", &self.summary)?;
        match &self.url {
            Some(url) => state.serialize_field("url", url)?,
            None => state.skip_field("url")?,
        }
        state.serialize_field("source", &tag)?;
        state.serialize_field("sourceLabel", tag.label())?;
        state.serialize_field("postedAt", &self.posted_at)?;
        state.serialize_field("meta", &self.details)?;
        state.end()
    }
}

/// One fully built feed state
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub items: Vec<Item>,
    pub last_updated: DateTime<Utc>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Snapshot {
    /// Placeholder published before the first refresh; stamped with the Unix epoch.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            last_updated: DateTime::<Utc>::default(),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// How a heuristic extraction went, separate from transport success
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Matched,
    UpstreamEmpty,
    NoMatch { detail: String },
}

/// What a source hands back from a successful pull
#[derive(Debug, Clone)]
pub struct SourceBatch {
    pub items: Vec<Item>,
    pub extraction: Extraction,
    pub warnings: Vec<String>,
}

impl SourceBatch {
    pub fn new(items: Vec<Item>) -> Self {
        let extraction = if items.is_empty() {
            Extraction::UpstreamEmpty
        } else {
            Extraction::Matched
        };
        Self {
            items,
            extraction,
            warnings: Vec::new(),
        }
    }

    pub fn no_match(detail: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            extraction: Extraction::NoMatch {
                detail: detail.into(),
            },
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    /// Drop items posted outside the recency window ending at `now` and
    /// return how many went. A batch emptied this way counts as upstream-empty.
    pub fn retain_recent(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.items.len();
        self.items.retain(|item| within_window(item.posted_at, now));
        if self.items.is_empty() && self.extraction == Extraction::Matched {
            self.extraction = Extraction::UpstreamEmpty;
        }
        before - self.items.len()
    }
}

/// Settled result of one source for one refresh cycle. A failed source has no
/// items and exactly one failure reason.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub tag: SourceTag,
    pub items: Vec<Item>,
    pub error: Option<String>,
    pub warnings: Vec<String>,
}

impl FetchOutcome {
    pub fn from_batch(tag: SourceTag, batch: SourceBatch) -> Self {
        let mut warnings = batch.warnings;
        if let Extraction::NoMatch { detail } = batch.extraction {
            warnings.push(format!("extraction matched nothing ({})", detail));
        }
        Self {
            tag,
            items: batch.items,
            error: None,
            warnings,
        }
    }

    pub fn failed(tag: SourceTag, reason: impl Into<String>) -> Self {
        Self {
            tag,
            items: Vec::new(),
            error: Some(reason.into()),
            warnings: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    /// Sent to HTML pages that serve bots a different document
    pub browser_user_agent: String,
    pub timeout_seconds: u64,
    pub scrape_timeout_seconds: u64,
    pub max_body_size_mb: usize,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (compatible; DigestBot/1.0)".to_string(),
            browser_user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            timeout_seconds: 10,
            scrape_timeout_seconds: 15,
            max_body_size_mb: 10,
            max_redirects: 5,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Response body exceeds limit: {size_mb}MB")]
    BodyTooLarge { size_mb: usize },

    #[error("JSON decode error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown source tag: {0}")]
    UnknownSource(String),

    #[error("No usable response: {0}")]
    NoUsableResponse(String),

    #[error("Task error: {0}")]
    Task(String),

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
