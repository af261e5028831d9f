use crate::fetcher::Fetcher;
use crate::traits::SourceFetcher;
use crate::types::{CommentMeta, Item, Result, SourceBatch, SourceDetails, SourceTag};
use crate::utils::{text, time};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://hn.algolia.com/api/v1";
pub const MIN_COMMENT_CHARS: usize = 100;
pub const HITS_PER_PAGE: usize = 100;
pub const MAX_ITEMS: usize = 10;
const ITEM_URL_BASE: &str = "https://news.ycombinator.com/item?id=";

#[derive(Debug, Clone, Deserialize)]
pub struct CommentHit {
    #[serde(rename = "objectID")]
    pub object_id: String,
    pub author: Option<String>,
    pub comment_text: Option<String>,
    pub created_at_i: i64,
    pub points: Option<i64>,
    pub story_title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Vec<serde_json::Value>,
}

/// Longest, best-received recent comments from the HN search API
pub struct BestCommentSource {
    api_base: String,
    fetcher: Fetcher,
}

impl BestCommentSource {
    pub fn new(api_base: impl Into<String>, fetcher: Fetcher) -> Self {
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            fetcher,
        }
    }

    fn search_url(&self, now: DateTime<Utc>) -> Result<Url> {
        let cutoff = time::recency_cutoff(now).timestamp();
        let url = Url::parse_with_params(
            &format!("{}/search_by_date", self.api_base),
            &[
                ("tags", "comment".to_string()),
                ("numericFilters", format!("created_at_i>{}", cutoff)),
                ("hitsPerPage", HITS_PER_PAGE.to_string()),
            ],
        )?;
        Ok(url)
    }
}

#[async_trait]
impl SourceFetcher for BestCommentSource {
    fn tag(&self) -> SourceTag {
        SourceTag::HnComments
    }

    async fn pull(&self, now: DateTime<Utc>) -> Result<SourceBatch> {
        let url = self.search_url(now)?;
        info!("Pulling recent comments: {}", url);

        let response: SearchResponse = self.fetcher.fetch_json(url.as_str()).await?;
        let hits = decode_hits(response.hits);
        let items = select_best_comments(hits, now);

        info!("Selected {} comments", items.len());
        Ok(SourceBatch::new(items))
    }
}

/// Decode hits one by one so a single odd record does not sink the page
pub fn decode_hits(raw: Vec<serde_json::Value>) -> Vec<CommentHit> {
    raw.into_iter()
        .filter_map(|value| match serde_json::from_value::<CommentHit>(value) {
            Ok(hit) => Some(hit),
            Err(e) => {
                debug!("Skipping malformed comment hit: {}", e);
                None
            }
        })
        .collect()
}

pub fn comment_score(text_chars: usize, points: Option<i64>) -> f64 {
    (text_chars as f64 / 50.0).min(10.0) + points.unwrap_or(0) as f64
}

pub fn select_best_comments(hits: Vec<CommentHit>, now: DateTime<Utc>) -> Vec<Item> {
    let mut scored: Vec<(f64, DateTime<Utc>, CommentHit)> = hits
        .into_iter()
        .filter_map(|hit| {
            let text_chars = hit.comment_text.as_deref()?.chars().count();
            if text_chars <= MIN_COMMENT_CHARS {
                return None;
            }
            let posted_at = time::from_unix(hit.created_at_i)?;
            if !time::within_window(posted_at, now) {
                return None;
            }
            Some((comment_score(text_chars, hit.points), posted_at, hit))
        })
        .collect();

    scored.sort_by(|(a, _, _), (b, _, _)| b.total_cmp(a));

    scored
        .into_iter()
        .take(MAX_ITEMS)
        .map(|(_, posted_at, hit)| comment_item(hit, posted_at))
        .collect()
}

fn comment_item(hit: CommentHit, posted_at: DateTime<Utc>) -> Item {
    let story_title = hit
        .story_title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    let title = format!(
        "Re: {}",
        story_title.as_deref().unwrap_or("HN Discussion")
    );

    Item {
        id: format!("hn-comment-{}", hit.object_id),
        title,
        summary: text::summarize(hit.comment_text.as_deref().unwrap_or_default()),
        url: Some(format!("{}{}", ITEM_URL_BASE, hit.object_id)),
        posted_at,
        details: SourceDetails::HnComments(CommentMeta {
            author: hit.author.filter(|a| !a.is_empty()),
            parent_story: story_title,
            upvotes: hit.points.filter(|p| *p > 0),
        }),
    }
}
