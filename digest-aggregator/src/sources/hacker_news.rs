use crate::fetcher::Fetcher;
use crate::traits::SourceFetcher;
use crate::types::{Item, Result, SourceBatch, SourceDetails, SourceTag, StoryMeta};
use crate::utils::{text, time, url};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Deserialize;
use tracing::{debug, info};

pub const DEFAULT_API_BASE: &str = "https://hacker-news.firebaseio.com/v0";
/// Detail requests are issued for this many ids off the top of the ranking
pub const CANDIDATE_LIMIT: usize = 50;
pub const MAX_ITEMS: usize = 10;

/// Which ranked list to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoryList {
    Top,
    Show,
}

impl StoryList {
    fn endpoint(&self) -> &'static str {
        match self {
            StoryList::Top => "topstories.json",
            StoryList::Show => "showstories.json",
        }
    }

    fn id_prefix(&self) -> &'static str {
        match self {
            StoryList::Top => "hn",
            StoryList::Show => "showhn",
        }
    }

    pub fn tag(&self) -> SourceTag {
        match self {
            StoryList::Top => SourceTag::HackerNews,
            StoryList::Show => SourceTag::ShowHn,
        }
    }

    fn details(&self, meta: StoryMeta) -> SourceDetails {
        match self {
            StoryList::Top => SourceDetails::HackerNews(meta),
            StoryList::Show => SourceDetails::ShowHn(meta),
        }
    }
}

/// Item record as served by the HN API
#[derive(Debug, Clone, Deserialize)]
pub struct HnStory {
    pub id: u64,
    pub title: Option<String>,
    pub url: Option<String>,
    pub text: Option<String>,
    #[serde(default)]
    pub score: i64,
    pub by: Option<String>,
    pub time: i64,
    pub descendants: Option<u64>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub dead: bool,
    #[serde(default)]
    pub deleted: bool,
}

/// Stories from one of the HN ranked lists, re-ranked by score
pub struct RankedStorySource {
    list: StoryList,
    api_base: String,
    fetcher: Fetcher,
}

impl RankedStorySource {
    pub fn new(list: StoryList, api_base: impl Into<String>, fetcher: Fetcher) -> Self {
        Self {
            list,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            fetcher,
        }
    }

    /// Front-page stories
    pub fn top_stories(api_base: impl Into<String>, fetcher: Fetcher) -> Self {
        Self::new(StoryList::Top, api_base, fetcher)
    }

    /// "Show HN" submissions
    pub fn show_stories(api_base: impl Into<String>, fetcher: Fetcher) -> Self {
        Self::new(StoryList::Show, api_base, fetcher)
    }

    async fn fetch_story(&self, id: u64) -> Option<HnStory> {
        let url = format!("{}/item/{}.json", self.api_base, id);
        match self.fetcher.fetch_json::<Option<HnStory>>(&url).await {
            Ok(story) => story,
            Err(e) => {
                debug!("Skipping story {}: {}", id, e);
                None
            }
        }
    }
}

#[async_trait]
impl SourceFetcher for RankedStorySource {
    fn tag(&self) -> SourceTag {
        self.list.tag()
    }

    async fn pull(&self, now: DateTime<Utc>) -> Result<SourceBatch> {
        let list_url = format!("{}/{}", self.api_base, self.list.endpoint());
        info!("Pulling ranked stories: {}", list_url);

        let ids: Vec<u64> = self.fetcher.fetch_json(&list_url).await?;
        let fetches: Vec<_> = ids
            .into_iter()
            .take(CANDIDATE_LIMIT)
            .map(|id| self.fetch_story(id))
            .collect();
        let stories: Vec<HnStory> = join_all(fetches)
            .await
            .into_iter()
            .flatten()
            .collect();

        let items = rank_stories(self.list, stories, now);
        info!(
            "Selected {} {} stories",
            items.len(),
            self.list.tag().label()
        );
        Ok(SourceBatch::new(items))
    }
}

/// Keep recent stories, order by score and normalize the top of the list.
/// Candidates arrive in ranking order; equal scores keep that order.
pub fn rank_stories(list: StoryList, stories: Vec<HnStory>, now: DateTime<Utc>) -> Vec<Item> {
    let mut recent: Vec<(HnStory, DateTime<Utc>)> = stories
        .into_iter()
        .filter(|story| story.kind == "story" && !story.dead && !story.deleted)
        .filter_map(|story| {
            let posted_at = time::from_unix(story.time)?;
            time::within_window(posted_at, now).then_some((story, posted_at))
        })
        .collect();

    recent.sort_by(|(a, _), (b, _)| b.score.cmp(&a.score));

    recent
        .into_iter()
        .filter_map(|(story, posted_at)| story_item(list, story, posted_at))
        .take(MAX_ITEMS)
        .collect()
}

fn story_item(list: StoryList, story: HnStory, posted_at: DateTime<Utc>) -> Option<Item> {
    let title = story
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())?;

    let summary = story
        .text
        .as_deref()
        .map(text::summarize)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| text::tweet_truncate(&title));

    let link = story.url.filter(|u| !u.trim().is_empty());
    let meta = StoryMeta {
        upvotes: story.score,
        comments: story.descendants.unwrap_or(0),
        author: story.by.unwrap_or_default(),
        domain: link.as_deref().and_then(url::extract_domain),
    };

    Some(Item {
        id: format!("{}-{}", list.id_prefix(), story.id),
        title,
        summary,
        url: link,
        posted_at,
        details: list.details(meta),
    })
}
