pub mod hacker_news;
pub mod hn_comments;
pub mod hype;
pub mod rss_feed;
pub mod telegram;

pub use hacker_news::{RankedStorySource, StoryList};
pub use hn_comments::BestCommentSource;
pub use hype::ScrapeSource;
pub use rss_feed::RssFeedSource;
pub use telegram::ChannelSource;

use crate::config::SourceEndpoints;
use crate::fetcher::Fetcher;
use crate::traits::SourceFetcher;
use std::sync::Arc;

/// Every integration, in merge order
pub fn default_sources(fetcher: &Fetcher, endpoints: &SourceEndpoints) -> Vec<Arc<dyn SourceFetcher>> {
    vec![
        Arc::new(RankedStorySource::top_stories(
            endpoints.hn_api_base.clone(),
            fetcher.clone(),
        )),
        Arc::new(RankedStorySource::show_stories(
            endpoints.hn_api_base.clone(),
            fetcher.clone(),
        )),
        Arc::new(BestCommentSource::new(
            endpoints.algolia_api_base.clone(),
            fetcher.clone(),
        )),
        Arc::new(RssFeedSource::new(
            endpoints.product_hunt_feed.clone(),
            endpoints.product_hunt_fallback_feed.clone(),
            rss_feed::PRODUCT_HUNT_SITE,
            fetcher.clone(),
        )),
        Arc::new(ChannelSource::new(
            endpoints.telegram_base.clone(),
            endpoints.telegram_channels.clone(),
            fetcher.clone(),
        )),
        Arc::new(ScrapeSource::new(endpoints.hype_url.clone(), fetcher.clone())),
    ]
}
