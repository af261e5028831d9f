use crate::sources::{hacker_news, hn_comments, hype, rss_feed, telegram};
use crate::types::FetchConfig;
use clap::Parser;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Where each source reads from
#[derive(Debug, Clone, PartialEq)]
pub struct SourceEndpoints {
    pub hn_api_base: String,
    pub algolia_api_base: String,
    pub product_hunt_feed: String,
    pub product_hunt_fallback_feed: Option<String>,
    pub telegram_base: String,
    pub telegram_channels: Vec<String>,
    pub hype_url: String,
}

impl Default for SourceEndpoints {
    fn default() -> Self {
        Self {
            hn_api_base: hacker_news::DEFAULT_API_BASE.to_string(),
            algolia_api_base: hn_comments::DEFAULT_API_BASE.to_string(),
            product_hunt_feed: rss_feed::PRODUCT_HUNT_FEED.to_string(),
            product_hunt_fallback_feed: Some(rss_feed::PRODUCT_HUNT_FALLBACK_FEED.to_string()),
            telegram_base: telegram::DEFAULT_BASE.to_string(),
            telegram_channels: telegram::DEFAULT_CHANNELS
                .iter()
                .map(|c| c.to_string())
                .collect(),
            hype_url: hype::DEFAULT_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "digest-aggregator")]
#[command(about = "Aggregates recent tech content into one time-ordered digest feed")]
pub struct Settings {
    /// Address to bind the HTTP API on
    #[arg(long, env = "BIND_ADDR", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind_addr: IpAddr,

    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Minutes between scheduled refreshes
    #[arg(long, env = "REFRESH_INTERVAL_MINUTES", default_value_t = 30)]
    pub refresh_interval_minutes: u64,

    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value_t = 10)]
    pub fetch_timeout_secs: u64,

    /// Timeout for the best-effort page scrape
    #[arg(long, env = "SCRAPE_TIMEOUT_SECS", default_value_t = 15)]
    pub scrape_timeout_secs: u64,

    #[arg(long, env = "USER_AGENT")]
    pub user_agent: Option<String>,

    /// Comma-separated channel names
    #[arg(long, env = "TELEGRAM_CHANNELS", value_delimiter = ',')]
    pub telegram_channels: Vec<String>,

    #[arg(long, env = "HN_API_BASE")]
    pub hn_api_base: Option<String>,

    #[arg(long, env = "ALGOLIA_API_BASE")]
    pub algolia_api_base: Option<String>,

    #[arg(long, env = "PRODUCT_HUNT_FEED")]
    pub product_hunt_feed: Option<String>,

    #[arg(long, env = "PRODUCT_HUNT_FALLBACK_FEED")]
    pub product_hunt_fallback_feed: Option<String>,

    #[arg(long, env = "TELEGRAM_BASE")]
    pub telegram_base: Option<String>,

    #[arg(long, env = "HYPE_URL")]
    pub hype_url: Option<String>,
}

impl Settings {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_minutes.max(1) * 60)
    }

    pub fn fetch_config(&self) -> FetchConfig {
        let defaults = FetchConfig::default();
        FetchConfig {
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
            timeout_seconds: self.fetch_timeout_secs,
            scrape_timeout_seconds: self.scrape_timeout_secs,
            ..defaults
        }
    }

    /// Defaults overlaid with whatever was set
    pub fn endpoints(&self) -> SourceEndpoints {
        let defaults = SourceEndpoints::default();
        let channels: Vec<String> = self
            .telegram_channels
            .iter()
            .map(|c| c.trim().trim_start_matches('@').to_string())
            .filter(|c| !c.is_empty())
            .collect();

        SourceEndpoints {
            hn_api_base: self.hn_api_base.clone().unwrap_or(defaults.hn_api_base),
            algolia_api_base: self
                .algolia_api_base
                .clone()
                .unwrap_or(defaults.algolia_api_base),
            product_hunt_feed: self
                .product_hunt_feed
                .clone()
                .unwrap_or(defaults.product_hunt_feed),
            product_hunt_fallback_feed: self
                .product_hunt_fallback_feed
                .clone()
                .or(defaults.product_hunt_fallback_feed),
            telegram_base: self.telegram_base.clone().unwrap_or(defaults.telegram_base),
            telegram_channels: if channels.is_empty() {
                defaults.telegram_channels
            } else {
                channels
            },
            hype_url: self.hype_url.clone().unwrap_or(defaults.hype_url),
        }
    }
}
