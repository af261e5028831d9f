use crate::types::{AggregatorError, FetchConfig, Result};
use reqwest::{header, Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::debug;

const JSON_ACCEPT: &str = "application/json";
const FEED_ACCEPT: &str = "application/rss+xml, application/atom+xml, application/xml, text/xml, */*";
const BYTES_PER_MB: usize = 1024 * 1024;
const PAGE_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Shared HTTP client. Cheap to clone; every source holds its own handle.
/// Requests are made once per cycle with no retries.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client, config })
    }

    /// GET a JSON document and decode it. A JSON `null` body decodes into `Option::None`.
    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let request = self.client.get(url).header(header::ACCEPT, JSON_ACCEPT);
        let body = self.send(url, request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn fetch_feed(&self, url: &str) -> Result<String> {
        let request = self.client.get(url).header(header::ACCEPT, FEED_ACCEPT);
        self.send(url, request).await
    }

    /// GET an HTML page presenting as a desktop browser
    pub async fn fetch_page(&self, url: &str) -> Result<String> {
        self.send(url, self.page_request(url)).await
    }

    /// Same as `fetch_page` with the longer scrape budget
    pub async fn fetch_page_slow(&self, url: &str) -> Result<String> {
        let request = self
            .page_request(url)
            .timeout(Duration::from_secs(self.config.scrape_timeout_seconds));
        self.send(url, request).await
    }

    fn page_request(&self, url: &str) -> RequestBuilder {
        self.client
            .get(url)
            .header(header::USER_AGENT, &self.config.browser_user_agent)
            .header(header::ACCEPT, PAGE_ACCEPT)
            .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
    }

    async fn send(&self, url: &str, request: RequestBuilder) -> Result<String> {
        let start_time = Instant::now();
        debug!("GET {}", url);

        let mut response = request.send().await.map_err(|e| classify(url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(AggregatorError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let limit = self.config.max_body_size_mb * BYTES_PER_MB;
        if let Some(content_length) = response.content_length() {
            if content_length as usize > limit {
                return Err(AggregatorError::BodyTooLarge {
                    size_mb: content_length as usize / BYTES_PER_MB,
                });
            }
        }

        // Chunked responses carry no length, so the limit is also checked as bytes arrive
        let mut bytes: Vec<u8> = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| classify(url, e))? {
            if bytes.len() + chunk.len() > limit {
                return Err(AggregatorError::BodyTooLarge {
                    size_mb: (bytes.len() + chunk.len()) / BYTES_PER_MB,
                });
            }
            bytes.extend_from_slice(&chunk);
        }
        let body = String::from_utf8_lossy(&bytes).into_owned();
        debug!(
            "Fetched {} ({} bytes in {}ms)",
            url,
            body.len(),
            start_time.elapsed().as_millis()
        );
        Ok(body)
    }
}

fn classify(url: &str, error: reqwest::Error) -> AggregatorError {
    if error.is_timeout() {
        AggregatorError::Timeout {
            url: url.to_string(),
        }
    } else {
        AggregatorError::Http(error)
    }
}
