use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, Utc};
use digest_aggregator::server::{router, AppState};
use digest_aggregator::{
    FeedAggregator, FeedStore, Item, LinkMeta, Result, SourceBatch, SourceDetails, SourceFetcher,
    SourceTag, StoryMeta,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

struct FixedSource {
    tag: SourceTag,
}

#[async_trait]
impl SourceFetcher for FixedSource {
    fn tag(&self) -> SourceTag {
        self.tag
    }

    async fn pull(&self, now: DateTime<Utc>) -> Result<SourceBatch> {
        let details = match self.tag {
            SourceTag::Hype => SourceDetails::Hype(LinkMeta {
                domain: Some("hype.example".to_string()),
            }),
            _ => SourceDetails::HackerNews(StoryMeta {
                upvotes: 42,
                comments: 7,
                author: "dang".to_string(),
                domain: Some("example.com".to_string()),
            }),
        };
        Ok(SourceBatch::new(vec![Item {
            id: format!("{}-1", self.tag),
            title: "A title".to_string(),
            summary: "A summary".to_string(),
            url: Some("https://example.com/a".to_string()),
            posted_at: now,
            details,
        }]))
    }
}

fn test_state() -> AppState {
    let sources: Vec<Arc<dyn SourceFetcher>> = vec![
        Arc::new(FixedSource {
            tag: SourceTag::HackerNews,
        }),
        Arc::new(FixedSource {
            tag: SourceTag::Hype,
        }),
    ];
    AppState::new(Arc::new(FeedAggregator::new(sources, Arc::new(FeedStore::new()))))
}

async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Value) {
    let response = router(state.clone())
        .oneshot(request)
        .await
        .expect("router responds");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    let json = serde_json::from_slice(&bytes).expect("json body");
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

#[tokio::test]
async fn test_health_before_first_refresh() {
    let state = test_state();
    let (status, body) = send(&state, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["lastUpdated"], "1970-01-01T00:00:00Z");
}

#[tokio::test]
async fn test_refresh_then_feed() {
    let state = test_state();

    let refresh = Request::builder()
        .method("POST")
        .uri("/api/refresh")
        .body(Body::empty())
        .expect("request builds");
    let (status, body) = send(&state, refresh).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Feed refreshed");

    let (status, body) = send(&state, get("/api/feed")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalCount"], 2);
    assert_eq!(body["filteredCount"], 1);
    assert_eq!(body["errors"].as_array().map(Vec::len), Some(0));

    let item = &body["items"][0];
    assert_eq!(item["id"], "hackernews-1");
    assert_eq!(item["source"], "hackernews");
    assert_eq!(item["sourceLabel"], "Hacker News");
    assert_eq!(item["meta"]["upvotes"], 42);
    assert_eq!(item["meta"]["domain"], "example.com");
}

#[tokio::test]
async fn test_feed_source_filter() {
    let state = test_state();
    state.aggregator.refresh().await;

    let (_, body) = send(&state, get("/api/feed?source=hype")).await;
    assert_eq!(body["filteredCount"], 1);
    assert_eq!(body["items"][0]["source"], "hype");

    let (_, body) = send(&state, get("/api/feed?source=unknown")).await;
    assert_eq!(body["filteredCount"], 1);
    assert_eq!(body["items"][0]["source"], "hackernews");
}
