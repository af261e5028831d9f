//! HTTP surface: feed query, manual refresh and liveness.

use crate::aggregator::FeedAggregator;
use crate::query::{FeedView, Health, QueryService};
use crate::types::Result;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<FeedAggregator>,
    pub query: Arc<QueryService>,
}

impl AppState {
    pub fn new(aggregator: Arc<FeedAggregator>) -> Self {
        let query = Arc::new(QueryService::new(aggregator.store()));
        Self { aggregator, query }
    }
}

#[derive(Debug, Deserialize)]
pub struct FeedParams {
    pub source: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/feed", get(get_feed))
        .route("/api/refresh", post(refresh))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until `shutdown` resolves
pub async fn serve<F>(addr: SocketAddr, state: AppState, shutdown: F) -> Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("HTTP API listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn get_feed(
    State(state): State<AppState>,
    Query(params): Query<FeedParams>,
) -> Json<FeedView> {
    Json(state.query.read(params.source.as_deref()))
}

async fn refresh(State(state): State<AppState>) -> impl IntoResponse {
    let aggregator = Arc::clone(&state.aggregator);
    match tokio::spawn(async move { aggregator.refresh().await }).await {
        Ok(snapshot) => {
            info!(
                "Manual refresh published {} items, {} errors",
                snapshot.items.len(),
                snapshot.errors.len()
            );
            (
                StatusCode::OK,
                Json(RefreshResponse {
                    success: true,
                    message: Some("Feed refreshed".to_string()),
                    error: None,
                }),
            )
        }
        Err(e) => {
            error!("Manual refresh aborted: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(RefreshResponse {
                    success: false,
                    message: None,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(state.query.health())
}
