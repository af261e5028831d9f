use crate::config::SourceEndpoints;
use crate::fetcher::Fetcher;
use crate::sources::default_sources;
use crate::state::FeedStore;
use crate::traits::SourceFetcher;
use crate::types::{FetchConfig, FetchOutcome, Result, Snapshot, SourceTag};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Runs refresh cycles across every registered source and publishes the
/// merged result to the store.
pub struct FeedAggregator {
    sources: Vec<Arc<dyn SourceFetcher>>,
    store: Arc<FeedStore>,
    /// Serializes refreshes; a second trigger waits for the running cycle
    refresh_lock: Mutex<()>,
}

impl FeedAggregator {
    pub fn new(sources: Vec<Arc<dyn SourceFetcher>>, store: Arc<FeedStore>) -> Self {
        Self {
            sources,
            store,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Aggregator over the built-in sources with a fresh store
    pub fn with_default_sources(
        fetch_config: FetchConfig,
        endpoints: &SourceEndpoints,
    ) -> Result<Self> {
        let fetcher = Fetcher::new(fetch_config)?;
        let sources = default_sources(&fetcher, endpoints);
        Ok(Self::new(sources, Arc::new(FeedStore::new())))
    }

    pub fn store(&self) -> Arc<FeedStore> {
        Arc::clone(&self.store)
    }

    pub fn source_tags(&self) -> Vec<SourceTag> {
        self.sources.iter().map(|s| s.tag()).collect()
    }

    /// Fetch every source concurrently, merge and publish one snapshot.
    /// Never fails: source failures end up in the snapshot's `errors`.
    pub async fn refresh(&self) -> Arc<Snapshot> {
        let _guard = self.refresh_lock.lock().await;
        let start_time = Instant::now();
        let now = Utc::now();

        info!("Starting refresh across {} sources", self.sources.len());

        let tasks: Vec<_> = self
            .sources
            .iter()
            .map(|source| {
                let source = Arc::clone(source);
                let tag = source.tag();
                let name = source.source_name();
                async move {
                    // Own task per source so a panic stays inside that source
                    let handle = tokio::spawn(async move { source.fetch(now).await });
                    let outcome = match handle.await {
                        Ok(outcome) => outcome,
                        Err(e) => FetchOutcome::failed(tag, format!("fetch task aborted: {}", e)),
                    };
                    (name, outcome)
                }
            })
            .collect();
        let outcomes = join_all(tasks).await;

        let snapshot = Arc::new(merge_outcomes(outcomes, Utc::now()));
        self.store.replace(Arc::clone(&snapshot));

        info!(
            "Refresh complete: {} items, {} failed sources, {} warnings in {}ms",
            snapshot.items.len(),
            snapshot.errors.len(),
            snapshot.warnings.len(),
            start_time.elapsed().as_millis()
        );
        snapshot
    }
}

/// Merge settled outcomes in registration order, drop repeated ids and sort
/// newest first. The sort is stable, so ties keep merge order.
pub fn merge_outcomes(outcomes: Vec<(String, FetchOutcome)>, built_at: DateTime<Utc>) -> Snapshot {
    let mut items = Vec::new();
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut seen_ids = HashSet::new();

    for (name, outcome) in outcomes {
        for warning in outcome.warnings {
            warn!("{}: {}", name, warning);
            warnings.push(format!("{}: {}", name, warning));
        }

        if let Some(reason) = outcome.error {
            error!("{} failed: {}", name, reason);
            errors.push(format!("{}: {}", name, reason));
            continue;
        }

        info!("{}: {} items", name, outcome.items.len());
        for item in outcome.items {
            if seen_ids.insert(item.id.clone()) {
                items.push(item);
            } else {
                warn!("Dropping duplicate item id {} from {}", item.id, name);
            }
        }
    }

    items.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));

    Snapshot {
        items,
        last_updated: built_at,
        errors,
        warnings,
    }
}
