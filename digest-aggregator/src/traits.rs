use crate::types::{FetchOutcome, Result, SourceBatch, SourceTag};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::warn;

/// One upstream integration, owned end to end: request, limits, recency
/// filtering, ranking and extraction.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Tag carried by every item this source produces
    fn tag(&self) -> SourceTag;

    /// Human-readable name used in logs and failure strings
    fn source_name(&self) -> String {
        self.tag().label().to_string()
    }

    /// Fetch and normalize items posted inside the recency window ending at `now`
    async fn pull(&self, now: DateTime<Utc>) -> Result<SourceBatch>;

    /// Settle the source for one cycle. Never fails: any error becomes the
    /// outcome's failure reason and the item list stays empty.
    async fn fetch(&self, now: DateTime<Utc>) -> FetchOutcome {
        match self.pull(now).await {
            Ok(mut batch) => {
                let dropped = batch.retain_recent(now);
                if dropped > 0 {
                    warn!(
                        "{} returned {} items outside the recency window; dropped",
                        self.source_name(),
                        dropped
                    );
                }
                FetchOutcome::from_batch(self.tag(), batch)
            }
            Err(e) => FetchOutcome::failed(self.tag(), e.to_string()),
        }
    }
}
