use crate::state::FeedStore;
use crate::types::{Item, SourceTag};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Read model served to clients
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedView {
    pub items: Vec<Item>,
    pub last_updated: DateTime<Utc>,
    /// Items in the snapshot before filtering
    pub total_count: usize,
    pub filtered_count: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    pub status: &'static str,
    pub last_updated: DateTime<Utc>,
}

/// Read-only view over the store; never triggers a fetch
pub struct QueryService {
    store: Arc<FeedStore>,
}

impl QueryService {
    pub fn new(store: Arc<FeedStore>) -> Self {
        Self { store }
    }

    /// Current feed, optionally narrowed to one source. An absent or
    /// unrecognized filter gives the default view, which leaves out the
    /// auxiliary sources.
    pub fn read(&self, source_filter: Option<&str>) -> FeedView {
        let snapshot = self.store.current();
        let filter = source_filter.and_then(|raw| raw.parse::<SourceTag>().ok());
        if filter.is_none() {
            if let Some(raw) = source_filter {
                debug!("Ignoring unknown source filter {:?}", raw);
            }
        }

        let items: Vec<Item> = snapshot
            .items
            .iter()
            .filter(|item| match filter {
                Some(tag) => item.source() == tag,
                None => !item.source().is_auxiliary(),
            })
            .cloned()
            .collect();

        FeedView {
            filtered_count: items.len(),
            total_count: snapshot.items.len(),
            items,
            last_updated: snapshot.last_updated,
            errors: snapshot.errors.clone(),
            warnings: snapshot.warnings.clone(),
        }
    }

    pub fn health(&self) -> Health {
        Health {
            status: "ok",
            last_updated: self.store.last_updated(),
        }
    }
}
