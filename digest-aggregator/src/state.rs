use crate::types::Snapshot;
use chrono::{DateTime, Utc};
use std::sync::{Arc, PoisonError, RwLock};

/// Holder of the current snapshot. Readers get a shared handle to a complete
/// snapshot; writers swap the whole value, so a reader never sees a mix of two
/// cycles.
pub struct FeedStore {
    current: RwLock<Arc<Snapshot>>,
}

impl FeedStore {
    /// Store holding the empty pre-refresh snapshot
    pub fn new() -> Self {
        Self::with_snapshot(Snapshot::empty())
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    pub fn current(&self) -> Arc<Snapshot> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Publish `snapshot`, handing back the one it replaced
    pub fn replace(&self, snapshot: Arc<Snapshot>) -> Arc<Snapshot> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, snapshot)
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.current().last_updated
    }
}

impl Default for FeedStore {
    fn default() -> Self {
        Self::new()
    }
}
