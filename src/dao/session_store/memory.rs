use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use dashmap::DashMap;
use futures::future::BoxFuture;

use crate::dao::{session_store::SessionStore, storage::StorageResult};

#[derive(Debug, Clone)]
struct StoredEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl StoredEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

/// In-process session store with per-key expiry.
///
/// Expired entries are hidden from every read as soon as their deadline passes
/// and physically removed by [`SessionStore::purge_expired`].
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, StoredEntry>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn live_value(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        let entry = self.entries.get(key)?;
        if entry.is_expired(now) {
            drop(entry);
            self.entries.remove_if(key, |_, entry| entry.is_expired(now));
            return None;
        }
        Some(entry.value.clone())
    }

    fn purge(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before.saturating_sub(self.entries.len())
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let value = self.live_value(key);
        Box::pin(async move { Ok(value) })
    }

    fn set(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let entry = StoredEntry {
            value,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.entries.insert(key.to_string(), entry);
        Box::pin(async { Ok(()) })
    }

    fn delete(&self, key: &str) -> BoxFuture<'static, StorageResult<bool>> {
        let now = Instant::now();
        let removed = self
            .entries
            .remove(key)
            .is_some_and(|(_, entry)| !entry.is_expired(now));
        Box::pin(async move { Ok(removed) })
    }

    fn exists(&self, key: &str) -> BoxFuture<'static, StorageResult<bool>> {
        let present = self.live_value(key).is_some();
        Box::pin(async move { Ok(present) })
    }

    fn purge_expired(&self) -> BoxFuture<'static, StorageResult<usize>> {
        let removed = self.purge();
        Box::pin(async move { Ok(removed) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
