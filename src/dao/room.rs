use std::{sync::Arc, time::Duration};

use crate::{
    dao::{
        session_store::SessionStore,
        storage::{StorageError, StorageResult},
    },
    state::room::{Room, RoomCode},
};

/// Typed access to room records kept as JSON documents in a [`SessionStore`].
///
/// Every save refreshes the record's expiry, so a room lives for `ttl`
/// after its latest committed change.
#[derive(Clone)]
pub struct RoomRepository {
    store: Arc<dyn SessionStore>,
    ttl: Duration,
}

impl RoomRepository {
    /// Repository writing rooms with the given time to live.
    pub fn new(store: Arc<dyn SessionStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Load a room, `None` when absent or expired.
    pub async fn find(&self, code: &RoomCode) -> StorageResult<Option<Room>> {
        let key = code.storage_key();
        let Some(raw) = self.store.get(&key).await? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|err| StorageError::corrupted(key, err))
    }

    /// Write the whole room record and reset its expiry.
    pub async fn save(&self, room: &Room) -> StorageResult<()> {
        let key = room.code.storage_key();
        let raw = serde_json::to_string(room).map_err(|err| StorageError::corrupted(&key, err))?;
        self.store.set(&key, raw, Some(self.ttl)).await
    }

    /// Whether a live record exists under `code`.
    pub async fn exists(&self, code: &RoomCode) -> StorageResult<bool> {
        self.store.exists(&code.storage_key()).await
    }

    /// Remove a room, returning whether it was present.
    pub async fn delete(&self, code: &RoomCode) -> StorageResult<bool> {
        self.store.delete(&code.storage_key()).await
    }

    /// Drop expired records from the backing store.
    pub async fn purge_expired(&self) -> StorageResult<usize> {
        self.store.purge_expired().await
    }

    /// Probe the underlying store.
    pub async fn health_check(&self) -> StorageResult<()> {
        self.store.health_check().await
    }
}
