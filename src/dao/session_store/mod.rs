/// In-process backend.
pub mod memory;

use std::time::Duration;

use futures::future::BoxFuture;

use crate::dao::storage::StorageResult;

pub use self::memory::MemoryStore;

/// Abstraction over the expiring key-value store holding room records.
///
/// Values are opaque strings (JSON documents in practice). The store makes no
/// atomicity promise across concurrent writers; callers serialize writes per key.
pub trait SessionStore: Send + Sync {
    /// Fetch the live value under `key`.
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>>;
    /// Store `value` under `key`, replacing any previous value. A `ttl` of `None` never expires.
    fn set(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Remove `key`, returning whether a live value was present.
    fn delete(&self, key: &str) -> BoxFuture<'static, StorageResult<bool>>;
    /// Whether a live value exists under `key`.
    fn exists(&self, key: &str) -> BoxFuture<'static, StorageResult<bool>>;
    /// Physically drop expired entries, returning how many were removed.
    ///
    /// Backends with native expiry keep the default no-op.
    fn purge_expired(&self) -> BoxFuture<'static, StorageResult<usize>> {
        Box::pin(async { Ok(0) })
    }
    /// Check the backend is reachable.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
