//! In-memory cache backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use gatehouse_auth::cache::{CacheError, CacheResult, CacheStorage};

/// In-memory implementation of [`CacheStorage`].
///
/// A real map, not a stub: entries written through the service are
/// observable on later reads, so flush-based invalidation can be asserted
/// against. The `fail_writes` switch makes every write return a backend
/// error, for exercising the never-fatal degradation path.
#[derive(Default)]
pub struct InMemoryCacheStorage {
    entries: RwLock<HashMap<String, Value>>,
    fail_writes: AtomicBool,
}

impl InMemoryCacheStorage {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write (create/update/flush) fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of stored entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns `true` if the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn check_writes(&self) -> CacheResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::backend("cache backend unavailable"));
        }

        Ok(())
    }
}

#[async_trait]
impl CacheStorage for InMemoryCacheStorage {
    async fn get_by_key(&self, key: &str) -> CacheResult<Value> {
        self.entries
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or(CacheError::Miss)
    }

    async fn create(&self, key: &str, value: Value) -> CacheResult<()> {
        self.check_writes()?;
        self.entries.write().await.insert(key.to_string(), value);

        Ok(())
    }

    async fn update(&self, key: &str, value: Value) -> CacheResult<()> {
        self.check_writes()?;
        self.entries.write().await.insert(key.to_string(), value);

        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.entries.write().await.remove(key);

        Ok(())
    }

    async fn flush(&self) -> CacheResult<()> {
        self.check_writes()?;
        self.entries.write().await.clear();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_miss_and_hit() {
        let cache = InMemoryCacheStorage::new();

        assert_eq!(cache.get_by_key("k").await.unwrap_err(), CacheError::Miss);

        cache.create("k", json!({"n": 1})).await.unwrap();
        assert_eq!(cache.get_by_key("k").await.unwrap(), json!({"n": 1}));
    }

    #[tokio::test]
    async fn test_flush_clears_all_entries() {
        let cache = InMemoryCacheStorage::new();

        cache.create("a", json!(1)).await.unwrap();
        cache.create("b", json!(2)).await.unwrap();
        assert_eq!(cache.len().await, 2);

        cache.flush().await.unwrap();
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_fail_writes_switch() {
        let cache = InMemoryCacheStorage::new();

        cache.create("a", json!(1)).await.unwrap();

        cache.set_fail_writes(true);
        assert!(cache.create("b", json!(2)).await.is_err());
        assert!(cache.flush().await.is_err());

        // Reads are unaffected, and prior entries survive.
        assert_eq!(cache.get_by_key("a").await.unwrap(), json!(1));

        cache.set_fail_writes(false);
        assert!(cache.create("b", json!(2)).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let cache = InMemoryCacheStorage::new();

        cache.create("a", json!(1)).await.unwrap();
        cache.delete("a").await.unwrap();
        cache.delete("a").await.unwrap();

        assert!(cache.is_empty().await);
    }
}
