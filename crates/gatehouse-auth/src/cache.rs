//! Cache-aside layer.
//!
//! A generic key-to-value read-through cache that speeds up repeated reads
//! without ever being a source of truth. Reads check the cache first and
//! populate it on miss; writes go to the repository and invalidate by
//! flushing the whole cache.
//!
//! Two rules hold everywhere:
//!
//! - Entry absence is a distinguishable outcome ([`CacheError::Miss`]),
//!   never a zero value.
//! - Cache failures are never fatal: callers treat any error as a miss and
//!   continue to the source of truth.
//!
//! Invalidation is a global [`CacheService::flush`]; a reader mid-flight at
//! flush time may still re-cache a stale record on its miss-then-fetch
//! path. Key-scoped invalidation (dropping `user_<id>` and `user_<email>`
//! together on mutation) would narrow that window and is a possible
//! follow-up, but the observable contract today is the full flush.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Cache layer errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// No entry exists for the requested key.
    #[error("cache miss")]
    Miss,

    /// The cache backend failed or the value could not be (de)serialized.
    #[error("cache error: {message}")]
    Backend {
        /// Description of the backend failure.
        message: String,
    },
}

impl CacheError {
    /// Creates a new `Backend` error.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a plain miss rather than a failure.
    #[must_use]
    pub fn is_miss(&self) -> bool {
        matches!(self, Self::Miss)
    }
}

/// Type alias for cache results.
pub type CacheResult<T> = Result<T, CacheError>;

/// Backend storage for cached entries.
///
/// Object-safe: values cross this boundary as [`serde_json::Value`]; the
/// typed front door is [`CacheService`].
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Looks up a single key.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Miss`] when the key is absent.
    async fn get_by_key(&self, key: &str) -> CacheResult<Value>;

    /// Writes a new entry. Succeeds even if the key already exists.
    async fn create(&self, key: &str, value: Value) -> CacheResult<()>;

    /// Overwrites an entry. Succeeds even if the key does not exist.
    async fn update(&self, key: &str, value: Value) -> CacheResult<()>;

    /// Removes a single key.
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Unconditionally clears the entire cache.
    async fn flush(&self) -> CacheResult<()>;
}

/// Typed wrapper over a [`CacheStorage`] backend.
#[derive(Clone)]
pub struct CacheService {
    storage: Arc<dyn CacheStorage>,
}

impl CacheService {
    /// Creates a new cache service over the given backend.
    #[must_use]
    pub fn new(storage: Arc<dyn CacheStorage>) -> Self {
        Self { storage }
    }

    /// Looks up `key` and deserializes the stored value.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Miss`] for an absent key and
    /// [`CacheError::Backend`] for backend or deserialization failures.
    /// Callers treat either as a miss.
    pub async fn get_by_key<T: DeserializeOwned>(&self, key: &str) -> CacheResult<T> {
        let value = self.storage.get_by_key(key).await?;

        serde_json::from_value(value).map_err(|e| CacheError::backend(e.to_string()))
    }

    /// Serializes `value` and writes it under `key`.
    pub async fn create<T: Serialize>(&self, key: &str, value: &T) -> CacheResult<()> {
        let value = serde_json::to_value(value).map_err(|e| CacheError::backend(e.to_string()))?;

        self.storage.create(key, value).await
    }

    /// Serializes `value` and overwrites `key`.
    pub async fn update<T: Serialize>(&self, key: &str, value: &T) -> CacheResult<()> {
        let value = serde_json::to_value(value).map_err(|e| CacheError::backend(e.to_string()))?;

        self.storage.update(key, value).await
    }

    /// Removes a single key.
    pub async fn delete(&self, key: &str) -> CacheResult<()> {
        self.storage.delete(key).await
    }

    /// Clears the entire cache. The only invalidation primitive used by
    /// the directory service.
    pub async fn flush(&self) -> CacheResult<()> {
        self.storage.flush().await
    }
}
