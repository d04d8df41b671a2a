//! Key-value cache with per-entry time-to-live.
//!
//! Holds serialized session results and anti-spam markers. Entries vanish
//! when their TTL runs out; nothing is persisted beyond that.

use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// Errors reported by cache backends
#[derive(Error, Debug)]
pub enum CacheError {
    /// Backend failed to serve the request
    #[error("Cache backend error: {0}")]
    Backend(String),
}

/// Writes applied together by [`KeyValueStore::commit`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WriteBatch {
    writes: Vec<(String, String, Option<Duration>)>,
}

impl WriteBatch {
    /// Queue a `set` with an optional TTL.
    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
        ttl: Option<Duration>,
    ) -> &mut Self {
        self.writes.push((key.into(), value.into(), ttl));
        self
    }

    /// Number of queued writes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// True when nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Interface for key-value caches
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get a live value.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    /// Set a value, replacing any previous one and its TTL.
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), CacheError>;
    /// Remaining lifetime; `None` when the key is missing or never expires.
    async fn ttl(&self, key: &str) -> Result<Option<Duration>, CacheError>;
    /// Whether a live value exists.
    async fn exists(&self, key: &str) -> Result<bool, CacheError>;
    /// Apply all writes of a batch in order.
    async fn commit(&self, batch: WriteBatch) -> Result<(), CacheError>;
}

#[derive(Clone, Debug)]
struct CachedValue {
    value: String,
    ttl: Option<Duration>,
    expires_at: Option<Instant>,
}

impl CachedValue {
    fn new(value: String, ttl: Option<Duration>) -> Self {
        Self {
            value,
            ttl,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        }
    }

    fn remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|at| at.saturating_duration_since(Instant::now()))
            .filter(|left| !left.is_zero())
    }
}

struct PerEntryExpiry;

impl Expiry<String, CachedValue> for PerEntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.ttl
    }
}

/// In-process cache backed by moka.
#[derive(Clone)]
pub struct MemoryCache {
    cache: Cache<String, CachedValue>,
}

impl MemoryCache {
    /// Create a cache bounded to `max_capacity` entries.
    ///
    /// # Examples
    ///
    /// ```
    /// use domofomka::storage::cache::MemoryCache;
    ///
    /// let cache = MemoryCache::new(10_000);
    /// ```
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryExpiry)
            .build();
        Self { cache }
    }

    async fn live(&self, key: &str) -> Option<CachedValue> {
        let entry = self.cache.get(key).await?;
        match entry.expires_at {
            Some(at) if at <= Instant::now() => None,
            _ => Some(entry),
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.live(key).await.map(|entry| entry.value))
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), CacheError> {
        self.cache
            .insert(key.to_string(), CachedValue::new(value, ttl))
            .await;
        Ok(())
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, CacheError> {
        Ok(self.live(key).await.and_then(|entry| entry.remaining()))
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.live(key).await.is_some())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), CacheError> {
        debug!(writes = batch.len(), "Committing cache batch");
        for (key, value, ttl) in batch.writes {
            self.cache.insert(key, CachedValue::new(value, ttl)).await;
        }
        Ok(())
    }
}
