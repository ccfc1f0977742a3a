//! Key-Value Store with TTL
//!
//! Backing store for short-lived tokens. Implementations must make `put`
//! an atomic overwrite and `take_if` an atomic read-compare-delete, so a
//! token can never be consumed twice.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use thiserror::Error;

use crate::clock::{Clock, SystemClock};
use crate::rate_limit::Bucket;

/// Cache backend failures
#[derive(Debug, Error)]
pub enum CacheError {
    /// The backend could not be reached or is in a broken state
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    /// A stored value could not be encoded or decoded
    #[error("Cache serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Key-value store contract
#[trait_variant::make(KeyValueStore: Send)]
pub trait LocalKeyValueStore {
    /// Live value for `key`
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value`, replacing any live value; `None` never expires
    async fn put(&self, key: &str, value: String, ttl: Option<Duration>)
    -> Result<(), CacheError>;

    /// Remove `key`; returns whether a live value existed
    async fn forget(&self, key: &str) -> Result<bool, CacheError>;

    /// Remove and return the live value
    async fn pull(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Remove the live value only when `predicate` accepts it
    ///
    /// Returns `true` when the value was removed. The check and the removal
    /// happen under one lock (or one backend transaction).
    async fn take_if(
        &self,
        key: &str,
        predicate: impl FnOnce(&str) -> bool + Send,
    ) -> Result<bool, CacheError>;
}

// ============================================================================
// In-memory implementation
// ============================================================================

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at_ms: Option<i64>,
}

impl Entry {
    fn is_live(&self, now_ms: i64) -> bool {
        self.expires_at_ms.is_none_or(|at| at > now_ms)
    }
}

/// Writes between two sweeps of expired entries and elapsed buckets
pub const PURGE_EVERY: u64 = 256;

#[derive(Debug, Default)]
pub(crate) struct Inner {
    entries: HashMap<String, Entry>,
    pub(crate) buckets: HashMap<String, Bucket>,
    writes: u64,
}

impl Inner {
    fn purge(&mut self, now_ms: i64) -> usize {
        let before = self.entries.len() + self.buckets.len();
        self.entries.retain(|_, e| e.is_live(now_ms));
        self.buckets.retain(|_, b| b.reset_at_ms > now_ms);
        before - self.entries.len() - self.buckets.len()
    }

    /// Count a write; every [`PURGE_EVERY`]th one sweeps the maps so keys
    /// nobody reads again do not accumulate
    pub(crate) fn note_write(&mut self, now_ms: i64) {
        self.writes = self.writes.wrapping_add(1);
        if self.writes % PURGE_EVERY == 0 {
            let purged = self.purge(now_ms);
            if purged > 0 {
                tracing::debug!(purged, "Memory cache swept");
            }
        }
    }
}

/// Process-local store
///
/// Holds both TTL entries and throttle buckets behind one mutex; it
/// implements [`KeyValueStore`] here and
/// [`ThrottleStore`](crate::rate_limit::ThrottleStore) in `rate_limit`.
/// Writes sweep expired data every [`PURGE_EVERY`] operations.
#[derive(Clone)]
pub struct MemoryCache {
    inner: Arc<Mutex<Inner>>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl MemoryCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            clock,
        }
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Inner>, CacheError> {
        self.inner
            .lock()
            .map_err(|_| CacheError::Unavailable("memory cache lock poisoned".to_string()))
    }

    /// Drop expired entries and elapsed buckets now; returns how many
    /// were removed
    pub fn purge_expired(&self) -> Result<usize, CacheError> {
        let now_ms = self.clock.now_ms();
        Ok(self.lock()?.purge(now_ms))
    }

    fn live<'a>(inner: &'a Inner, key: &str, now_ms: i64) -> Option<&'a Entry> {
        inner.entries.get(key).filter(|e| e.is_live(now_ms))
    }
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache").finish_non_exhaustive()
    }
}

impl KeyValueStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now_ms = self.clock.now_ms();
        let inner = self.lock()?;
        Ok(Self::live(&inner, key, now_ms).map(|e| e.value.clone()))
    }

    async fn put(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let now_ms = self.clock.now_ms();
        let expires_at_ms = ttl.map(|ttl| now_ms + ttl.as_millis() as i64);
        let mut inner = self.lock()?;
        inner.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at_ms,
            },
        );
        inner.note_write(now_ms);
        Ok(())
    }

    async fn forget(&self, key: &str) -> Result<bool, CacheError> {
        let now_ms = self.clock.now_ms();
        let removed = self.lock()?.entries.remove(key);
        Ok(removed.is_some_and(|e| e.is_live(now_ms)))
    }

    async fn pull(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now_ms = self.clock.now_ms();
        let removed = self.lock()?.entries.remove(key);
        Ok(removed.filter(|e| e.is_live(now_ms)).map(|e| e.value))
    }

    async fn take_if(
        &self,
        key: &str,
        predicate: impl FnOnce(&str) -> bool + Send,
    ) -> Result<bool, CacheError> {
        let now_ms = self.clock.now_ms();
        let mut inner = self.lock()?;

        let matched = Self::live(&inner, key, now_ms).is_some_and(|e| predicate(&e.value));
        if matched {
            inner.entries.remove(key);
        }
        Ok(matched)
    }
}
