//! Rate Limiting Infrastructure
//!
//! Fixed-window attempt limiting for sensitive operations.
//!
//! ## Flow
//! 1. The caller builds a [`Limit`] (config + signature key)
//! 2. [`ThrottleGate::attempt`] atomically reserves one attempt, or trips
//! 3. The returned [`ThrottleTicket`] decides what happens to the reserved
//!    attempt: `hit()` keeps it counted, `release()` hands it back,
//!    `clear()` resets the whole bucket
//!
//! Reserving before the operation runs means two concurrent requests can
//! never both observe "one attempt left" and both proceed.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::cache::MemoryCache;
use crate::clock::Clock;

// ============================================================================
// Configuration
// ============================================================================

/// Rate limit configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleConfig {
    /// Maximum attempts allowed in one window
    pub max_attempts: u32,
    /// Window length
    pub decay: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self::per_minutes(60, 3)
    }
}

impl ThrottleConfig {
    pub const fn new(max_attempts: u32, decay: Duration) -> Self {
        Self {
            max_attempts,
            decay,
        }
    }

    /// `max_attempts` per `decay_minutes`
    pub const fn per_minutes(decay_minutes: u64, max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::from_secs(decay_minutes * 60))
    }

    pub fn decay_ms(&self) -> i64 {
        self.decay.as_millis() as i64
    }

    /// Bind this configuration to a bucket key
    pub fn by(&self, key: impl Into<String>) -> Limit {
        Limit {
            key: key.into(),
            config: *self,
        }
    }
}

/// A configured limit applied to one bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limit {
    key: String,
    config: ThrottleConfig,
}

impl Limit {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn config(&self) -> ThrottleConfig {
        self.config
    }
}

// ============================================================================
// Store
// ============================================================================

/// Throttle store failures
#[derive(Debug, Error)]
pub enum ThrottleStoreError {
    #[error("Throttle store unavailable: {0}")]
    Unavailable(String),
}

impl From<crate::cache::CacheError> for ThrottleStoreError {
    fn from(err: crate::cache::CacheError) -> Self {
        ThrottleStoreError::Unavailable(err.to_string())
    }
}

/// Outcome of one reservation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    /// Whether an attempt was reserved
    pub allowed: bool,
    /// Attempts counted in the current window (including this one)
    pub attempts: u32,
    /// When the current window ends (Unix ms)
    pub reset_at_ms: i64,
}

impl Reservation {
    /// Whole seconds until the window ends, rounded up
    pub fn retry_after_secs(&self, now_ms: i64) -> u64 {
        let remaining_ms = (self.reset_at_ms - now_ms).max(0) as u64;
        remaining_ms.div_ceil(1000)
    }
}

/// Counter store contract
///
/// `reserve` must check and increment atomically.
#[trait_variant::make(ThrottleStore: Send)]
pub trait LocalThrottleStore {
    /// Count one attempt unless `max_attempts` is already reached
    ///
    /// A missing or elapsed bucket starts a new window of `window_ms`.
    async fn reserve(
        &self,
        key: &str,
        max_attempts: u32,
        window_ms: i64,
        now_ms: i64,
    ) -> Result<Reservation, ThrottleStoreError>;

    /// Give back one attempt of the live window
    async fn release(&self, key: &str, now_ms: i64) -> Result<(), ThrottleStoreError>;

    /// Drop the bucket
    async fn clear(&self, key: &str) -> Result<(), ThrottleStoreError>;

    /// Attempts counted in the live window
    async fn attempts(&self, key: &str, now_ms: i64) -> Result<u32, ThrottleStoreError>;
}

/// In-memory throttle store; buckets live next to the cache entries
pub type MemoryThrottleStore = MemoryCache;

/// Counter state of one key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Bucket {
    pub(crate) count: u32,
    pub(crate) reset_at_ms: i64,
}

impl ThrottleStore for MemoryCache {
    async fn reserve(
        &self,
        key: &str,
        max_attempts: u32,
        window_ms: i64,
        now_ms: i64,
    ) -> Result<Reservation, ThrottleStoreError> {
        let mut inner = self.lock()?;

        let bucket = inner
            .buckets
            .entry(key.to_string())
            .or_insert(Bucket {
                count: 0,
                reset_at_ms: now_ms + window_ms,
            });

        if bucket.reset_at_ms <= now_ms {
            *bucket = Bucket {
                count: 0,
                reset_at_ms: now_ms + window_ms,
            };
        }

        let allowed = bucket.count < max_attempts;
        if allowed {
            bucket.count += 1;
        }
        let reservation = Reservation {
            allowed,
            attempts: bucket.count,
            reset_at_ms: bucket.reset_at_ms,
        };

        inner.note_write(now_ms);
        Ok(reservation)
    }

    async fn release(&self, key: &str, now_ms: i64) -> Result<(), ThrottleStoreError> {
        let mut inner = self.lock()?;
        if let Some(bucket) = inner.buckets.get_mut(key) {
            if bucket.reset_at_ms > now_ms {
                bucket.count = bucket.count.saturating_sub(1);
            }
        }
        Ok(())
    }

    async fn clear(&self, key: &str) -> Result<(), ThrottleStoreError> {
        self.lock()?.buckets.remove(key);
        Ok(())
    }

    async fn attempts(&self, key: &str, now_ms: i64) -> Result<u32, ThrottleStoreError> {
        let inner = self.lock()?;
        Ok(inner
            .buckets
            .get(key)
            .filter(|b| b.reset_at_ms > now_ms)
            .map_or(0, |b| b.count))
    }
}

// ============================================================================
// Gate
// ============================================================================

/// Attempt limiter over a [`ThrottleStore`]
pub struct ThrottleGate<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> Clone for ThrottleGate<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            clock: self.clock.clone(),
        }
    }
}

impl<S: ThrottleStore + Sync> ThrottleGate<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Reserve one attempt against `limit`
    ///
    /// ## Arguments
    /// * `limit` - bucket key and configuration
    /// * `on_trip` - builds the error returned when the limit is reached;
    ///   receives the retry-after in seconds
    ///
    /// ## Returns
    /// * `Ok(ThrottleTicket)` - attempt reserved
    /// * `Err(E)` - the `on_trip` error, or a store failure
    pub async fn attempt<E, F>(&self, limit: &Limit, on_trip: F) -> Result<ThrottleTicket<S>, E>
    where
        F: FnOnce(u64) -> E,
        E: From<ThrottleStoreError>,
    {
        self.attempt_all(std::slice::from_ref(limit), on_trip).await
    }

    /// Reserve one attempt against every limit
    ///
    /// Any denial denies the whole attempt: reservations already taken are
    /// handed back and `on_trip` receives the longest retry-after.
    pub async fn attempt_all<E, F>(
        &self,
        limits: &[Limit],
        on_trip: F,
    ) -> Result<ThrottleTicket<S>, E>
    where
        F: FnOnce(u64) -> E,
        E: From<ThrottleStoreError>,
    {
        let now_ms = self.clock.now_ms();
        let mut reserved = Vec::with_capacity(limits.len());
        let mut retry_after: Option<u64> = None;

        for limit in limits {
            let reservation = self
                .store
                .reserve(
                    &limit.key,
                    limit.config.max_attempts,
                    limit.config.decay_ms(),
                    now_ms,
                )
                .await?;

            if reservation.allowed {
                reserved.push(limit.key.clone());
            } else {
                let secs = reservation.retry_after_secs(now_ms);
                retry_after = Some(retry_after.map_or(secs, |r| r.max(secs)));
            }
        }

        if let Some(secs) = retry_after {
            for key in &reserved {
                self.store.release(key, now_ms).await?;
            }
            tracing::warn!(
                limits = limits.len(),
                retry_after_secs = secs,
                "Throttle tripped"
            );
            return Err(on_trip(secs));
        }

        Ok(ThrottleTicket {
            store: self.store.clone(),
            clock: self.clock.clone(),
            keys: reserved,
        })
    }

    /// Attempts counted for `limit` in its live window
    pub async fn attempts(&self, limit: &Limit) -> Result<u32, ThrottleStoreError> {
        self.store.attempts(&limit.key, self.clock.now_ms()).await
    }

    /// Reset the bucket of `limit`
    pub async fn clear(&self, limit: &Limit) -> Result<(), ThrottleStoreError> {
        self.store.clear(&limit.key).await
    }
}

/// A reserved attempt awaiting its outcome
///
/// Dropping the ticket without a decision leaves the attempt counted.
#[must_use = "decide whether the reserved attempt counts: hit(), release() or clear()"]
pub struct ThrottleTicket<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    keys: Vec<String>,
}

impl<S: ThrottleStore + Sync> ThrottleTicket<S> {
    /// Record a failure: the reserved attempt stays counted
    pub fn hit(self) {
        tracing::debug!(buckets = self.keys.len(), "Throttle attempt recorded");
    }

    /// The operation succeeded and must not count against the limit
    pub async fn release(self) -> Result<(), ThrottleStoreError> {
        let now_ms = self.clock.now_ms();
        for key in &self.keys {
            self.store.release(key, now_ms).await?;
        }
        Ok(())
    }

    /// Reset every bucket this ticket reserved in
    pub async fn clear(self) -> Result<(), ThrottleStoreError> {
        for key in &self.keys {
            self.store.clear(key).await?;
        }
        Ok(())
    }
}

impl<S> std::fmt::Debug for ThrottleTicket<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThrottleTicket")
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Tripped(u64),
        Store,
    }

    impl From<ThrottleStoreError> for TestError {
        fn from(_: ThrottleStoreError) -> Self {
            TestError::Store
        }
    }

    fn gate() -> (ThrottleGate<MemoryCache>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(10_000_000));
        let store = Arc::new(MemoryCache::new(clock.clone()));
        (ThrottleGate::new(store, clock.clone()), clock)
    }

    #[test]
    fn test_default_config() {
        let config = ThrottleConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.decay, Duration::from_secs(3600));
        assert_eq!(config.by("abc").key(), "abc");
    }

    #[test]
    fn test_retry_after_rounds_up() {
        let reservation = Reservation {
            allowed: false,
            attempts: 3,
            reset_at_ms: 10_001,
        };
        assert_eq!(reservation.retry_after_secs(10_000), 1);
        assert_eq!(reservation.retry_after_secs(9_000), 2);
        assert_eq!(reservation.retry_after_secs(20_000), 0);
    }

    #[tokio::test]
    async fn test_n_allowed_then_denied_then_allowed_after_window() {
        let (gate, clock) = gate();
        let limit = ThrottleConfig::per_minutes(1, 3).by("k");

        for _ in 0..3 {
            gate.attempt(&limit, TestError::Tripped).await.unwrap().hit();
        }

        let err = gate.attempt(&limit, TestError::Tripped).await.unwrap_err();
        assert_eq!(err, TestError::Tripped(60));

        clock.advance(Duration::from_secs(60));
        assert!(gate.attempt(&limit, TestError::Tripped).await.is_ok());
    }

    #[tokio::test]
    async fn test_retry_after_is_remaining_window() {
        let (gate, clock) = gate();
        let limit = ThrottleConfig::per_minutes(15, 5).by("k");

        for _ in 0..5 {
            gate.attempt(&limit, TestError::Tripped).await.unwrap().hit();
            clock.advance(Duration::from_secs(10));
        }

        let err = gate.attempt(&limit, TestError::Tripped).await.unwrap_err();
        assert_eq!(err, TestError::Tripped(15 * 60 - 50));
    }

    #[tokio::test]
    async fn test_release_does_not_count() {
        let (gate, _) = gate();
        let limit = ThrottleConfig::per_minutes(1, 1).by("k");

        for _ in 0..5 {
            gate.attempt(&limit, TestError::Tripped)
                .await
                .unwrap()
                .release()
                .await
                .unwrap();
        }
        assert_eq!(gate.attempts(&limit).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_dropped_ticket_stays_counted() {
        let (gate, _) = gate();
        let limit = ThrottleConfig::per_minutes(1, 2).by("k");

        {
            let _ticket = gate.attempt(&limit, TestError::Tripped).await.unwrap();
        }
        assert_eq!(gate.attempts(&limit).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_clear_resets_bucket() {
        let (gate, _) = gate();
        let limit = ThrottleConfig::per_minutes(1, 2).by("k");

        gate.attempt(&limit, TestError::Tripped).await.unwrap().hit();
        gate.attempt(&limit, TestError::Tripped)
            .await
            .unwrap()
            .clear()
            .await
            .unwrap();
        assert_eq!(gate.attempts(&limit).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_attempt_all_denies_and_releases() {
        let (gate, clock) = gate();
        let short = ThrottleConfig::per_minutes(1, 1).by("short");
        let long = ThrottleConfig::per_minutes(10, 5).by("long");

        gate.attempt(&short, TestError::Tripped).await.unwrap().hit();
        clock.advance(Duration::from_secs(30));

        let err = gate
            .attempt_all(&[long.clone(), short.clone()], TestError::Tripped)
            .await
            .unwrap_err();
        assert_eq!(err, TestError::Tripped(30));
        // The reservation taken on `long` was handed back
        assert_eq!(gate.attempts(&long).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_attempt_all_reports_longest_retry() {
        let (gate, _) = gate();
        let a = ThrottleConfig::per_minutes(1, 1).by("a");
        let b = ThrottleConfig::per_minutes(5, 1).by("b");

        gate.attempt_all(&[a.clone(), b.clone()], TestError::Tripped)
            .await
            .unwrap()
            .hit();

        let err = gate
            .attempt_all(&[a, b], TestError::Tripped)
            .await
            .unwrap_err();
        assert_eq!(err, TestError::Tripped(300));
    }

    #[tokio::test]
    async fn test_concurrent_attempts_never_exceed_max() {
        let (gate, _) = gate();
        let limit = ThrottleConfig::per_minutes(1, 5).by("k");

        let mut handles = Vec::new();
        for _ in 0..32 {
            let gate = gate.clone();
            let limit = limit.clone();
            handles.push(tokio::spawn(async move {
                match gate.attempt(&limit, TestError::Tripped).await {
                    Ok(ticket) => {
                        ticket.hit();
                        true
                    }
                    Err(_) => false,
                }
            }));
        }

        let mut allowed = 0;
        for handle in handles {
            if handle.await.unwrap() {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 5);
    }
}
