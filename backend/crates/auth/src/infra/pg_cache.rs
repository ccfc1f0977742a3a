//! PostgreSQL token and throttle store
//!
//! Shared-state counterpart of `platform::cache::MemoryCache` for
//! deployments running more than one process. Token records live in
//! `cache_entries`, throttle buckets in `throttle_buckets`.

use std::sync::Arc;
use std::time::Duration;

use platform::cache::{CacheError, KeyValueStore};
use platform::clock::{Clock, SystemClock};
use platform::rate_limit::{Reservation, ThrottleStore, ThrottleStoreError};
use sqlx::PgPool;

fn unavailable(err: sqlx::Error) -> CacheError {
    tracing::error!(error = %err, "Cache store query failed");
    CacheError::Unavailable(err.to_string())
}

fn throttle_unavailable(err: sqlx::Error) -> ThrottleStoreError {
    tracing::error!(error = %err, "Throttle store query failed");
    ThrottleStoreError::Unavailable(err.to_string())
}

#[derive(Clone)]
pub struct PgCacheStore {
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl PgCacheStore {
    pub fn new(pool: PgPool) -> Self {
        Self::with_clock(pool, Arc::new(SystemClock))
    }

    pub fn with_clock(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    /// Delete expired entries and elapsed buckets
    pub async fn purge_expired(&self) -> Result<u64, CacheError> {
        let now_ms = self.clock.now_ms();

        let entries = sqlx::query("DELETE FROM cache_entries WHERE expires_at_ms <= $1")
            .bind(now_ms)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?
            .rows_affected();
        let buckets = sqlx::query("DELETE FROM throttle_buckets WHERE reset_at_ms <= $1")
            .bind(now_ms)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?
            .rows_affected();

        tracing::info!(entries, buckets, "Purged expired cache rows");
        Ok(entries + buckets)
    }

    /// Run [`PgCacheStore::purge_expired`] every `every` on the current
    /// runtime until the handle is aborted
    pub fn spawn_purge(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        let store = self.clone();
        let mut ticker = tokio::time::interval(every);
        tokio::spawn(async move {
            loop {
                ticker.tick().await;
                if let Err(err) = store.purge_expired().await {
                    tracing::warn!(error = %err, "Cache purge failed; retrying next tick");
                }
            }
        })
    }
}

impl std::fmt::Debug for PgCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgCacheStore").finish_non_exhaustive()
    }
}

// ============================================================================
// Key-value store
// ============================================================================

impl KeyValueStore for PgCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT value FROM cache_entries
            WHERE key = $1 AND (expires_at_ms IS NULL OR expires_at_ms > $2)
            "#,
        )
        .bind(key)
        .bind(self.clock.now_ms())
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)
    }

    async fn put(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), CacheError> {
        let expires_at_ms = ttl.map(|ttl| self.clock.now_ms() + ttl.as_millis() as i64);

        sqlx::query(
            r#"
            INSERT INTO cache_entries (key, value, expires_at_ms)
            VALUES ($1, $2, $3)
            ON CONFLICT (key) DO UPDATE SET
                value = EXCLUDED.value,
                expires_at_ms = EXCLUDED.expires_at_ms
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(expires_at_ms)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(())
    }

    async fn forget(&self, key: &str) -> Result<bool, CacheError> {
        let live = sqlx::query_scalar::<_, bool>(
            r#"
            DELETE FROM cache_entries WHERE key = $1
            RETURNING (expires_at_ms IS NULL OR expires_at_ms > $2)
            "#,
        )
        .bind(key)
        .bind(self.clock.now_ms())
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(live.unwrap_or(false))
    }

    async fn pull(&self, key: &str) -> Result<Option<String>, CacheError> {
        let row = sqlx::query_as::<_, (String, bool)>(
            r#"
            DELETE FROM cache_entries WHERE key = $1
            RETURNING value, (expires_at_ms IS NULL OR expires_at_ms > $2)
            "#,
        )
        .bind(key)
        .bind(self.clock.now_ms())
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(row.filter(|(_, live)| *live).map(|(value, _)| value))
    }

    async fn take_if(
        &self,
        key: &str,
        predicate: impl FnOnce(&str) -> bool + Send,
    ) -> Result<bool, CacheError> {
        let mut tx = self.pool.begin().await.map_err(unavailable)?;

        let value = sqlx::query_scalar::<_, String>(
            r#"
            SELECT value FROM cache_entries
            WHERE key = $1 AND (expires_at_ms IS NULL OR expires_at_ms > $2)
            FOR UPDATE
            "#,
        )
        .bind(key)
        .bind(self.clock.now_ms())
        .fetch_optional(&mut *tx)
        .await
        .map_err(unavailable)?;

        let Some(value) = value.filter(|v| predicate(v)) else {
            tx.rollback().await.map_err(unavailable)?;
            return Ok(false);
        };

        sqlx::query("DELETE FROM cache_entries WHERE key = $1 AND value = $2")
            .bind(key)
            .bind(value)
            .execute(&mut *tx)
            .await
            .map_err(unavailable)?;
        tx.commit().await.map_err(unavailable)?;

        Ok(true)
    }
}

// ============================================================================
// Throttle store
// ============================================================================

impl ThrottleStore for PgCacheStore {
    async fn reserve(
        &self,
        key: &str,
        max_attempts: u32,
        window_ms: i64,
        now_ms: i64,
    ) -> Result<Reservation, ThrottleStoreError> {
        // SET expressions read the row as it was before the update, so
        // `allowed` reflects the pre-increment state
        let (count, reset_at_ms, allowed) = sqlx::query_as::<_, (i32, i64, bool)>(
            r#"
            INSERT INTO throttle_buckets (key, count, reset_at_ms, allowed)
            VALUES ($1, LEAST(1, $2), $3 + $4, $2 > 0)
            ON CONFLICT (key) DO UPDATE SET
                count = CASE
                    WHEN throttle_buckets.reset_at_ms <= $3 THEN LEAST(1, $2)
                    WHEN throttle_buckets.count < $2 THEN throttle_buckets.count + 1
                    ELSE throttle_buckets.count
                END,
                reset_at_ms = CASE
                    WHEN throttle_buckets.reset_at_ms <= $3 THEN $3 + $4
                    ELSE throttle_buckets.reset_at_ms
                END,
                allowed = CASE
                    WHEN throttle_buckets.reset_at_ms <= $3 THEN $2 > 0
                    ELSE throttle_buckets.count < $2
                END
            RETURNING count, reset_at_ms, allowed
            "#,
        )
        .bind(key)
        .bind(i32::try_from(max_attempts).unwrap_or(i32::MAX))
        .bind(now_ms)
        .bind(window_ms)
        .fetch_one(&self.pool)
        .await
        .map_err(throttle_unavailable)?;

        Ok(Reservation {
            allowed,
            attempts: count.max(0) as u32,
            reset_at_ms,
        })
    }

    async fn release(&self, key: &str, now_ms: i64) -> Result<(), ThrottleStoreError> {
        sqlx::query(
            r#"
            UPDATE throttle_buckets SET count = GREATEST(count - 1, 0)
            WHERE key = $1 AND reset_at_ms > $2
            "#,
        )
        .bind(key)
        .bind(now_ms)
        .execute(&self.pool)
        .await
        .map_err(throttle_unavailable)?;

        Ok(())
    }

    async fn clear(&self, key: &str) -> Result<(), ThrottleStoreError> {
        sqlx::query("DELETE FROM throttle_buckets WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(throttle_unavailable)?;

        Ok(())
    }

    async fn attempts(&self, key: &str, now_ms: i64) -> Result<u32, ThrottleStoreError> {
        let count = sqlx::query_scalar::<_, i32>(
            "SELECT count FROM throttle_buckets WHERE key = $1 AND reset_at_ms > $2",
        )
        .bind(key)
        .bind(now_ms)
        .fetch_optional(&self.pool)
        .await
        .map_err(throttle_unavailable)?;

        Ok(count.map_or(0, |c| c.max(0) as u32))
    }
}
