//! Token Broker
//!
//! Short-lived single-purpose tokens kept in a [`KeyValueStore`].
//!
//! ## Storage
//! Key `"<broker>:<guard>:<scope>"`, value JSON
//! `{ "digest": sha256-hex(token), "created_at_ms": i64 }`, store TTL set
//! to the broker TTL. Only the digest is stored; the token itself exists
//! only in the notification sent to the user.
//!
//! ## Invariants
//! - At most one live token per key: `issue` overwrites
//! - `consume` checks and deletes under one store operation
//! - The bypass code is only configured outside production

use std::sync::Arc;
use std::time::Duration;

use platform::cache::{CacheError, KeyValueStore};
use platform::clock::Clock;
use platform::crypto::{constant_time_eq, random_digits, random_hex, sha256_hex};
use serde::{Deserialize, Serialize};

use crate::domain::value_object::guard::Guard;

/// Lowest verification code (6 digits)
pub const VERIFICATION_CODE_MIN: u32 = 100_000;
/// Highest verification code
pub const VERIFICATION_CODE_MAX: u32 = 999_999;
/// Random bytes in a reset token (64 hex characters)
pub const RESET_TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// 6-digit email confirmation code
    VerificationCode,
    /// Opaque password reset token
    ResetToken,
}

impl TokenKind {
    pub fn namespace(&self) -> &'static str {
        match self {
            TokenKind::VerificationCode => "email_verification",
            TokenKind::ResetToken => "password_reset",
        }
    }

    fn generate(&self) -> String {
        match self {
            TokenKind::VerificationCode => {
                random_digits(VERIFICATION_CODE_MIN, VERIFICATION_CODE_MAX)
            }
            TokenKind::ResetToken => random_hex(RESET_TOKEN_BYTES),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenRecord {
    digest: String,
    created_at_ms: i64,
}

impl TokenRecord {
    fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    fn is_live(&self, now_ms: i64, ttl_ms: i64) -> bool {
        self.created_at_ms + ttl_ms > now_ms
    }

    fn matches(&self, supplied_digest: &str) -> bool {
        constant_time_eq(self.digest.as_bytes(), supplied_digest.as_bytes())
    }
}

pub struct TokenBroker<K> {
    kind: TokenKind,
    store: Arc<K>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    bypass: Option<String>,
}

impl<K> Clone for TokenBroker<K> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            store: self.store.clone(),
            clock: self.clock.clone(),
            ttl: self.ttl,
            bypass: self.bypass.clone(),
        }
    }
}

impl<K> std::fmt::Debug for TokenBroker<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenBroker")
            .field("kind", &self.kind)
            .field("ttl", &self.ttl)
            .field("bypass", &self.bypass.is_some())
            .finish_non_exhaustive()
    }
}

impl<K: KeyValueStore + Sync> TokenBroker<K> {
    pub fn new(kind: TokenKind, store: Arc<K>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            kind,
            store,
            clock,
            ttl,
            bypass: None,
        }
    }

    /// Accept `bypass` in `verify`/`consume` without prior issuance
    ///
    /// Pass `AuthConfig::verification_bypass()`, which is `None` in
    /// production.
    pub fn with_bypass(mut self, bypass: Option<&str>) -> Self {
        self.bypass = bypass.map(str::to_string);
        self
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn key(&self, guard: &Guard, scope: &str) -> String {
        format!("{}:{}:{}", self.kind.namespace(), guard, scope)
    }

    fn ttl_ms(&self) -> i64 {
        self.ttl.as_millis() as i64
    }

    fn is_bypass(&self, supplied: &str) -> bool {
        self.bypass
            .as_deref()
            .is_some_and(|bypass| constant_time_eq(bypass.as_bytes(), supplied.as_bytes()))
    }

    /// Issue a fresh token, superseding any live one
    ///
    /// ## Returns
    /// The plain token, to be delivered to the user
    pub async fn issue(&self, guard: &Guard, scope: &str) -> Result<String, CacheError> {
        let token = self.kind.generate();
        let record = TokenRecord {
            digest: sha256_hex(token.as_bytes()),
            created_at_ms: self.clock.now_ms(),
        };

        self.store
            .put(
                &self.key(guard, scope),
                serde_json::to_string(&record)?,
                Some(self.ttl),
            )
            .await?;

        tracing::debug!(broker = self.kind.namespace(), guard = %guard, "Token issued");
        Ok(token)
    }

    /// Check `supplied` without consuming it
    pub async fn verify(
        &self,
        guard: &Guard,
        scope: &str,
        supplied: &str,
    ) -> Result<bool, CacheError> {
        if self.is_bypass(supplied) {
            return Ok(true);
        }

        let Some(raw) = self.store.get(&self.key(guard, scope)).await? else {
            return Ok(false);
        };

        let now_ms = self.clock.now_ms();
        let supplied_digest = sha256_hex(supplied.as_bytes());
        Ok(TokenRecord::parse(&raw)
            .is_some_and(|r| r.is_live(now_ms, self.ttl_ms()) && r.matches(&supplied_digest)))
    }

    /// Check `supplied` and delete the record when it matches
    ///
    /// Only one of any number of concurrent callers can succeed.
    pub async fn consume(
        &self,
        guard: &Guard,
        scope: &str,
        supplied: &str,
    ) -> Result<bool, CacheError> {
        let key = self.key(guard, scope);

        if self.is_bypass(supplied) {
            self.store.forget(&key).await?;
            tracing::warn!(broker = self.kind.namespace(), guard = %guard, "Bypass code accepted");
            return Ok(true);
        }

        let now_ms = self.clock.now_ms();
        let ttl_ms = self.ttl_ms();
        let supplied_digest = sha256_hex(supplied.as_bytes());

        let consumed = self
            .store
            .take_if(&key, move |raw| {
                TokenRecord::parse(raw)
                    .is_some_and(|r| r.is_live(now_ms, ttl_ms) && r.matches(&supplied_digest))
            })
            .await?;

        if consumed {
            tracing::debug!(broker = self.kind.namespace(), guard = %guard, "Token consumed");
        }
        Ok(consumed)
    }

    /// Delete the live token, if any
    pub async fn revoke(&self, guard: &Guard, scope: &str) -> Result<bool, CacheError> {
        self.store.forget(&self.key(guard, scope)).await
    }

    /// Whether a live token was issued less than `within` ago
    pub async fn recently_issued(
        &self,
        guard: &Guard,
        scope: &str,
        within: Duration,
    ) -> Result<bool, CacheError> {
        let Some(raw) = self.store.get(&self.key(guard, scope)).await? else {
            return Ok(false);
        };

        let now_ms = self.clock.now_ms();
        Ok(TokenRecord::parse(&raw)
            .is_some_and(|r| r.created_at_ms + within.as_millis() as i64 > now_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::cache::MemoryCache;
    use platform::clock::ManualClock;

    fn broker(kind: TokenKind) -> (TokenBroker<MemoryCache>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let store = Arc::new(MemoryCache::new(clock.clone()));
        (
            TokenBroker::new(kind, store, clock.clone(), Duration::from_secs(3600)),
            clock,
        )
    }

    #[test]
    fn test_key_format() {
        let (broker, _) = broker(TokenKind::ResetToken);
        assert_eq!(
            broker.key(&Guard::users(), "a@b.c"),
            "password_reset:users:a@b.c"
        );
    }

    #[tokio::test]
    async fn test_code_shape() {
        let (broker, _) = broker(TokenKind::VerificationCode);
        let code = broker.issue(&Guard::users(), "a@b.c").await.unwrap();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));

        let (broker, _) = broker_reset();
        let token = broker.issue(&Guard::users(), "a@b.c").await.unwrap();
        assert_eq!(token.len(), 64);
    }

    fn broker_reset() -> (TokenBroker<MemoryCache>, Arc<ManualClock>) {
        broker(TokenKind::ResetToken)
    }

    #[tokio::test]
    async fn test_consume_succeeds_exactly_once() {
        let (broker, _) = broker_reset();
        let guard = Guard::users();
        let token = broker.issue(&guard, "a@b.c").await.unwrap();

        assert!(broker.verify(&guard, "a@b.c", &token).await.unwrap());
        assert!(broker.consume(&guard, "a@b.c", &token).await.unwrap());
        assert!(!broker.consume(&guard, "a@b.c", &token).await.unwrap());
        assert!(!broker.verify(&guard, "a@b.c", &token).await.unwrap());
    }

    #[tokio::test]
    async fn test_wrong_value_fails_and_keeps_token() {
        let (broker, _) = broker_reset();
        let guard = Guard::users();
        let token = broker.issue(&guard, "a@b.c").await.unwrap();

        assert!(!broker.consume(&guard, "a@b.c", "wrong").await.unwrap());
        assert!(broker.consume(&guard, "a@b.c", &token).await.unwrap());
    }

    #[tokio::test]
    async fn test_reissue_supersedes() {
        let (broker, _) = broker(TokenKind::VerificationCode);
        let guard = Guard::users();
        let first = broker.issue(&guard, "a@b.c").await.unwrap();
        let mut second = broker.issue(&guard, "a@b.c").await.unwrap();
        while second == first {
            second = broker.issue(&guard, "a@b.c").await.unwrap();
        }

        assert!(!broker.verify(&guard, "a@b.c", &first).await.unwrap());
        assert!(broker.verify(&guard, "a@b.c", &second).await.unwrap());
    }

    #[tokio::test]
    async fn test_scopes_and_guards_are_isolated() {
        let (broker, _) = broker_reset();
        let token = broker.issue(&Guard::users(), "a@b.c").await.unwrap();

        assert!(!broker.verify(&Guard::users(), "x@b.c", &token).await.unwrap());
        assert!(!broker.verify(&Guard::new("admins"), "a@b.c", &token).await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_token_fails() {
        let (broker, clock) = broker(TokenKind::VerificationCode);
        let guard = Guard::users();
        let code = broker.issue(&guard, "a@b.c").await.unwrap();

        clock.advance(Duration::from_secs(3600));
        assert!(!broker.verify(&guard, "a@b.c", &code).await.unwrap());
        assert!(!broker.consume(&guard, "a@b.c", &code).await.unwrap());
    }

    #[tokio::test]
    async fn test_bypass_only_when_configured() {
        let (plain, _) = broker(TokenKind::VerificationCode);
        let guard = Guard::users();
        assert!(!plain.verify(&guard, "a@b.c", "111111").await.unwrap());

        let bypassing = plain.clone().with_bypass(Some("111111"));
        assert!(bypassing.verify(&guard, "a@b.c", "111111").await.unwrap());
        assert!(bypassing.consume(&guard, "a@b.c", "111111").await.unwrap());
        assert!(!bypassing.verify(&guard, "a@b.c", "111112").await.unwrap());

        let production = plain.with_bypass(None);
        assert!(!production.consume(&guard, "a@b.c", "111111").await.unwrap());
    }

    #[tokio::test]
    async fn test_revoke() {
        let (broker, _) = broker_reset();
        let guard = Guard::users();
        let token = broker.issue(&guard, "a@b.c").await.unwrap();

        assert!(broker.revoke(&guard, "a@b.c").await.unwrap());
        assert!(!broker.revoke(&guard, "a@b.c").await.unwrap());
        assert!(!broker.consume(&guard, "a@b.c", &token).await.unwrap());
    }

    #[tokio::test]
    async fn test_recently_issued() {
        let (broker, clock) = broker_reset();
        let guard = Guard::users();
        let within = Duration::from_secs(60);

        assert!(!broker.recently_issued(&guard, "a@b.c", within).await.unwrap());
        broker.issue(&guard, "a@b.c").await.unwrap();
        assert!(broker.recently_issued(&guard, "a@b.c", within).await.unwrap());

        clock.advance(within);
        assert!(!broker.recently_issued(&guard, "a@b.c", within).await.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_consume_single_winner() {
        let (broker, _) = broker_reset();
        let guard = Guard::users();
        let token = broker.issue(&guard, "a@b.c").await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let broker = broker.clone();
            let token = token.clone();
            handles.push(tokio::spawn(async move {
                broker.consume(&Guard::users(), "a@b.c", &token).await.unwrap()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
