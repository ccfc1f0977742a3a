//! Auth Session Entity
//!
//! A server-side login of one principal on one device.

use chrono::{DateTime, Duration, Utc};
use kernel::id::{PrincipalId, SessionId};
use platform::signature::ClientInfo;

use crate::domain::value_object::guard::Guard;

/// Auth session entity
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// Session ID (UUID v4)
    pub session_id: SessionId,
    pub principal_id: PrincipalId,
    pub guard: Guard,
    /// Session expiration (Unix timestamp ms)
    pub expires_at_ms: i64,
    /// Whether "Remember Me" was checked
    pub remember: bool,
    /// Client IP (optional, for logging)
    pub client_ip: Option<String>,
    /// User agent string (for session management display)
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl AuthSession {
    /// Create a new auth session
    ///
    /// TTL is provided by the application layer (config), not hard-coded here.
    pub fn new(
        principal_id: PrincipalId,
        guard: Guard,
        remember: bool,
        client: &ClientInfo,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id: SessionId::new(),
            principal_id,
            guard,
            expires_at_ms: (now + ttl).timestamp_millis(),
            remember,
            client_ip: client.ip.map(|ip| ip.to_string()),
            user_agent: client.user_agent.clone(),
            created_at: now,
            last_activity_at: now,
        }
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms > self.expires_at_ms
    }

    /// Same login under a fresh id (session fixation defense)
    pub fn regenerate(&self, ttl: Duration, now: DateTime<Utc>) -> Self {
        Self {
            session_id: SessionId::new(),
            expires_at_ms: (now + ttl).timestamp_millis(),
            last_activity_at: now,
            ..self.clone()
        }
    }
}
