//! Repository Traits
//!
//! Interfaces for data persistence. Implementations are in the infra layer.
//! Method names are distinct across traits so one type can implement both.

use kernel::id::{PrincipalId, SessionId};

use crate::domain::entity::{auth_session::AuthSession, principal::Principal};
use crate::domain::value_object::{email::Email, guard::Guard};
use crate::error::AuthResult;

/// Principal repository trait
#[trait_variant::make(PrincipalRepository: Send)]
pub trait LocalPrincipalRepository {
    /// Insert a new principal
    ///
    /// Fails with a unique violation when `(guard, email)` is taken.
    async fn insert_principal(&self, principal: &Principal) -> AuthResult<()>;

    async fn find_principal(&self, guard: &Guard, id: PrincipalId) -> AuthResult<Option<Principal>>;

    /// Lookup by credentials (the email address)
    async fn find_principal_by_email(
        &self,
        guard: &Guard,
        email: &Email,
    ) -> AuthResult<Option<Principal>>;

    /// Persist every mutable attribute
    async fn update_principal(&self, principal: &Principal) -> AuthResult<()>;

    /// Returns whether a row was deleted
    async fn delete_principal(&self, guard: &Guard, id: PrincipalId) -> AuthResult<bool>;
}

/// Auth session repository trait
#[trait_variant::make(SessionRepository: Send)]
pub trait LocalSessionRepository {
    async fn insert_session(&self, session: &AuthSession) -> AuthResult<()>;

    async fn find_session(&self, session_id: SessionId) -> AuthResult<Option<AuthSession>>;

    /// All sessions of a principal, oldest first
    async fn sessions_of(&self, principal_id: PrincipalId) -> AuthResult<Vec<AuthSession>>;

    async fn delete_session(&self, session_id: SessionId) -> AuthResult<()>;

    /// Delete all sessions for a principal (except current)
    async fn delete_sessions_of(
        &self,
        principal_id: PrincipalId,
        except: Option<SessionId>,
    ) -> AuthResult<u64>;

    /// Clean up expired sessions
    async fn cleanup_expired_sessions(&self, now_ms: i64) -> AuthResult<u64>;
}

/// Everything the auth workflows persist
pub trait AuthRepository: PrincipalRepository + SessionRepository + Send + Sync + 'static {}

impl<T> AuthRepository for T where T: PrincipalRepository + SessionRepository + Send + Sync + 'static {}
