//! In-memory implementations
//!
//! Process-local repository, event recorder and notification outbox. Used
//! by tests and by embedders that keep no database.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use kernel::id::{PrincipalId, SessionId};

use crate::domain::entity::{auth_session::AuthSession, principal::Principal};
use crate::domain::event::{AuthEvent, EventDispatcher};
use crate::domain::notification::{Notification, Notifier, Recipient};
use crate::domain::repository::{PrincipalRepository, SessionRepository};
use crate::domain::value_object::{email::Email, guard::Guard};
use crate::error::{AuthError, AuthResult};

fn lock<T>(mutex: &Mutex<T>) -> AuthResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| AuthError::Internal("memory store lock poisoned".into()))
}

// ============================================================================
// Repository
// ============================================================================

#[derive(Debug, Default)]
struct Tables {
    principals: HashMap<PrincipalId, Principal>,
    sessions: HashMap<SessionId, AuthSession>,
}

impl Tables {
    fn email_taken(&self, guard: &Guard, email: &Email, except: PrincipalId) -> bool {
        self.principals.values().any(|p| {
            p.id != except && &p.guard == guard && p.email.as_ref() == Some(email)
        })
    }
}

/// Repository over two hash maps behind one mutex
///
/// Enforces the same `(guard, email)` uniqueness as the database schema.
#[derive(Debug, Default)]
pub struct MemoryAuthRepository {
    tables: Mutex<Tables>,
}

impl MemoryAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn principal_count(&self) -> usize {
        self.tables.lock().map(|t| t.principals.len()).unwrap_or_default()
    }

    pub fn session_count(&self) -> usize {
        self.tables.lock().map(|t| t.sessions.len()).unwrap_or_default()
    }
}

impl PrincipalRepository for MemoryAuthRepository {
    async fn insert_principal(&self, principal: &Principal) -> AuthResult<()> {
        let mut tables = lock(&self.tables)?;
        if let Some(email) = &principal.email {
            if tables.email_taken(&principal.guard, email, principal.id) {
                return Err(AuthError::field("email", "validation.unique"));
            }
        }
        tables.principals.insert(principal.id, principal.clone());
        Ok(())
    }

    async fn find_principal(&self, guard: &Guard, id: PrincipalId) -> AuthResult<Option<Principal>> {
        let tables = lock(&self.tables)?;
        Ok(tables
            .principals
            .get(&id)
            .filter(|p| &p.guard == guard)
            .cloned())
    }

    async fn find_principal_by_email(
        &self,
        guard: &Guard,
        email: &Email,
    ) -> AuthResult<Option<Principal>> {
        let tables = lock(&self.tables)?;
        Ok(tables
            .principals
            .values()
            .find(|p| &p.guard == guard && p.email.as_ref() == Some(email))
            .cloned())
    }

    async fn update_principal(&self, principal: &Principal) -> AuthResult<()> {
        let mut tables = lock(&self.tables)?;
        if let Some(email) = &principal.email {
            if tables.email_taken(&principal.guard, email, principal.id) {
                return Err(AuthError::field("email", "validation.unique"));
            }
        }
        match tables.principals.get_mut(&principal.id) {
            Some(slot) => {
                *slot = principal.clone();
                Ok(())
            }
            None => Err(AuthError::Internal(format!(
                "principal {} does not exist",
                principal.id
            ))),
        }
    }

    async fn delete_principal(&self, guard: &Guard, id: PrincipalId) -> AuthResult<bool> {
        let mut tables = lock(&self.tables)?;
        let owned = tables.principals.get(&id).is_some_and(|p| &p.guard == guard);
        Ok(owned && tables.principals.remove(&id).is_some())
    }
}

impl SessionRepository for MemoryAuthRepository {
    async fn insert_session(&self, session: &AuthSession) -> AuthResult<()> {
        lock(&self.tables)?
            .sessions
            .insert(session.session_id, session.clone());
        Ok(())
    }

    async fn find_session(&self, session_id: SessionId) -> AuthResult<Option<AuthSession>> {
        Ok(lock(&self.tables)?.sessions.get(&session_id).cloned())
    }

    async fn sessions_of(&self, principal_id: PrincipalId) -> AuthResult<Vec<AuthSession>> {
        let tables = lock(&self.tables)?;
        let mut sessions: Vec<AuthSession> = tables
            .sessions
            .values()
            .filter(|s| s.principal_id == principal_id)
            .cloned()
            .collect();
        sessions.sort_by_key(|s| s.created_at);
        Ok(sessions)
    }

    async fn delete_session(&self, session_id: SessionId) -> AuthResult<()> {
        lock(&self.tables)?.sessions.remove(&session_id);
        Ok(())
    }

    async fn delete_sessions_of(
        &self,
        principal_id: PrincipalId,
        except: Option<SessionId>,
    ) -> AuthResult<u64> {
        let mut tables = lock(&self.tables)?;
        let before = tables.sessions.len();
        tables
            .sessions
            .retain(|id, s| s.principal_id != principal_id || Some(*id) == except);
        Ok((before - tables.sessions.len()) as u64)
    }

    async fn cleanup_expired_sessions(&self, now_ms: i64) -> AuthResult<u64> {
        let mut tables = lock(&self.tables)?;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, s| !s.is_expired(now_ms));
        let deleted = (before - tables.sessions.len()) as u64;
        tracing::debug!(sessions_deleted = deleted, "Cleaned up expired sessions");
        Ok(deleted)
    }
}

// ============================================================================
// Event recorder
// ============================================================================

/// Keeps every fired event, in order
#[derive(Debug, Default)]
pub struct RecordingEventDispatcher {
    events: Mutex<Vec<AuthEvent>>,
}

impl RecordingEventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuthEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Names of the fired events, in order
    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(AuthEvent::name).collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.names().into_iter().filter(|n| *n == name).count()
    }
}

impl EventDispatcher for RecordingEventDispatcher {
    fn fire(&self, event: AuthEvent) {
        tracing::debug!(event = event.name(), "Auth event recorded");
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

// ============================================================================
// Notification outbox
// ============================================================================

/// Keeps every sent notification until purged
#[derive(Debug, Default)]
pub struct MemoryOutbox {
    sent: Mutex<Vec<(Recipient, Notification)>>,
}

impl MemoryOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(Recipient, Notification)> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Notifications addressed to `email`, oldest first
    pub fn sent_to(&self, email: &str) -> Vec<Notification> {
        self.sent()
            .into_iter()
            .filter(|(r, _)| r.email.as_str() == email)
            .map(|(_, n)| n)
            .collect()
    }

    /// Most recent notification of `kind` addressed to `email`
    pub fn last_to(&self, email: &str, kind: &str) -> Option<Notification> {
        self.sent_to(email).into_iter().rev().find(|n| n.kind() == kind)
    }
}

impl Notifier for MemoryOutbox {
    fn send(&self, recipient: Recipient, notification: Notification) {
        tracing::debug!(kind = notification.kind(), "Notification queued");
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((recipient, notification));
        }
    }

    fn purge(&self, principal_id: PrincipalId) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.retain(|(r, _)| r.principal_id != Some(principal_id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use platform::signature::ClientInfo;

    use crate::domain::value_object::name::Name;

    fn principal(email: &str) -> Principal {
        Principal::new(
            Guard::users(),
            Name::new("Jane").unwrap(),
            Some(Email::new(email).unwrap()),
            None,
            Utc::now(),
        )
    }

    fn session(principal_id: PrincipalId) -> AuthSession {
        AuthSession::new(
            principal_id,
            Guard::users(),
            false,
            &ClientInfo::default(),
            chrono::Duration::hours(1),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_email_unique_per_guard() {
        let repo = MemoryAuthRepository::new();
        repo.insert_principal(&principal("a@example.com")).await.unwrap();

        let err = repo
            .insert_principal(&principal("A@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::ValidationFailed(_)));

        let mut admin = principal("a@example.com");
        admin.guard = Guard::new("admins");
        repo.insert_principal(&admin).await.unwrap();
        assert_eq!(repo.principal_count(), 2);
    }

    #[tokio::test]
    async fn test_find_respects_guard() {
        let repo = MemoryAuthRepository::new();
        let p = principal("a@example.com");
        repo.insert_principal(&p).await.unwrap();

        assert!(repo.find_principal(&Guard::users(), p.id).await.unwrap().is_some());
        assert!(repo.find_principal(&Guard::new("admins"), p.id).await.unwrap().is_none());
        assert!(!repo.delete_principal(&Guard::new("admins"), p.id).await.unwrap());
        assert!(repo.delete_principal(&Guard::users(), p.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_sessions_keeps_current() {
        let repo = MemoryAuthRepository::new();
        let id = PrincipalId::new();
        let current = session(id);
        repo.insert_session(&current).await.unwrap();
        repo.insert_session(&session(id)).await.unwrap();
        repo.insert_session(&session(id)).await.unwrap();
        repo.insert_session(&session(PrincipalId::new())).await.unwrap();

        let deleted = repo
            .delete_sessions_of(id, Some(current.session_id))
            .await
            .unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(repo.sessions_of(id).await.unwrap().len(), 1);
        assert_eq!(repo.session_count(), 2);

        assert_eq!(repo.delete_sessions_of(id, None).await.unwrap(), 1);
    }

    #[test]
    fn test_outbox_purge() {
        let outbox = MemoryOutbox::new();
        let id = PrincipalId::new();
        let email = Email::new("a@example.com").unwrap();
        outbox.send(
            Recipient::principal(id, email.clone()),
            Notification::PasswordReset { token: "t".into() },
        );
        outbox.send(
            Recipient::address(email),
            Notification::EmailConfirmationCode { code: "123456".into() },
        );

        outbox.purge(id);
        assert_eq!(outbox.sent().len(), 1);
        assert!(outbox.last_to("a@example.com", "email_confirmation_code").is_some());
    }
}
