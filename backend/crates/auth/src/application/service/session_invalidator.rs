//! Session Invalidator
//!
//! Ends the sessions of a principal on every device but the current one.

use std::sync::Arc;

use kernel::id::{PrincipalId, SessionId};

use crate::domain::repository::SessionRepository;
use crate::error::AuthResult;

pub struct SessionInvalidator<R> {
    repo: Arc<R>,
}

impl<R> Clone for SessionInvalidator<R> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
        }
    }
}

impl<R: SessionRepository + Sync> SessionInvalidator<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Delete every session of `principal_id` except `current`
    ///
    /// With `current` set to `None` every session ends.
    ///
    /// ## Returns
    /// Number of sessions deleted
    pub async fn logout_other_devices(
        &self,
        principal_id: PrincipalId,
        current: Option<SessionId>,
    ) -> AuthResult<u64> {
        let deleted = self.repo.delete_sessions_of(principal_id, current).await?;

        tracing::info!(
            principal_id = %principal_id,
            deleted,
            kept_current = current.is_some(),
            "Sessions invalidated"
        );

        Ok(deleted)
    }
}
