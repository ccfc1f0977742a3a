//! Principal Observer
//!
//! Every principal write of the workflows goes through here so the
//! secret- and email-change side effects cannot be skipped.
//!
//! Before the write:
//! - email changed: `email_verified_at` is cleared
//! - password changed: the remember token is cycled
//!
//! After the write commits (never rolled back):
//! - email changed: verification link, reset token of the old address
//!   revoked, password-init link when the principal has no password
//! - password changed: every other session ends

use kernel::id::SessionId;

use crate::application::services::{AuthCache, AuthServices};
use crate::domain::entity::principal::Principal;
use crate::domain::repository::AuthRepository;
use crate::error::AuthResult;

impl<R: AuthRepository, C: AuthCache> AuthServices<R, C> {
    /// Persist a new principal
    pub async fn create_principal(&self, principal: &Principal) -> AuthResult<()> {
        self.repo.insert_principal(principal).await?;

        tracing::info!(
            principal_id = %principal.id,
            guard = %principal.guard,
            "Principal created"
        );

        self.send_password_init(principal).await?;
        Ok(())
    }

    /// Persist changes of `updated` relative to `original`
    ///
    /// ## Arguments
    /// * `original` - the principal as read before the change
    /// * `updated` - the changed principal
    /// * `current_session` - session kept alive on a password change
    pub async fn save_principal(
        &self,
        original: &Principal,
        mut updated: Principal,
        current_session: Option<SessionId>,
    ) -> AuthResult<Principal> {
        let email_changed = updated.email_differs_from(original);
        let password_changed = updated.password_differs_from(original);

        if email_changed {
            updated.email_verified_at = None;
        }
        if password_changed {
            self.remember.cycle(&mut updated);
        }

        self.repo.update_principal(&updated).await?;

        if email_changed {
            tracing::info!(principal_id = %updated.id, "Principal email changed");
            self.send_verification_link(&updated);
            if let Some(old) = &original.email {
                self.resets.revoke(&original.guard, old.as_str()).await?;
            }
            self.send_password_init(&updated).await?;
        }

        if password_changed {
            tracing::info!(principal_id = %updated.id, "Principal password changed");
            self.sessions
                .logout_other_devices(updated.id, current_session)
                .await?;
        }

        Ok(updated)
    }

    /// Delete a principal and everything hanging off it
    ///
    /// ## Returns
    /// Whether the principal existed
    pub async fn remove_principal(&self, principal: &Principal) -> AuthResult<bool> {
        let deleted = self
            .repo
            .delete_principal(&principal.guard, principal.id)
            .await?;
        if !deleted {
            return Ok(false);
        }

        self.notifier.purge(principal.id);
        if let Some(email) = &principal.email {
            self.resets.revoke(&principal.guard, email.as_str()).await?;
        }
        self.sessions.logout_other_devices(principal.id, None).await?;

        tracing::info!(
            principal_id = %principal.id,
            guard = %principal.guard,
            "Principal deleted"
        );
        Ok(true)
    }
}
