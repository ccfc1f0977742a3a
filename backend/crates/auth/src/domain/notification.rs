//! Notifications
//!
//! Content rendering and delivery happen outside this crate; the workflows
//! only hand a [`Notification`] to a [`Notifier`].

use kernel::id::PrincipalId;

use crate::domain::value_object::email::Email;

/// Where a notification goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    /// Set when the address belongs to a known principal
    pub principal_id: Option<PrincipalId>,
    pub email: Email,
}

impl Recipient {
    pub fn principal(principal_id: PrincipalId, email: Email) -> Self {
        Self {
            principal_id: Some(principal_id),
            email,
        }
    }

    /// An address not (yet) tied to a principal
    pub fn address(email: Email) -> Self {
        Self {
            principal_id: None,
            email,
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum Notification {
    /// Signed email verification link
    VerifyEmail { url: String },

    /// 6-digit email confirmation code
    EmailConfirmationCode { code: String },

    /// Password reset token
    PasswordReset { token: String },

    /// Reset token sent to a principal that never set a password
    PasswordInit { token: String },
}

impl Notification {
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::VerifyEmail { .. } => "verify_email",
            Notification::EmailConfirmationCode { .. } => "email_confirmation_code",
            Notification::PasswordReset { .. } => "password_reset",
            Notification::PasswordInit { .. } => "password_init",
        }
    }
}

impl std::fmt::Debug for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Payloads are credentials
        f.debug_struct("Notification")
            .field("kind", &self.kind())
            .finish_non_exhaustive()
    }
}

/// Notification dispatcher
pub trait Notifier: Send + Sync {
    fn send(&self, recipient: Recipient, notification: Notification);

    /// Drop every stored notification of a principal
    fn purge(&self, principal_id: PrincipalId);
}
