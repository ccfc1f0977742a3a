//! Domain Events
//!
//! Fired by the workflows after the corresponding write has committed.
//! `Failed` and `Lockout` are the only events raised on failure paths.

use kernel::id::PrincipalId;

use crate::domain::value_object::{email::Email, guard::Guard};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// A new principal registered
    Registered { guard: Guard, principal_id: PrincipalId },

    /// A session was started
    Login {
        guard: Guard,
        principal_id: PrincipalId,
        remember: bool,
    },

    /// A presented password was checked and accepted
    Validated { guard: Guard, principal_id: PrincipalId },

    /// A presented password did not match
    Failed {
        guard: Guard,
        principal_id: Option<PrincipalId>,
    },

    /// A throttle tripped on a credential check
    Lockout { guard: Guard },

    /// Every other session of the principal was ended
    OtherDeviceLogout { guard: Guard, principal_id: PrincipalId },

    /// A password was set through a reset token
    PasswordReset { guard: Guard, principal_id: PrincipalId },

    /// The principal's email was verified through a signed link
    Verified { guard: Guard, principal_id: PrincipalId },

    /// An address was confirmed through a code
    EmailConfirmed { guard: Guard, email: Email },

    /// The principal deleted their account
    AccountDeleted { guard: Guard, principal_id: PrincipalId },
}

impl AuthEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AuthEvent::Registered { .. } => "registered",
            AuthEvent::Login { .. } => "login",
            AuthEvent::Validated { .. } => "validated",
            AuthEvent::Failed { .. } => "failed",
            AuthEvent::Lockout { .. } => "lockout",
            AuthEvent::OtherDeviceLogout { .. } => "other_device_logout",
            AuthEvent::PasswordReset { .. } => "password_reset",
            AuthEvent::Verified { .. } => "verified",
            AuthEvent::EmailConfirmed { .. } => "email_confirmed",
            AuthEvent::AccountDeleted { .. } => "account_deleted",
        }
    }
}

/// Event sink
pub trait EventDispatcher: Send + Sync {
    fn fire(&self, event: AuthEvent);
}

/// Dispatcher that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventDispatcher;

impl EventDispatcher for TracingEventDispatcher {
    fn fire(&self, event: AuthEvent) {
        tracing::info!(event = event.name(), ?event, "Auth event");
    }
}
