//! Logout Other Devices Use Case
//!
//! Confirms the password, then ends every other session and rotates the
//! remember token so no other device stays logged in.

use std::sync::Arc;

use kernel::error::kind::ErrorKind;
use serde::Serialize;

use crate::application::pipeline::{self, AuthContext, check_rules};
use crate::application::rules;
use crate::application::service::SuppliedSecret;
use crate::application::services::{AuthCache, AuthServices};
use crate::domain::entity::{auth_session::AuthSession, principal::Principal};
use crate::domain::event::AuthEvent;
use crate::domain::repository::AuthRepository;
use crate::domain::value_object::user_password::UserPassword;
use crate::error::{AuthError, AuthResult};

#[derive(Default, Serialize)]
pub struct LogoutOtherDevicesInput {
    pub password: Option<String>,
}

#[derive(Debug)]
pub struct LogoutOtherDevicesOutput {
    pub principal: Principal,
    /// The caller's session under its new id
    pub session: AuthSession,
}

pub struct LogoutOtherDevicesUseCase<R, C> {
    services: Arc<AuthServices<R, C>>,
}

impl<R: AuthRepository, C: AuthCache> LogoutOtherDevicesUseCase<R, C> {
    pub fn new(services: Arc<AuthServices<R, C>>) -> Self {
        Self { services }
    }

    pub async fn execute(
        &self,
        ctx: &AuthContext,
        input: LogoutOtherDevicesInput,
    ) -> AuthResult<LogoutOtherDevicesOutput> {
        let s = &self.services;
        let principal_id = ctx.principal_id.ok_or(AuthError::Unauthenticated)?;
        let _lock = s.locks.lock(principal_id).await;
        let me = s.resolve_me(ctx).await?;

        // Throttle
        let limit = s
            .config
            .throttle
            .password
            .by(s.signature("password", ctx, Some(&me)).hash());
        let ticket = s
            .throttle_credentials(&ctx.guard, &[limit], &["password"], ErrorKind::UnprocessableEntity)
            .await?;

        // Validate
        let errors = check_rules(&rules::password_check(), &pipeline::payload(&input)?);
        let ticket = s.settle_input(ticket, errors).await?;

        let secret = SuppliedSecret::from_input(input.password.as_deref());
        if !s.credentials.validate(&me, &secret) {
            return Err(s.reject_secret(ticket, Some(&me), &ctx.guard, "password", "auth.password"));
        }
        s.events.fire(AuthEvent::Validated {
            guard: ctx.guard.clone(),
            principal_id: me.id,
        });
        ticket.clear().await?;

        // Mutate: a fresh hash of the same secret, and a fresh remember token
        let now = s.now();
        let mut updated = me.clone();
        let rehashed = match secret.as_clear_text() {
            Some(clear) => {
                updated.set_password(UserPassword::rehash(clear, s.hasher())?, now);
                true
            }
            None => {
                s.remember.cycle(&mut updated);
                false
            }
        };
        let principal = s.save_principal(&me, updated, ctx.session_id).await?;

        // Side effects; a new hash already ended the other sessions in
        // `save_principal`
        if !rehashed {
            s.sessions
                .logout_other_devices(principal.id, ctx.session_id)
                .await?;
        }
        s.events.fire(AuthEvent::OtherDeviceLogout {
            guard: ctx.guard.clone(),
            principal_id: principal.id,
        });
        let session = s.relogin(&principal, ctx.session_id, &ctx.client).await?;

        Ok(LogoutOtherDevicesOutput { principal, session })
    }
}
