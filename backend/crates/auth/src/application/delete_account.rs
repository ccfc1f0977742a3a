//! Delete Account Use Case
//!
//! Removes the authenticated principal after a password check. Tokens,
//! notifications and sessions go with it.

use std::sync::Arc;

use kernel::error::kind::ErrorKind;
use serde::Serialize;

use crate::application::pipeline::{self, AuthContext, check_rules};
use crate::application::rules;
use crate::application::service::SuppliedSecret;
use crate::application::services::{AuthCache, AuthServices};
use crate::domain::event::AuthEvent;
use crate::domain::repository::AuthRepository;
use crate::error::{AuthError, AuthResult};

#[derive(Default, Serialize)]
pub struct DeleteAccountInput {
    pub password: Option<String>,
}

pub struct DeleteAccountUseCase<R, C> {
    services: Arc<AuthServices<R, C>>,
}

impl<R: AuthRepository, C: AuthCache> DeleteAccountUseCase<R, C> {
    pub fn new(services: Arc<AuthServices<R, C>>) -> Self {
        Self { services }
    }

    pub async fn execute(&self, ctx: &AuthContext, input: DeleteAccountInput) -> AuthResult<()> {
        let s = &self.services;
        let principal_id = ctx.principal_id.ok_or(AuthError::Unauthenticated)?;
        let _lock = s.locks.lock(principal_id).await;
        let me = s.resolve_me(ctx).await?;

        // Throttle (shares the password-check bucket)
        let limit = s
            .config
            .throttle
            .password
            .by(s.signature("password", ctx, Some(&me)).hash());
        let ticket = s
            .throttle_credentials(&ctx.guard, &[limit], &["password"], ErrorKind::UnprocessableEntity)
            .await?;

        // Validate: a principal with a password must present it
        let mut errors = check_rules(&rules::password_check(), &pipeline::payload(&input)?);
        let secret = SuppliedSecret::from_input(input.password.as_deref());
        if me.has_password() && secret.is_absent() && errors.is_empty() {
            errors.push(kernel::error::field::FieldError::new("password", "validation.required"));
        }
        let ticket = s.settle_input(ticket, errors).await?;

        if !s.credentials.validate(&me, &secret) {
            return Err(s.reject_secret(ticket, Some(&me), &ctx.guard, "password", "auth.password"));
        }
        s.events.fire(AuthEvent::Validated {
            guard: ctx.guard.clone(),
            principal_id: me.id,
        });

        // Mutate
        s.remove_principal(&me).await?;
        ticket.clear().await?;

        s.events.fire(AuthEvent::AccountDeleted {
            guard: ctx.guard.clone(),
            principal_id: me.id,
        });
        Ok(())
    }
}
