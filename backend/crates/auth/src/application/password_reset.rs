//! Password Reset Use Case
//!
//! Sets a new password from a single-use reset token. Success cycles the
//! remember token and ends every session of the principal.

use std::sync::Arc;

use kernel::error::{field::FieldErrors, kind::ErrorKind};
use serde::Serialize;

use crate::application::pipeline::{self, AuthContext, check_rules, parse_field};
use crate::application::rules;
use crate::application::services::{AuthCache, AuthServices};
use crate::domain::entity::principal::Principal;
use crate::domain::event::AuthEvent;
use crate::domain::repository::AuthRepository;
use crate::domain::value_object::{
    email::Email,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

/// Message for an unknown address or a wrong, used or expired token
pub const INVALID_TOKEN: &str = "passwords.token";

#[derive(Default, Serialize)]
pub struct PasswordResetInput {
    pub token: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

#[derive(Debug)]
pub struct PasswordResetOutput {
    pub principal: Principal,
}

pub struct PasswordResetUseCase<R, C> {
    services: Arc<AuthServices<R, C>>,
}

impl<R: AuthRepository, C: AuthCache> PasswordResetUseCase<R, C> {
    pub fn new(services: Arc<AuthServices<R, C>>) -> Self {
        Self { services }
    }

    pub async fn execute(
        &self,
        ctx: &AuthContext,
        input: PasswordResetInput,
    ) -> AuthResult<PasswordResetOutput> {
        let s = &self.services;
        s.require_guest(ctx)?;

        // Throttle
        let scope = Email::new(&input.email)
            .map(|e| e.as_str().to_string())
            .unwrap_or_else(|_| input.email.clone());
        let limit = s.config.throttle.password_reset.by(
            s.signature("password_reset", ctx, None)
                .data("email", scope)
                .hash(),
        );
        let ticket = s
            .throttle(&[limit], &["email"], ErrorKind::UnprocessableEntity)
            .await?;

        // Validate
        let mut errors: FieldErrors =
            check_rules(&rules::password_reset(&s.config), &pipeline::payload(&input)?);
        let email = parse_field(&mut errors, "email", Email::new(&input.email));
        let password = parse_field(&mut errors, "password", RawPassword::new(input.password));
        let ticket = s.settle_input(ticket, errors).await?;
        let (Some(email), Some(password)) = (email, password) else {
            return Err(AuthError::Internal("reset input passed with missing values".into()));
        };

        // Token
        let Some(principal) = s.repo.find_principal_by_email(&ctx.guard, &email).await? else {
            ticket.hit();
            return Err(AuthError::field("email", INVALID_TOKEN));
        };
        let _lock = s.locks.lock(principal.id).await;
        if !s
            .resets
            .consume(&ctx.guard, email.as_str(), &input.token)
            .await?
        {
            ticket.hit();
            tracing::warn!(principal_id = %principal.id, "Password reset with invalid token");
            return Err(AuthError::field("email", INVALID_TOKEN));
        }

        // Mutate (re-read under the lock)
        let original = s
            .repo
            .find_principal(&ctx.guard, principal.id)
            .await?
            .ok_or_else(|| AuthError::field("email", INVALID_TOKEN))?;
        let mut updated = original.clone();
        updated.set_password(UserPassword::hash(&password, s.hasher())?, s.now());
        let principal = s.save_principal(&original, updated, None).await?;
        ticket.clear().await?;

        s.events.fire(AuthEvent::PasswordReset {
            guard: ctx.guard.clone(),
            principal_id: principal.id,
        });

        tracing::info!(principal_id = %principal.id, "Password reset");
        Ok(PasswordResetOutput { principal })
    }
}
