//! Email Confirmation Use Cases
//!
//! Ownership proof through a 6-digit code sent to an address. Works for
//! guests and authenticated callers alike; nothing is persisted on the
//! principal.

use std::sync::Arc;

use kernel::error::{field::FieldErrors, kind::ErrorKind};
use serde::Serialize;

use crate::application::pipeline::{self, AuthContext, check_rules, parse_field};
use crate::application::rules;
use crate::application::services::{AuthCache, AuthServices};
use crate::domain::event::AuthEvent;
use crate::domain::notification::{Notification, Recipient};
use crate::domain::repository::AuthRepository;
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

/// Message for a wrong, used or expired code
pub const INVALID_CODE: &str = "validation.email_confirmation";

/// Normalized address when it parses, the raw input otherwise
fn throttle_scope(raw: &str) -> String {
    Email::new(raw)
        .map(|e| e.as_str().to_string())
        .unwrap_or_else(|_| raw.to_string())
}

// ============================================================================
// Send
// ============================================================================

#[derive(Default, Serialize)]
pub struct SendEmailConfirmationInput {
    pub email: String,
}

pub struct SendEmailConfirmationUseCase<R, C> {
    services: Arc<AuthServices<R, C>>,
}

impl<R: AuthRepository, C: AuthCache> SendEmailConfirmationUseCase<R, C> {
    pub fn new(services: Arc<AuthServices<R, C>>) -> Self {
        Self { services }
    }

    pub async fn execute(&self, ctx: &AuthContext, input: SendEmailConfirmationInput) -> AuthResult<()> {
        let s = &self.services;

        // Throttle
        let limit = s.config.throttle.email_confirmation.by(
            s.signature("email_confirmation", ctx, None)
                .data("email", throttle_scope(&input.email))
                .hash(),
        );
        let ticket = s
            .throttle(&[limit], &["email"], ErrorKind::UnprocessableEntity)
            .await?;

        // Validate
        let mut errors: FieldErrors =
            check_rules(&rules::email_confirmation(&s.config), &pipeline::payload(&input)?);
        let email = parse_field(&mut errors, "email", Email::new(&input.email));
        let ticket = s.settle_input(ticket, errors).await?;
        let email = email.ok_or_else(|| AuthError::Internal("email passed validation unset".into()))?;

        ticket.hit();
        let code = s.codes.issue(&ctx.guard, email.as_str()).await?;
        let recipient = match ctx.principal_id {
            Some(id) => Recipient::principal(id, email),
            None => Recipient::address(email),
        };
        s.notifier
            .send(recipient, Notification::EmailConfirmationCode { code });

        tracing::info!(guard = %ctx.guard, "Email confirmation code sent");
        Ok(())
    }
}

// ============================================================================
// Confirm
// ============================================================================

#[derive(Default, Serialize)]
pub struct ConfirmEmailInput {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmEmailOutput {
    pub email: Email,
}

pub struct ConfirmEmailUseCase<R, C> {
    services: Arc<AuthServices<R, C>>,
}

impl<R: AuthRepository, C: AuthCache> ConfirmEmailUseCase<R, C> {
    pub fn new(services: Arc<AuthServices<R, C>>) -> Self {
        Self { services }
    }

    pub async fn execute(&self, ctx: &AuthContext, input: ConfirmEmailInput) -> AuthResult<ConfirmEmailOutput> {
        let s = &self.services;

        // Throttle
        let limit = s.config.throttle.email_confirmation_confirm.by(
            s.signature("email_confirmation_confirm", ctx, None)
                .data("email", throttle_scope(&input.email))
                .hash(),
        );
        let ticket = s
            .throttle(&[limit], &["code"], ErrorKind::UnprocessableEntity)
            .await?;

        // Validate
        let mut errors: FieldErrors =
            check_rules(&rules::confirm_email(&s.config), &pipeline::payload(&input)?);
        let email = parse_field(&mut errors, "email", Email::new(&input.email));
        let ticket = s.settle_input(ticket, errors).await?;
        let email = email.ok_or_else(|| AuthError::Internal("email passed validation unset".into()))?;

        if !s.codes.consume(&ctx.guard, email.as_str(), &input.code).await? {
            ticket.hit();
            tracing::warn!(guard = %ctx.guard, "Email confirmation with invalid code");
            return Err(AuthError::field("code", INVALID_CODE));
        }
        ticket.clear().await?;

        s.events.fire(AuthEvent::EmailConfirmed {
            guard: ctx.guard.clone(),
            email: email.clone(),
        });
        Ok(ConfirmEmailOutput { email })
    }
}
