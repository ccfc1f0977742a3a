//! Password Forgot Use Case
//!
//! Sends a reset token to the address. The answer never reveals whether
//! the address belongs to a principal.

use std::sync::Arc;

use kernel::error::{field::FieldErrors, kind::ErrorKind};
use serde::Serialize;

use crate::application::pipeline::{self, AuthContext, check_rules, parse_field};
use crate::application::rules;
use crate::application::services::{AuthCache, AuthServices};
use crate::domain::notification::{Notification, Recipient};
use crate::domain::repository::AuthRepository;
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

/// Status key returned for every accepted request
pub const RESET_LINK_SENT: &str = "passwords.sent";

#[derive(Default, Serialize)]
pub struct PasswordForgotInput {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordForgotOutput {
    pub status: &'static str,
}

pub struct PasswordForgotUseCase<R, C> {
    services: Arc<AuthServices<R, C>>,
}

impl<R: AuthRepository, C: AuthCache> PasswordForgotUseCase<R, C> {
    pub fn new(services: Arc<AuthServices<R, C>>) -> Self {
        Self { services }
    }

    pub async fn execute(
        &self,
        ctx: &AuthContext,
        input: PasswordForgotInput,
    ) -> AuthResult<PasswordForgotOutput> {
        let s = &self.services;
        s.require_guest(ctx)?;

        // Throttle (keyed by the normalized address when it parses)
        let scope = Email::new(&input.email)
            .map(|e| e.as_str().to_string())
            .unwrap_or_else(|_| input.email.clone());
        let limit = s.config.throttle.password_forgot.by(
            s.signature("password_forgot", ctx, None)
                .data("email", scope)
                .hash(),
        );
        let ticket = s
            .throttle(&[limit], &["email"], ErrorKind::UnprocessableEntity)
            .await?;

        // Validate
        let mut errors: FieldErrors =
            check_rules(&rules::password_forgot(&s.config), &pipeline::payload(&input)?);
        let email = parse_field(&mut errors, "email", Email::new(&input.email));
        let ticket = s.settle_input(ticket, errors).await?;
        let email = email.ok_or_else(|| AuthError::Internal("email passed validation unset".into()))?;

        // Every accepted request counts
        ticket.hit();
        let sent = PasswordForgotOutput {
            status: RESET_LINK_SENT,
        };

        let Some(principal) = s.repo.find_principal_by_email(&ctx.guard, &email).await? else {
            tracing::debug!(guard = %ctx.guard, "Reset requested for unknown address");
            return Ok(sent);
        };

        if s.resets
            .recently_issued(&ctx.guard, email.as_str(), s.config.reset_resend_throttle)
            .await?
        {
            tracing::debug!(principal_id = %principal.id, "Reset token re-issue suppressed");
            return Ok(sent);
        }

        let token = s.resets.issue(&ctx.guard, email.as_str()).await?;
        s.notifier.send(
            Recipient::principal(principal.id, email),
            Notification::PasswordReset { token },
        );

        tracing::info!(principal_id = %principal.id, "Password reset token sent");
        Ok(sent)
    }
}
