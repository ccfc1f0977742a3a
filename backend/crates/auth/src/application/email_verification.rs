//! Email Verification Use Cases
//!
//! Ownership proof through a signed link sent to the principal's address.
//!
//! The link carries `id`, `hash` (SHA-256 hex of the address), `guard`,
//! `expires` and `signature`. The signature and expiry are checked first,
//! then `id` and `hash` against the authenticated principal.

use std::sync::Arc;

use kernel::error::{field::FieldErrors, kind::ErrorKind};
use platform::crypto::constant_time_eq;
use platform::signed_url::SignedUrl;
use serde::Serialize;

use crate::application::pipeline::{AuthContext, check_rules, finish};
use crate::application::rules;
use crate::application::services::{
    AuthCache, AuthServices, VERIFY_GUARD_PARAM, VERIFY_HASH_PARAM, VERIFY_ID_PARAM,
};
use crate::domain::entity::principal::Principal;
use crate::domain::event::AuthEvent;
use crate::domain::repository::AuthRepository;
use crate::error::{AuthError, AuthResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationStatus {
    /// A link was sent, or the address is now verified
    Done,
    /// Nothing to do: the address was verified before
    AlreadyVerified,
}

// ============================================================================
// Send
// ============================================================================

pub struct SendEmailVerificationUseCase<R, C> {
    services: Arc<AuthServices<R, C>>,
}

impl<R: AuthRepository, C: AuthCache> SendEmailVerificationUseCase<R, C> {
    pub fn new(services: Arc<AuthServices<R, C>>) -> Self {
        Self { services }
    }

    pub async fn execute(&self, ctx: &AuthContext) -> AuthResult<VerificationStatus> {
        let s = &self.services;
        let me = s.resolve_me(ctx).await?;

        if !s.config.must_verify_email(&ctx.guard) {
            return Err(AuthError::ForbiddenOperation);
        }
        if me.has_verified_email() {
            return Ok(VerificationStatus::AlreadyVerified);
        }

        // Throttle
        let limit = s
            .config
            .throttle
            .email_verification
            .by(s.signature("email_verification", ctx, Some(&me)).hash());
        let ticket = s
            .throttle(&[limit], &["email"], ErrorKind::TooManyRequests)
            .await?;

        if me.email.is_none() {
            return s
                .refund(ticket, AuthError::field("email", "validation.required"))
                .await;
        }

        ticket.hit();
        s.send_verification_link(&me);
        Ok(VerificationStatus::Done)
    }
}

// ============================================================================
// Verify
// ============================================================================

/// The query parameters of the followed link
#[derive(Debug, Default, Clone, Serialize)]
pub struct VerifyEmailInput {
    pub params: Vec<(String, String)>,
}

impl VerifyEmailInput {
    fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug)]
pub struct VerifyEmailOutput {
    pub status: VerificationStatus,
    pub principal: Principal,
}

pub struct VerifyEmailUseCase<R, C> {
    services: Arc<AuthServices<R, C>>,
}

impl<R: AuthRepository, C: AuthCache> VerifyEmailUseCase<R, C> {
    pub fn new(services: Arc<AuthServices<R, C>>) -> Self {
        Self { services }
    }

    fn matches(expected: &str, presented: Option<&str>) -> bool {
        presented.is_some_and(|p| constant_time_eq(expected.as_bytes(), p.as_bytes()))
    }

    pub async fn execute(&self, ctx: &AuthContext, input: VerifyEmailInput) -> AuthResult<VerifyEmailOutput> {
        let s = &self.services;
        let principal_id = ctx.principal_id.ok_or(AuthError::Unauthenticated)?;
        let _lock = s.locks.lock(principal_id).await;
        let me = s.resolve_me(ctx).await?;

        // Signature and expiry
        let url = SignedUrl {
            path: s.config.verification_path.clone(),
            params: input.params.clone(),
        };
        s.signer.verify(&url, s.clock.now_secs())?;

        // Validate
        let payload = serde_json::Value::Object(
            input
                .params
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::from(v.as_str())))
                .collect(),
        );
        let errors: FieldErrors = check_rules(&rules::verify_email(), &payload);
        finish(errors)?;

        if !s.config.must_verify_email(&ctx.guard) {
            return Err(AuthError::ForbiddenOperation);
        }
        let Some(email) = &me.email else {
            return Err(AuthError::ForbiddenOperation);
        };
        let authentic = Self::matches(&me.id.to_string(), input.param(VERIFY_ID_PARAM))
            & Self::matches(&email.verification_hash(), input.param(VERIFY_HASH_PARAM))
            & Self::matches(me.guard.as_str(), input.param(VERIFY_GUARD_PARAM));
        if !authentic {
            tracing::warn!(principal_id = %me.id, "Verification link for another principal");
            return Err(AuthError::ForbiddenOperation);
        }

        if me.has_verified_email() {
            return Ok(VerifyEmailOutput {
                status: VerificationStatus::AlreadyVerified,
                principal: me,
            });
        }

        // Mutate
        let mut updated = me.clone();
        updated.mark_email_verified(s.now());
        let principal = s.save_principal(&me, updated, ctx.session_id).await?;

        s.events.fire(AuthEvent::Verified {
            guard: ctx.guard.clone(),
            principal_id: principal.id,
        });

        tracing::info!(principal_id = %principal.id, "Email verified");
        Ok(VerifyEmailOutput {
            status: VerificationStatus::Done,
            principal,
        })
    }
}
