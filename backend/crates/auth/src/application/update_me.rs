//! Update Me Use Case
//!
//! Changes name, email, password or locale of the authenticated principal.
//! A new password needs the current one when a password is set.

use std::sync::Arc;

use kernel::error::{field::FieldErrors, kind::ErrorKind};
use platform::rate_limit::Limit;
use serde::Serialize;

use crate::application::pipeline::{self, AuthContext, check_rules, parse_field};
use crate::application::rules;
use crate::application::service::SuppliedSecret;
use crate::application::services::{AuthCache, AuthServices};
use crate::domain::entity::principal::Principal;
use crate::domain::repository::AuthRepository;
use crate::domain::value_object::{
    email::Email,
    name::Name,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

/// Update input; `None` leaves an attribute unchanged
#[derive(Default, Serialize)]
pub struct UpdateMeInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_confirmation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

/// Update output
#[derive(Debug)]
pub struct UpdateMeOutput {
    pub principal: Principal,
}

/// Update me use case
pub struct UpdateMeUseCase<R, C> {
    services: Arc<AuthServices<R, C>>,
}

impl<R: AuthRepository, C: AuthCache> UpdateMeUseCase<R, C> {
    pub fn new(services: Arc<AuthServices<R, C>>) -> Self {
        Self { services }
    }

    /// One limit per credential being changed, `credentials.{index}`
    fn credential_limits(
        &self,
        ctx: &AuthContext,
        me: &Principal,
        input: &UpdateMeInput,
    ) -> (Vec<Limit>, Vec<&'static str>) {
        let s = &self.services;
        let changed = [
            ("email", input.email.is_some()),
            ("password", input.password.is_some()),
        ];

        changed
            .iter()
            .enumerate()
            .filter(|(_, (_, present))| *present)
            .map(|(index, (field, _))| {
                let hash = s
                    .signature("update_me", ctx, Some(me))
                    .data("credentials", index.to_string())
                    .hash();
                (s.config.throttle.update_me.by(hash), *field)
            })
            .unzip()
    }

    pub async fn execute(&self, ctx: &AuthContext, input: UpdateMeInput) -> AuthResult<UpdateMeOutput> {
        let s = &self.services;
        let principal_id = ctx.principal_id.ok_or(AuthError::Unauthenticated)?;
        let _lock = s.locks.lock(principal_id).await;
        let me = s.resolve_me(ctx).await?;

        // Throttle
        let (limits, fields) = self.credential_limits(ctx, &me, &input);
        let ticket = s
            .throttle(&limits, &fields, ErrorKind::UnprocessableEntity)
            .await?;

        // Validate
        let needs_current = input.password.is_some() && me.has_password();
        let rules = rules::update_me(&s.config, &ctx.guard, &me.id.to_string(), needs_current);
        let mut errors: FieldErrors = check_rules(&rules, &pipeline::payload(&input)?);

        let name = input
            .name
            .as_deref()
            .and_then(|n| parse_field(&mut errors, "name", Name::new(n)));
        let email = input
            .email
            .as_deref()
            .and_then(|e| parse_field(&mut errors, "email", Email::new(e)));
        let password = input
            .password
            .clone()
            .and_then(|p| parse_field(&mut errors, "password", RawPassword::new(p)));
        let ticket = s.settle_input(ticket, errors).await?;

        // Uniqueness against other principals
        if let Some(email) = email.as_ref().filter(|e| me.email.as_ref() != Some(*e)) {
            let taken = s
                .repo
                .find_principal_by_email(&ctx.guard, email)
                .await?
                .is_some_and(|other| other.id != me.id);
            if taken {
                ticket.hit();
                return Err(AuthError::field("email", "validation.unique"));
            }
        }

        // Current secret
        if needs_current {
            let secret = SuppliedSecret::from_input(input.current_password.as_deref());
            if !s.credentials.validate(&me, &secret) {
                return Err(s.reject_secret(
                    ticket,
                    Some(&me),
                    &ctx.guard,
                    "current_password",
                    "auth.password",
                ));
            }
        }

        // Mutate
        let now = s.now();
        let mut updated = me.clone();
        if let Some(name) = name {
            updated.set_name(name, now);
        }
        if let Some(email) = email {
            if me.email.as_ref() != Some(&email) {
                updated.set_email(Some(email), now);
            }
        }
        if let Some(password) = password {
            updated.set_password(UserPassword::hash(&password, s.hasher())?, now);
        }
        if let Some(locale) = input.locale {
            updated.set_locale(Some(locale).filter(|l| !l.is_empty()), now);
        }

        let principal = s.save_principal(&me, updated, ctx.session_id).await?;
        ticket.release().await?;

        tracing::info!(principal_id = %principal.id, "Principal updated");
        Ok(UpdateMeOutput { principal })
    }
}
