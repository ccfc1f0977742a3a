//! Register Use Case
//!
//! Creates a principal and logs it in.

use std::sync::Arc;

use kernel::error::{field::FieldErrors, kind::ErrorKind};
use serde::Serialize;

use crate::application::pipeline::{self, AuthContext, check_rules, parse_field};
use crate::application::rules;
use crate::application::services::{AuthCache, AuthServices, LoginOutcome};
use crate::domain::entity::principal::Principal;
use crate::domain::event::AuthEvent;
use crate::domain::repository::AuthRepository;
use crate::domain::value_object::{
    email::Email,
    name::Name,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

/// Fields reported when the register limit trips
const CREDENTIAL_FIELDS: &[&str] = &["email"];

/// Register input
#[derive(Default, Serialize)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    pub remember: bool,
    pub locale: Option<String>,
}

/// Register output
#[derive(Debug)]
pub struct RegisterOutput {
    pub principal: Principal,
    pub login: LoginOutcome,
}

/// Register use case
pub struct RegisterUseCase<R, C> {
    services: Arc<AuthServices<R, C>>,
}

impl<R: AuthRepository, C: AuthCache> RegisterUseCase<R, C> {
    pub fn new(services: Arc<AuthServices<R, C>>) -> Self {
        Self { services }
    }

    pub async fn execute(&self, ctx: &AuthContext, input: RegisterInput) -> AuthResult<RegisterOutput> {
        let s = &self.services;
        s.require_guest(ctx)?;

        // Throttle
        let limit = s
            .config
            .throttle
            .register
            .by(s.signature("register", ctx, None).hash());
        let ticket = s
            .throttle(&[limit], CREDENTIAL_FIELDS, ErrorKind::UnprocessableEntity)
            .await?;

        // Validate
        let rules = rules::register(&s.config, &ctx.guard);
        let mut errors: FieldErrors = check_rules(&rules, &pipeline::payload(&input)?);
        let name = parse_field(&mut errors, "name", Name::new(&input.name));
        let email = parse_field(&mut errors, "email", Email::new(&input.email));
        let password = parse_field(&mut errors, "password", RawPassword::new(input.password));
        let ticket = s.settle_input(ticket, errors).await?;
        let (Some(name), Some(email), Some(password)) = (name, email, password) else {
            return Err(AuthError::Internal("register input passed with missing values".into()));
        };

        // Duplicate identity
        if s.repo
            .find_principal_by_email(&ctx.guard, &email)
            .await?
            .is_some()
        {
            ticket.hit();
            tracing::debug!(guard = %ctx.guard, "Registration with taken email");
            return Err(AuthError::fields(CREDENTIAL_FIELDS.iter().copied(), "validation.unique"));
        }

        // Mutate
        let now = s.now();
        let hash = UserPassword::hash(&password, s.hasher())?;
        let mut principal = Principal::new(ctx.guard.clone(), name, Some(email), Some(hash), now);
        principal.set_locale(input.locale.filter(|l| !l.is_empty()), now);
        s.create_principal(&principal).await?;
        ticket.release().await?;

        // Side effects
        s.events.fire(AuthEvent::Registered {
            guard: principal.guard.clone(),
            principal_id: principal.id,
        });
        s.send_verification_link(&principal);
        let login = s.login(&mut principal, input.remember, &ctx.client).await?;

        tracing::info!(
            principal_id = %principal.id,
            guard = %principal.guard,
            "Principal registered"
        );

        Ok(RegisterOutput { principal, login })
    }
}
