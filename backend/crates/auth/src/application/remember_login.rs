//! Remember Login Use Case
//!
//! Starts a session from a "remember me" cookie (`id` plus remember
//! token). A token rotated by a password change or a logout of other
//! devices no longer matches.

use std::str::FromStr;
use std::sync::Arc;

use kernel::error::kind::ErrorKind;
use kernel::id::PrincipalId;
use serde::Serialize;

use crate::application::pipeline::{self, AuthContext, check_rules};
use crate::application::rules;
use crate::application::services::{AuthCache, AuthServices, LoginOutcome};
use crate::domain::entity::principal::Principal;
use crate::domain::event::AuthEvent;
use crate::domain::repository::AuthRepository;
use crate::error::{AuthError, AuthResult};

#[derive(Default, Serialize)]
pub struct RememberLoginInput {
    pub id: String,
    pub token: String,
}

#[derive(Debug)]
pub struct RememberLoginOutput {
    pub principal: Principal,
    pub login: LoginOutcome,
}

pub struct RememberLoginUseCase<R, C> {
    services: Arc<AuthServices<R, C>>,
}

impl<R: AuthRepository, C: AuthCache> RememberLoginUseCase<R, C> {
    pub fn new(services: Arc<AuthServices<R, C>>) -> Self {
        Self { services }
    }

    pub async fn execute(
        &self,
        ctx: &AuthContext,
        input: RememberLoginInput,
    ) -> AuthResult<RememberLoginOutput> {
        let s = &self.services;
        s.require_guest(ctx)?;

        // Throttle
        let limit = s
            .config
            .throttle
            .remember
            .by(s.signature("remember", ctx, None).hash());
        let ticket = s
            .throttle_credentials(&ctx.guard, &[limit], &[], ErrorKind::TooManyRequests)
            .await?;

        // Validate
        let errors = check_rules(&rules::remember_login(), &pipeline::payload(&input)?);
        let ticket = s.settle_input(ticket, errors).await?;

        let principal = match PrincipalId::from_str(&input.id) {
            Ok(id) => s.repo.find_principal(&ctx.guard, id).await?,
            Err(_) => None,
        };
        let Some(mut principal) = principal.filter(|p| p.remember_token_matches(&input.token)) else {
            ticket.hit();
            s.events.fire(AuthEvent::Failed {
                guard: ctx.guard.clone(),
                principal_id: None,
            });
            return Err(AuthError::Unauthenticated);
        };
        ticket.release().await?;

        let login = s.login(&mut principal, true, &ctx.client).await?;
        Ok(RememberLoginOutput { principal, login })
    }
}
