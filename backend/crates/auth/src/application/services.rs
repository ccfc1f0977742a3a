//! Auth Services
//!
//! The collaborators every workflow composes: repositories, stores,
//! throttle gate, brokers, hasher, link signer, event and notification
//! sinks. Built once from an [`AuthConfig`] and shared behind an `Arc`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kernel::id::SessionId;
use platform::cache::KeyValueStore;
use platform::clock::Clock;
use platform::password::{Argon2Hasher, SecretHasher};
use platform::rate_limit::{ThrottleGate, ThrottleStore};
use platform::signature::ClientInfo;
use platform::signed_url::{HmacUrlSigner, UrlSigner};

use crate::application::config::AuthConfig;
use crate::application::service::{
    CredentialValidator, PrincipalLocks, RememberTokenCycler, SessionInvalidator, TokenBroker,
    TokenKind,
};
use crate::domain::entity::{auth_session::AuthSession, principal::Principal};
use crate::domain::event::{AuthEvent, EventDispatcher};
use crate::domain::notification::{Notification, Notifier, Recipient};
use crate::domain::repository::AuthRepository;
use crate::domain::value_object::remember_token::RememberToken;
use crate::error::AuthResult;

/// Signed verification link parameters
pub const VERIFY_ID_PARAM: &str = "id";
pub const VERIFY_HASH_PARAM: &str = "hash";
pub const VERIFY_GUARD_PARAM: &str = "guard";

/// Store backing tokens and throttle buckets
pub trait AuthCache: KeyValueStore + ThrottleStore + Send + Sync + 'static {}

impl<T> AuthCache for T where T: KeyValueStore + ThrottleStore + Send + Sync + 'static {}

/// A started session
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub session: AuthSession,
    /// Set for "remember me" logins
    pub remember_token: Option<RememberToken>,
}

pub struct AuthServices<R, C> {
    pub config: Arc<AuthConfig>,
    pub repo: Arc<R>,
    pub cache: Arc<C>,
    pub clock: Arc<dyn Clock>,
    pub signer: Arc<dyn UrlSigner>,
    pub events: Arc<dyn EventDispatcher>,
    pub notifier: Arc<dyn Notifier>,
    pub gate: ThrottleGate<C>,
    pub credentials: CredentialValidator,
    /// 6-digit email confirmation codes
    pub codes: TokenBroker<C>,
    /// Password reset tokens
    pub resets: TokenBroker<C>,
    pub remember: RememberTokenCycler,
    pub sessions: SessionInvalidator<R>,
    pub locks: PrincipalLocks,
}

impl<R: AuthRepository, C: AuthCache> AuthServices<R, C> {
    pub fn new(
        config: AuthConfig,
        repo: Arc<R>,
        cache: Arc<C>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventDispatcher>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let hasher: Arc<dyn SecretHasher> =
            Arc::new(Argon2Hasher::new(config.password_pepper.clone()));
        let signer: Arc<dyn UrlSigner> = Arc::new(HmacUrlSigner::new(config.url_secret.to_vec()));

        let codes = TokenBroker::new(
            TokenKind::VerificationCode,
            cache.clone(),
            clock.clone(),
            config.verification_code_ttl,
        )
        .with_bypass(config.verification_bypass());
        let resets = TokenBroker::new(
            TokenKind::ResetToken,
            cache.clone(),
            clock.clone(),
            config.password_reset_ttl,
        );

        tracing::info!(
            environment = %config.environment,
            bypass = config.verification_bypass().is_some(),
            simple_throttle = config.simple_throttle,
            "Auth services initialized"
        );

        Self {
            gate: ThrottleGate::new(cache.clone(), clock.clone()),
            credentials: CredentialValidator::new(hasher),
            sessions: SessionInvalidator::new(repo.clone()),
            remember: RememberTokenCycler::new(),
            locks: PrincipalLocks::new(),
            config: Arc::new(config),
            repo,
            cache,
            clock,
            signer,
            events,
            notifier,
            codes,
            resets,
        }
    }

    /// Replace the password hasher (e.g. cheaper parameters in tests)
    pub fn with_hasher(mut self, hasher: Arc<dyn SecretHasher>) -> Self {
        self.credentials = CredentialValidator::new(hasher);
        self
    }

    pub fn hasher(&self) -> &dyn SecretHasher {
        self.credentials.hasher()
    }

    pub fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.clock.now_ms()).unwrap_or_default()
    }

    // ========================================================================
    // Sessions
    // ========================================================================

    /// Start a session for `principal`
    ///
    /// A "remember me" login gives the principal a remember token when it
    /// has none and persists it; an existing token is reused so other
    /// remembered devices stay logged in.
    pub async fn login(
        &self,
        principal: &mut Principal,
        remember: bool,
        client: &ClientInfo,
    ) -> AuthResult<LoginOutcome> {
        let now = self.now();

        if remember && self.remember.ensure(principal) {
            self.repo.update_principal(principal).await?;
        }

        let session = AuthSession::new(
            principal.id,
            principal.guard.clone(),
            remember,
            client,
            self.config.session_ttl(remember),
            now,
        );
        self.repo.insert_session(&session).await?;

        self.events.fire(AuthEvent::Login {
            guard: principal.guard.clone(),
            principal_id: principal.id,
            remember,
        });

        tracing::info!(
            principal_id = %principal.id,
            guard = %principal.guard,
            remember,
            "Session started"
        );

        Ok(LoginOutcome {
            session,
            remember_token: remember
                .then(|| principal.remember_token.clone())
                .flatten(),
        })
    }

    /// Re-establish the current login under a fresh session id
    ///
    /// Falls back to a new session when the current one is gone.
    pub async fn relogin(
        &self,
        principal: &Principal,
        current: Option<SessionId>,
        client: &ClientInfo,
    ) -> AuthResult<AuthSession> {
        let now = self.now();

        let existing = match current {
            Some(id) => self
                .repo
                .find_session(id)
                .await?
                .filter(|s| s.principal_id == principal.id),
            None => None,
        };

        let session = match existing {
            Some(old) => {
                let rotated = old.regenerate(self.config.session_ttl(old.remember), now);
                self.repo.insert_session(&rotated).await?;
                self.repo.delete_session(old.session_id).await?;
                rotated
            }
            None => {
                let fresh = AuthSession::new(
                    principal.id,
                    principal.guard.clone(),
                    false,
                    client,
                    self.config.session_ttl(false),
                    now,
                );
                self.repo.insert_session(&fresh).await?;
                fresh
            }
        };

        tracing::debug!(principal_id = %principal.id, "Session regenerated");
        Ok(session)
    }

    // ========================================================================
    // Notifications
    // ========================================================================

    /// Signed verification link parameters for `principal`
    pub fn verification_params(&self, principal: &Principal) -> Option<Vec<(String, String)>> {
        let email = principal.email.as_ref()?;
        Some(vec![
            (VERIFY_ID_PARAM.to_string(), principal.id.to_string()),
            (VERIFY_HASH_PARAM.to_string(), email.verification_hash()),
            (VERIFY_GUARD_PARAM.to_string(), principal.guard.to_string()),
        ])
    }

    /// Send a signed verification link
    ///
    /// ## Returns
    /// `false` when nothing was sent: the guard does not verify email, the
    /// principal has no email, or it is already verified.
    pub fn send_verification_link(&self, principal: &Principal) -> bool {
        if !self.config.must_verify_email(&principal.guard) || principal.has_verified_email() {
            return false;
        }
        let (Some(email), Some(params)) = (&principal.email, self.verification_params(principal))
        else {
            return false;
        };

        let expires_at =
            self.clock.now_secs() + self.config.verification_link_ttl.as_secs() as i64;
        let url = self
            .signer
            .sign(&self.config.verification_path, &params, expires_at);

        self.notifier.send(
            Recipient::principal(principal.id, email.clone()),
            Notification::VerifyEmail { url: url.to_uri() },
        );

        tracing::info!(principal_id = %principal.id, "Verification link sent");
        true
    }

    /// Send a reset token to a principal that has no password yet
    pub async fn send_password_init(&self, principal: &Principal) -> AuthResult<bool> {
        if principal.has_password() {
            return Ok(false);
        }
        let Some(email) = &principal.email else {
            return Ok(false);
        };

        let token = self.resets.issue(&principal.guard, email.as_str()).await?;
        self.notifier.send(
            Recipient::principal(principal.id, email.clone()),
            Notification::PasswordInit { token },
        );

        tracing::info!(principal_id = %principal.id, "Password init link sent");
        Ok(true)
    }
}
