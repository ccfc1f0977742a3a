//! Principal Entity
//!
//! An authenticatable identity within one guard.

use chrono::{DateTime, Utc};
use kernel::id::PrincipalId;
use platform::signature::SignatureSubject;

use crate::domain::value_object::{
    email::Email, guard::Guard, name::Name, remember_token::RememberToken,
    user_password::UserPassword,
};

/// Principal entity
#[derive(Debug, Clone)]
pub struct Principal {
    /// Internal UUID identifier
    pub id: PrincipalId,
    /// Realm this principal authenticates in
    pub guard: Guard,
    pub name: Name,
    pub email: Option<Email>,
    pub email_verified_at: Option<DateTime<Utc>>,
    /// Argon2id hash; `None` until the principal sets a password
    pub password: Option<UserPassword>,
    pub remember_token: Option<RememberToken>,
    /// Preferred language tag (e.g. `en`, `cs`)
    pub locale: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Principal {
    pub fn new(
        guard: Guard,
        name: Name,
        email: Option<Email>,
        password: Option<UserPassword>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PrincipalId::new(),
            guard,
            name,
            email,
            email_verified_at: None,
            password,
            remember_token: None,
            locale: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_verified_email(&self) -> bool {
        self.email_verified_at.is_some()
    }

    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }

    pub fn mark_email_verified(&mut self, now: DateTime<Utc>) {
        self.email_verified_at = Some(now);
        self.updated_at = now;
    }

    pub fn set_name(&mut self, name: Name, now: DateTime<Utc>) {
        self.name = name;
        self.updated_at = now;
    }

    pub fn set_email(&mut self, email: Option<Email>, now: DateTime<Utc>) {
        self.email = email;
        self.updated_at = now;
    }

    pub fn set_password(&mut self, password: UserPassword, now: DateTime<Utc>) {
        self.password = Some(password);
        self.updated_at = now;
    }

    pub fn set_locale(&mut self, locale: Option<String>, now: DateTime<Utc>) {
        self.locale = locale;
        self.updated_at = now;
    }

    /// Rotate the remember token; every earlier token stops matching
    pub fn cycle_remember_token(&mut self) -> &RememberToken {
        self.remember_token.insert(RememberToken::generate())
    }

    /// Constant-time remember-token check
    pub fn remember_token_matches(&self, presented: &str) -> bool {
        self.remember_token
            .as_ref()
            .is_some_and(|token| token.matches(presented))
    }

    /// Email changed compared to `original`
    pub fn email_differs_from(&self, original: &Principal) -> bool {
        self.email != original.email
    }

    /// Password hash changed compared to `original`
    pub fn password_differs_from(&self, original: &Principal) -> bool {
        self.password != original.password
    }
}

impl SignatureSubject for Principal {
    fn signature_id(&self) -> String {
        self.id.to_string()
    }

    fn signature_guard(&self) -> &str {
        self.guard.as_str()
    }
}
