//! Remember Token Value Object
//!
//! Long-lived "stay signed in" credential. Only one value is valid per
//! principal at a time, so rotating it revokes every remember-me login.

use platform::crypto::{constant_time_eq, random_alphanumeric};
use std::fmt;

/// Token length in characters
pub const REMEMBER_TOKEN_LENGTH: usize = 60;

#[derive(Clone, PartialEq, Eq)]
pub struct RememberToken(String);

impl RememberToken {
    /// Fresh random token (`[A-Za-z0-9]{60}`)
    pub fn generate() -> Self {
        Self(random_alphanumeric(REMEMBER_TOKEN_LENGTH))
    }

    pub fn from_db(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Constant-time comparison with a presented token
    pub fn matches(&self, presented: &str) -> bool {
        constant_time_eq(self.0.as_bytes(), presented.as_bytes())
    }
}

impl fmt::Debug for RememberToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RememberToken").field(&"[REDACTED]").finish()
    }
}
