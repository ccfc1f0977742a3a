//! Guard Value Object
//!
//! A guard names an independent authentication realm. Principals, sessions,
//! throttle buckets and token records of two guards never mix.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Guard of regular application users
pub const USERS: &str = "users";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Guard(Cow<'static, str>);

impl Guard {
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn users() -> Self {
        Self::from_static(USERS)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Guard {
    fn default() -> Self {
        Self::users()
    }
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Guard {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_and_owned_compare_equal() {
        assert_eq!(Guard::users(), Guard::new("users"));
        assert_ne!(Guard::users(), Guard::new("admins"));
        assert_eq!(Guard::default().to_string(), "users");
    }
}
