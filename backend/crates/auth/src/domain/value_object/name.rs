//! Display Name Value Object
//!
//! Free-form name shown to other users. NFKC normalized and trimmed; any
//! script is allowed, control characters are not.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

/// Maximum length in characters (after normalization)
pub const NAME_MAX_LENGTH: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("Name cannot be empty")]
    Empty,

    #[error("Name must be at most {NAME_MAX_LENGTH} characters")]
    TooLong,

    #[error("Name contains control characters")]
    InvalidCharacter,
}

impl NameError {
    pub fn message_key(&self) -> &'static str {
        match self {
            NameError::Empty => "validation.required",
            NameError::TooLong => "validation.max.string",
            NameError::InvalidCharacter => "validation.regex",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Name(String);

impl Name {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, NameError> {
        let normalized: String = raw.as_ref().nfkc().collect();
        let name = normalized.trim();

        if name.is_empty() {
            return Err(NameError::Empty);
        }
        if name.chars().count() > NAME_MAX_LENGTH {
            return Err(NameError::TooLong);
        }
        if name.chars().any(char::is_control) {
            return Err(NameError::InvalidCharacter);
        }

        Ok(Self(name.to_string()))
    }

    pub fn from_db(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Name {
    type Error = NameError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Name::new(s)
    }
}

impl From<Name> for String {
    fn from(name: Name) -> Self {
        name.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_normalized_and_trimmed() {
        // Full-width letters fold to ASCII under NFKC
        let name = Name::new("  ＪＯＨＮ Doe ").unwrap();
        assert_eq!(name.as_str(), "JOHN Doe");
    }

    #[test]
    fn test_name_rules() {
        assert_eq!(Name::new(" \t "), Err(NameError::Empty));
        assert_eq!(Name::new("a\u{0007}b"), Err(NameError::InvalidCharacter));
        assert_eq!(Name::new("x".repeat(NAME_MAX_LENGTH + 1)), Err(NameError::TooLong));
        assert!(Name::new("x".repeat(NAME_MAX_LENGTH)).is_ok());
        assert!(Name::new("山田 太郎").is_ok());
    }
}
