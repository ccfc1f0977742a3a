//! User Password Value Object
//!
//! Domain wrappers around `platform::password`.
//!
//! - [`RawPassword`] is a *new* password chosen by the user; it passes the
//!   NIST SP 800-63B policy before it can be hashed.
//! - [`UserPassword`] is the stored Argon2id PHC string.
//!
//! Passwords presented for verification skip the policy (an old password
//! must still verify after the policy tightens); see
//! `application::service::credential_validator::SuppliedSecret`.

use platform::password::{
    ClearTextPassword, HashedPassword, PasswordHashError, PasswordPolicyError, SecretHasher,
};
use std::fmt;

// ============================================================================
// Raw Password (User Input)
// ============================================================================

/// New password from user input
///
/// Memory is zeroized when dropped.
pub struct RawPassword(ClearTextPassword);

impl RawPassword {
    /// Create a new raw password, enforcing the password policy
    ///
    /// ## Validation Rules (NIST SP 800-63B)
    /// - 8 to 128 characters after NFKC normalization
    /// - No control characters
    /// - No common patterns (sequential, keyboard, dictionary)
    pub fn new(raw: String) -> Result<Self, PasswordPolicyError> {
        ClearTextPassword::new(raw).map(Self)
    }

    pub(crate) fn as_clear_text(&self) -> &ClearTextPassword {
        &self.0
    }
}

impl fmt::Debug for RawPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawPassword").field(&"[REDACTED]").finish()
    }
}

/// Translation key (plus placeholder) for a policy violation
pub fn policy_message(err: &PasswordPolicyError) -> (&'static str, Option<(&'static str, usize)>) {
    match err {
        PasswordPolicyError::TooShort { min, .. } => ("validation.min.string", Some(("min", *min))),
        PasswordPolicyError::TooLong { max, .. } => ("validation.max.string", Some(("max", *max))),
        PasswordPolicyError::EmptyOrWhitespace => ("validation.required", None),
        PasswordPolicyError::InvalidCharacter | PasswordPolicyError::CommonPattern => {
            ("validation.password", None)
        }
    }
}

// ============================================================================
// User Password (Hashed, for storage)
// ============================================================================

/// Hashed user password for database storage
///
/// Stores password in Argon2id PHC string format.
#[derive(Clone, PartialEq, Eq)]
pub struct UserPassword(HashedPassword);

impl UserPassword {
    /// Hash a new password
    pub fn hash(raw: &RawPassword, hasher: &dyn SecretHasher) -> Result<Self, PasswordHashError> {
        hasher.hash(raw.as_clear_text()).map(Self)
    }

    /// Re-hash an already verified secret with the current parameters
    pub(crate) fn rehash(
        secret: &ClearTextPassword,
        hasher: &dyn SecretHasher,
    ) -> Result<Self, PasswordHashError> {
        hasher.hash(secret).map(Self)
    }

    /// Create from PHC string (from database)
    pub fn from_phc_string(phc_string: impl Into<String>) -> Result<Self, PasswordHashError> {
        HashedPassword::from_phc_string(phc_string).map(Self)
    }

    pub fn as_phc_string(&self) -> &str {
        self.0.as_phc_string()
    }

    /// Constant-time verification
    pub fn verify(&self, secret: &ClearTextPassword, hasher: &dyn SecretHasher) -> bool {
        hasher.verify(secret, &self.0)
    }

    /// True when the hash uses outdated parameters
    pub fn needs_rehash(&self, hasher: &dyn SecretHasher) -> bool {
        hasher.needs_rehash(&self.0)
    }
}

impl fmt::Debug for UserPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use platform::password::{Argon2Hasher, MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};

    fn hasher() -> Argon2Hasher {
        Argon2Hasher::with_params(None, 1024, 1, 1).unwrap()
    }

    #[test]
    fn test_raw_password_validation() {
        assert!(RawPassword::new("ValidPass123!".to_string()).is_ok());
        assert!(RawPassword::new("a".repeat(MIN_PASSWORD_LENGTH - 1)).is_err());
        assert!(RawPassword::new("a".repeat(MAX_PASSWORD_LENGTH + 1)).is_err());
        assert!(RawPassword::new("password123".to_string()).is_err());
        assert!(RawPassword::new(String::new()).is_err());
    }

    #[test]
    fn test_policy_messages() {
        let short = RawPassword::new("Ab1!".to_string()).unwrap_err();
        assert_eq!(
            policy_message(&short),
            ("validation.min.string", Some(("min", MIN_PASSWORD_LENGTH)))
        );

        let common = RawPassword::new("password123".to_string()).unwrap_err();
        assert_eq!(policy_message(&common).0, "validation.password");
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = hasher();
        let raw = RawPassword::new("TestPassword123!".to_string()).unwrap();
        let hashed = UserPassword::hash(&raw, &hasher).unwrap();

        assert!(hashed.verify(&ClearTextPassword::for_verification("TestPassword123!"), &hasher));
        assert!(!hashed.verify(&ClearTextPassword::for_verification("WrongPassword123!"), &hasher));
    }

    #[test]
    fn test_phc_string_roundtrip() {
        let hasher = hasher();
        let raw = RawPassword::new("TestPassword123!".to_string()).unwrap();
        let hashed = UserPassword::hash(&raw, &hasher).unwrap();

        let restored = UserPassword::from_phc_string(hashed.as_phc_string()).unwrap();
        assert!(restored.verify(raw.as_clear_text(), &hasher));
        assert!(UserPassword::from_phc_string("not-a-phc").is_err());
    }

    #[test]
    fn test_rehash_detection() {
        let cheap = hasher();
        let raw = RawPassword::new("TestPassword123!".to_string()).unwrap();
        let hashed = UserPassword::hash(&raw, &cheap).unwrap();

        assert!(!hashed.needs_rehash(&cheap));
        let stronger = Argon2Hasher::with_params(None, 2048, 2, 1).unwrap();
        assert!(hashed.needs_rehash(&stronger));
    }

    #[test]
    fn test_debug_redaction() {
        let raw = RawPassword::new("SecretPassword123!".to_string()).unwrap();
        let debug = format!("{:?}", raw);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("Secret"));

        let hashed = UserPassword::hash(&raw, &hasher()).unwrap();
        assert!(format!("{:?}", hashed).contains("HASH"));
    }
}
