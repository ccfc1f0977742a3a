//! Password Hashing and Verification
//!
//! NIST SP 800-63B oriented password handling with:
//! - Argon2id hashing (memory-hard, recommended by OWASP)
//! - Zeroization of sensitive data
//! - Optional application-wide pepper
//!
//! Callers work against the [`SecretHasher`] trait; [`Argon2Hasher`] is the
//! production implementation.

use std::fmt;

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use rand::rngs::OsRng;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

// ============================================================================
// Constants (NIST SP 800-63B compliant)
// ============================================================================

/// Minimum password length (NIST: SHALL be at least 8)
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length (NIST: SHOULD permit at least 64)
pub const MAX_PASSWORD_LENGTH: usize = 128;

// ============================================================================
// Error Types
// ============================================================================

/// Password policy violation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    #[error("Password must be at least {min} characters (got {actual})")]
    TooShort { min: usize, actual: usize },

    #[error("Password must be at most {max} characters (got {actual})")]
    TooLong { max: usize, actual: usize },

    #[error("Password cannot be empty or contain only whitespace")]
    EmptyOrWhitespace,

    /// Control characters other than space, tab and newline
    #[error("Password contains invalid control characters")]
    InvalidCharacter,

    /// Sequential, repeated or dictionary passwords
    #[error("Password is too common or follows a predictable pattern")]
    CommonPattern,
}

/// Password hashing errors
#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,

    #[error("Invalid Argon2 parameters: {0}")]
    InvalidParams(String),
}

// ============================================================================
// Clear Text Password (Zeroized on drop)
// ============================================================================

/// Clear text password with automatic memory zeroization
///
/// ## Security
/// - Implements `Zeroize` and `ZeroizeOnDrop`
/// - Does not implement `Clone` to prevent accidental copies
/// - Debug output is redacted
///
/// ## Examples
/// ```rust
/// use platform::password::ClearTextPassword;
///
/// let password = ClearTextPassword::new("my_secure_passphrase".to_string()).unwrap();
/// assert_eq!(format!("{:?}", password), "ClearTextPassword(\"[REDACTED]\")");
/// ```
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    /// Create a new clear text password, enforcing the password policy
    ///
    /// Unicode is normalized using NFKC before validation; length is counted
    /// in code points.
    pub fn new(raw: String) -> Result<Self, PasswordPolicyError> {
        let normalized = Self::normalize(raw);

        if normalized.trim().is_empty() {
            return Err(PasswordPolicyError::EmptyOrWhitespace);
        }

        let char_count = normalized.chars().count();

        if char_count < MIN_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooShort {
                min: MIN_PASSWORD_LENGTH,
                actual: char_count,
            });
        }

        if char_count > MAX_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooLong {
                max: MAX_PASSWORD_LENGTH,
                actual: char_count,
            });
        }

        if normalized
            .chars()
            .any(|ch| ch.is_control() && ch != ' ' && ch != '\t' && ch != '\n')
        {
            return Err(PasswordPolicyError::InvalidCharacter);
        }

        if is_common_pattern(&normalized) {
            return Err(PasswordPolicyError::CommonPattern);
        }

        Ok(Self(normalized))
    }

    /// Wrap a supplied secret for verification only
    ///
    /// No policy is applied: a secret that could never have been set must
    /// still be answered with "does not match", not with a policy error.
    pub fn for_verification(raw: &str) -> Self {
        Self(Self::normalize(raw.to_string()))
    }

    fn normalize(raw: String) -> String {
        let raw = Zeroizing::new(raw);
        raw.nfkc().collect()
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Hashed Password (Safe to store)
// ============================================================================

/// Hashed password in PHC string format
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword {
    hash: String,
}

impl HashedPassword {
    /// Create from PHC string (e.g., from database)
    pub fn from_phc_string(s: impl Into<String>) -> Result<Self, PasswordHashError> {
        let hash = s.into();
        PasswordHash::new(&hash).map_err(|_| PasswordHashError::InvalidHashFormat)?;
        Ok(Self { hash })
    }

    /// Get the PHC string for storage
    pub fn as_phc_string(&self) -> &str {
        &self.hash
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

// ============================================================================
// Hasher
// ============================================================================

/// Hashing primitive used by the credential flows
pub trait SecretHasher: Send + Sync {
    fn hash(&self, secret: &ClearTextPassword) -> Result<HashedPassword, PasswordHashError>;

    /// Constant-time verification; malformed hashes never verify
    fn verify(&self, secret: &ClearTextPassword, hashed: &HashedPassword) -> bool;

    /// True when `hashed` was produced with other parameters than the
    /// current ones
    fn needs_rehash(&self, hashed: &HashedPassword) -> bool;
}

/// Argon2id hasher with an optional pepper
///
/// ## Examples
/// ```rust
/// use platform::password::{Argon2Hasher, ClearTextPassword, SecretHasher};
///
/// let hasher = Argon2Hasher::new(Some(b"pepper".to_vec()));
/// let password = ClearTextPassword::new("correct horse battery".to_string()).unwrap();
/// let hashed = hasher.hash(&password).unwrap();
/// assert!(hasher.verify(&password, &hashed));
/// ```
#[derive(Clone)]
pub struct Argon2Hasher {
    pepper: Option<Zeroizing<Vec<u8>>>,
    params: Params,
}

impl Argon2Hasher {
    /// OWASP recommended parameters: m=19456 (19 MiB), t=2, p=1
    pub fn new(pepper: Option<Vec<u8>>) -> Self {
        Self {
            pepper: pepper.map(Zeroizing::new),
            params: Params::default(),
        }
    }

    /// Custom cost parameters (cheap parameters keep test suites fast)
    pub fn with_params(
        pepper: Option<Vec<u8>>,
        m_cost: u32,
        t_cost: u32,
        p_cost: u32,
    ) -> Result<Self, PasswordHashError> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| PasswordHashError::InvalidParams(e.to_string()))?;
        Ok(Self {
            pepper: pepper.map(Zeroizing::new),
            params,
        })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Password bytes followed by the pepper
    fn peppered(&self, secret: &ClearTextPassword) -> Zeroizing<Vec<u8>> {
        let mut combined = Zeroizing::new(secret.as_bytes().to_vec());
        if let Some(pepper) = &self.pepper {
            combined.extend_from_slice(pepper);
        }
        combined
    }
}

impl fmt::Debug for Argon2Hasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Argon2Hasher")
            .field("pepper", &self.pepper.as_ref().map(|_| "[REDACTED]"))
            .field("m_cost", &self.params.m_cost())
            .field("t_cost", &self.params.t_cost())
            .field("p_cost", &self.params.p_cost())
            .finish()
    }
}

impl SecretHasher for Argon2Hasher {
    fn hash(&self, secret: &ClearTextPassword) -> Result<HashedPassword, PasswordHashError> {
        // Random salt (128 bits)
        let salt = SaltString::generate(OsRng);

        let hash = self
            .argon2()
            .hash_password(&self.peppered(secret), &salt)
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;

        Ok(HashedPassword {
            hash: hash.to_string(),
        })
    }

    fn verify(&self, secret: &ClearTextPassword, hashed: &HashedPassword) -> bool {
        let Ok(parsed) = PasswordHash::new(&hashed.hash) else {
            return false;
        };

        // Parameters come from the PHC string; comparison is constant-time
        self.argon2()
            .verify_password(&self.peppered(secret), &parsed)
            .is_ok()
    }

    fn needs_rehash(&self, hashed: &HashedPassword) -> bool {
        let Ok(parsed) = PasswordHash::new(&hashed.hash) else {
            return true;
        };

        if parsed.algorithm != Algorithm::Argon2id.ident() {
            return true;
        }

        match Params::try_from(&parsed) {
            Ok(params) => {
                params.m_cost() != self.params.m_cost()
                    || params.t_cost() != self.params.t_cost()
                    || params.p_cost() != self.params.p_cost()
            }
            Err(_) => true,
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Check for common weak patterns
fn is_common_pattern(password: &str) -> bool {
    let lower = password.to_lowercase();

    // All same character (e.g., "aaaaaaaa")
    let mut chars = lower.chars();
    if let Some(first) = chars.next() {
        if chars.all(|c| c == first) {
            return true;
        }
    }

    if is_sequential_numbers(&lower) {
        return true;
    }

    const KEYBOARD_PATTERNS: &[&str] = &[
        "qwerty",
        "qwertyuiop",
        "asdfgh",
        "asdfghjkl",
        "zxcvbn",
        "qazwsx",
        "1qaz2wsx",
    ];

    if KEYBOARD_PATTERNS.iter().any(|p| lower.contains(p)) {
        return true;
    }

    const COMMON_PASSWORDS: &[&str] = &[
        "password",
        "password1",
        "password123",
        "12345678",
        "123456789",
        "1234567890",
        "abcdefgh",
        "letmein",
        "welcome",
        "admin123",
        "iloveyou",
        "sunshine",
        "princess",
        "football",
        "monkey",
        "shadow",
        "master",
        "dragon",
        "baseball",
        "michael",
        "trustno1",
    ];

    COMMON_PASSWORDS.contains(&lower.as_str())
}

/// Check if string is sequential numbers
fn is_sequential_numbers(s: &str) -> bool {
    let digits: Vec<u32> = s.chars().filter_map(|c| c.to_digit(10)).collect();

    if digits.len() < 4 || digits.len() != s.chars().count() {
        return false;
    }

    let is_ascending = digits
        .windows(2)
        .all(|w| w[1] == w[0] + 1 || (w[0] == 9 && w[1] == 0));

    let is_descending = digits
        .windows(2)
        .all(|w| w[0] == w[1] + 1 || (w[0] == 0 && w[1] == 9));

    is_ascending || is_descending
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher(pepper: Option<&[u8]>) -> Argon2Hasher {
        Argon2Hasher::with_params(pepper.map(<[u8]>::to_vec), 1024, 1, 1).unwrap()
    }

    #[test]
    fn test_password_too_short() {
        let result = ClearTextPassword::new("short".to_string());
        assert!(matches!(result, Err(PasswordPolicyError::TooShort { .. })));
    }

    #[test]
    fn test_password_too_long() {
        let long_password = "ab".repeat(MAX_PASSWORD_LENGTH);
        let result = ClearTextPassword::new(long_password);
        assert!(matches!(result, Err(PasswordPolicyError::TooLong { .. })));
    }

    #[test]
    fn test_password_whitespace_only() {
        for raw in ["", "        "] {
            let result = ClearTextPassword::new(raw.to_string());
            assert!(matches!(
                result,
                Err(PasswordPolicyError::EmptyOrWhitespace)
            ));
        }
    }

    #[test]
    fn test_password_control_character() {
        let result = ClearTextPassword::new("abc\u{7}defghij".to_string());
        assert!(matches!(result, Err(PasswordPolicyError::InvalidCharacter)));
    }

    #[test]
    fn test_password_common_pattern() {
        for raw in ["password123", "qwertyuiop", "12345678", "aaaaaaaaa"] {
            let result = ClearTextPassword::new(raw.to_string());
            assert!(
                matches!(result, Err(PasswordPolicyError::CommonPattern)),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_valid_passwords() {
        assert!(ClearTextPassword::new("MySecure#Pass2024!".to_string()).is_ok());
        assert!(ClearTextPassword::new("パスワード安全です!".to_string()).is_ok());
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = fast_hasher(None);
        let password = ClearTextPassword::new("TestPassword123!".to_string()).unwrap();
        let hashed = hasher.hash(&password).unwrap();

        assert!(hasher.verify(&password, &hashed));
        assert!(!hasher.verify(&ClearTextPassword::for_verification("nope"), &hashed));
    }

    #[test]
    fn test_hash_with_pepper() {
        let peppered = fast_hasher(Some(b"my_secret_pepper"));
        let password = ClearTextPassword::new("TestPassword123!".to_string()).unwrap();
        let hashed = peppered.hash(&password).unwrap();

        assert!(peppered.verify(&password, &hashed));
        assert!(!fast_hasher(None).verify(&password, &hashed));
        assert!(!fast_hasher(Some(b"wrong_pepper")).verify(&password, &hashed));
    }

    #[test]
    fn test_verification_normalizes_like_policy() {
        let hasher = fast_hasher(None);
        // U+FB01 (ligature fi) normalizes to "fi" under NFKC
        let password = ClearTextPassword::new("\u{FB01}ne-tuned secret".to_string()).unwrap();
        let hashed = hasher.hash(&password).unwrap();
        assert!(hasher.verify(&ClearTextPassword::for_verification("fine-tuned secret"), &hashed));
    }

    #[test]
    fn test_phc_string_roundtrip() {
        let hasher = fast_hasher(None);
        let password = ClearTextPassword::new("TestPassword123!".to_string()).unwrap();
        let hashed = hasher.hash(&password).unwrap();

        let restored = HashedPassword::from_phc_string(hashed.as_phc_string()).unwrap();
        assert!(hasher.verify(&password, &restored));
        assert!(HashedPassword::from_phc_string("not_a_valid_hash").is_err());
    }

    #[test]
    fn test_needs_rehash_on_param_change() {
        let cheap = fast_hasher(None);
        let password = ClearTextPassword::new("TestPassword123!".to_string()).unwrap();
        let hashed = cheap.hash(&password).unwrap();

        assert!(!cheap.needs_rehash(&hashed));
        assert!(Argon2Hasher::with_params(None, 2048, 1, 1).unwrap().needs_rehash(&hashed));
    }

    #[test]
    fn test_debug_redaction() {
        let password = ClearTextPassword::for_verification("secret");
        let debug_output = format!("{:?}", password);
        assert!(debug_output.contains("REDACTED"));
        assert!(!debug_output.contains("secret"));

        let debug_output = format!("{:?}", fast_hasher(Some(b"pepper")));
        assert!(debug_output.contains("REDACTED"));
    }
}
