//! Application Configuration
//!
//! Configuration for the Auth application layer. Passed explicitly at
//! construction; nothing here is global.

use std::time::Duration;

use platform::rate_limit::ThrottleConfig;

use crate::domain::value_object::guard::Guard;

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Environment {
    #[display("production")]
    Production,
    #[display("staging")]
    Staging,
    #[display("local")]
    Local,
    #[display("testing")]
    Testing,
}

/// Throttle limits, one per workflow
#[derive(Debug, Clone, Copy)]
pub struct ThrottleLimits {
    pub register: ThrottleConfig,
    pub update_me: ThrottleConfig,
    /// Password checks (logout other devices, account deletion)
    pub password: ThrottleConfig,
    pub password_forgot: ThrottleConfig,
    pub password_reset: ThrottleConfig,
    pub email_verification: ThrottleConfig,
    pub email_confirmation: ThrottleConfig,
    pub email_confirmation_confirm: ThrottleConfig,
    pub remember: ThrottleConfig,
}

impl Default for ThrottleLimits {
    fn default() -> Self {
        let sensitive = ThrottleConfig::per_minutes(15, 5);
        Self {
            register: sensitive,
            update_me: sensitive,
            password: sensitive,
            password_forgot: sensitive,
            password_reset: sensitive,
            email_verification: ThrottleConfig::default(),
            email_confirmation: ThrottleConfig::default(),
            email_confirmation_confirm: sensitive,
            remember: sensitive,
        }
    }
}

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub environment: Environment,
    /// Secret for signed URLs (32 bytes)
    pub url_secret: [u8; 32],
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    pub throttle: ThrottleLimits,
    /// Raise bare 429 errors instead of field-scoped `auth.throttle` messages
    pub simple_throttle: bool,
    /// Session TTL without "Remember Me" (12 hours)
    pub session_ttl_short: Duration,
    /// Session TTL with "Remember Me" (1 week)
    pub session_ttl_long: Duration,
    /// Email confirmation code lifetime
    pub verification_code_ttl: Duration,
    /// Password reset token lifetime
    pub password_reset_ttl: Duration,
    /// Minimum delay between two reset tokens for one address
    pub reset_resend_throttle: Duration,
    /// Signed verification link lifetime
    pub verification_link_ttl: Duration,
    /// Path of the email verification endpoint
    pub verification_path: String,
    /// Code accepted without issuance outside production
    pub verification_bypass_code: String,
    /// Guards whose principals must verify their email
    pub verifying_guards: Vec<Guard>,
    /// Accepted `locale` values
    pub supported_locales: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Production,
            url_secret: [0u8; 32],
            password_pepper: None,
            throttle: ThrottleLimits::default(),
            simple_throttle: false,
            session_ttl_short: Duration::from_secs(12 * 3600), // 12 hours
            session_ttl_long: Duration::from_secs(7 * 24 * 3600), // 1 week
            verification_code_ttl: Duration::from_secs(60 * 60),
            password_reset_ttl: Duration::from_secs(60 * 60),
            reset_resend_throttle: Duration::from_secs(60),
            verification_link_ttl: Duration::from_secs(60 * 60),
            verification_path: "/email/verify".to_string(),
            verification_bypass_code: "111111".to_string(),
            verifying_guards: vec![Guard::users()],
            supported_locales: vec!["en".to_string()],
        }
    }
}

impl AuthConfig {
    /// Create config with a random URL secret
    pub fn with_random_secret() -> Self {
        use rand::RngCore;
        let mut secret = [0u8; 32];
        rand::rng().fill_bytes(&mut secret);
        Self {
            url_secret: secret,
            ..Default::default()
        }
    }

    /// Create config for local development (bypass code enabled)
    pub fn development() -> Self {
        Self {
            environment: Environment::Local,
            ..Self::with_random_secret()
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// The verification bypass code, when the environment allows one
    pub fn verification_bypass(&self) -> Option<&str> {
        if self.is_production() || self.verification_bypass_code.is_empty() {
            None
        } else {
            Some(&self.verification_bypass_code)
        }
    }

    /// Whether email rules include DNS/spoof checks
    pub fn strict_email_rules(&self) -> bool {
        !matches!(self.environment, Environment::Local | Environment::Testing)
    }

    pub fn must_verify_email(&self, guard: &Guard) -> bool {
        self.verifying_guards.contains(guard)
    }

    pub fn supports_locale(&self, locale: &str) -> bool {
        self.supported_locales.iter().any(|l| l == locale)
    }

    /// Get session TTL in milliseconds
    pub fn session_ttl_short_ms(&self) -> i64 {
        self.session_ttl_short.as_millis() as i64
    }

    /// Get session TTL with Remember Me in milliseconds
    pub fn session_ttl_long_ms(&self) -> i64 {
        self.session_ttl_long.as_millis() as i64
    }

    pub fn session_ttl(&self, remember: bool) -> chrono::Duration {
        chrono::Duration::milliseconds(if remember {
            self.session_ttl_long_ms()
        } else {
            self.session_ttl_short_ms()
        })
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bypass_never_in_production() {
        let config = AuthConfig::default();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.verification_bypass(), None);

        let dev = AuthConfig::development();
        assert_eq!(dev.verification_bypass(), Some("111111"));
    }

    #[test]
    fn test_empty_bypass_disables_it() {
        let config = AuthConfig {
            verification_bypass_code: String::new(),
            ..AuthConfig::development()
        };
        assert_eq!(config.verification_bypass(), None);
    }

    #[test]
    fn test_strict_email_rules_per_environment() {
        assert!(AuthConfig::default().strict_email_rules());
        assert!(!AuthConfig::development().strict_email_rules());
        let staging = AuthConfig {
            environment: Environment::Staging,
            ..AuthConfig::default()
        };
        assert!(staging.strict_email_rules());
        assert_eq!(staging.environment.to_string(), "staging");
    }

    #[test]
    fn test_default_limits() {
        let limits = ThrottleLimits::default();
        assert_eq!(limits.register.max_attempts, 5);
        assert_eq!(limits.register.decay, Duration::from_secs(15 * 60));
        assert_eq!(limits.email_verification.max_attempts, 3);
    }

    #[test]
    fn test_random_secret_differs() {
        let a = AuthConfig::with_random_secret();
        let b = AuthConfig::with_random_secret();
        assert_ne!(a.url_secret, b.url_secret);
        assert!(a.must_verify_email(&Guard::users()));
        assert!(!a.must_verify_email(&Guard::new("admins")));
    }

    #[test]
    fn test_session_ttl() {
        let config = AuthConfig::default();
        assert_eq!(config.session_ttl(false), chrono::Duration::hours(12));
        assert_eq!(config.session_ttl(true), chrono::Duration::days(7));
    }
}
