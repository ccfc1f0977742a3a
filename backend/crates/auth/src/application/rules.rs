//! Input rules per workflow
//!
//! Declared with the rule-set composer; the wire form is what an external
//! validator receives, the predicate entries run in
//! [`check_rules`](crate::application::pipeline::check_rules).

use kernel::validation::{EmailOptions, FieldRules, RuleSet};
use platform::password::{MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};
use serde_json::Value;

use crate::application::config::AuthConfig;
use crate::domain::value_object::guard::Guard;

/// Maximum `name` length
pub const NAME_MAX: i64 = 255;
/// Maximum `email` length
pub const EMAIL_MAX: i64 = 254;
/// Verification code length
pub const CODE_LENGTH: u32 = 6;

fn email_options(config: &AuthConfig) -> EmailOptions {
    if config.strict_email_rules() {
        EmailOptions::default()
    } else {
        EmailOptions::lenient()
    }
}

fn email(config: &AuthConfig) -> RuleSet {
    RuleSet::new().string(EMAIL_MAX).email(email_options(config))
}

fn new_password() -> RuleSet {
    RuleSet::new()
        .string(MAX_PASSWORD_LENGTH as i64)
        .password_rule(MIN_PASSWORD_LENGTH as i64)
        .confirmed()
}

fn locale(config: &AuthConfig) -> RuleSet {
    let supported = config.supported_locales.clone();
    RuleSet::new()
        .sometimes()
        .nullable()
        .string(16)
        .callback_with_message(
            move |value, _| {
                value
                    .as_str()
                    .is_some_and(|l| supported.iter().any(|s| s == l))
            },
            "validation.in",
        )
}

fn is_code(value: &Value, _: &str) -> bool {
    value
        .as_str()
        .is_some_and(|s| s.len() == CODE_LENGTH as usize && s.bytes().all(|b| b.is_ascii_digit()))
}

pub fn register(config: &AuthConfig, guard: &Guard) -> FieldRules {
    FieldRules::new()
        .field("name", RuleSet::new().required().string(NAME_MAX))
        .field(
            "email",
            email(config)
                .required()
                .unique(guard.as_str(), "email", None::<&str>, None, &[]),
        )
        .field("password", new_password().required())
        .field("remember", RuleSet::new().sometimes().boolean())
        .field("locale", locale(config))
}

/// `has_new_password` makes `current_password` required
pub fn update_me(config: &AuthConfig, guard: &Guard, me: &str, has_new_password: bool) -> FieldRules {
    FieldRules::new()
        .field("name", RuleSet::new().sometimes().filled().string(NAME_MAX))
        .field(
            "email",
            email(config)
                .sometimes()
                .filled()
                .unique(guard.as_str(), "email", me, Some("id"), &[]),
        )
        .field("password", new_password().sometimes().filled())
        .field(
            "current_password",
            RuleSet::new()
                .when(has_new_password, |r| r.required())
                .current_password(Some(guard.as_str())),
        )
        .field("locale", locale(config))
}

pub fn password_check() -> FieldRules {
    FieldRules::new().field("password", RuleSet::new().nullable().string(MAX_PASSWORD_LENGTH as i64))
}

pub fn password_forgot(config: &AuthConfig) -> FieldRules {
    FieldRules::new().field("email", email(config).required())
}

pub fn password_reset(config: &AuthConfig) -> FieldRules {
    FieldRules::new()
        .field("token", RuleSet::new().required().string(255))
        .field("email", email(config).required())
        .field("password", new_password().required())
}

pub fn verify_email() -> FieldRules {
    FieldRules::new()
        .field("id", RuleSet::new().required().uuid())
        .field("hash", RuleSet::new().required().char(64))
}

pub fn email_confirmation(config: &AuthConfig) -> FieldRules {
    FieldRules::new().field("email", email(config).required())
}

pub fn confirm_email(config: &AuthConfig) -> FieldRules {
    FieldRules::new()
        .field("email", email(config).required())
        .field(
            "code",
            RuleSet::new()
                .required()
                .bail()
                .digits(CODE_LENGTH)
                .callback_with_message(is_code, "validation.digits"),
        )
}

pub fn remember_login() -> FieldRules {
    FieldRules::new()
        .field("id", RuleSet::new().required().uuid())
        .field("token", RuleSet::new().required().string(255))
}
