//! Auth Action Pipeline
//!
//! Shared steps of every workflow: guard-state checks, request signatures,
//! throttling and input checks. The use cases compose these in the order
//! throttle, validate, mutate, side effects, respond.

use kernel::error::{
    field::{FieldError, FieldErrors},
    kind::ErrorKind,
};
use kernel::id::{PrincipalId, SessionId};
use kernel::validation::{FieldRules, RuleKind};
use platform::password::PasswordPolicyError;
use platform::rate_limit::{Limit, ThrottleTicket};
use platform::signature::{ClientInfo, RequestSignature, SignatureSubject};
use serde_json::Value;

use crate::application::services::{AuthCache, AuthServices};
use crate::domain::entity::principal::Principal;
use crate::domain::event::AuthEvent;
use crate::domain::repository::AuthRepository;
use crate::domain::value_object::{email::EmailError, guard::Guard, name::NameError, user_password};
use crate::error::{AuthError, AuthResult};

// ============================================================================
// Request context
// ============================================================================

/// Who is calling, as resolved by the session layer
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub guard: Guard,
    pub principal_id: Option<PrincipalId>,
    pub session_id: Option<SessionId>,
    pub client: ClientInfo,
}

impl AuthContext {
    pub fn guest(guard: Guard, client: ClientInfo) -> Self {
        Self {
            guard,
            principal_id: None,
            session_id: None,
            client,
        }
    }

    pub fn authenticated(
        guard: Guard,
        principal_id: PrincipalId,
        session_id: Option<SessionId>,
        client: ClientInfo,
    ) -> Self {
        Self {
            guard,
            principal_id: Some(principal_id),
            session_id,
            client,
        }
    }

    pub fn is_guest(&self) -> bool {
        self.principal_id.is_none()
    }
}

// ============================================================================
// Field errors from value objects
// ============================================================================

/// Conversion of a value-object error into a field-scoped message
pub trait IntoFieldError {
    fn into_field_error(self, field: &str) -> FieldError;
}

impl IntoFieldError for EmailError {
    fn into_field_error(self, field: &str) -> FieldError {
        let error = FieldError::new(field, self.message_key());
        match self {
            EmailError::TooLong => error.with_param("max", 254),
            _ => error,
        }
    }
}

impl IntoFieldError for NameError {
    fn into_field_error(self, field: &str) -> FieldError {
        let error = FieldError::new(field, self.message_key());
        match self {
            NameError::TooLong => error.with_param("max", 255),
            _ => error,
        }
    }
}

impl IntoFieldError for PasswordPolicyError {
    fn into_field_error(self, field: &str) -> FieldError {
        let (message, param) = user_password::policy_message(&self);
        let error = FieldError::new(field, message);
        match param {
            Some((key, value)) => error.with_param(key, value),
            None => error,
        }
    }
}

/// Keep the value, or record its error under `field`
///
/// A field that already failed an input rule keeps only that message.
pub fn parse_field<T, E: IntoFieldError>(
    errors: &mut FieldErrors,
    field: &str,
    result: Result<T, E>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            if !errors.fields().any(|f| f == field) {
                errors.push(e.into_field_error(field));
            }
            None
        }
    }
}

/// JSON view of a use-case input, as the input rules see it
pub fn payload<T: serde::Serialize>(input: &T) -> AuthResult<Value> {
    serde_json::to_value(input).map_err(|e| AuthError::Internal(e.to_string()))
}

/// Errors collected so far, or `Ok`
pub fn finish(errors: FieldErrors) -> AuthResult<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AuthError::ValidationFailed(errors))
    }
}

// ============================================================================
// Input rules
// ============================================================================

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

/// Check the presence modifiers, the conditional `exclude`, `prohibited`
/// and `required` entries, `confirmed` and every predicate rule
///
/// Format rules (`email`, `string`, ...) are enforced by the value
/// objects the use cases build from the same input.
pub fn check_rules(rules: &FieldRules, payload: &Value) -> FieldErrors {
    let mut errors = FieldErrors::new();

    for (field, set) in rules.iter() {
        let raw = payload.get(field);
        let value = raw.unwrap_or(&Value::Null);

        if set.has_rule(RuleKind::Exclude) {
            continue;
        }

        if set.has_rule(RuleKind::Prohibited) {
            if is_present(value) {
                errors.push(FieldError::new(field, "validation.prohibited"));
            }
            continue;
        }

        if !is_present(value) {
            if set.is_required() || set.has_rule(RuleKind::Required) {
                errors.push(FieldError::new(field, "validation.required"));
            } else if set.is_filled() && raw.is_some_and(|v| !v.is_null()) {
                errors.push(FieldError::new(field, "validation.filled"));
            }
            continue;
        }

        let mut failed = false;

        if set.has_rule(RuleKind::Confirmed) {
            let confirmation = payload.get(format!("{field}_confirmation"));
            if confirmation != Some(value) {
                errors.push(FieldError::new(field, "validation.confirmed"));
                failed = true;
            }
        }

        if failed && set.is_bail() {
            continue;
        }

        for message in set.failing_callbacks(value, field) {
            errors.push(FieldError::new(field, message));
            if set.is_bail() {
                break;
            }
        }
    }

    errors
}

// ============================================================================
// Pipeline steps
// ============================================================================

impl<R: AuthRepository, C: AuthCache> AuthServices<R, C> {
    /// Reject authenticated callers
    pub fn require_guest(&self, ctx: &AuthContext) -> AuthResult<()> {
        if ctx.is_guest() {
            Ok(())
        } else {
            Err(AuthError::GuestRequired)
        }
    }

    /// The authenticated principal of `ctx`
    ///
    /// A context carrying a session id is only accepted while that session
    /// is live and belongs to the principal.
    pub async fn resolve_me(&self, ctx: &AuthContext) -> AuthResult<Principal> {
        let principal_id = ctx.principal_id.ok_or(AuthError::Unauthenticated)?;

        if let Some(session_id) = ctx.session_id {
            let live = self.repo.find_session(session_id).await?.is_some_and(|s| {
                s.principal_id == principal_id
                    && s.guard == ctx.guard
                    && !s.is_expired(self.clock.now_ms())
            });
            if !live {
                return Err(AuthError::Unauthenticated);
            }
        }

        self.repo
            .find_principal(&ctx.guard, principal_id)
            .await?
            .ok_or(AuthError::Unauthenticated)
    }

    /// Request signature seeded with the client metadata
    pub fn signature(
        &self,
        namespace: &str,
        ctx: &AuthContext,
        principal: Option<&Principal>,
    ) -> RequestSignature {
        RequestSignature::for_client(namespace, &ctx.client)
            .data("guard", ctx.guard.as_str())
            .principal(principal.map(|p| p as &dyn SignatureSubject))
    }

    /// Builds the error raised when a limit trips
    ///
    /// With `simple_throttle` set the error is a bare 429; otherwise each
    /// of `fields` carries `auth.throttle` and the response uses `status`.
    pub fn on_trip(&self, fields: &[&str], status: ErrorKind) -> impl FnOnce(u64) -> AuthError {
        let (fields, status) = if self.config.simple_throttle {
            (Vec::new(), ErrorKind::TooManyRequests)
        } else {
            (fields.iter().map(|f| f.to_string()).collect(), status)
        };

        move |retry_after_secs| AuthError::ThrottleExceeded {
            fields,
            retry_after_secs,
            status,
        }
    }

    /// Reserve one attempt against every limit
    pub async fn throttle(
        &self,
        limits: &[Limit],
        fields: &[&str],
        status: ErrorKind,
    ) -> AuthResult<ThrottleTicket<C>> {
        self.gate
            .attempt_all(limits, self.on_trip(fields, status))
            .await
    }

    /// Like [`AuthServices::throttle`], firing `Lockout` on a trip
    pub async fn throttle_credentials(
        &self,
        guard: &Guard,
        limits: &[Limit],
        fields: &[&str],
        status: ErrorKind,
    ) -> AuthResult<ThrottleTicket<C>> {
        let result = self.throttle(limits, fields, status).await;
        if let Err(AuthError::ThrottleExceeded { .. }) = &result {
            self.events.fire(AuthEvent::Lockout {
                guard: guard.clone(),
            });
        }
        result
    }

    /// Record a rejected secret
    ///
    /// The attempt stays counted, `Failed` fires and the caller gets
    /// `message` on `field`.
    pub fn reject_secret(
        &self,
        ticket: ThrottleTicket<C>,
        principal: Option<&Principal>,
        guard: &Guard,
        field: &str,
        message: &'static str,
    ) -> AuthError {
        ticket.hit();
        self.events.fire(AuthEvent::Failed {
            guard: guard.clone(),
            principal_id: principal.map(|p| p.id),
        });
        tracing::warn!(
            principal_id = ?principal.map(|p| p.id),
            guard = %guard,
            field,
            "Secret rejected"
        );
        AuthError::field(field, message)
    }

    /// Hand the reserved attempt back and surface `error`
    ///
    /// For failures that must not count against the limit (malformed
    /// input).
    pub async fn refund<T>(&self, ticket: ThrottleTicket<C>, error: AuthError) -> AuthResult<T> {
        ticket.release().await?;
        Err(error)
    }

    /// Finish the validate step: refund the attempt when input failed
    pub async fn settle_input(
        &self,
        ticket: ThrottleTicket<C>,
        errors: FieldErrors,
    ) -> AuthResult<ThrottleTicket<C>> {
        match finish(errors) {
            Ok(()) => Ok(ticket),
            Err(e) => self.refund(ticket, e).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::validation::RuleSet;
    use serde_json::json;

    fn rules() -> FieldRules {
        FieldRules::new()
            .field("name", RuleSet::new().required().string(255))
            .field("password", RuleSet::new().sometimes().filled().confirmed())
            .field(
                "code",
                RuleSet::new()
                    .sometimes()
                    .bail()
                    .callback_with_message(|v, _| v.as_str().is_some_and(|s| s.len() == 6), "validation.digits")
                    .callback(|v, _| v.as_str().is_some_and(|s| s.chars().all(|c| c.is_ascii_digit()))),
            )
    }

    #[test]
    fn test_required_missing_and_blank() {
        let errors = check_rules(&rules(), &json!({}));
        assert!(errors.contains("name", "validation.required"));
        assert_eq!(errors.len(), 1);

        let errors = check_rules(&rules(), &json!({ "name": "   " }));
        assert!(errors.contains("name", "validation.required"));
    }

    #[test]
    fn test_filled_only_when_key_present() {
        let errors = check_rules(&rules(), &json!({ "name": "x", "password": "" }));
        assert!(errors.contains("password", "validation.filled"));

        let errors = check_rules(&rules(), &json!({ "name": "x", "password": null }));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_confirmed() {
        let payload = json!({ "name": "x", "password": "a", "password_confirmation": "b" });
        assert!(check_rules(&rules(), &payload).contains("password", "validation.confirmed"));

        let payload = json!({ "name": "x", "password": "a", "password_confirmation": "a" });
        assert!(check_rules(&rules(), &payload).is_empty());
    }

    #[test]
    fn test_bail_stops_at_first_failing_callback() {
        let errors = check_rules(&rules(), &json!({ "name": "x", "code": "12a" }));
        assert_eq!(errors.messages_for("code").collect::<Vec<_>>(), vec!["validation.digits"]);
    }

    #[test]
    fn test_conditional_entries_apply_while_met() {
        let rules = |invited: bool| {
            FieldRules::new()
                .field("code", RuleSet::new().required_if_rule(invited))
                .field("referrer", RuleSet::new().prohibited_if_rule(invited))
                .field("name", RuleSet::new().required().exclude_if_rule(invited))
        };

        let errors = check_rules(&rules(true), &json!({ "referrer": "bob" }));
        assert!(errors.contains("code", "validation.required"));
        assert!(errors.contains("referrer", "validation.prohibited"));
        assert_eq!(errors.len(), 2);

        let errors = check_rules(&rules(false), &json!({ "referrer": "bob" }));
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["name"]);
    }

    #[test]
    fn test_errors_follow_field_order() {
        let payload = json!({ "password": "a", "code": "1" });
        let errors = check_rules(&rules(), &payload);
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["name", "password", "code"]
        );
    }

    #[test]
    fn test_parse_field_keeps_rule_message() {
        let mut errors = FieldErrors::single("email", "validation.required");
        let email = parse_field(
            &mut errors,
            "email",
            crate::domain::value_object::email::Email::new(""),
        );
        assert!(email.is_none());
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_parse_field_records_error() {
        let mut errors = FieldErrors::new();
        let email = parse_field(
            &mut errors,
            "email",
            crate::domain::value_object::email::Email::new("nope"),
        );
        assert!(email.is_none());
        assert!(errors.contains("email", "validation.email"));
        assert!(finish(errors).is_err());
    }

    #[test]
    fn test_context() {
        let ctx = AuthContext::guest(Guard::users(), ClientInfo::default());
        assert!(ctx.is_guest());
        let ctx = AuthContext::authenticated(Guard::users(), PrincipalId::new(), None, ClientInfo::default());
        assert!(!ctx.is_guest());
    }
}
