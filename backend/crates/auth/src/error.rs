//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::response::{IntoResponse, Response};
use http::StatusCode;
use kernel::error::{app_error::AppError, field::FieldErrors, kind::ErrorKind};
use platform::cache::CacheError;
use platform::password::PasswordHashError;
use platform::rate_limit::ThrottleStoreError;
use platform::signed_url::SignedUrlError;
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// A throttle limit tripped
    ///
    /// With `fields` empty the error is a bare rate-limit response;
    /// otherwise every listed field carries `auth.throttle`.
    #[error("Too many attempts, retry in {retry_after_secs} seconds")]
    ThrottleExceeded {
        fields: Vec<String>,
        retry_after_secs: u64,
        status: ErrorKind,
    },

    /// Field-scoped validation failure (wrong secret, duplicate identity, ...)
    #[error("The given data was invalid")]
    ValidationFailed(FieldErrors),

    /// No principal could be resolved for the guard
    #[error("Unauthenticated")]
    Unauthenticated,

    /// Endpoint requires an anonymous caller
    #[error("Already authenticated")]
    GuestRequired,

    /// Authenticated but not allowed
    #[error("This action is unauthorized")]
    ForbiddenOperation,

    /// Signed link rejected
    #[error("Invalid link: {0}")]
    InvalidLink(#[from] SignedUrlError),

    /// Token store failure
    #[error("Token store error: {0}")]
    Store(#[from] CacheError),

    /// Throttle store failure
    #[error("Throttle store error: {0}")]
    Throttle(#[from] ThrottleStoreError),

    /// Password hashing failure
    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] PasswordHashError),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Field-scoped validation error with one message
    pub fn field(field: impl Into<String>, message: &'static str) -> Self {
        AuthError::ValidationFailed(FieldErrors::single(field, message))
    }

    /// The same message on each listed field
    pub fn fields<I, S>(fields: I, message: &'static str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AuthError::ValidationFailed(FieldErrors::for_fields(fields, message))
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::ThrottleExceeded { status, .. } => *status,
            AuthError::ValidationFailed(_) => ErrorKind::UnprocessableEntity,
            AuthError::Unauthenticated => ErrorKind::Unauthorized,
            AuthError::GuestRequired
            | AuthError::ForbiddenOperation
            | AuthError::InvalidLink(_) => ErrorKind::Forbidden,
            AuthError::Store(_) | AuthError::Throttle(_) => ErrorKind::ServiceUnavailable,
            AuthError::PasswordHash(_) | AuthError::Database(_) | AuthError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Convert to AppError
    ///
    /// Auth and authorization failures stay undecorated: status plus a
    /// generic message, never the specific check that failed.
    pub fn to_app_error(&self) -> AppError {
        match self {
            AuthError::ThrottleExceeded {
                fields,
                retry_after_secs,
                status,
            } => {
                let error = if fields.is_empty() {
                    AppError::new(*status, "Too Many Attempts.")
                } else {
                    AppError::new(*status, "Too many attempts.").with_errors(
                        FieldErrors::for_fields(fields.iter().cloned(), "auth.throttle")
                            .with_param("seconds", retry_after_secs)
                            .with_param("minutes", retry_after_secs.div_ceil(60)),
                    )
                };
                error.with_retry_after(*retry_after_secs)
            }
            AuthError::ValidationFailed(errors) => AppError::validation(errors.clone()),
            AuthError::Unauthenticated => AppError::unauthorized("Unauthenticated."),
            AuthError::GuestRequired
            | AuthError::ForbiddenOperation
            | AuthError::InvalidLink(_) => AppError::forbidden("This action is unauthorized."),
            AuthError::Store(_) | AuthError::Throttle(_) => {
                AppError::service_unavailable("Service temporarily unavailable")
            }
            AuthError::PasswordHash(_) | AuthError::Database(_) | AuthError::Internal(_) => {
                AppError::internal("Internal server error")
            }
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Store(e) => {
                tracing::error!(error = %e, "Auth token store error");
            }
            AuthError::Throttle(e) => {
                tracing::error!(error = %e, "Auth throttle store error");
            }
            AuthError::PasswordHash(e) => {
                tracing::error!(error = %e, "Password hashing error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::ThrottleExceeded {
                retry_after_secs, ..
            } => {
                tracing::warn!(retry_after_secs, "Auth throttle exceeded");
            }
            AuthError::InvalidLink(e) => {
                tracing::warn!(error = %e, "Rejected signed link");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        if err.kind() == ErrorKind::UnprocessableEntity && !err.errors().is_empty() {
            return AuthError::ValidationFailed(err.errors().clone());
        }
        AuthError::Internal(err.to_string())
    }
}

impl From<FieldErrors> for AuthError {
    fn from(errors: FieldErrors) -> Self {
        AuthError::ValidationFailed(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_throttle_renders_seconds_and_minutes() {
        let err = AuthError::ThrottleExceeded {
            fields: vec!["email".into(), "password".into()],
            retry_after_secs: 61,
            status: ErrorKind::UnprocessableEntity,
        };
        let app = err.to_app_error();

        assert_eq!(app.status_code(), 422);
        assert_eq!(app.retry_after_secs(), Some(61));
        let fields: Vec<_> = app.errors().fields().collect();
        assert_eq!(fields, vec!["email", "password"]);

        let first = app.errors().iter().next().unwrap();
        assert_eq!(first.message, "auth.throttle");
        assert_eq!(first.params.get("seconds").map(String::as_str), Some("61"));
        assert_eq!(first.params.get("minutes").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_simple_throttle_is_bare_429() {
        let err = AuthError::ThrottleExceeded {
            fields: Vec::new(),
            retry_after_secs: 30,
            status: ErrorKind::TooManyRequests,
        };
        let app = err.to_app_error();
        assert_eq!(app.status_code(), 429);
        assert!(app.errors().is_empty());
        assert_eq!(app.retry_after_secs(), Some(30));
    }

    #[test]
    fn test_auth_failures_are_undecorated() {
        assert_eq!(AuthError::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::GuestRequired.status_code(), StatusCode::FORBIDDEN);

        let link = AuthError::InvalidLink(SignedUrlError::Expired).to_app_error();
        assert_eq!(link.status_code(), 403);
        assert!(!link.message().contains("expired"));
    }

    #[test]
    fn test_infrastructure_errors_are_not_validation_errors() {
        let err = AuthError::from(CacheError::Unavailable("down".into()));
        assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
        assert!(err.to_app_error().errors().is_empty());
    }

    #[test]
    fn test_validation_keeps_field_order() {
        let err = AuthError::from(
            FieldErrors::new()
                .with("name", "validation.required")
                .with("email", "validation.email"),
        );
        let app = err.to_app_error();
        assert_eq!(app.errors().fields().collect::<Vec<_>>(), vec!["name", "email"]);
    }
}
