//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Principals, sessions, events, notifications, repository traits
//! - `application/` - Use cases, the shared pipeline steps and services
//! - `infra/` - PostgreSQL and in-memory implementations
//! - `presentation/` - Request DTOs and the public `MeResource`
//!
//! ## Features
//! - Registration, profile and credential updates per guard
//! - Logout of other devices with remember-token rotation
//! - Password forgot/reset with single-use reset tokens
//! - Email verification (signed links) and confirmation (6-digit codes)
//! - Account deletion and "remember me" logins
//!
//! ## Security Model
//! - Passwords hashed with Argon2id (NIST SP 800-63B compliant)
//! - Every sensitive workflow throttled by request signature
//! - Tokens stored as digests and consumed atomically
//! - Writes for one principal serialized in-process

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use application::{AuthContext, AuthServices};
pub use error::{AuthError, AuthResult};
pub use infra::{MemoryAuthRepository, PgAuthRepository, PgCacheStore};
pub use presentation::MeResource;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod store {
    pub use crate::infra::postgres::PgAuthRepository as AuthStore;
}
