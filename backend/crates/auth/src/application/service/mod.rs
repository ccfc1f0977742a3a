//! Application services shared by the use cases

pub mod credential_validator;
pub mod locks;
pub mod remember_token;
pub mod session_invalidator;
pub mod token_broker;

pub use credential_validator::{CredentialValidator, SuppliedSecret};
pub use locks::PrincipalLocks;
pub use remember_token::RememberTokenCycler;
pub use session_invalidator::SessionInvalidator;
pub use token_broker::{TokenBroker, TokenKind};
