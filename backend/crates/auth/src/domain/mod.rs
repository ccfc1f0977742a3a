//! Domain Layer
//!
//! Contains entities, value objects, repository traits, events and
//! notification contracts.

pub mod entity;
pub mod event;
pub mod notification;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{auth_session::AuthSession, principal::Principal};
pub use event::{AuthEvent, EventDispatcher};
pub use notification::{Notification, Notifier, Recipient};
pub use repository::{AuthRepository, PrincipalRepository, SessionRepository};
