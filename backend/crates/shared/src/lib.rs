//! Shared Kernel - Vocabulary shared by every auth crate
//!
//! Holds the pieces whose meaning never changes between domains:
//! - Unified error types, field-scoped validation errors, result aliases
//! - Typed identifiers (`Id<T>`)
//! - The validation rule-set composer used to declare input rules
//!
//! Nothing in here performs I/O.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod field;
    pub mod kind;
}
pub mod id;
pub mod validation;
