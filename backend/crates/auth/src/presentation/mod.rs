//! Presentation Layer
//!
//! Request DTOs and the public `MeResource` representation.

pub mod dto;

pub use dto::{MeAttributes, MeResource};
