//! Value Object Module

pub mod email;
pub mod guard;
pub mod name;
pub mod remember_token;
pub mod user_password;
