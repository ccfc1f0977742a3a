//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (SHA-256, HMAC, Base64, random tokens)
//! - Password hashing (Argon2id, NIST SP 800-63B compliant)
//! - Clock and TTL key-value cache
//! - Request signatures and rate limiting infrastructure
//! - Signed temporary URLs

pub mod cache;
pub mod clock;
pub mod crypto;
pub mod password;
pub mod rate_limit;
pub mod signature;
pub mod signed_url;

#[cfg(test)]
mod tests;
