//! Credential Validator
//!
//! Checks a supplied secret against a principal's stored hash. Whether an
//! absent secret is acceptable is the caller's decision: the validator
//! treats [`SuppliedSecret::Absent`] as vacuously valid.

use std::sync::Arc;

use platform::password::{ClearTextPassword, SecretHasher};

use crate::domain::entity::principal::Principal;

/// A secret presented with a request
#[derive(Debug)]
pub enum SuppliedSecret {
    /// Nothing (or an empty string) was supplied
    Absent,
    Present(ClearTextPassword),
}

impl SuppliedSecret {
    /// Empty input counts as absent
    pub fn from_input(input: Option<&str>) -> Self {
        match input {
            Some(secret) if !secret.is_empty() => {
                SuppliedSecret::Present(ClearTextPassword::for_verification(secret))
            }
            _ => SuppliedSecret::Absent,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, SuppliedSecret::Absent)
    }

    pub fn as_clear_text(&self) -> Option<&ClearTextPassword> {
        match self {
            SuppliedSecret::Absent => None,
            SuppliedSecret::Present(secret) => Some(secret),
        }
    }
}

#[derive(Clone)]
pub struct CredentialValidator {
    hasher: Arc<dyn SecretHasher>,
}

impl CredentialValidator {
    pub fn new(hasher: Arc<dyn SecretHasher>) -> Self {
        Self { hasher }
    }

    /// `true` when the secret matches, or when none was supplied
    ///
    /// A principal without a stored hash never validates a present secret.
    pub fn validate(&self, principal: &Principal, secret: &SuppliedSecret) -> bool {
        let SuppliedSecret::Present(secret) = secret else {
            return true;
        };

        principal
            .password
            .as_ref()
            .is_some_and(|hash| hash.verify(secret, self.hasher.as_ref()))
    }

    pub fn hasher(&self) -> &dyn SecretHasher {
        self.hasher.as_ref()
    }
}

impl std::fmt::Debug for CredentialValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialValidator").finish_non_exhaustive()
    }
}
