//! Remember-Token Cycler
//!
//! Rotating the remember token invalidates every "remember me" cookie
//! issued before the rotation.

use crate::domain::entity::principal::Principal;

#[derive(Debug, Default, Clone, Copy)]
pub struct RememberTokenCycler;

impl RememberTokenCycler {
    pub fn new() -> Self {
        Self
    }

    /// Give `principal` a fresh remember token
    ///
    /// The caller persists the principal.
    pub fn cycle(&self, principal: &mut Principal) {
        principal.cycle_remember_token();
        tracing::debug!(principal_id = %principal.id, "Remember token cycled");
    }

    /// Give `principal` a remember token unless it already has one
    ///
    /// ## Returns
    /// Whether a token was created
    pub fn ensure(&self, principal: &mut Principal) -> bool {
        if principal.remember_token.is_some() {
            return false;
        }
        self.cycle(principal);
        true
    }
}
