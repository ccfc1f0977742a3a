//! Per-principal serialization
//!
//! Validation-read, write and remember-token cycling of one principal run
//! under one async mutex so concurrent requests cannot interleave them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use kernel::id::PrincipalId;
use tokio::sync::OwnedMutexGuard;

#[derive(Debug, Default)]
pub struct PrincipalLocks {
    slots: Mutex<HashMap<PrincipalId, Arc<tokio::sync::Mutex<()>>>>,
}

impl PrincipalLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `principal_id`
    pub async fn lock(&self, principal_id: PrincipalId) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self
                .slots
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            // Slots nobody holds or waits for can go
            slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            slots.entry(principal_id).or_default().clone()
        };
        slot.lock_owned().await
    }

    /// Number of principals currently locked or awaited
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .map(|slots| slots.len())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_principal_is_serialized() {
        let locks = Arc::new(PrincipalLocks::new());
        let id = PrincipalId::new();
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            let inside = inside.clone();
            let max_inside = max_inside.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.lock(id).await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_inside.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_different_principals_do_not_block() {
        let locks = PrincipalLocks::new();
        let _a = locks.lock(PrincipalId::new()).await;
        let _b = locks.lock(PrincipalId::new()).await;
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn test_released_slots_are_pruned() {
        let locks = PrincipalLocks::new();
        drop(locks.lock(PrincipalId::new()).await);
        let _held = locks.lock(PrincipalId::new()).await;
        assert_eq!(locks.len(), 1);
    }
}
