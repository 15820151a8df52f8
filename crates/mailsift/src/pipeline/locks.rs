//! One async mutex per owner.
//!
//! Work for the same owner is serialized; different owners never contend
//! beyond the brief map lookup.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Held for the duration of an owner-scoped operation. Dropping it releases
/// the owner.
pub type OwnerGuard = OwnedMutexGuard<()>;

#[derive(Clone, Default)]
pub struct OwnerLocks {
    locks: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl OwnerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, owner: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(
            locks
                .entry(owner.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
        )
    }

    /// Waits until no other task holds `owner`.
    pub async fn acquire(&self, owner: &str) -> OwnerGuard {
        self.lock_for(owner).lock_owned().await
    }

    /// Number of owners seen so far.
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .map(|locks| locks.len())
            .unwrap_or_else(|poisoned| poisoned.into_inner().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
