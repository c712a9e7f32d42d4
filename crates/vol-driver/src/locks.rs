//! Per-target serialization
//!
//! The appliance offers no compare-and-swap, so any sequence that reads
//! target or LUN state and then acts on it must hold the target's lock for
//! its whole duration. Operations on distinct targets do not contend.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Async mutex map keyed on target name
#[derive(Debug, Default)]
pub struct TargetLockMap {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl TargetLockMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `target`, creating it on first use.
    ///
    /// The guard is owned so callers can hold it across await points for
    /// the full multi-step sequence.
    pub async fn lock(&self, target: &str) -> OwnedMutexGuard<()> {
        let entry = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(target.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        entry.lock_owned().await
    }
}
