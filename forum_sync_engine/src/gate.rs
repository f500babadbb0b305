//! A single process-wide critical section.
//!
//! Every clone of a [`ConcurrencyGate`] shares the same lock, so holding the guard from any clone excludes all other
//! holders. The lock is released when the guard is dropped, which covers early returns, errors and cancelled futures.
use std::sync::Arc;

use log::*;
use tokio::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Default)]
pub struct ConcurrencyGate {
    lock: Arc<Mutex<()>>,
}

pub struct GateGuard<'a> {
    _guard: MutexGuard<'a, ()>,
}

impl ConcurrencyGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no one else holds the gate, and returns a guard that keeps it closed until dropped.
    pub async fn enter(&self) -> GateGuard<'_> {
        let guard = self.lock.lock().await;
        trace!("🔄️ Gate entered");
        GateGuard { _guard: guard }
    }

    pub fn is_held(&self) -> bool {
        self.lock.try_lock().is_err()
    }
}
