use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// In-process guard against overlapping fare check runs sharing one snapshot store.
#[derive(Debug, Clone, Default)]
pub struct RunLock {
    inner: Arc<Mutex<()>>,
}

/// Held for the duration of a run; dropping it releases the lock.
#[derive(Debug)]
pub struct RunGuard {
    _guard: OwnedMutexGuard<()>,
}

impl RunLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` when another run currently holds the lock.
    pub fn try_acquire(&self) -> Option<RunGuard> {
        self.inner
            .clone()
            .try_lock_owned()
            .ok()
            .map(|guard| RunGuard { _guard: guard })
    }
}
