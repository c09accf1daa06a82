//! Caller-facing lock handle

use std::fmt;

use tracing::warn;

use super::manager::LockManager;
use super::types::LockResult;

/// Handle to an acquired distributed lock
///
/// Returned by [`LockManager::lock`]; its only operation is
/// [`unlock`](LockDescriptor::unlock). Dropping a descriptor without
/// unlocking logs a warning and leaves the remote lock to the store's
/// session expiry; release is async and fallible, so it cannot run in
/// `Drop`.
pub struct LockDescriptor {
    manager: LockManager,
    lock_path: String,
    released: bool,
}

impl LockDescriptor {
    pub(crate) fn new(manager: LockManager, lock_path: String) -> Self {
        Self {
            manager,
            lock_path,
            released: false,
        }
    }

    /// The canonical lock path this descriptor holds
    pub fn lock_path(&self) -> &str {
        &self.lock_path
    }

    /// Release the lock
    ///
    /// Local bookkeeping is cleaned up unconditionally; an error from the
    /// store's release call is still returned for visibility.
    pub async fn unlock(mut self) -> LockResult<()> {
        self.released = true;
        self.manager.unlock_path(&self.lock_path).await
    }
}

impl Drop for LockDescriptor {
    fn drop(&mut self) {
        if !self.released {
            warn!(
                lock_path = %self.lock_path,
                "lock descriptor dropped without unlock; the distributed lock stays held until the store session lapses"
            );
        }
    }
}

impl fmt::Debug for LockDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockDescriptor")
            .field("lock_path", &self.lock_path)
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for LockDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lock[{}]", self.lock_path)
    }
}
