//! Process-wide registry of in-flight lock attempts

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio_util::sync::CancellationToken;

use crate::infrastructure::store::RemoteLock;

/// One in-flight or held distributed lock
///
/// Created when a caller wins the local race for a path; removed when the
/// attempt fails or the holder releases. The same instance covers both the
/// "attempt in flight" and the "held" phase.
pub(crate) struct LockInstance {
    /// Remote lock handle, exclusively owned by this instance
    pub(crate) handle: Box<dyn RemoteLock>,

    /// One-shot completion signal waking local waiters
    ///
    /// Fired exactly once, at removal time, after the registry mutex has
    /// been released. Late waiters observe a fired signal immediately.
    pub(crate) done: CancellationToken,
}

impl std::fmt::Debug for LockInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockInstance")
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl LockInstance {
    pub(crate) fn new(handle: Box<dyn RemoteLock>) -> Self {
        Self {
            handle,
            done: CancellationToken::new(),
        }
    }
}

/// Mapping from lock path to the single in-flight instance for that path
///
/// Every operation is one short critical section over the same mutex, so the
/// check-and-insert of [`claim`] cannot interleave with [`remove`]. The mutex
/// is never held across an `.await`.
///
/// [`claim`]: LockRegistry::claim
/// [`remove`]: LockRegistry::remove
#[derive(Default)]
pub(crate) struct LockRegistry {
    inner: Mutex<HashMap<String, Arc<LockInstance>>>,
}

impl LockRegistry {
    fn guard(&self) -> MutexGuard<'_, HashMap<String, Arc<LockInstance>>> {
        self.inner.lock().expect("lock registry mutex poisoned")
    }

    /// Atomically register `instance` for `path` if no attempt is in flight
    ///
    /// On contention the already-registered instance is returned instead;
    /// the caller waits on its `done` signal and claims again.
    pub(crate) fn claim(
        &self,
        path: &str,
        instance: Arc<LockInstance>,
    ) -> Result<(), Arc<LockInstance>> {
        match self.guard().entry(path.to_string()) {
            Entry::Occupied(entry) => Err(entry.get().clone()),
            Entry::Vacant(slot) => {
                slot.insert(instance);
                Ok(())
            }
        }
    }

    /// Look up the instance registered for `path`
    pub(crate) fn get(&self, path: &str) -> Option<Arc<LockInstance>> {
        self.guard().get(path).cloned()
    }

    /// Delete the entry for `path`
    ///
    /// Callers fire the instance's `done` signal only after this returns, so
    /// woken waiters re-check a map whose mutex is already free.
    pub(crate) fn remove(&self, path: &str) -> Option<Arc<LockInstance>> {
        self.guard().remove(path)
    }

    /// Whether an attempt is registered for `path`
    #[cfg(test)]
    pub(crate) fn contains(&self, path: &str) -> bool {
        self.guard().contains_key(path)
    }
}
