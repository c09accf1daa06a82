//! In-process coordination store
//!
//! `MemoryStore` implements the [`CoordinationStore`] contract entirely in
//! process memory: an explicit directory set, and per-key mutual exclusion
//! with the session-style semantics the lock manager expects from a real
//! backend. Grants for one key are sequential; `acquire` parks until the
//! previous holder releases. Used by tests and local development.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;

use super::{CoordinationStore, RemoteLock, StoreError, StoreResult};

/// Slot serializing holders of one lock key
type KeySlot = Arc<AsyncMutex<()>>;

#[derive(Default)]
struct Inner {
    dirs: RwLock<HashSet<String>>,
    slots: Mutex<HashMap<String, KeySlot>>,
    held: Mutex<HashMap<String, String>>,
}

/// In-memory coordination store with session-style mutual exclusion per key
///
/// Clones share state, so several managers (or several handles) built from
/// clones of one store contend for the same keys.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a directory so [`CoordinationStore::dir_exists`] reports it
    pub fn create_dir(&self, dir_path: impl Into<String>) {
        self.inner
            .dirs
            .write()
            .expect("dirs lock poisoned")
            .insert(dir_path.into());
    }

    /// Remove a previously registered directory
    pub fn remove_dir(&self, dir_path: &str) {
        self.inner
            .dirs
            .write()
            .expect("dirs lock poisoned")
            .remove(dir_path);
    }

    /// The contents stored by the current holder of `key`, if any
    pub fn held_contents(&self, key: &str) -> Option<String> {
        self.inner
            .held
            .lock()
            .expect("held lock poisoned")
            .get(key)
            .cloned()
    }
}

#[async_trait]
impl CoordinationStore for MemoryStore {
    async fn dir_exists(&self, dir_path: &str) -> StoreResult<bool> {
        Ok(self
            .inner
            .dirs
            .read()
            .expect("dirs lock poisoned")
            .contains(dir_path))
    }

    async fn prepare_lock(&self, key: &str, contents: &str) -> StoreResult<Box<dyn RemoteLock>> {
        let slot = {
            let mut slots = self.inner.slots.lock().expect("slots lock poisoned");
            slots.entry(key.to_string()).or_default().clone()
        };

        Ok(Box::new(MemoryLock {
            key: key.to_string(),
            contents: contents.to_string(),
            slot,
            store: self.inner.clone(),
            guard: AsyncMutex::new(None),
        }))
    }
}

/// Handle to one lock attempt against a [`MemoryStore`]
struct MemoryLock {
    key: String,
    contents: String,
    slot: KeySlot,
    store: Arc<Inner>,
    guard: AsyncMutex<Option<OwnedMutexGuard<()>>>,
}

#[async_trait]
impl RemoteLock for MemoryLock {
    async fn acquire(&self, cancel: &CancellationToken) -> StoreResult<()> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(StoreError::Canceled),
            guard = self.slot.clone().lock_owned() => {
                *self.guard.lock().await = Some(guard);
                self.store
                    .held
                    .lock()
                    .expect("held lock poisoned")
                    .insert(self.key.clone(), self.contents.clone());
                Ok(())
            }
        }
    }

    async fn release(&self) -> StoreResult<()> {
        match self.guard.lock().await.take() {
            Some(guard) => {
                self.store
                    .held
                    .lock()
                    .expect("held lock poisoned")
                    .remove(&self.key);
                drop(guard);
                Ok(())
            }
            None => Err(StoreError::Backend(format!(
                "lock '{}' is not held",
                self.key
            ))),
        }
    }
}
