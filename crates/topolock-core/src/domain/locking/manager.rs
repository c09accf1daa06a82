//! Lock manager coordinating local contention and remote acquisition
//!
//! Many tasks in one process may race for the same distributed lock. The
//! manager lets exactly one of them run the remote acquisition for a given
//! lock path; everyone else parks on the in-flight attempt's completion
//! signal and re-races for the slot once it concludes, so the process never
//! has two outstanding remote attempts for one path.

use std::fmt;
use std::sync::Arc;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::descriptor::LockDescriptor;
use super::registry::{LockInstance, LockRegistry};
use super::types::{LockConfig, LockError, LockResult};
use crate::infrastructure::store::{CoordinationStore, StoreError};

/// Coordinates distributed lock acquisition against a coordination store
///
/// Cloning is cheap; clones share the same registry, so local arbitration
/// spans every clone in the process.
#[derive(Clone)]
pub struct LockManager {
    config: LockConfig,
    store: Arc<dyn CoordinationStore>,
    registry: Arc<LockRegistry>,
}

impl LockManager {
    /// Create a manager over `store` with the given configuration
    pub fn new(store: Arc<dyn CoordinationStore>, config: LockConfig) -> Self {
        Self {
            config,
            store,
            registry: Arc::new(LockRegistry::default()),
        }
    }

    /// Create a manager with default configuration
    pub fn with_defaults(store: Arc<dyn CoordinationStore>) -> Self {
        Self::new(store, LockConfig::default())
    }

    /// Get the configuration
    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Acquire the distributed lock guarding `dir_path`
    ///
    /// `contents` is an opaque payload stored alongside the lock, e.g. for
    /// diagnostics (see [`HolderInfo`] for the conventional shape). The call
    /// blocks until the lock is granted or `cancel` fires: first while
    /// another task in this process attempts the same path, then while the
    /// store performs the distributed acquisition.
    ///
    /// # Limitation
    ///
    /// A granted lock is not re-validated until [`LockDescriptor::unlock`].
    /// If the store loses it underneath (e.g. session expiry on the remote
    /// side), this manager will not notice. Backends wanting stronger
    /// guarantees can expose a lost-lock channel on their [`RemoteLock`]
    /// implementation and watch it outside the manager.
    ///
    /// [`HolderInfo`]: super::types::HolderInfo
    /// [`RemoteLock`]: crate::infrastructure::store::RemoteLock
    pub async fn lock(
        &self,
        dir_path: &str,
        contents: &str,
        cancel: &CancellationToken,
    ) -> LockResult<LockDescriptor> {
        // The directory must exist before its lock path can be taken.
        match self.store.dir_exists(dir_path).await {
            Ok(true) => {}
            Ok(false) => return Err(LockError::NoNode(dir_path.to_string())),
            Err(StoreError::NoNode(node)) => return Err(LockError::NoNode(node)),
            Err(source) => {
                return Err(LockError::Precondition {
                    dir: dir_path.to_string(),
                    source,
                });
            }
        }

        let lock_path = self.config.lock_path(dir_path);

        let handle = self
            .store
            .prepare_lock(&lock_path, contents)
            .await
            .map_err(|source| LockError::Prepare {
                path: lock_path.clone(),
                source,
            })?;

        debug!(lock_path = %lock_path, "attempting to acquire lock");
        let start = Instant::now();

        // Wait until this task is the only one in the process trying to
        // lock this path.
        let instance = Arc::new(LockInstance::new(handle));
        loop {
            match self.registry.claim(&lock_path, instance.clone()) {
                Ok(()) => break,
                Err(existing) => {
                    debug!(
                        lock_path = %lock_path,
                        "waiting for in-process attempt to conclude"
                    );
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            return Err(LockError::Canceled(lock_path));
                        }
                        _ = existing.done.cancelled() => {}
                    }
                    // The previous attempt concluded; race for the slot again.
                }
            }
        }

        // Sole local attempter for this path from here on.
        if let Err(source) = instance.handle.acquire(cancel).await {
            // Give up the slot, then wake anyone parked on this attempt.
            self.registry.remove(&lock_path);
            instance.done.cancel();

            return Err(match source {
                StoreError::Canceled => LockError::Canceled(lock_path),
                source => LockError::Acquire {
                    path: lock_path,
                    source,
                },
            });
        }

        info!(
            lock_path = %lock_path,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "lock acquired"
        );

        // The registry entry now stands for "held" rather than "attempt in
        // flight"; it is removed on unlock.
        Ok(LockDescriptor::new(self.clone(), lock_path))
    }

    /// Release the lock on `lock_path`; called from [`LockDescriptor::unlock`]
    pub(crate) async fn unlock_path(&self, lock_path: &str) -> LockResult<()> {
        let Some(instance) = self.registry.get(lock_path) else {
            return Err(LockError::NotHeld(lock_path.to_string()));
        };

        // Try the remote release; local cleanup happens regardless.
        let released = instance.handle.release().await;

        self.registry.remove(lock_path);
        instance.done.cancel();

        match released {
            Ok(()) => {
                info!(lock_path = %lock_path, "lock released");
                Ok(())
            }
            Err(source) => {
                warn!(lock_path = %lock_path, error = %source, "store release failed");
                Err(LockError::Release {
                    path: lock_path.to_string(),
                    source,
                })
            }
        }
    }
}

impl fmt::Debug for LockManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
