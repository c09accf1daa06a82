//! Coordination store boundary
//!
//! This module defines the traits for the external coordination service: a
//! consensus-backed key/value store offering session-based mutual exclusion.
//! The traits abstract over different backends (Consul-style HTTP stores,
//! etcd-style gRPC stores, the in-memory store used by tests).
//!
//! The lock manager does not inspect or depend on a backend's internal
//! timing or retry behavior beyond respecting cancellation.

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub mod memory;

pub use memory::MemoryStore;

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors surfaced by a coordination store backend
#[derive(Error, Debug)]
pub enum StoreError {
    /// The addressed node does not exist in the store
    #[error("node doesn't exist: {0}")]
    NoNode(String),

    /// The operation was interrupted by the caller's cancellation signal
    #[error("operation canceled")]
    Canceled,

    /// Any other backend failure
    #[error("store backend error: {0}")]
    Backend(String),
}

/// A coordination store capable of distributed locking
#[async_trait]
pub trait CoordinationStore: Send + Sync {
    /// Check whether a directory exists in the store
    ///
    /// Backends may report a missing directory either as `Ok(false)` or as
    /// [`StoreError::NoNode`]; callers treat both the same way.
    async fn dir_exists(&self, dir_path: &str) -> StoreResult<bool>;

    /// Build a lock handle bound to `key`
    ///
    /// `contents` is an opaque payload the backend stores alongside the lock
    /// while it is held, e.g. for diagnostics. Preparing a handle does not
    /// contend for the lock; that happens in [`RemoteLock::acquire`].
    async fn prepare_lock(&self, key: &str, contents: &str) -> StoreResult<Box<dyn RemoteLock>>;
}

/// One distributed lock attempt/hold in a coordination store
#[async_trait]
pub trait RemoteLock: Send + Sync {
    /// Block until the distributed lock is granted or `cancel` fires
    ///
    /// May take arbitrarily long: network round-trips, contention with other
    /// processes. Must return [`StoreError::Canceled`] when interrupted.
    async fn acquire(&self, cancel: &CancellationToken) -> StoreResult<()>;

    /// Release the distributed lock
    async fn release(&self) -> StoreResult<()>;
}
