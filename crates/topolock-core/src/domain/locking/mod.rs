//! Distributed lock coordination
//!
//! This module serializes concurrent in-process attempts on the same lock
//! path before delegating the actual distributed acquisition to a
//! coordination store.
//!
//! # Architecture
//!
//! - **Manager**: [`LockManager`] orchestrates the existence precondition,
//!   the local contention loop, and the remote acquire/release calls
//! - **Registry**: process-wide map guaranteeing at most one in-flight
//!   attempt per lock path
//! - **Descriptor**: [`LockDescriptor`] returned to the winning caller;
//!   releasing it wakes the next local waiter
//!
//! Per lock path the state machine is `FREE -> CLAIMED -> {HELD | FREE}`:
//! a failed remote acquisition frees the path, a successful one turns the
//! claim into a hold until `unlock`. Local waiters cannot distinguish
//! CLAIMED from HELD and always re-check, which is correct because both
//! states forbid a second local claim.
//!
//! # Example
//!
//! ```ignore
//! use topolock_core::prelude::*;
//! use tokio_util::sync::CancellationToken;
//!
//! let manager = LockManager::with_defaults(store);
//! let cancel = CancellationToken::new();
//!
//! let descriptor = manager.lock("/ns/keyspace", "reparent shard 0", &cancel).await?;
//!
//! // Do work under the lock...
//!
//! descriptor.unlock().await?;
//! ```

pub mod descriptor;
pub mod manager;
pub(crate) mod registry;
pub mod types;

// Re-export main types
pub use descriptor::LockDescriptor;
pub use manager::LockManager;
pub use types::{HolderInfo, LOCKS_FILENAME, LockConfig, LockError, LockResult};
