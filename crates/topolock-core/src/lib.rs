//! Topolock Core Library
//!
//! This crate provides the core functionality for Topolock, including:
//! - Lock manager (local arbitration of distributed lock attempts)
//! - Lock registry (single-attempt-at-a-time semantics per lock path)
//! - Descriptors (caller-held handles for releasing acquired locks)
//! - Coordination store abstraction (consensus-backed key/value stores
//!   offering session-based mutual exclusion)
//! - In-memory store implementation for tests and local development

pub mod domain;
pub mod infrastructure;

pub use domain::locking::{
    HolderInfo, LockConfig, LockDescriptor, LockError, LockManager, LockResult,
};
pub use infrastructure::store::{
    CoordinationStore, MemoryStore, RemoteLock, StoreError, StoreResult,
};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::domain::locking::{
        LockConfig, LockDescriptor, LockError, LockManager, LockResult,
    };
    pub use crate::infrastructure::store::CoordinationStore;
}
