//! Lock types and error definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::infrastructure::store::StoreError;

/// Result type for lock operations
pub type LockResult<T> = std::result::Result<T, LockError>;

/// Lock errors
#[derive(Error, Debug)]
pub enum LockError {
    /// The target directory does not exist in the store
    #[error("node doesn't exist: {0}")]
    NoNode(String),

    /// The existence check failed for a reason other than a missing node
    #[error("cannot check directory '{dir}' before locking: {source}")]
    Precondition {
        dir: String,
        #[source]
        source: StoreError,
    },

    /// The store could not construct a lock handle
    #[error("cannot prepare lock for '{path}': {source}")]
    Prepare {
        path: String,
        #[source]
        source: StoreError,
    },

    /// The caller's cancellation fired while waiting or acquiring
    #[error("lock acquisition canceled for '{0}'")]
    Canceled(String),

    /// Remote acquisition failed for a reason other than cancellation
    #[error("cannot acquire lock on '{path}': {source}")]
    Acquire {
        path: String,
        #[source]
        source: StoreError,
    },

    /// Unlock invoked for a path with no registered instance
    #[error("unlock: lock '{0}' not held")]
    NotHeld(String),

    /// The store's release call failed; local bookkeeping was still cleaned up
    #[error("cannot release lock on '{path}': {source}")]
    Release {
        path: String,
        #[source]
        source: StoreError,
    },
}

impl LockError {
    /// Get the diagnostic code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoNode(_) => "L100",
            Self::Precondition { .. } => "L200",
            Self::Prepare { .. } => "L300",
            Self::Canceled(_) => "L400",
            Self::Acquire { .. } => "L500",
            Self::NotHeld(_) => "L600",
            Self::Release { .. } => "L700",
        }
    }
}

/// Default file name appended to a directory path to form its lock path
pub const LOCKS_FILENAME: &str = "locks";

/// Configuration for the lock manager
#[derive(Debug, Clone)]
pub struct LockConfig {
    /// Path prefix prepended to every derived lock path
    pub root: String,

    /// File name appended to a directory path to form its lock path
    pub locks_filename: String,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            root: "/".to_string(),
            locks_filename: LOCKS_FILENAME.to_string(),
        }
    }
}

impl LockConfig {
    /// Set the root path prefix
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into();
        self
    }

    /// Set the lock file name
    pub fn with_locks_filename(mut self, name: impl Into<String>) -> Self {
        self.locks_filename = name.into();
        self
    }

    /// Derive the canonical lock path for a directory
    pub fn lock_path(&self, dir_path: &str) -> String {
        join_path(&[self.root.as_str(), dir_path, self.locks_filename.as_str()])
    }
}

/// Join path segments with `/` separators, collapsing duplicate slashes.
/// A single leading `/` is kept when the first segment is absolute.
fn join_path(segments: &[&str]) -> String {
    let absolute = segments.first().is_some_and(|s| s.starts_with('/'));
    let joined = segments
        .iter()
        .flat_map(|s| s.split('/'))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

/// Diagnostic payload describing the would-be holder of a lock
///
/// The manager never interprets lock contents; this is a convenience for
/// callers that want the conventional "who holds this" record stored
/// alongside the lock in the coordination store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HolderInfo {
    /// Unique id for this holder
    pub id: Uuid,

    /// Hostname of the process
    pub hostname: String,

    /// Process id
    pub pid: u32,

    /// When the holder started going for the lock
    pub started_at: DateTime<Utc>,

    /// Free-form description of why the lock is taken
    pub purpose: String,
}

impl HolderInfo {
    /// Describe the current process
    pub fn for_current_process(purpose: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            hostname: gethostname::gethostname().to_string_lossy().into_owned(),
            pid: std::process::id(),
            started_at: Utc::now(),
            purpose: purpose.into(),
        }
    }

    /// Render as JSON for use as lock contents
    pub fn to_contents(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_path_derivation() {
        let config = LockConfig::default();
        assert_eq!(config.lock_path("/ns/a"), "/ns/a/locks");

        let config = LockConfig::default().with_root("/global/topo");
        assert_eq!(config.lock_path("/ns/a"), "/global/topo/ns/a/locks");
        assert_eq!(config.lock_path("ns/a/"), "/global/topo/ns/a/locks");
    }

    #[test]
    fn test_lock_path_collapses_duplicate_slashes() {
        let config = LockConfig::default().with_root("/root/");
        assert_eq!(config.lock_path("//ns//a"), "/root/ns/a/locks");
    }

    #[test]
    fn test_relative_root_stays_relative() {
        let config = LockConfig::default().with_root("cell1");
        assert_eq!(config.lock_path("ns/a"), "cell1/ns/a/locks");
    }

    #[test]
    fn test_config_builder() {
        let config = LockConfig::default()
            .with_root("/cells/test")
            .with_locks_filename("leases");

        assert_eq!(config.root, "/cells/test");
        assert_eq!(config.lock_path("/ns/a"), "/cells/test/ns/a/leases");
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(LockError::NoNode("/ns/a".to_string()).code(), "L100");
        assert_eq!(
            LockError::Canceled("/ns/a/locks".to_string()).code(),
            "L400"
        );
        assert_eq!(LockError::NotHeld("/ns/a/locks".to_string()).code(), "L600");
    }

    #[test]
    fn test_not_held_message() {
        let err = LockError::NotHeld("/ns/a/locks".to_string());
        assert_eq!(err.to_string(), "unlock: lock '/ns/a/locks' not held");
    }

    #[test]
    fn test_holder_info_round_trip() {
        let info = HolderInfo::for_current_process("nightly backup");
        let contents = info.to_contents();

        let parsed: HolderInfo = serde_json::from_str(&contents).expect("valid json");
        assert_eq!(parsed.id, info.id);
        assert_eq!(parsed.pid, std::process::id());
        assert_eq!(parsed.purpose, "nightly backup");
    }
}
