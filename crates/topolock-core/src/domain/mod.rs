//! Domain layer
//!
//! Contains the core locking logic and domain models.

pub mod locking;
