//! Error taxonomy for the persistence layer
//!
//! Four failure classes:
//! - `Validation`: a required field is missing; rejected before any write
//! - `NotFound`: a referenced board/node does not exist; rejected before any write
//! - `Integrity`: the on-disk schema or a cascade invariant cannot be honored
//! - `Storage`: the underlying SQLite engine failed; propagated unchanged
//!
//! "Nothing to do" (update/delete of a missing id) is not an error: those
//! operations return `Ok(None)` or `Ok(false)` instead.

use thiserror::Error;

/// Errors surfaced by [`GraphStore`](crate::core::store::GraphStore) and
/// [`SchemaManager`](crate::core::schema::SchemaManager).
#[derive(Error, Debug)]
pub enum StoreError {
    /// A required field was missing or malformed
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced entity does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Schema version or cross-table invariant violation
    #[error("integrity violation: {0}")]
    Integrity(String),

    /// Underlying SQLite failure
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// A stored JSON column failed to round-trip
    #[error("corrupt stored value: {0}")]
    Corrupt(#[from] serde_json::Error),
}

impl StoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::Integrity(msg.into())
    }
}

/// Result alias used throughout the core.
pub type Result<T, E = StoreError> = std::result::Result<T, E>;
