//! Error types for the tree store
//!
//! Covers:
//! - Read and commit failures reported by a store backend
//! - Structural violations (writing below a missing container)
//! - Node encoding/decoding failures
//! - Invalid registry keys

use crate::path::TreePath;
use crate::types::Partition;

/// Tree store error
///
/// `Clone` so a single failure can be recorded on a chain and delivered to
/// every party waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Backend failed to serve a read
    #[error("read of {path} in {partition} failed: {reason}")]
    ReadFailed {
        partition: Partition,
        path: TreePath,
        reason: String,
    },

    /// Backend rejected or failed to apply a commit
    #[error("commit failed: {0}")]
    CommitFailed(String),

    /// Write below a container that does not exist
    #[error("cannot write {path} in {partition}: parent container does not exist")]
    MissingParent { partition: Partition, path: TreePath },

    /// Stored node could not be decoded into the requested type
    #[error("failed to decode node at {path}: {reason}")]
    Decode { path: TreePath, reason: String },

    /// Node could not be encoded for storage
    #[error("failed to encode node: {0}")]
    Encode(String),

    /// Store is shut down or otherwise unreachable
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Check if the failure may succeed when retried on a fresh chain
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ReadFailed { .. } | Self::CommitFailed(_) | Self::Unavailable(_)
        )
    }
}

/// Registry key validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    /// Empty key
    #[error("registry key cannot be empty")]
    Empty,

    /// Leading or trailing whitespace
    #[error("registry key {0:?} has surrounding whitespace")]
    SurroundingWhitespace(String),

    /// Character reserved by path rendering
    #[error("registry key {key:?} contains reserved character {ch:?}")]
    ReservedCharacter { key: String, ch: char },
}
