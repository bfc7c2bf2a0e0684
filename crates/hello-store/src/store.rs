//! Tree store interface
//!
//! A [`TreeStore`] is a hierarchical key-value store with two partitions,
//! point reads, atomic multi-operation commits and a change feed.

use crate::error::StoreError;
use crate::path::TreePath;
use crate::types::{ChangeEvent, Generation, Partition, WriteOp};
use serde_json::Value;
use std::fmt::Debug;
use tokio::sync::broadcast;

/// Transactional tree store
///
/// Implementations must:
/// - serve reads from a snapshot consistent with the partition at call time
/// - apply every operation of a commit or none of them
/// - publish one [`ChangeEvent`] per touched node after a commit is visible
#[async_trait::async_trait]
pub trait TreeStore: Send + Sync + Debug {
    /// Read the node at `path`
    ///
    /// # Errors
    /// `StoreError::ReadFailed` if the backend cannot serve the read
    async fn read(&self, partition: Partition, path: &TreePath) -> Result<Option<Value>, StoreError>;

    /// Atomically apply `ops` in order
    ///
    /// # Returns
    /// Generation of the store after the commit
    ///
    /// # Errors
    /// - `StoreError::MissingParent` if a put targets a path whose container
    ///   does not exist
    /// - `StoreError::CommitFailed` if the backend rejects the commit
    async fn commit(&self, ops: Vec<WriteOp>) -> Result<Generation, StoreError>;

    /// Subscribe to committed changes
    ///
    /// Only changes committed after the call are delivered.
    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent>;

    /// Current generation
    fn generation(&self) -> Generation;
}
