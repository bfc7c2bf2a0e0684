//! Greeting registry schema
//!
//! The registry is a root container, `greeting-registry`, holding a keyed
//! list of `greeting-registry-entry` nodes. The same layout exists in both
//! partitions.
//!
//! ```text
//! /greeting-registry
//!     /greeting-registry-entry[<name>]  { name, greeting }
//! ```

use crate::error::StoreError;
use crate::key::RegistryKey;
use crate::path::TreePath;
use crate::store::TreeStore;
use crate::types::Partition;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Root container name
pub const REGISTRY_CONTAINER: &str = "greeting-registry";

/// Entry list name
pub const ENTRY_LIST: &str = "greeting-registry-entry";

/// Typed node that knows its own address
pub trait TreeNode: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Address of this node
    fn path(&self) -> TreePath;

    /// Encode for storage
    ///
    /// # Errors
    /// `StoreError::Encode` if serialization fails
    fn encode(&self) -> Result<Value, StoreError> {
        serde_json::to_value(self).map_err(|e| StoreError::Encode(e.to_string()))
    }

    /// Decode a stored value read from `path`
    ///
    /// # Errors
    /// `StoreError::Decode` if the value does not match the node type
    fn decode(path: &TreePath, value: Value) -> Result<Self, StoreError> {
        serde_json::from_value(value).map_err(|e| StoreError::Decode {
            path: path.clone(),
            reason: e.to_string(),
        })
    }
}

/// Root registry container
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GreetingRegistry {}

impl GreetingRegistry {
    /// Address of the registry container
    #[inline]
    #[must_use]
    pub fn path() -> TreePath {
        TreePath::root().container(REGISTRY_CONTAINER)
    }
}

impl TreeNode for GreetingRegistry {
    fn path(&self) -> TreePath {
        Self::path()
    }
}

/// Greeting stored for one name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// Entry key
    pub name: RegistryKey,
    /// Stored greeting
    pub greeting: String,
}

impl RegistryEntry {
    /// Create entry
    #[inline]
    #[must_use]
    pub fn new(name: RegistryKey, greeting: impl Into<String>) -> Self {
        Self {
            name,
            greeting: greeting.into(),
        }
    }

    /// Address of the entry for `key`
    #[inline]
    #[must_use]
    pub fn path_for(key: &RegistryKey) -> TreePath {
        GreetingRegistry::path().item(ENTRY_LIST, key.as_str())
    }
}

impl TreeNode for RegistryEntry {
    fn path(&self) -> TreePath {
        Self::path_for(&self.name)
    }
}

/// Read and decode a typed node
///
/// # Errors
/// Propagates the store's read error, or `StoreError::Decode` when the stored
/// value is not an `N`.
pub async fn read_node<N: TreeNode>(
    store: &dyn TreeStore,
    partition: Partition,
    path: &TreePath,
) -> Result<Option<N>, StoreError> {
    match store.read(partition, path).await? {
        Some(value) => N::decode(path, value).map(Some),
        None => Ok(None),
    }
}
