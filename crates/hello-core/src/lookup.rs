//! Registry lookups
//!
//! [`RegistryLookup`] reads one greeting entry from a partition. A missing
//! entry is a successful `None`; only store failures are errors.

use crate::error::LookupError;
use hello_store::{read_node, Partition, RegistryEntry, RegistryKey, TreeStore};
use std::sync::Arc;

/// Point reads of registry entries
#[derive(Debug, Clone)]
pub struct RegistryLookup {
    store: Arc<dyn TreeStore>,
}

impl RegistryLookup {
    /// Create lookup over `store`
    #[inline]
    #[must_use]
    pub fn new(store: Arc<dyn TreeStore>) -> Self {
        Self { store }
    }

    /// Read the entry for `key` from `partition`
    ///
    /// # Errors
    /// `LookupError::ReadFailed` if the store read fails or the stored node
    /// cannot be decoded
    pub async fn read(
        &self,
        partition: Partition,
        key: &RegistryKey,
    ) -> Result<Option<RegistryEntry>, LookupError> {
        let path = RegistryEntry::path_for(key);
        read_node::<RegistryEntry>(self.store.as_ref(), partition, &path)
            .await
            .map_err(|source| {
                tracing::debug!(%key, %partition, error = %source, "registry read failed");
                LookupError::ReadFailed {
                    key: key.clone(),
                    partition,
                    source,
                }
            })
    }
}
