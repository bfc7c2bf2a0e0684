//! Hello Store - partitioned, versioned tree store
//!
//! Provides:
//! - [`TreeStore`]: the transactional store interface (point reads, atomic
//!   commits, change feed)
//! - [`MemoryTreeStore`]: an in-process implementation with fault injection
//! - [`TreePath`]: structured node addresses
//! - The greeting registry schema ([`GreetingRegistry`], [`RegistryEntry`])
//!
//! # Partitions
//!
//! ```text
//! CONFIGURATION   intended state, programmed by operators
//! OPERATIONAL     applied state, recorded by the system
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use hello_store::prelude::*;
//!
//! let store = MemoryTreeStore::new();
//! let key = RegistryKey::new("Jesus")?;
//! let entry = RegistryEntry::new(key, "Hola Jesus");
//!
//! store.commit(vec![
//!     WriteOp::Put { partition: Partition::Configuration, path: GreetingRegistry::path(), value: GreetingRegistry::default().encode()? },
//!     WriteOp::Put { partition: Partition::Configuration, path: entry.path(), value: entry.encode()? },
//! ]).await?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod error;
pub mod key;
pub mod memory;
pub mod path;
pub mod schema;
pub mod store;
pub mod types;

// Re-exports for convenience
pub use error::{KeyError, StoreError};
pub use key::RegistryKey;
pub use memory::{MemoryStoreConfig, MemoryTreeStore};
pub use path::{PathSegment, TreePath};
pub use schema::{read_node, GreetingRegistry, RegistryEntry, TreeNode, ENTRY_LIST, REGISTRY_CONTAINER};
pub use store::TreeStore;
pub use types::{ChangeEvent, ChangeKind, Generation, Partition, WriteOp};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the tree store
    pub use crate::{
        GreetingRegistry, MemoryTreeStore, Partition, RegistryEntry, RegistryKey, StoreError,
        TreeNode, TreePath, TreeStore, WriteOp,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
