//! Store-level value types: partitions, write operations, change events

use crate::path::TreePath;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Logical view of the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    /// Intended state, programmed by operators
    Configuration,
    /// Applied state, recorded by the system
    Operational,
}

impl Partition {
    /// Both partitions, in a fixed order
    pub const ALL: [Partition; 2] = [Partition::Configuration, Partition::Operational];

    /// Short lowercase name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Operational => "operational",
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Commit generation of a versioned store
///
/// Strictly increases with every non-empty commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Generation(pub u64);

impl Generation {
    /// Next generation
    #[inline]
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// Single mutation inside a commit
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Replace the node at `path`
    Put {
        partition: Partition,
        path: TreePath,
        value: Value,
    },
    /// Remove the node at `path` and everything below it
    Delete { partition: Partition, path: TreePath },
}

impl WriteOp {
    /// Partition the operation targets
    #[inline]
    #[must_use]
    pub fn partition(&self) -> Partition {
        match self {
            Self::Put { partition, .. } | Self::Delete { partition, .. } => *partition,
        }
    }

    /// Path the operation targets
    #[inline]
    #[must_use]
    pub fn path(&self) -> &TreePath {
        match self {
            Self::Put { path, .. } | Self::Delete { path, .. } => path,
        }
    }
}

/// Kind of committed change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// A value became visible (created or replaced)
    Written,
    /// A value was removed
    Deleted,
}

/// Notification published for every node touched by a commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Generation produced by the commit
    pub generation: Generation,
    /// Partition of the touched node
    pub partition: Partition,
    /// Exact path of the touched node
    pub path: TreePath,
    /// What happened to it
    pub kind: ChangeKind,
}

impl ChangeEvent {
    /// Check if this event is a write of exactly `path` in `partition`
    #[inline]
    #[must_use]
    pub fn is_write_of(&self, partition: Partition, path: &TreePath) -> bool {
        self.kind == ChangeKind::Written && self.partition == partition && &self.path == path
    }
}
