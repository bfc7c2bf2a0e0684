//! Structured tree identifiers
//!
//! Provides [`TreePath`], the address of a node in the store. A path is a
//! sequence of segments, each either a named container or a keyed list item.
//! The empty path is the implicit tree root, which always exists.

use std::fmt::{self, Display, Formatter};

/// One step in a [`TreePath`]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathSegment {
    /// Named container
    Container(String),

    /// Item of a keyed list
    Item {
        /// List name
        list: String,
        /// Item key
        key: String,
    },
}

impl Display for PathSegment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Container(name) => f.write_str(name),
            Self::Item { list, key } => write!(f, "{list}[{key}]"),
        }
    }
}

/// Address of a node in the tree
///
/// Paths order lexicographically by segment, so every descendant of a path
/// sorts directly after it. Stores rely on this to range-scan subtrees.
///
/// # Example
/// ```
/// use hello_store::TreePath;
///
/// let entry = TreePath::root()
///     .container("greeting-registry")
///     .item("greeting-registry-entry", "Sebastian");
///
/// assert_eq!(entry.to_string(), "/greeting-registry/greeting-registry-entry[Sebastian]");
/// assert_eq!(entry.parent(), Some(TreePath::root().container("greeting-registry")));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TreePath {
    segments: Vec<PathSegment>,
}

impl TreePath {
    /// The tree root
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Append a container segment
    #[inline]
    #[must_use]
    pub fn container(mut self, name: impl Into<String>) -> Self {
        self.segments.push(PathSegment::Container(name.into()));
        self
    }

    /// Append a keyed list item segment
    #[inline]
    #[must_use]
    pub fn item(mut self, list: impl Into<String>, key: impl Into<String>) -> Self {
        self.segments.push(PathSegment::Item {
            list: list.into(),
            key: key.into(),
        });
        self
    }

    /// Path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Number of segments below the root
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Check if this is the tree root
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Enclosing path, `None` for the root
    #[must_use]
    pub fn parent(&self) -> Option<TreePath> {
        let (_, parent) = self.segments.split_last()?;
        Some(Self {
            segments: parent.to_vec(),
        })
    }

    /// Last segment, `None` for the root
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Check if `self` equals `ancestor` or lies below it
    #[inline]
    #[must_use]
    pub fn starts_with(&self, ancestor: &TreePath) -> bool {
        self.segments.starts_with(&ancestor.segments)
    }
}

impl Display for TreePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}
