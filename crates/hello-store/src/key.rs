//! Registry keys
//!
//! Provides [`RegistryKey`], the validated name that addresses one greeting
//! registry entry.

use crate::error::KeyError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Characters that would make a rendered [`crate::TreePath`] ambiguous
const RESERVED: [char; 3] = ['/', '[', ']'];

/// Validated registry key
///
/// Non-empty, no surrounding whitespace, none of `/ [ ]`. Immutable once
/// constructed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegistryKey(String);

impl RegistryKey {
    /// Create a key, validating the name
    ///
    /// # Errors
    /// - `KeyError::Empty` for an empty name
    /// - `KeyError::SurroundingWhitespace` for untrimmed names
    /// - `KeyError::ReservedCharacter` for names containing `/`, `[` or `]`
    pub fn new(name: impl Into<String>) -> Result<Self, KeyError> {
        let name = name.into();

        if name.is_empty() {
            return Err(KeyError::Empty);
        }
        if name.trim() != name {
            return Err(KeyError::SurroundingWhitespace(name));
        }
        if let Some(ch) = name.chars().find(|c| RESERVED.contains(c)) {
            return Err(KeyError::ReservedCharacter { key: name, ch });
        }

        Ok(Self(name))
    }

    /// Key as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RegistryKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RegistryKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for RegistryKey {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RegistryKey> for String {
    fn from(key: RegistryKey) -> Self {
        key.0
    }
}

impl AsRef<str> for RegistryKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn key_accepts_plain_names() {
        let key = RegistryKey::new("Sebastian").unwrap();
        assert_eq!(key.as_str(), "Sebastian");
        assert_eq!(key.to_string(), "Sebastian");
    }

    #[test]
    fn key_rejects_empty() {
        assert_eq!(RegistryKey::new(""), Err(KeyError::Empty));
    }

    #[test]
    fn key_rejects_surrounding_whitespace() {
        assert!(matches!(
            RegistryKey::new(" Jesus"),
            Err(KeyError::SurroundingWhitespace(_))
        ));
        assert!(RegistryKey::new("Mary Ann").is_ok());
    }

    #[test]
    fn key_rejects_reserved_characters() {
        assert!(matches!(
            RegistryKey::new("a/b"),
            Err(KeyError::ReservedCharacter { ch: '/', .. })
        ));
    }

    #[test]
    fn key_serde_validates() {
        let key: RegistryKey = serde_json::from_str("\"Jesus\"").unwrap();
        assert_eq!(key.as_str(), "Jesus");
        assert!(serde_json::from_str::<RegistryKey>("\"\"").is_err());
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"Jesus\"");
    }

    proptest! {
        #[test]
        fn key_display_preserves_valid_names(name in "[A-Za-z0-9][A-Za-z0-9 _.-]{0,30}[A-Za-z0-9]") {
            let key = RegistryKey::new(name.clone()).unwrap();
            prop_assert_eq!(key.to_string(), name);
        }

        #[test]
        fn keys_order_like_their_names(a in "[a-z]{1,8}", b in "[a-z]{1,8}") {
            let ka = RegistryKey::new(a.clone()).unwrap();
            let kb = RegistryKey::new(b.clone()).unwrap();
            prop_assert_eq!(ka.cmp(&kb), a.cmp(&b));
        }
    }
}
