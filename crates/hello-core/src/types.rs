//! Core types: identifiers, requests and results

use hello_store::RegistryKey;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unique transaction chain identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChainId(pub Ulid);

impl ChainId {
    /// Generate new chain ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ChainId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique transaction identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub Ulid);

impl TransactionId {
    /// Generate new transaction ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One greeting request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreetingRequest {
    /// Name to greet
    pub key: RegistryKey,
}

impl GreetingRequest {
    /// Create request
    #[inline]
    #[must_use]
    pub fn new(key: RegistryKey) -> Self {
        Self { key }
    }
}

/// Computed greeting returned to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Greeting {
    /// Greeting text
    pub value: String,
}

/// RPC input of `hello-world`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelloWorldInput {
    /// Name to greet
    pub name: String,
}

impl HelloWorldInput {
    /// Create input
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// RPC output of `hello-world`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelloWorldOutput {
    /// Greeting text
    pub greeting: String,
}

impl From<Greeting> for HelloWorldOutput {
    fn from(greeting: Greeting) -> Self {
        Self {
            greeting: greeting.value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(ChainId::new(), ChainId::new());
        assert_ne!(TransactionId::new(), TransactionId::new());
    }

    #[test]
    fn output_from_greeting() {
        let output = HelloWorldOutput::from(Greeting {
            value: "Hello Sebastian".to_string(),
        });
        assert_eq!(output.greeting, "Hello Sebastian");
    }
}
