//! Service configuration
//!
//! Loaded from TOML; every field has a default so an empty file is valid.
//!
//! ```toml
//! greeting_prefix = "Hello "
//! arrival_timeout_ms = 5000
//! log_filter = "info,hello_core=debug"
//!
//! [store]
//! change_buffer = 1024
//! commit_latency_ms = 0
//! ```

use crate::error::ConfigError;
use hello_store::MemoryStoreConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Greeting service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Prefix of the default greeting
    pub greeting_prefix: String,
    /// How long callers wait for a greeting to be recorded
    pub arrival_timeout_ms: u64,
    /// Tracing filter directive used when `RUST_LOG` is unset
    pub log_filter: String,
    /// In-memory store settings
    pub store: MemoryStoreConfig,
}

impl ServiceConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With greeting prefix
    #[inline]
    #[must_use]
    pub fn with_greeting_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.greeting_prefix = prefix.into();
        self
    }

    /// With arrival timeout
    #[inline]
    #[must_use]
    pub fn with_arrival_timeout(mut self, timeout: Duration) -> Self {
        self.arrival_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With store settings
    #[inline]
    #[must_use]
    pub fn with_store(mut self, store: MemoryStoreConfig) -> Self {
        self.store = store;
        self
    }

    /// Arrival timeout as a duration
    #[inline]
    #[must_use]
    pub fn arrival_timeout(&self) -> Duration {
        Duration::from_millis(self.arrival_timeout_ms)
    }

    /// Parse configuration from TOML
    ///
    /// # Errors
    /// - `ConfigError::Parse` for malformed TOML or unknown value types
    /// - `ConfigError::Invalid` for out-of-range values
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// `ConfigError::Io` if the file cannot be read, otherwise as
    /// [`ServiceConfig::from_toml_str`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// `ConfigError::Invalid` naming the first offending field
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.change_buffer == 0 {
            return Err(ConfigError::Invalid {
                field: "store.change_buffer",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.arrival_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "arrival_timeout_ms",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            greeting_prefix: "Hello ".to_string(),
            arrival_timeout_ms: 5_000,
            log_filter: "info".to_string(),
            store: MemoryStoreConfig::default(),
        }
    }
}
