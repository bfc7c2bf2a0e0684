//! Error types for Hello Core
//!
//! Provides error handling for:
//! - Transaction chain lifecycle (`ChainError`) and commit outcomes
//!   (`CommitFailure`)
//! - Registry lookups (`LookupError`)
//! - Failures surfaced to RPC callers (`RpcError`)
//! - Service-level registry programming (`ServiceError`)
//! - Configuration loading (`ConfigError`)

use crate::types::{ChainId, TransactionId};
use hello_store::{KeyError, Partition, RegistryKey, StoreError};
use std::fmt;
use std::path::PathBuf;

/// Transaction chain lifecycle errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    /// Chain failed or was closed; open a new one
    #[error("transaction chain {0} is closed")]
    ChainClosed(ChainId),
}

/// Failed commit of one chained transaction
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommitFailure {
    /// Store rejected the commit
    #[error("transaction {transaction} on chain {chain} failed to commit: {source}")]
    Store {
        /// Owning chain
        chain: ChainId,
        /// Failed transaction
        transaction: TransactionId,
        /// Underlying store error
        #[source]
        source: StoreError,
    },

    /// Transaction was never committed because its chain stopped first
    #[error("transaction {transaction} abandoned: chain {chain} stopped committing")]
    Abandoned {
        /// Owning chain
        chain: ChainId,
        /// Abandoned transaction
        transaction: TransactionId,
    },
}

impl CommitFailure {
    /// Chain the transaction belonged to
    #[inline]
    #[must_use]
    pub fn chain(&self) -> ChainId {
        match self {
            Self::Store { chain, .. } | Self::Abandoned { chain, .. } => *chain,
        }
    }

    /// Failed transaction
    #[inline]
    #[must_use]
    pub fn transaction(&self) -> TransactionId {
        match self {
            Self::Store { transaction, .. } | Self::Abandoned { transaction, .. } => *transaction,
        }
    }

    /// Check if the failure may succeed when retried on a fresh chain
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store { source, .. } => source.is_transient(),
            Self::Abandoned { .. } => true,
        }
    }
}

/// Registry lookup errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// Store read failed (distinct from "not found")
    #[error("failed to read {key} from {partition}: {source}")]
    ReadFailed {
        /// Requested key
        key: RegistryKey,
        /// Partition read
        partition: Partition,
        /// Underlying store error
        #[source]
        source: StoreError,
    },
}

/// RPC error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// Transport-level failure
    Transport,
    /// Failure while executing the RPC
    Rpc,
    /// Malformed request
    Protocol,
    /// Application-level failure
    Application,
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Transport => "transport",
            Self::Rpc => "rpc",
            Self::Protocol => "protocol",
            Self::Application => "application",
        })
    }
}

/// Failure reported to an RPC caller
#[derive(Debug, thiserror::Error)]
#[error("{error_type} error: {message}")]
pub struct RpcError {
    /// Classification
    pub error_type: ErrorType,
    /// Human-readable message
    pub message: String,
    /// Underlying cause
    #[source]
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl RpcError {
    /// Create error without cause
    #[inline]
    pub fn new(error_type: ErrorType, message: impl Into<String>) -> Self {
        Self {
            error_type,
            message: message.into(),
            cause: None,
        }
    }

    /// Create error with cause
    #[inline]
    pub fn with_cause(
        error_type: ErrorType,
        message: impl Into<String>,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            error_type,
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }

    /// RPC-class failure
    #[inline]
    pub fn rpc(message: impl Into<String>, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::with_cause(ErrorType::Rpc, message, cause)
    }

    /// Malformed request
    #[inline]
    pub fn protocol(
        message: impl Into<String>,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::with_cause(ErrorType::Protocol, message, cause)
    }
}

/// Service-level errors for registry programming
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Invalid registry key
    #[error("invalid name: {0}")]
    InvalidKey(#[from] KeyError),

    /// No transaction could be opened
    #[error("chain error: {0}")]
    Chain(#[from] ChainError),

    /// Commit failed
    #[error("commit failed: {0}")]
    Commit(#[from] CommitFailure),

    /// Node could not be prepared for storage
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Read failed
    #[error("lookup failed: {0}")]
    Lookup(#[from] LookupError),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        /// Config file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Value out of range
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}
