//! Hello Core - greeting service over chained registry transactions
//!
//! Provides:
//! - [`TransactionChain`] / [`SharedChain`]: ordered, fail-fast write chains
//! - [`RegistryLookup`]: point reads of registry entries
//! - [`GreetingOrchestrator`]: the read-respond-record greeting workflow
//! - [`KeyArrivalWaiter`]: notification when an entry becomes visible
//! - [`GreetingService`]: the `hello-world` RPC implementation
//!
//! # Flow
//!
//! ```text
//! hello-world(name)
//!   -> read CONFIGURATION/greeting-registry-entry[name]
//!   -> reply with stored greeting or "<prefix><name>"
//!   -> write OPERATIONAL/greeting-registry-entry[name] through the chain
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use hello_core::prelude::*;
//!
//! let store = Arc::new(MemoryTreeStore::new());
//! let service = GreetingService::start(store, ServiceConfig::default()).await;
//!
//! let output = service.hello_world(HelloWorldInput::new("Sebastian")).await?;
//! assert_eq!(output.greeting, "Hello Sebastian");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod chain;
pub mod config;
pub mod error;
pub mod lookup;
pub mod orchestrator;
pub mod service;
pub mod types;
pub mod waiter;

// Re-exports for convenience
pub use chain::{
    log_commit_outcome, ChainEvent, ChainEvents, ChainState, CommitFuture, SharedChain,
    Transaction, TransactionChain,
};
pub use config::ServiceConfig;
pub use error::{
    ChainError, CommitFailure, ConfigError, ErrorType, LookupError, RpcError, ServiceError,
};
pub use lookup::RegistryLookup;
pub use orchestrator::{default_greeting, GreetingFuture, GreetingOrchestrator};
pub use service::{GreetingService, HelloService};
pub use types::{
    ChainId, Greeting, GreetingRequest, HelloWorldInput, HelloWorldOutput, TransactionId,
};
pub use waiter::{ArrivalState, KeyArrival, KeyArrivalWaiter};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running the greeting service
    pub use crate::{
        ChainEvent, ErrorType, GreetingService, HelloService, HelloWorldInput, HelloWorldOutput,
        KeyArrivalWaiter, RpcError, ServiceConfig, ServiceError,
    };
    pub use hello_store::prelude::*;
    pub use std::sync::Arc;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
