//! Greeting service
//!
//! [`GreetingService`] is the RPC-facing implementation of [`HelloService`].
//! It owns:
//! - Startup initialization of the registry tree in both partitions
//! - The shared transaction chain used for every write
//! - The orchestrator, lookup and key-arrival waiter built on the store

use crate::chain::{log_commit_outcome, ChainEvent, SharedChain};
use crate::config::ServiceConfig;
use crate::error::{RpcError, ServiceError};
use crate::lookup::RegistryLookup;
use crate::orchestrator::GreetingOrchestrator;
use crate::types::{ChainId, GreetingRequest, HelloWorldInput, HelloWorldOutput};
use crate::waiter::KeyArrivalWaiter;
use hello_store::{GreetingRegistry, Partition, RegistryEntry, RegistryKey, TreeStore};
use std::sync::Arc;
use tokio::sync::broadcast;

/// RPC surface of the greeting service
#[async_trait::async_trait]
pub trait HelloService: Send + Sync {
    /// Produce a greeting for `input.name`
    ///
    /// # Errors
    /// - `ErrorType::Protocol` for an invalid name
    /// - `ErrorType::Rpc` if the registry could not be read
    async fn hello_world(&self, input: HelloWorldInput) -> Result<HelloWorldOutput, RpcError>;
}

/// Greeting service over a tree store
#[derive(Debug)]
pub struct GreetingService {
    config: ServiceConfig,
    store: Arc<dyn TreeStore>,
    chain: Arc<SharedChain>,
    lookup: RegistryLookup,
    orchestrator: GreetingOrchestrator,
    waiter: KeyArrivalWaiter,
}

impl GreetingService {
    /// Start the service
    ///
    /// Creates the registry container in both partitions before returning.
    /// Initialization failure is logged; the service still starts. Must be
    /// called within a Tokio runtime.
    pub async fn start(store: Arc<dyn TreeStore>, config: ServiceConfig) -> Self {
        let chain = Arc::new(SharedChain::open(Arc::clone(&store)));
        let lookup = RegistryLookup::new(Arc::clone(&store));
        let orchestrator = GreetingOrchestrator::new(
            lookup.clone(),
            Arc::clone(&chain),
            config.greeting_prefix.as_str(),
        );
        let waiter = KeyArrivalWaiter::new(Arc::clone(&store));

        let service = Self {
            config,
            store,
            chain,
            lookup,
            orchestrator,
            waiter,
        };
        service.initialize_registry().await;
        service
    }

    async fn initialize_registry(&self) {
        tracing::info!("preparing to initialize the greeting registry");

        let mut transaction = match self.chain.new_transaction() {
            Ok(transaction) => transaction,
            Err(error) => {
                tracing::warn!(%error, "failed to create greeting registry");
                return;
            }
        };

        for partition in Partition::ALL {
            if let Err(error) = transaction.put_node(partition, &GreetingRegistry::default()) {
                tracing::warn!(%error, "failed to create greeting registry");
                return;
            }
        }

        let _ = log_commit_outcome("failed to create greeting registry", transaction.submit()).await;
    }

    /// Service configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Underlying store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<dyn TreeStore> {
        &self.store
    }

    /// Orchestrator driving `hello_world`
    #[inline]
    #[must_use]
    pub fn orchestrator(&self) -> &GreetingOrchestrator {
        &self.orchestrator
    }

    /// Key-arrival waiter over the service's store
    #[inline]
    #[must_use]
    pub fn waiter(&self) -> &KeyArrivalWaiter {
        &self.waiter
    }

    /// Chain currently used for writes
    #[must_use]
    pub fn current_chain(&self) -> ChainId {
        self.chain.current_id()
    }

    /// Subscribe to terminal events of the service's chains
    #[must_use]
    pub fn chain_events(&self) -> broadcast::Receiver<ChainEvent> {
        self.chain.subscribe()
    }

    /// Program a greeting override into CONFIGURATION
    ///
    /// # Errors
    /// - `ServiceError::InvalidKey` for an invalid name
    /// - `ServiceError::Chain` or `ServiceError::Commit` if the write fails
    pub async fn program(&self, name: &str, greeting: &str) -> Result<(), ServiceError> {
        let entry = RegistryEntry::new(RegistryKey::new(name)?, greeting);
        let mut transaction = self.chain.new_transaction()?;
        transaction.put_node(Partition::Configuration, &entry)?;
        transaction.submit().await?;
        tracing::info!(key = %entry.name, "programmed greeting");
        Ok(())
    }

    /// Remove a greeting override from CONFIGURATION
    ///
    /// # Errors
    /// As [`GreetingService::program`]
    pub async fn forget(&self, name: &str) -> Result<(), ServiceError> {
        let key = RegistryKey::new(name)?;
        let mut transaction = self.chain.new_transaction()?;
        transaction.delete(Partition::Configuration, RegistryEntry::path_for(&key));
        transaction.submit().await?;
        tracing::info!(%key, "removed programmed greeting");
        Ok(())
    }

    /// Greeting recorded in OPERATIONAL for `name`, if any
    ///
    /// # Errors
    /// - `ServiceError::InvalidKey` for an invalid name
    /// - `ServiceError::Lookup` if the read fails
    pub async fn recorded(&self, name: &str) -> Result<Option<RegistryEntry>, ServiceError> {
        let key = RegistryKey::new(name)?;
        Ok(self.lookup.read(Partition::Operational, &key).await?)
    }

    /// Close the write chain, letting queued writes finish
    ///
    /// Later requests still get greetings, but nothing more is recorded and
    /// [`GreetingService::program`] fails with `ServiceError::Chain`.
    pub fn shutdown(&self) {
        tracing::info!(chain = %self.chain.current_id(), "shutting down greeting service");
        self.chain.close();
    }
}

#[async_trait::async_trait]
impl HelloService for GreetingService {
    async fn hello_world(&self, input: HelloWorldInput) -> Result<HelloWorldOutput, RpcError> {
        let key = RegistryKey::new(input.name).map_err(|e| RpcError::protocol("invalid name", e))?;
        let greeting = self.orchestrator.handle(GreetingRequest::new(key)).await?;
        Ok(greeting.into())
    }
}
