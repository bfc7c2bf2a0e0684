//! Testing utilities for the greeting registry workspace
//!
//! Shared fixtures for spinning up a service over an in-memory store.

#![allow(missing_docs)]

use hello_core::{GreetingService, ServiceConfig};
use hello_store::{MemoryStoreConfig, MemoryTreeStore, Partition, RegistryEntry, RegistryKey};
use std::sync::Arc;
use std::time::Duration;

/// Bound for every arrival wait in tests
pub const ARRIVAL_TIMEOUT: Duration = Duration::from_secs(5);

pub fn key(name: &str) -> RegistryKey {
    RegistryKey::new(name).unwrap()
}

pub fn memory_store() -> Arc<MemoryTreeStore> {
    Arc::new(MemoryTreeStore::new())
}

pub fn test_config() -> ServiceConfig {
    ServiceConfig::new().with_arrival_timeout(ARRIVAL_TIMEOUT)
}

pub async fn setup_test_service() -> (Arc<MemoryTreeStore>, GreetingService) {
    setup_service_with(MemoryStoreConfig::new()).await
}

pub async fn setup_service_with(store_config: MemoryStoreConfig) -> (Arc<MemoryTreeStore>, GreetingService) {
    let store = Arc::new(MemoryTreeStore::with_config(store_config.clone()));
    let service = GreetingService::start(store.clone(), test_config().with_store(store_config)).await;
    (store, service)
}

/// Service with `(name, greeting)` overrides programmed into CONFIGURATION
pub async fn setup_seeded_service(entries: &[(&str, &str)]) -> (Arc<MemoryTreeStore>, GreetingService) {
    let (store, service) = setup_test_service().await;
    for (name, greeting) in entries {
        service.program(name, greeting).await.unwrap();
    }
    (store, service)
}

/// Wait for `name` to be recorded in OPERATIONAL and return the entry
///
/// The waiter's presence check and the final read both go through
/// `TreeStore::read`, so call this only after any `fail_next_reads` budget
/// meant for the service has been spent.
pub async fn await_operational(service: &GreetingService, name: &str) -> RegistryEntry {
    let arrived = service
        .waiter()
        .wait_for(Partition::Operational, &key(name), ARRIVAL_TIMEOUT)
        .await;
    assert!(arrived, "{name} never reached OPERATIONAL");
    service.recorded(name).await.unwrap().unwrap()
}
