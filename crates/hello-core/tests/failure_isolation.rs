//! Failure handling across the greeting service.
//!
//! Guarantees exercised here:
//! - A failed CONFIGURATION read fails the request and writes nothing.
//! - A failed OPERATIONAL write never reaches the caller; it is reported on
//!   the chain event feed instead.
//! - After a chain fails, the next request runs on a fresh chain and its
//!   write persists.

use hello_core::{ChainEvent, CommitFailure, ErrorType, HelloService, HelloWorldInput};
use hello_store::{Partition, RegistryEntry, StoreError};
use hello_test_utils::{await_operational, key, setup_test_service, ARRIVAL_TIMEOUT};
use pretty_assertions::assert_eq;
use std::time::Duration;

/// Read failures surface as RPC errors and skip the operational write.
#[tokio::test]
async fn read_failure_fails_request_without_write() {
    let (store, service) = setup_test_service().await;
    store.fail_next_reads(1);

    let err = service
        .hello_world(HelloWorldInput::new("Sebastian"))
        .await
        .unwrap_err();
    assert_eq!(err.error_type, ErrorType::Rpc);
    assert_eq!(err.message, "Failed");

    let arrived = service
        .waiter()
        .wait_for(Partition::Operational, &key("Sebastian"), Duration::from_millis(100))
        .await;
    assert!(!arrived);
}

/// Write failures are invisible to the caller and reported on the chain feed.
#[tokio::test]
async fn write_failure_is_reported_on_chain_feed() {
    let (store, service) = setup_test_service().await;
    let mut events = service.chain_events();
    let failing_chain = service.current_chain();
    store.fail_next_commits(1);

    let output = service
        .hello_world(HelloWorldInput::new("Sebastian"))
        .await
        .unwrap();
    assert_eq!(output.greeting, "Hello Sebastian");

    let event = tokio::time::timeout(ARRIVAL_TIMEOUT, events.recv())
        .await
        .expect("chain event")
        .unwrap();
    match event {
        ChainEvent::Failed { chain, cause, .. } => {
            assert_eq!(chain, failing_chain);
            assert!(matches!(
                cause,
                CommitFailure::Store {
                    source: StoreError::CommitFailed(_),
                    ..
                }
            ));
        }
        other => panic!("unexpected chain event: {other:?}"),
    }
    assert!(!store.contains(
        Partition::Operational,
        &RegistryEntry::path_for(&key("Sebastian"))
    ));
}

/// The service replaces a failed chain and keeps recording.
#[tokio::test]
async fn next_request_recovers_on_new_chain() {
    let (store, service) = setup_test_service().await;
    let mut events = service.chain_events();
    let first_chain = service.current_chain();
    store.fail_next_commits(1);

    service.hello_world(HelloWorldInput::new("Sebastian")).await.unwrap();
    let event = tokio::time::timeout(ARRIVAL_TIMEOUT, events.recv())
        .await
        .expect("chain event")
        .unwrap();
    assert!(event.is_failure());

    let output = service.hello_world(HelloWorldInput::new("Ana")).await.unwrap();
    assert_eq!(output.greeting, "Hello Ana");
    assert_eq!(await_operational(&service, "Ana").await.greeting, "Hello Ana");
    assert_ne!(service.current_chain(), first_chain);
}

/// Programming through a failed store surfaces the commit error directly.
#[tokio::test]
async fn program_reports_commit_failure() {
    let (store, service) = setup_test_service().await;
    store.fail_next_commits(1);

    let err = service.program("Jesus", "Hola Jesus").await.unwrap_err();
    assert!(matches!(err, hello_core::ServiceError::Commit(_)));

    // A retry goes through on a replacement chain
    service.program("Jesus", "Hola Jesus").await.unwrap();
    let output = service.hello_world(HelloWorldInput::new("Jesus")).await.unwrap();
    assert_eq!(output.greeting, "Hola Jesus");
}
