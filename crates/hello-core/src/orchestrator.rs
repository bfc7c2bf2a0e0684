//! Greeting orchestration
//!
//! [`GreetingOrchestrator`] runs the read-then-write workflow for one request:
//! 1. Read the CONFIGURATION entry for the key
//! 2. Use the stored greeting, or compute the default one
//! 3. Resolve the caller's [`GreetingFuture`]
//! 4. Record the greeting in OPERATIONAL through the shared chain
//!
//! Step 4 starts only after step 3, and its outcome is logged, never returned
//! to the caller. A failed read resolves the caller with an RPC error and
//! skips the write.

use crate::chain::{log_commit_outcome, SharedChain};
use crate::error::{ErrorType, RpcError};
use crate::lookup::RegistryLookup;
use crate::types::{Greeting, GreetingRequest};
use hello_store::{Partition, RegistryEntry, RegistryKey};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// Default greeting: `prefix` followed by the key
#[inline]
#[must_use]
pub fn default_greeting(prefix: &str, key: &RegistryKey) -> String {
    format!("{prefix}{key}")
}

/// Caller-visible result of one greeting request
#[derive(Debug)]
#[must_use = "greeting futures do nothing unless awaited"]
pub struct GreetingFuture {
    rx: oneshot::Receiver<Result<Greeting, RpcError>>,
}

impl Future for GreetingFuture {
    type Output = Result<Greeting, RpcError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(RpcError::new(
                ErrorType::Application,
                "greeting workflow stopped before responding",
            ))),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Read-then-write greeting workflow
#[derive(Debug, Clone)]
pub struct GreetingOrchestrator {
    lookup: RegistryLookup,
    chain: Arc<SharedChain>,
    prefix: Arc<str>,
}

impl GreetingOrchestrator {
    /// Create orchestrator
    #[must_use]
    pub fn new(lookup: RegistryLookup, chain: Arc<SharedChain>, prefix: impl Into<Arc<str>>) -> Self {
        Self {
            lookup,
            chain,
            prefix: prefix.into(),
        }
    }

    /// Default greeting for `key` under this orchestrator's prefix
    #[inline]
    #[must_use]
    pub fn default_greeting(&self, key: &RegistryKey) -> String {
        default_greeting(&self.prefix, key)
    }

    /// Start the workflow for `request`
    ///
    /// The workflow runs on its own task and completes even if the returned
    /// future is dropped. Must be called within a Tokio runtime.
    pub fn handle(&self, request: GreetingRequest) -> GreetingFuture {
        let (reply, rx) = oneshot::channel();
        tokio::spawn(self.clone().run(request, reply));
        GreetingFuture { rx }
    }

    async fn run(self, request: GreetingRequest, reply: oneshot::Sender<Result<Greeting, RpcError>>) {
        let GreetingRequest { key } = request;

        let stored = match self.lookup.read(Partition::Configuration, &key).await {
            Ok(stored) => stored,
            Err(error) => {
                tracing::warn!(%key, %error, "greeting lookup failed");
                let _ = reply.send(Err(RpcError::rpc("Failed", error)));
                return;
            }
        };

        let value = match stored {
            Some(entry) => {
                tracing::debug!(%key, "using programmed greeting");
                entry.greeting
            }
            None => self.default_greeting(&key),
        };

        if reply
            .send(Ok(Greeting {
                value: value.clone(),
            }))
            .is_err()
        {
            tracing::debug!(%key, "caller went away before the greeting resolved");
        }

        self.record(RegistryEntry::new(key, value)).await;
    }

    /// Write `entry` to OPERATIONAL and log the outcome
    async fn record(&self, entry: RegistryEntry) {
        let mut transaction = match self.chain.new_transaction() {
            Ok(transaction) => transaction,
            Err(error) => {
                tracing::warn!(key = %entry.name, %error, "no transaction available to record greeting");
                return;
            }
        };

        if let Err(error) = transaction.put_node(Partition::Operational, &entry) {
            tracing::warn!(key = %entry.name, %error, "failed to encode greeting entry");
            return;
        }

        // Failure already reaches the chain's event channel
        let _ = log_commit_outcome(
            "failed to write greeting to greeting registry",
            transaction.submit(),
        )
        .await;
    }
}
