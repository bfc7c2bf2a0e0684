//! Key arrival notifications
//!
//! [`KeyArrivalWaiter`] resolves when a registry entry becomes visible in a
//! partition, without polling. Each [`KeyArrival`] subscribes to the store's
//! change feed for exactly one partition and path and fires at most once.
//!
//! ```text
//! Pending ──(value visible)──> Fired
//!    └─────(deadline)───────> TimedOut
//! ```

use hello_store::{ChangeEvent, Partition, RegistryEntry, RegistryKey, TreePath, TreeStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};

/// Arrival state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrivalState {
    /// Still waiting
    Pending,
    /// Value became visible
    Fired,
    /// Deadline elapsed first
    TimedOut,
}

impl ArrivalState {
    /// Check if the state is terminal
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Factory for key arrival subscriptions
#[derive(Debug, Clone)]
pub struct KeyArrivalWaiter {
    store: Arc<dyn TreeStore>,
}

impl KeyArrivalWaiter {
    /// Create waiter over `store`
    #[inline]
    #[must_use]
    pub fn new(store: Arc<dyn TreeStore>) -> Self {
        Self { store }
    }

    /// Subscribe to the arrival of `key` in `partition`
    ///
    /// The subscription starts now; a value already present when
    /// [`KeyArrival::wait`] first checks counts as arrived.
    #[must_use]
    pub fn register(&self, partition: Partition, key: &RegistryKey) -> KeyArrival {
        KeyArrival {
            store: Arc::clone(&self.store),
            partition,
            path: RegistryEntry::path_for(key),
            changes: Some(self.store.subscribe()),
            state: ArrivalState::Pending,
        }
    }

    /// Wait up to `timeout` for `key` to be visible in `partition`
    ///
    /// # Returns
    /// `true` if the entry is visible before the deadline
    pub async fn wait_for(&self, partition: Partition, key: &RegistryKey, timeout: Duration) -> bool {
        self.register(partition, key).wait(timeout).await
    }
}

/// One-shot subscription to a key's arrival
#[derive(Debug)]
pub struct KeyArrival {
    store: Arc<dyn TreeStore>,
    partition: Partition,
    path: TreePath,
    changes: Option<broadcast::Receiver<ChangeEvent>>,
    state: ArrivalState,
}

impl KeyArrival {
    /// Current state
    #[inline]
    #[must_use]
    pub fn state(&self) -> ArrivalState {
        self.state
    }

    /// Path being watched
    #[inline]
    #[must_use]
    pub fn path(&self) -> &TreePath {
        &self.path
    }

    /// Wait up to `timeout` for the value to arrive
    ///
    /// Once the state is terminal the subscription is released and further
    /// calls return the same answer immediately.
    ///
    /// Presence checks are ordinary [`TreeStore::read`] calls: they pay the
    /// store's latency and count against `MemoryTreeStore::fail_next_reads`.
    /// A failed check is treated as "not yet present".
    pub async fn wait(&mut self, timeout: Duration) -> bool {
        if self.state.is_terminal() {
            return self.state == ArrivalState::Fired;
        }
        let Some(changes) = self.changes.as_mut() else {
            return false;
        };

        let arrived = matches!(
            tokio::time::timeout(
                timeout,
                watch_path(self.store.as_ref(), self.partition, &self.path, changes),
            )
            .await,
            Ok(true)
        );

        self.changes = None;
        self.state = if arrived {
            ArrivalState::Fired
        } else {
            tracing::debug!(partition = %self.partition, path = %self.path, ?timeout, "key arrival timed out");
            ArrivalState::TimedOut
        };
        arrived
    }
}

/// Resolve `true` once `path` holds a value; `false` if the feed closes
async fn watch_path(
    store: &dyn TreeStore,
    partition: Partition,
    path: &TreePath,
    changes: &mut broadcast::Receiver<ChangeEvent>,
) -> bool {
    if is_present(store, partition, path).await {
        return true;
    }

    loop {
        match changes.recv().await {
            Ok(event) if event.is_write_of(partition, path) => return true,
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(%path, skipped, "change feed lagged; re-checking snapshot");
                if is_present(store, partition, path).await {
                    return true;
                }
            }
            Err(RecvError::Closed) => return false,
        }
    }
}

/// Snapshot check through the regular read path
async fn is_present(store: &dyn TreeStore, partition: Partition, path: &TreePath) -> bool {
    match store.read(partition, path).await {
        Ok(value) => value.is_some(),
        Err(error) => {
            tracing::debug!(%path, %error, "presence check failed; waiting for change feed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hello_store::{GreetingRegistry, MemoryStoreConfig, MemoryTreeStore, TreeNode, WriteOp};
    use serde_json::json;

    fn key(name: &str) -> RegistryKey {
        RegistryKey::new(name).unwrap()
    }

    async fn initialized_store(config: MemoryStoreConfig) -> Arc<MemoryTreeStore> {
        let store = Arc::new(MemoryTreeStore::with_config(config));
        store
            .commit(
                Partition::ALL
                    .into_iter()
                    .map(|partition| WriteOp::Put {
                        partition,
                        path: GreetingRegistry::path(),
                        value: json!({}),
                    })
                    .collect(),
            )
            .await
            .unwrap();
        store
    }

    async fn write(store: &MemoryTreeStore, partition: Partition, name: &str) {
        let entry = RegistryEntry::new(key(name), format!("Hello {name}"));
        store
            .commit(vec![WriteOp::Put {
                partition,
                path: entry.path(),
                value: entry.encode().unwrap(),
            }])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn fires_on_later_write() {
        let store = initialized_store(MemoryStoreConfig::new()).await;
        let waiter = KeyArrivalWaiter::new(store.clone());
        let mut arrival = waiter.register(Partition::Operational, &key("a"));

        let writer = {
            let store = store.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                write(&store, Partition::Operational, "a").await;
            })
        };

        assert!(arrival.wait(Duration::from_secs(5)).await);
        assert_eq!(arrival.state(), ArrivalState::Fired);
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn fires_for_value_present_at_registration() {
        let store = initialized_store(MemoryStoreConfig::new()).await;
        write(&store, Partition::Operational, "a").await;

        let waiter = KeyArrivalWaiter::new(store);
        assert!(waiter.wait_for(Partition::Operational, &key("a"), Duration::from_millis(100)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_when_nothing_arrives() {
        let store = initialized_store(MemoryStoreConfig::new()).await;
        let waiter = KeyArrivalWaiter::new(store);
        let mut arrival = waiter.register(Partition::Operational, &key("a"));

        assert!(!arrival.wait(Duration::from_millis(50)).await);
        assert_eq!(arrival.state(), ArrivalState::TimedOut);
    }

    #[tokio::test]
    async fn ignores_other_keys_and_partitions() {
        let store = initialized_store(MemoryStoreConfig::new()).await;
        let waiter = KeyArrivalWaiter::new(store.clone());
        let mut arrival = waiter.register(Partition::Operational, &key("a"));

        write(&store, Partition::Operational, "ab").await;
        write(&store, Partition::Operational, "b").await;
        write(&store, Partition::Configuration, "a").await;

        assert!(!arrival.wait(Duration::from_millis(100)).await);
    }

    #[tokio::test]
    async fn ignores_deletes() {
        let store = initialized_store(MemoryStoreConfig::new()).await;
        let waiter = KeyArrivalWaiter::new(store.clone());
        let mut arrival = waiter.register(Partition::Operational, &key("a"));

        store
            .commit(vec![WriteOp::Delete {
                partition: Partition::Operational,
                path: RegistryEntry::path_for(&key("a")),
            }])
            .await
            .unwrap();

        assert!(!arrival.wait(Duration::from_millis(50)).await);
    }

    #[tokio::test]
    async fn terminal_state_is_sticky() {
        let store = initialized_store(MemoryStoreConfig::new()).await;
        let waiter = KeyArrivalWaiter::new(store.clone());
        let mut arrival = waiter.register(Partition::Operational, &key("a"));

        assert!(!arrival.wait(Duration::from_millis(10)).await);
        write(&store, Partition::Operational, "a").await;

        // No second completion once timed out
        assert!(!arrival.wait(Duration::from_secs(1)).await);
        assert_eq!(arrival.state(), ArrivalState::TimedOut);
    }

    #[tokio::test]
    async fn lagged_subscriber_rechecks_snapshot() {
        let store = initialized_store(MemoryStoreConfig::new().with_change_buffer(1)).await;
        let waiter = KeyArrivalWaiter::new(store.clone());
        let mut arrival = waiter.register(Partition::Operational, &key("a"));

        // One commit, three events: the write of "a" is pushed out of the
        // 1-slot feed before the waiter reads it, leaving only "c"
        let ops = ["a", "b", "c"]
            .into_iter()
            .map(|name| {
                let entry = RegistryEntry::new(key(name), format!("Hello {name}"));
                WriteOp::Put {
                    partition: Partition::Operational,
                    path: entry.path(),
                    value: entry.encode().unwrap(),
                }
            })
            .collect();
        store.commit(ops).await.unwrap();

        // The first snapshot check sees nothing, so only the re-check after
        // the lag can observe "a"
        store.fail_next_reads(1);
        assert!(arrival.wait(Duration::from_millis(200)).await);
        assert_eq!(arrival.state(), ArrivalState::Fired);
    }

    #[tokio::test]
    async fn presence_check_shares_read_fault_budget() {
        let store = initialized_store(MemoryStoreConfig::new()).await;
        write(&store, Partition::Operational, "a").await;
        let waiter = KeyArrivalWaiter::new(store.clone());

        store.fail_next_reads(1);
        // Failed snapshot read, no later write: the present value is missed
        assert!(!waiter.wait_for(Partition::Operational, &key("a"), Duration::from_millis(50)).await);
        // The injected fault was spent by the waiter
        assert!(store.read(Partition::Operational, &RegistryEntry::path_for(&key("a"))).await.is_ok());
    }

    #[test]
    fn arrival_state_terminality() {
        assert!(!ArrivalState::Pending.is_terminal());
        assert!(ArrivalState::Fired.is_terminal());
        assert!(ArrivalState::TimedOut.is_terminal());
    }
}
