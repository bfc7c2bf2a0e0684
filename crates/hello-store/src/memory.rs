//! In-memory tree store
//!
//! [`MemoryTreeStore`] keeps each partition in an ordered map keyed by
//! [`TreePath`]. Commits run under one write lock with an undo log, so a
//! failing operation leaves no trace. Change events are published while the
//! lock is held, which keeps the feed in generation order.

use crate::error::StoreError;
use crate::path::TreePath;
use crate::store::TreeStore;
use crate::types::{ChangeEvent, ChangeKind, Generation, Partition, WriteOp};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::broadcast;

/// Memory store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryStoreConfig {
    /// Capacity of the change feed before slow subscribers lag
    pub change_buffer: usize,
    /// Simulated latency applied to every read and commit
    pub commit_latency_ms: u64,
}

impl MemoryStoreConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With change feed capacity
    #[inline]
    #[must_use]
    pub fn with_change_buffer(mut self, capacity: usize) -> Self {
        self.change_buffer = capacity;
        self
    }

    /// With simulated latency
    #[inline]
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.commit_latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Simulated latency as a duration
    #[inline]
    #[must_use]
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.commit_latency_ms)
    }
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self {
            change_buffer: 1024,
            commit_latency_ms: 0,
        }
    }
}

/// One undo record: the value a path held before the commit touched it
#[derive(Debug)]
struct Undo {
    partition: Partition,
    path: TreePath,
    previous: Option<Value>,
}

#[derive(Debug, Default)]
struct StoreState {
    generation: Generation,
    configuration: BTreeMap<TreePath, Value>,
    operational: BTreeMap<TreePath, Value>,
}

impl StoreState {
    fn partition(&self, partition: Partition) -> &BTreeMap<TreePath, Value> {
        match partition {
            Partition::Configuration => &self.configuration,
            Partition::Operational => &self.operational,
        }
    }

    fn partition_mut(&mut self, partition: Partition) -> &mut BTreeMap<TreePath, Value> {
        match partition {
            Partition::Configuration => &mut self.configuration,
            Partition::Operational => &mut self.operational,
        }
    }

    fn apply(
        &mut self,
        op: WriteOp,
        generation: Generation,
        undo: &mut Vec<Undo>,
        events: &mut Vec<ChangeEvent>,
    ) -> Result<(), StoreError> {
        match op {
            WriteOp::Put {
                partition,
                path,
                value,
            } => {
                if path.is_root() {
                    return Err(StoreError::CommitFailed(
                        "the tree root cannot be replaced".to_string(),
                    ));
                }

                let map = self.partition_mut(partition);
                let parent_exists = path
                    .parent()
                    .is_some_and(|parent| parent.is_root() || map.contains_key(&parent));
                if !parent_exists {
                    return Err(StoreError::MissingParent { partition, path });
                }

                let previous = map.insert(path.clone(), value);
                undo.push(Undo {
                    partition,
                    path: path.clone(),
                    previous,
                });
                events.push(ChangeEvent {
                    generation,
                    partition,
                    path,
                    kind: ChangeKind::Written,
                });
            }
            WriteOp::Delete { partition, path } => {
                let map = self.partition_mut(partition);
                let doomed: Vec<TreePath> = map
                    .range(path.clone()..)
                    .take_while(|(candidate, _)| candidate.starts_with(&path))
                    .map(|(candidate, _)| candidate.clone())
                    .collect();

                for doomed_path in doomed {
                    let previous = map.remove(&doomed_path);
                    undo.push(Undo {
                        partition,
                        path: doomed_path.clone(),
                        previous,
                    });
                    events.push(ChangeEvent {
                        generation,
                        partition,
                        path: doomed_path,
                        kind: ChangeKind::Deleted,
                    });
                }
            }
        }
        Ok(())
    }

    fn rollback(&mut self, undo: Vec<Undo>) {
        for record in undo.into_iter().rev() {
            let map = self.partition_mut(record.partition);
            match record.previous {
                Some(value) => {
                    map.insert(record.path, value);
                }
                None => {
                    map.remove(&record.path);
                }
            }
        }
    }
}

/// Countdown fault injection for tests and simulations
#[derive(Debug, Default)]
struct FaultInjector {
    reads: AtomicUsize,
    commits: AtomicUsize,
}

impl FaultInjector {
    fn take(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

/// In-process [`TreeStore`]
#[derive(Debug)]
pub struct MemoryTreeStore {
    config: MemoryStoreConfig,
    state: RwLock<StoreState>,
    changes: broadcast::Sender<ChangeEvent>,
    faults: FaultInjector,
}

impl MemoryTreeStore {
    /// Create an empty store with default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MemoryStoreConfig::default())
    }

    /// Create an empty store
    #[must_use]
    pub fn with_config(config: MemoryStoreConfig) -> Self {
        let (changes, _) = broadcast::channel(config.change_buffer.max(1));
        Self {
            config,
            state: RwLock::new(StoreState::default()),
            changes,
            faults: FaultInjector::default(),
        }
    }

    /// Store configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &MemoryStoreConfig {
        &self.config
    }

    /// Make the next `count` reads fail
    pub fn fail_next_reads(&self, count: usize) {
        self.faults.reads.store(count, Ordering::SeqCst);
    }

    /// Make the next `count` commits fail
    pub fn fail_next_commits(&self, count: usize) {
        self.faults.commits.store(count, Ordering::SeqCst);
    }

    /// Check if a node exists, bypassing latency and faults
    #[must_use]
    pub fn contains(&self, partition: Partition, path: &TreePath) -> bool {
        self.state.read().partition(partition).contains_key(path)
    }

    /// Number of nodes in a partition
    #[must_use]
    pub fn len(&self, partition: Partition) -> usize {
        self.state.read().partition(partition).len()
    }

    /// Check if a partition holds no nodes
    #[must_use]
    pub fn is_empty(&self, partition: Partition) -> bool {
        self.len(partition) == 0
    }

    async fn simulate_latency(&self) {
        let latency = self.config.latency();
        if latency.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(latency).await;
        }
    }

    fn apply_commit(&self, ops: Vec<WriteOp>) -> Result<Generation, StoreError> {
        let mut state = self.state.write();
        if ops.is_empty() {
            return Ok(state.generation);
        }

        let generation = state.generation.next();
        let mut undo = Vec::with_capacity(ops.len());
        let mut events = Vec::with_capacity(ops.len());

        for op in ops {
            if let Err(error) = state.apply(op, generation, &mut undo, &mut events) {
                state.rollback(undo);
                return Err(error);
            }
        }

        state.generation = generation;
        for event in events {
            // No subscribers is not an error
            let _ = self.changes.send(event);
        }

        Ok(generation)
    }
}

impl Default for MemoryTreeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl TreeStore for MemoryTreeStore {
    async fn read(&self, partition: Partition, path: &TreePath) -> Result<Option<Value>, StoreError> {
        self.simulate_latency().await;

        if FaultInjector::take(&self.faults.reads) {
            return Err(StoreError::ReadFailed {
                partition,
                path: path.clone(),
                reason: "injected read failure".to_string(),
            });
        }

        Ok(self.state.read().partition(partition).get(path).cloned())
    }

    async fn commit(&self, ops: Vec<WriteOp>) -> Result<Generation, StoreError> {
        self.simulate_latency().await;

        if FaultInjector::take(&self.faults.commits) {
            tracing::debug!(ops = ops.len(), "rejecting commit: injected failure");
            return Err(StoreError::CommitFailed("injected commit failure".to_string()));
        }

        let generation = self.apply_commit(ops)?;
        tracing::trace!(%generation, "commit applied");
        Ok(generation)
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }

    fn generation(&self) -> Generation {
        self.state.read().generation
    }
}
