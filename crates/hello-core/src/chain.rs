//! Transaction chains
//!
//! A [`TransactionChain`] sequences dependent transactions against a
//! [`TreeStore`]:
//! - One worker task per chain commits transactions in submission order
//! - The first failed commit closes the chain, emits a single
//!   [`ChainEvent::Failed`], and abandons every transaction queued behind it
//! - An explicit [`TransactionChain::close`] drains outstanding transactions
//!   and emits [`ChainEvent::Closed`] if none failed
//!
//! Chains never retry. A caller that wants to continue after a failure opens a
//! new chain; [`SharedChain`] does that on demand for long-lived services.

use crate::error::{ChainError, CommitFailure};
use crate::types::{ChainId, TransactionId};
use hello_store::{Generation, Partition, StoreError, TreeNode, TreePath, TreeStore, WriteOp};
use parking_lot::Mutex;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{broadcast, mpsc, oneshot};

/// Capacity of the [`SharedChain`] event relay
const RELAY_CAPACITY: usize = 64;

/// Lifecycle state of one chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainState {
    /// Whether the chain accepts new transactions
    pub alive: bool,
    /// Failure that closed the chain, if any
    pub last_error: Option<CommitFailure>,
}

impl ChainState {
    fn active() -> Self {
        Self {
            alive: true,
            last_error: None,
        }
    }
}

/// Terminal chain notification, delivered at most once per chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainEvent {
    /// A commit failed; the chain is closed
    Failed {
        /// Failed chain
        chain: ChainId,
        /// Transaction whose commit failed
        transaction: TransactionId,
        /// Commit failure
        cause: CommitFailure,
    },
    /// The chain was closed after committing everything submitted to it
    Closed {
        /// Closed chain
        chain: ChainId,
    },
}

impl ChainEvent {
    /// Chain the event belongs to
    #[inline]
    #[must_use]
    pub fn chain(&self) -> ChainId {
        match self {
            Self::Failed { chain, .. } | Self::Closed { chain } => *chain,
        }
    }

    /// Check if this is a failure
    #[inline]
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Single-fire receiver for a chain's terminal event
#[derive(Debug)]
pub struct ChainEvents {
    chain: ChainId,
    rx: oneshot::Receiver<ChainEvent>,
}

impl ChainEvents {
    /// Chain this receiver observes
    #[inline]
    #[must_use]
    pub fn chain(&self) -> ChainId {
        self.chain
    }

    /// Wait for the terminal event
    ///
    /// Returns `None` if the chain was dropped without failing or being
    /// closed.
    pub async fn recv(self) -> Option<ChainEvent> {
        self.rx.await.ok()
    }

    /// Take the terminal event if it has already fired
    pub fn try_recv(&mut self) -> Option<ChainEvent> {
        self.rx.try_recv().ok()
    }
}

enum ChainCommand {
    Commit {
        transaction: TransactionId,
        ops: Vec<WriteOp>,
        reply: oneshot::Sender<Result<Generation, CommitFailure>>,
    },
    Close,
}

#[derive(Debug)]
struct ChainShared {
    id: ChainId,
    state: Arc<Mutex<ChainState>>,
    queue: mpsc::UnboundedSender<ChainCommand>,
}

impl std::fmt::Debug for ChainCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Commit { transaction, ops, .. } => f
                .debug_struct("Commit")
                .field("transaction", transaction)
                .field("ops", &ops.len())
                .finish(),
            Self::Close => f.write_str("Close"),
        }
    }
}

/// Ordered sequence of transactions with shared failure semantics
#[derive(Debug)]
pub struct TransactionChain {
    shared: Arc<ChainShared>,
}

impl TransactionChain {
    /// Open a chain over `store`
    ///
    /// Spawns the chain's commit worker, so it must be called within a Tokio
    /// runtime.
    ///
    /// # Returns
    /// The chain handle and the receiver for its terminal event
    #[must_use]
    pub fn open(store: Arc<dyn TreeStore>) -> (Self, ChainEvents) {
        let id = ChainId::new();
        let state = Arc::new(Mutex::new(ChainState::active()));
        let (queue, commands) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = oneshot::channel();

        tokio::spawn(run_chain(id, store, Arc::clone(&state), commands, events_tx));
        tracing::debug!(chain = %id, "transaction chain opened");

        let chain = Self {
            shared: Arc::new(ChainShared { id, state, queue }),
        };
        let events = ChainEvents {
            chain: id,
            rx: events_rx,
        };
        (chain, events)
    }

    /// Chain identifier
    #[inline]
    #[must_use]
    pub fn id(&self) -> ChainId {
        self.shared.id
    }

    /// Snapshot of the chain state
    #[must_use]
    pub fn state(&self) -> ChainState {
        self.shared.state.lock().clone()
    }

    /// Check if the chain accepts new transactions
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.shared.state.lock().alive
    }

    /// Start a new write transaction
    ///
    /// # Errors
    /// `ChainError::ChainClosed` if the chain failed or was closed
    pub fn new_transaction(&self) -> Result<Transaction, ChainError> {
        if !self.is_alive() {
            return Err(ChainError::ChainClosed(self.shared.id));
        }
        Ok(Transaction {
            id: TransactionId::new(),
            chain: Arc::clone(&self.shared),
            ops: Vec::new(),
        })
    }

    /// Stop accepting transactions and report success once drained
    ///
    /// Transactions already submitted still commit. Idempotent; a no-op on a
    /// failed chain.
    pub fn close(&self) {
        {
            let mut state = self.shared.state.lock();
            if !state.alive {
                return;
            }
            state.alive = false;
        }
        // Worker gone means nobody is left to notify
        let _ = self.shared.queue.send(ChainCommand::Close);
    }
}

/// Write transaction bound to a chain
#[derive(Debug)]
pub struct Transaction {
    id: TransactionId,
    chain: Arc<ChainShared>,
    ops: Vec<WriteOp>,
}

impl Transaction {
    /// Transaction identifier
    #[inline]
    #[must_use]
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Owning chain
    #[inline]
    #[must_use]
    pub fn chain(&self) -> ChainId {
        self.chain.id
    }

    /// Number of staged operations
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Check if nothing is staged
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Stage a put of a raw value
    pub fn put(&mut self, partition: Partition, path: TreePath, value: Value) -> &mut Self {
        self.ops.push(WriteOp::Put {
            partition,
            path,
            value,
        });
        self
    }

    /// Stage a put of a typed node at its own path
    ///
    /// # Errors
    /// `StoreError::Encode` if the node cannot be serialized
    pub fn put_node<N: TreeNode>(&mut self, partition: Partition, node: &N) -> Result<&mut Self, StoreError> {
        let value = node.encode()?;
        Ok(self.put(partition, node.path(), value))
    }

    /// Stage removal of `path` and its subtree
    pub fn delete(&mut self, partition: Partition, path: TreePath) -> &mut Self {
        self.ops.push(WriteOp::Delete { partition, path });
        self
    }

    /// Queue the transaction for commit
    ///
    /// The returned future resolves once the chain worker has committed or
    /// abandoned the transaction. Dropping it does not cancel the commit.
    pub fn submit(self) -> CommitFuture {
        let (reply, rx) = oneshot::channel();
        let chain = self.chain.id;
        let transaction = self.id;

        // A closed queue drops `reply`, which resolves the future as abandoned
        let _ = self.chain.queue.send(ChainCommand::Commit {
            transaction,
            ops: self.ops,
            reply,
        });

        CommitFuture {
            chain,
            transaction,
            rx,
        }
    }
}

/// Outcome of a submitted transaction
#[derive(Debug)]
#[must_use = "commit outcomes should be observed or logged"]
pub struct CommitFuture {
    chain: ChainId,
    transaction: TransactionId,
    rx: oneshot::Receiver<Result<Generation, CommitFailure>>,
}

impl CommitFuture {
    /// Submitted transaction
    #[inline]
    pub fn transaction(&self) -> TransactionId {
        self.transaction
    }
}

impl Future for CommitFuture {
    type Output = Result<Generation, CommitFailure>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let chain = self.chain;
        let transaction = self.transaction;
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(_)) => Poll::Ready(Err(CommitFailure::Abandoned { chain, transaction })),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Await a commit and log its outcome
///
/// `context` is the warning logged if the commit fails; success is logged
/// without it.
pub async fn log_commit_outcome(
    context: &str,
    commit: CommitFuture,
) -> Result<Generation, CommitFailure> {
    let transaction = commit.transaction();
    match commit.await {
        Ok(generation) => {
            tracing::info!(%transaction, %generation, "transaction committed");
            Ok(generation)
        }
        Err(failure) => {
            tracing::warn!(%transaction, error = %failure, "{context}");
            Err(failure)
        }
    }
}

/// Chain commit worker
async fn run_chain(
    chain: ChainId,
    store: Arc<dyn TreeStore>,
    state: Arc<Mutex<ChainState>>,
    mut commands: mpsc::UnboundedReceiver<ChainCommand>,
    events: oneshot::Sender<ChainEvent>,
) {
    let mut events = Some(events);
    let mut failed = false;

    while let Some(command) = commands.recv().await {
        match command {
            ChainCommand::Commit {
                transaction,
                ops,
                reply,
            } => {
                if failed {
                    tracing::debug!(%chain, %transaction, "abandoning transaction queued behind failure");
                    let _ = reply.send(Err(CommitFailure::Abandoned { chain, transaction }));
                    continue;
                }

                match store.commit(ops).await {
                    Ok(generation) => {
                        tracing::trace!(%chain, %transaction, %generation, "transaction committed");
                        let _ = reply.send(Ok(generation));
                    }
                    Err(source) => {
                        failed = true;
                        let failure = CommitFailure::Store {
                            chain,
                            transaction,
                            source,
                        };
                        {
                            let mut state = state.lock();
                            state.alive = false;
                            state.last_error = Some(failure.clone());
                        }
                        if let Some(events) = events.take() {
                            let _ = events.send(ChainEvent::Failed {
                                chain,
                                transaction,
                                cause: failure.clone(),
                            });
                        }
                        let _ = reply.send(Err(failure));
                    }
                }
            }
            ChainCommand::Close => {
                if let Some(events) = events.take() {
                    let _ = events.send(ChainEvent::Closed { chain });
                }
                break;
            }
        }
    }

    tracing::debug!(%chain, failed, "transaction chain worker stopped");
}

/// Long-lived chain slot that reopens its chain after a failure
///
/// Every chain it opens has its terminal event logged and relayed to
/// [`SharedChain::subscribe`] receivers.
#[derive(Debug)]
pub struct SharedChain {
    store: Arc<dyn TreeStore>,
    current: Mutex<ChainSlot>,
    relay: broadcast::Sender<ChainEvent>,
}

#[derive(Debug)]
struct ChainSlot {
    chain: TransactionChain,
    shut_down: bool,
}

impl SharedChain {
    /// Open the first chain over `store`
    ///
    /// Must be called within a Tokio runtime.
    #[must_use]
    pub fn open(store: Arc<dyn TreeStore>) -> Self {
        let (relay, _) = broadcast::channel(RELAY_CAPACITY);
        let chain = Self::open_chain(&store, &relay);
        Self {
            store,
            current: Mutex::new(ChainSlot {
                chain,
                shut_down: false,
            }),
            relay,
        }
    }

    /// Identifier of the chain currently in use
    #[must_use]
    pub fn current_id(&self) -> ChainId {
        self.current.lock().chain.id()
    }

    /// Subscribe to terminal events of this and every later chain
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ChainEvent> {
        self.relay.subscribe()
    }

    /// Start a transaction, replacing the chain first if it failed
    ///
    /// # Errors
    /// `ChainError::ChainClosed` after [`SharedChain::close`]
    pub fn new_transaction(&self) -> Result<Transaction, ChainError> {
        let mut current = self.current.lock();
        match current.chain.new_transaction() {
            Ok(transaction) => Ok(transaction),
            Err(error) if current.shut_down => Err(error),
            Err(ChainError::ChainClosed(closed)) => {
                let replacement = Self::open_chain(&self.store, &self.relay);
                tracing::info!(closed = %closed, replacement = %replacement.id(), "replacing failed transaction chain");
                current.chain = replacement;
                current.chain.new_transaction()
            }
        }
    }

    /// Close the current chain and stop opening new ones
    ///
    /// Transactions already submitted still commit.
    pub fn close(&self) {
        let mut current = self.current.lock();
        current.shut_down = true;
        current.chain.close();
    }

    /// Check if [`SharedChain::close`] was called
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.current.lock().shut_down
    }

    fn open_chain(store: &Arc<dyn TreeStore>, relay: &broadcast::Sender<ChainEvent>) -> TransactionChain {
        let (chain, events) = TransactionChain::open(Arc::clone(store));
        tokio::spawn(relay_chain_events(events, relay.clone()));
        chain
    }
}

/// Log a chain's terminal event and forward it to subscribers
async fn relay_chain_events(events: ChainEvents, relay: broadcast::Sender<ChainEvent>) {
    let chain = events.chain();
    let Some(event) = events.recv().await else {
        tracing::debug!(%chain, "transaction chain dropped without terminal event");
        return;
    };

    match &event {
        ChainEvent::Failed { cause, .. } => {
            tracing::warn!(%chain, error = %cause, "greeting transaction chain failed");
        }
        ChainEvent::Closed { .. } => {
            tracing::info!(%chain, "greeting transaction chain closed successfully");
        }
    }
    let _ = relay.send(event);
}

#[cfg(test)]
mod tests {
    use super::*;
    use hello_store::{
        GreetingRegistry, MemoryStoreConfig, MemoryTreeStore, RegistryEntry, RegistryKey,
    };
    use serde_json::json;
    use std::time::Duration;

    async fn initialized_store(config: MemoryStoreConfig) -> Arc<MemoryTreeStore> {
        let store = Arc::new(MemoryTreeStore::with_config(config));
        let registry = GreetingRegistry::default().encode().unwrap();
        store
            .commit(vec![
                WriteOp::Put {
                    partition: Partition::Configuration,
                    path: GreetingRegistry::path(),
                    value: registry.clone(),
                },
                WriteOp::Put {
                    partition: Partition::Operational,
                    path: GreetingRegistry::path(),
                    value: registry,
                },
            ])
            .await
            .unwrap();
        store
    }

    fn entry(name: &str, greeting: &str) -> RegistryEntry {
        RegistryEntry::new(RegistryKey::new(name).unwrap(), greeting)
    }

    #[tokio::test]
    async fn commit_applies_write() {
        let store = initialized_store(MemoryStoreConfig::new()).await;
        let (chain, _events) = TransactionChain::open(store.clone());

        let mut tx = chain.new_transaction().unwrap();
        tx.put_node(Partition::Operational, &entry("a", "Hello a")).unwrap();
        assert_eq!(tx.len(), 1);
        assert_eq!(tx.chain(), chain.id());

        let generation = tx.submit().await.unwrap();
        assert_eq!(generation, store.generation());
        assert!(store.contains(Partition::Operational, &entry("a", "").path()));
    }

    #[tokio::test]
    async fn commits_in_submission_order() {
        let store =
            initialized_store(MemoryStoreConfig::new().with_latency(Duration::from_millis(1))).await;
        let (chain, _events) = TransactionChain::open(store.clone());
        let path = entry("a", "").path();

        let commits: Vec<CommitFuture> = (0..10)
            .map(|i| {
                let mut tx = chain.new_transaction().unwrap();
                tx.put(Partition::Operational, path.clone(), json!(i));
                tx.submit()
            })
            .collect();

        let mut last = Generation::default();
        for commit in commits {
            let generation = commit.await.unwrap();
            assert!(generation > last);
            last = generation;
        }

        let value = store.read(Partition::Operational, &path).await.unwrap();
        assert_eq!(value, Some(json!(9)));
    }

    #[tokio::test]
    async fn failure_fires_once_and_closes_chain() {
        let store = initialized_store(MemoryStoreConfig::new()).await;
        let (chain, events) = TransactionChain::open(store.clone());
        store.fail_next_commits(1);

        let mut tx = chain.new_transaction().unwrap();
        tx.put_node(Partition::Operational, &entry("a", "Hello a")).unwrap();
        let failure = tx.submit().await.unwrap_err();
        assert!(matches!(failure, CommitFailure::Store { .. }));

        let event = events.recv().await.unwrap();
        assert!(event.is_failure());
        assert_eq!(event.chain(), chain.id());

        let state = chain.state();
        assert!(!state.alive);
        assert_eq!(state.last_error, Some(failure));

        assert_eq!(
            chain.new_transaction().unwrap_err(),
            ChainError::ChainClosed(chain.id())
        );
    }

    #[tokio::test]
    async fn queued_transactions_are_abandoned() {
        let store = initialized_store(MemoryStoreConfig::new()).await;
        let (chain, mut events) = TransactionChain::open(store.clone());
        store.fail_next_commits(1);

        let mut first = chain.new_transaction().unwrap();
        first.put_node(Partition::Operational, &entry("a", "Hello a")).unwrap();
        let mut second = chain.new_transaction().unwrap();
        second.put_node(Partition::Operational, &entry("b", "Hello b")).unwrap();

        let first = first.submit();
        let second = second.submit();

        assert!(matches!(first.await, Err(CommitFailure::Store { .. })));
        assert!(matches!(second.await, Err(CommitFailure::Abandoned { .. })));

        // Single failure event, even though two transactions did not commit
        assert!(events.try_recv().is_some_and(|e| e.is_failure()));
        assert!(events.try_recv().is_none());
        assert!(!store.contains(Partition::Operational, &entry("b", "").path()));
    }

    #[tokio::test]
    async fn close_reports_success_after_draining() {
        let store =
            initialized_store(MemoryStoreConfig::new().with_latency(Duration::from_millis(2))).await;
        let (chain, events) = TransactionChain::open(store.clone());

        let mut tx = chain.new_transaction().unwrap();
        tx.put_node(Partition::Operational, &entry("a", "Hello a")).unwrap();
        let commit = tx.submit();
        chain.close();

        assert_eq!(events.recv().await, Some(ChainEvent::Closed { chain: chain.id() }));
        assert!(commit.await.is_ok());
        assert!(matches!(chain.new_transaction(), Err(ChainError::ChainClosed(_))));
    }

    #[tokio::test]
    async fn submit_after_close_is_abandoned() {
        let store = initialized_store(MemoryStoreConfig::new()).await;
        let (chain, events) = TransactionChain::open(store.clone());

        let mut late = chain.new_transaction().unwrap();
        late.put_node(Partition::Operational, &entry("a", "Hello a")).unwrap();
        chain.close();
        assert!(matches!(events.recv().await, Some(ChainEvent::Closed { .. })));

        assert!(matches!(late.submit().await, Err(CommitFailure::Abandoned { .. })));
        assert!(!store.contains(Partition::Operational, &entry("a", "").path()));
    }

    #[tokio::test]
    async fn close_after_failure_emits_nothing_more() {
        let store = initialized_store(MemoryStoreConfig::new()).await;
        let (chain, mut events) = TransactionChain::open(store.clone());
        store.fail_next_commits(1);

        let tx = chain.new_transaction().unwrap();
        let _ = tx.submit().await;
        chain.close();

        assert!(events.try_recv().is_some_and(|e| e.is_failure()));
        assert!(events.try_recv().is_none());
    }

    #[tokio::test]
    async fn dropped_chain_reports_nothing() {
        let store = initialized_store(MemoryStoreConfig::new()).await;
        let (chain, events) = TransactionChain::open(store);
        drop(chain);
        assert_eq!(events.recv().await, None);
    }

    #[tokio::test]
    async fn shared_chain_reopens_after_failure() {
        let store = initialized_store(MemoryStoreConfig::new()).await;
        let shared = SharedChain::open(store.clone());
        let mut relayed = shared.subscribe();
        let first_chain = shared.current_id();
        store.fail_next_commits(1);

        let mut tx = shared.new_transaction().unwrap();
        tx.put_node(Partition::Operational, &entry("a", "Hello a")).unwrap();
        assert!(tx.submit().await.is_err());

        let event = relayed.recv().await.unwrap();
        assert!(event.is_failure());
        assert_eq!(event.chain(), first_chain);

        let mut tx = shared.new_transaction().unwrap();
        assert_ne!(tx.chain(), first_chain);
        tx.put_node(Partition::Operational, &entry("a", "Hello a")).unwrap();
        assert!(tx.submit().await.is_ok());
        assert_ne!(shared.current_id(), first_chain);
    }

    #[tokio::test]
    async fn log_commit_outcome_passes_result_through() {
        let store = initialized_store(MemoryStoreConfig::new()).await;
        let (chain, _events) = TransactionChain::open(store.clone());

        let mut tx = chain.new_transaction().unwrap();
        tx.put_node(Partition::Operational, &entry("a", "Hello a")).unwrap();
        assert!(log_commit_outcome("write greeting", tx.submit()).await.is_ok());

        store.fail_next_commits(1);
        let tx = chain.new_transaction().unwrap();
        assert!(log_commit_outcome("write greeting", tx.submit()).await.is_err());
    }

    /// In-memory log sink for a scoped subscriber
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn capture_logs() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        (logs, tracing::subscriber::set_default(subscriber))
    }

    #[tokio::test]
    async fn commit_outcome_context_only_on_failure() {
        let store = initialized_store(MemoryStoreConfig::new()).await;
        let (chain, _events) = TransactionChain::open(store.clone());
        let (logs, _guard) = capture_logs();

        let mut tx = chain.new_transaction().unwrap();
        tx.put_node(Partition::Operational, &entry("a", "Hello a")).unwrap();
        log_commit_outcome("failed to write greeting", tx.submit())
            .await
            .unwrap();

        let success = logs.contents();
        assert!(success.contains("transaction committed"), "{success}");
        assert!(!success.contains("failed to write greeting"), "{success}");
        assert!(!success.contains("WARN"), "{success}");

        store.fail_next_commits(1);
        let tx = chain.new_transaction().unwrap();
        log_commit_outcome("failed to write greeting", tx.submit())
            .await
            .unwrap_err();

        let all = logs.contents();
        let warning = all
            .lines()
            .find(|line| line.contains("WARN"))
            .expect("failure warning");
        assert!(warning.contains("failed to write greeting"), "{warning}");
    }

    #[tokio::test]
    async fn shared_chain_stays_closed_after_close() {
        let store = initialized_store(MemoryStoreConfig::new()).await;
        let shared = SharedChain::open(store.clone());
        let mut relayed = shared.subscribe();
        let chain = shared.current_id();

        shared.close();
        assert!(shared.is_shut_down());
        assert_eq!(
            shared.new_transaction().unwrap_err(),
            ChainError::ChainClosed(chain)
        );
        assert_eq!(shared.current_id(), chain);
        assert_eq!(relayed.recv().await.unwrap(), ChainEvent::Closed { chain });
    }
}
