//! Publishes immutable snapshots of the synchronizer state

use arc_swap::ArcSwap;
use futures::channel::mpsc::{UnboundedReceiver, UnboundedSender, unbounded};
use parking_lot::Mutex;
use std::{fmt, sync::Arc};
use tokio::sync::watch;
use wallet_sync_core::{ConnectFailure, Snapshot, TransactionRecord, WalletSession};

type ChangeCallback = Arc<dyn Fn(&Snapshot) + Send + Sync>;

/// Holds the current [`Snapshot`] and notifies listeners when a new one is published.
///
/// Reads never wait on the writer, a reader sees either the previous or the new snapshot.
pub struct SnapshotPublisher {
    current: ArcSwap<Snapshot>,
    /// latest snapshot only, for readers that may fall behind
    latest: watch::Sender<Arc<Snapshot>>,
    callbacks: Mutex<Vec<ChangeCallback>>,
    /// stream listeners, closed ones are dropped on the next publish
    listeners: Mutex<Vec<UnboundedSender<Arc<Snapshot>>>>,
}

// === impl SnapshotPublisher ===

impl SnapshotPublisher {
    pub fn new() -> Self {
        let initial = Arc::new(Snapshot { taken_at: now_millis(), ..Default::default() });
        let (latest, _) = watch::channel(Arc::clone(&initial));
        Self {
            current: ArcSwap::new(initial),
            latest,
            callbacks: Default::default(),
            listeners: Default::default(),
        }
    }

    /// The latest snapshot.
    pub fn current(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Registers a callback that is invoked with every new snapshot.
    pub fn on_change<F>(&self, callback: F)
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        self.callbacks.lock().push(Arc::new(callback));
    }

    /// Returns a stream of all snapshots published from now on.
    pub fn new_snapshot_notifications(&self) -> UnboundedReceiver<Arc<Snapshot>> {
        let (tx, rx) = unbounded();
        self.listeners.lock().push(tx);
        rx
    }

    /// Returns a receiver that always holds the latest snapshot.
    ///
    /// Unlike [`Self::new_snapshot_notifications`] nothing is buffered, a slow reader skips
    /// intermediate snapshots.
    pub fn subscribe_latest(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.latest.subscribe()
    }

    /// Publishes a snapshot of the given state and notifies all listeners.
    pub(crate) fn publish<'a>(
        &self,
        sessions: Vec<WalletSession>,
        transactions: impl IntoIterator<Item = &'a TransactionRecord>,
        ledger_saturated: bool,
        connect_failures: Vec<ConnectFailure>,
    ) -> Arc<Snapshot> {
        let snapshot = Arc::new(Snapshot {
            sequence: self.current.load().sequence + 1,
            taken_at: now_millis(),
            sessions,
            transactions: transactions.into_iter().cloned().collect(),
            ledger_saturated,
            connect_failures,
        });
        self.current.store(Arc::clone(&snapshot));
        self.latest.send_replace(Arc::clone(&snapshot));
        trace!(target: "sync::snapshot", sequence = snapshot.sequence, "published snapshot");

        // callbacks may register further callbacks
        let callbacks = self.callbacks.lock().clone();
        for callback in &callbacks {
            callback(&snapshot);
        }
        self.listeners.lock().retain(|listener| listener.unbounded_send(Arc::clone(&snapshot)).is_ok());
        snapshot
    }
}

impl Default for SnapshotPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SnapshotPublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotPublisher")
            .field("current", &self.current.load().sequence)
            .field("callbacks", &self.callbacks.lock().len())
            .field("listeners", &self.listeners.lock().len())
            .finish()
    }
}

/// Milliseconds since the unix epoch.
pub fn now_millis() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default()
}
