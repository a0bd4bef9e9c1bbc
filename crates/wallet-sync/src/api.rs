//! Handle used by the HTTP routes, the websocket handler and embedding code

use futures::channel::mpsc::{Receiver, UnboundedReceiver};
use std::sync::Arc;
use tokio::sync::{
    mpsc::{self, error::TrySendError},
    watch,
};
use wallet_sync_core::{
    ChainFamily, RawEvent, Snapshot, WalletStatus,
    adapter::ChainAdapters,
    command::{CommandKind, OutboundCommand, ServerMessage},
};

use crate::{
    error::{CommandError, LedgerSaturatedError},
    format,
    ingest::{IngestCounters, IngestStats},
    outbox::Outbox,
    service::SyncMessage,
    snapshot::SnapshotPublisher,
};

/// A cheap to clone handle to a running synchronizer.
///
/// Reads are served from the published snapshot, writes are queued for the
/// [`SyncService`](crate::service::SyncService) and applied in arrival order.
#[derive(Clone, Debug)]
pub struct SyncApi {
    queue: mpsc::Sender<SyncMessage>,
    publisher: Arc<SnapshotPublisher>,
    outbox: Outbox,
    stats: Arc<IngestStats>,
    adapters: Arc<ChainAdapters>,
    summary_transactions: usize,
    ledger_capacity: usize,
}

// === impl SyncApi ===

impl SyncApi {
    pub(crate) fn new(
        queue: mpsc::Sender<SyncMessage>,
        publisher: Arc<SnapshotPublisher>,
        outbox: Outbox,
        stats: Arc<IngestStats>,
        summary_transactions: usize,
        ledger_capacity: usize,
    ) -> Self {
        Self {
            queue,
            publisher,
            outbox,
            stats,
            adapters: Default::default(),
            summary_transactions,
            ledger_capacity,
        }
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.publisher.current()
    }

    /// Registers a callback invoked with every new snapshot.
    pub fn on_change<F>(&self, callback: F)
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        self.publisher.on_change(callback)
    }

    /// Returns a stream of all snapshots published from now on.
    pub fn new_snapshot_notifications(&self) -> UnboundedReceiver<Arc<Snapshot>> {
        self.publisher.new_snapshot_notifications()
    }

    /// Returns a receiver holding only the latest snapshot.
    pub fn subscribe_latest_snapshot(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.publisher.subscribe_latest()
    }

    /// Returns a stream of all messages for the wallet page.
    pub fn subscribe_outbound(&self) -> Receiver<ServerMessage> {
        self.outbox.subscribe()
    }

    /// Queues an inbound event, waiting for queue capacity.
    ///
    /// The event is validated when it is applied, invalid events are dropped then.
    pub async fn ingest(&self, event: RawEvent) -> Result<(), CommandError> {
        self.queue.send(SyncMessage::Event(event)).await.map_err(|_| CommandError::Closed)
    }

    /// Queues an inbound event without waiting.
    pub fn try_ingest(&self, event: RawEvent) -> Result<(), CommandError> {
        self.try_send(SyncMessage::Event(event))
    }

    /// Records an inbound message that is not a decodable event.
    ///
    /// Counted as malformed, the same as events the chain adapters reject.
    pub fn reject_undecodable(&self, err: &dyn std::error::Error) {
        debug!(target: "sync::api", %err, "dropped undecodable event");
        self.stats.record_undecodable();
    }

    /// Validates a command and queues it for the wallet page.
    ///
    /// Returns the normalized command.
    pub fn dispatch(&self, command: OutboundCommand) -> Result<OutboundCommand, CommandError> {
        let chain = command.chain_family;
        let command = self.adapters.get(chain).normalize_command(&command)?;

        let snapshot = self.snapshot();
        match command.command {
            CommandKind::Connect | CommandKind::Disconnect => {}
            CommandKind::Sign | CommandKind::Transfer => {
                let status = snapshot.status(chain);
                if status != WalletStatus::Connected {
                    return Err(CommandError::NotConnected { chain, status })
                }
            }
        }
        if command.command == CommandKind::Transfer && snapshot.ledger_saturated {
            return Err(LedgerSaturatedError { capacity: self.ledger_capacity }.into())
        }

        self.try_send(SyncMessage::Command(command.clone()))?;
        debug!(target: "sync::api", %chain, command = %command.command, "queued command");
        Ok(command)
    }

    pub fn connect(&self, chain: ChainFamily) -> Result<OutboundCommand, CommandError> {
        self.dispatch(OutboundCommand::connect(chain))
    }

    pub fn disconnect(&self, chain: ChainFamily) -> Result<OutboundCommand, CommandError> {
        self.dispatch(OutboundCommand::disconnect(chain))
    }

    pub fn sign(
        &self,
        chain: ChainFamily,
        message: impl Into<String>,
    ) -> Result<OutboundCommand, CommandError> {
        self.dispatch(OutboundCommand::sign(chain, message))
    }

    /// Requests a native transfer, `amount` is in display units.
    pub fn transfer(
        &self,
        chain: ChainFamily,
        to: impl Into<String>,
        amount: impl Into<String>,
    ) -> Result<OutboundCommand, CommandError> {
        self.dispatch(OutboundCommand::transfer(chain, to, amount))
    }

    pub fn stats(&self) -> IngestCounters {
        self.stats.counters()
    }

    /// Renders the latest snapshot for an agent, `limit` overrides the number of transactions.
    pub fn agent_summary(&self, limit: Option<usize>) -> String {
        format::format_snapshot(&self.snapshot(), limit.unwrap_or(self.summary_transactions))
    }

    fn try_send(&self, msg: SyncMessage) -> Result<(), CommandError> {
        self.queue.try_send(msg).map_err(|err| match err {
            TrySendError::Full(_) => {
                warn!(target: "sync::api", "ingestion queue is full");
                CommandError::QueueFull
            }
            TrySendError::Closed(_) => CommandError::Closed,
        })
    }
}
