//! Validates inbound events and applies them to the session store and the ledger

use serde::Serialize;
use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::time::Instant;
use wallet_sync_core::{
    ChainFamily, EventKind, EventTag, NetworkId, NormalizedEvent, RawEvent, Snapshot,
    TransactionRecord, TxKind, TxStatus, WalletStatus,
    adapter::{ChainAdapter, ChainAdapters},
    command::{CommandKind, OutboundCommand},
};

use crate::{
    error::{IngestError, StaleEventError},
    ledger::{LedgerError, TransactionLedger, UpdateOutcome},
    session::{ApplyOutcome, SessionStore},
    snapshot::SnapshotPublisher,
};

/// Counters of ingestion outcomes.
///
/// Kept outside of the snapshot, so discarded events leave the snapshot untouched.
#[derive(Debug, Default)]
pub struct IngestStats {
    applied: AtomicU64,
    ignored: AtomicU64,
    malformed: AtomicU64,
    unknown_chain: AtomicU64,
    stale: AtomicU64,
    rejected: AtomicU64,
    saturated: AtomicU64,
    expired_sessions: AtomicU64,
}

/// A point in time copy of [`IngestStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestCounters {
    /// events that changed state
    pub applied: u64,
    /// duplicates and no-op updates
    pub ignored: u64,
    pub malformed: u64,
    pub unknown_chain: u64,
    pub stale: u64,
    /// valid events that were not allowed in the current session state
    pub rejected: u64,
    /// records rejected by a saturated ledger
    pub saturated: u64,
    pub expired_sessions: u64,
}

// === impl IngestStats ===

impl IngestStats {
    pub fn counters(&self) -> IngestCounters {
        IngestCounters {
            applied: self.applied.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            unknown_chain: self.unknown_chain.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            saturated: self.saturated.load(Ordering::Relaxed),
            expired_sessions: self.expired_sessions.load(Ordering::Relaxed),
        }
    }

    /// Records a message that could not even be decoded into a [`RawEvent`].
    pub(crate) fn record_undecodable(&self) {
        Self::bump(&self.malformed);
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn record_error(&self, err: &IngestError) {
        let counter = match err {
            IngestError::Malformed(_) => &self.malformed,
            IngestError::UnknownChain(_) => &self.unknown_chain,
            IngestError::Stale(_) => &self.stale,
            IngestError::LedgerSaturated(_) => &self.saturated,
            IngestError::InvalidTransition { .. } |
            IngestError::AddressMismatch { .. } |
            IngestError::ForeignRecord { .. } => &self.rejected,
        };
        Self::bump(counter);
    }
}

/// The single writer of the session store and the transaction ledger.
///
/// Every inbound event, regardless of the transport it arrived on, is applied through
/// [`EventIngestor::ingest`]. Failures of a single event are recorded and never escape.
#[derive(Debug)]
pub struct EventIngestor {
    adapters: ChainAdapters,
    store: SessionStore,
    ledger: TransactionLedger,
    publisher: Arc<SnapshotPublisher>,
    stats: Arc<IngestStats>,
}

// === impl EventIngestor ===

impl EventIngestor {
    pub fn new(
        expected: impl IntoIterator<Item = NetworkId>,
        ledger_capacity: usize,
        publisher: Arc<SnapshotPublisher>,
        stats: Arc<IngestStats>,
    ) -> Self {
        Self {
            adapters: ChainAdapters::default(),
            store: SessionStore::new(expected),
            ledger: TransactionLedger::new(ledger_capacity),
            publisher,
            stats,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn ledger(&self) -> &TransactionLedger {
        &self.ledger
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.publisher.current()
    }

    /// Ingests a raw event, publishing a new snapshot if it changed state.
    pub fn ingest(&mut self, raw: &RawEvent) {
        self.ingest_at(raw, Instant::now())
    }

    pub fn ingest_at(&mut self, raw: &RawEvent, now: Instant) {
        match self.try_ingest(raw, now) {
            Ok(ApplyOutcome::Changed) => {
                self.publish();
                IngestStats::bump(&self.stats.applied);
            }
            Ok(ApplyOutcome::Unchanged) => {
                trace!(target: "sync::ingest", chain = %raw.chain_family, kind = %raw.kind, "event carried no new information");
                IngestStats::bump(&self.stats.ignored);
            }
            Err(err) => {
                match &err {
                    IngestError::Stale(_) => {
                        trace!(target: "sync::ingest", %err, "dropped stale event")
                    }
                    IngestError::LedgerSaturated(_) => {
                        warn!(target: "sync::ingest", %err, "dropped event")
                    }
                    _ => debug!(target: "sync::ingest", %err, chain = %raw.chain_family, kind = %raw.kind, "dropped event"),
                }
                self.stats.record_error(&err);
            }
        }
    }

    /// Routes, validates and applies a single event.
    pub fn try_ingest(&mut self, raw: &RawEvent, now: Instant) -> Result<ApplyOutcome, IngestError> {
        let adapter = self.adapters.route(&raw.chain_family)?;
        let event = adapter.normalize_event(raw)?;
        self.apply(&event, now)
    }

    /// Applies a normalized event.
    ///
    /// Only accepted events keep the session alive.
    pub fn apply(&mut self, event: &NormalizedEvent, now: Instant) -> Result<ApplyOutcome, IngestError> {
        let chain = event.chain;
        let status = self.store.status(chain);
        if status == WalletStatus::Disconnected &&
            !matches!(event.tag(), EventTag::Connect | EventTag::State)
        {
            return Err(StaleEventError { chain, event: event.tag(), reason: "chain is disconnected" }
                .into())
        }
        let outcome = self.apply_event(event, now)?;
        self.store.touch(chain, &event.session_id, now);
        Ok(outcome)
    }

    fn apply_event(&mut self, event: &NormalizedEvent, now: Instant) -> Result<ApplyOutcome, IngestError> {
        let chain = event.chain;
        match &event.kind {
            EventKind::SignResult { tx_id, address, error } => {
                let from = self.check_signer(event, address.as_deref())?;
                if self.ledger.knows(tx_id) {
                    return Ok(ApplyOutcome::Unchanged)
                }
                let (status, confirmed_at) = match error {
                    None => (TxStatus::Confirmed, Some(event.timestamp)),
                    Some(_) => (TxStatus::Failed, None),
                };
                self.record(TransactionRecord {
                    id: tx_id.clone(),
                    chain_family: chain,
                    kind: TxKind::Sign,
                    from,
                    to: None,
                    amount: None,
                    status,
                    created_at: event.timestamp,
                    confirmed_at,
                    error: error.clone(),
                })
            }
            EventKind::TransferInitiated { tx_id, from, to, amount } => {
                let from = self.check_signer(event, from.as_deref())?;
                if self.ledger.knows(tx_id) {
                    return Ok(ApplyOutcome::Unchanged)
                }
                self.record(TransactionRecord {
                    id: tx_id.clone(),
                    chain_family: chain,
                    kind: TxKind::Transfer,
                    from,
                    to: Some(to.clone()),
                    amount: Some(amount.clone()),
                    status: TxStatus::Pending,
                    created_at: event.timestamp,
                    confirmed_at: None,
                    error: None,
                })
            }
            EventKind::TransferConfirmed { tx_id } => {
                self.update(chain, tx_id, TxStatus::Confirmed, Some(event.timestamp), None)
            }
            EventKind::TransferFailed { tx_id, reason } => {
                self.update(chain, tx_id, TxStatus::Failed, None, reason.clone())
            }
            _ => self.store.apply(event, now),
        }
    }

    /// Applies the optimistic side of an outbound command.
    ///
    /// Returns true if this changed state.
    pub fn on_command(&mut self, command: &OutboundCommand, now: Instant) -> bool {
        if command.command == CommandKind::Connect &&
            self.store.begin_connect(command.chain_family, now)
        {
            self.publish();
            return true
        }
        false
    }

    /// Disconnects all sessions without inbound events for longer than `timeout`.
    ///
    /// Returns the number of evicted sessions.
    pub fn evict_expired(&mut self, now: Instant, timeout: Duration) -> usize {
        let expired = self.store.evict_expired(now, timeout);
        for err in &expired {
            info!(target: "sync::ingest", %err, "forcing disconnect");
            IngestStats::bump(&self.stats.expired_sessions);
        }
        if !expired.is_empty() {
            self.publish();
        }
        expired.len()
    }

    /// Validates that a sign or transfer happens on a connected session and returns the signer.
    fn check_signer(
        &self,
        event: &NormalizedEvent,
        reported: Option<&str>,
    ) -> Result<String, IngestError> {
        let chain = event.chain;
        let status = self.store.status(chain);
        let session = match self.store.get(chain) {
            Some(session) if status == WalletStatus::Connected => session,
            _ => return Err(IngestError::InvalidTransition { chain, status, event: event.tag() }),
        };
        if let Some(reported) = reported &&
            reported != session.address
        {
            return Err(IngestError::AddressMismatch {
                chain,
                connected: session.address.clone(),
                reported: reported.to_string(),
            })
        }
        Ok(session.address.clone())
    }

    fn record(&mut self, record: TransactionRecord) -> Result<ApplyOutcome, IngestError> {
        match self.ledger.record(record) {
            Ok(_) => Ok(ApplyOutcome::Changed),
            Err(LedgerError::Duplicate(_)) => Ok(ApplyOutcome::Unchanged),
            Err(LedgerError::Saturated(err)) => Err(err.into()),
        }
    }

    fn update(
        &mut self,
        chain: ChainFamily,
        tx_id: &str,
        status: TxStatus,
        confirmed_at: Option<u64>,
        error: Option<String>,
    ) -> Result<ApplyOutcome, IngestError> {
        match self.ledger.update_status(chain, tx_id, status, confirmed_at, error) {
            UpdateOutcome::Updated => Ok(ApplyOutcome::Changed),
            UpdateOutcome::Unchanged | UpdateOutcome::Unknown => Ok(ApplyOutcome::Unchanged),
            UpdateOutcome::ForeignChain(owner) => {
                Err(IngestError::ForeignRecord { chain, owner, id: tx_id.to_string() })
            }
        }
    }

    fn publish(&self) -> Arc<Snapshot> {
        self.publisher.publish(
            self.store.sessions(),
            self.ledger.records(),
            self.ledger.is_saturated(),
            self.store.failures(),
        )
    }

    /// The adapter of a chain family.
    pub fn adapter(&self, chain: ChainFamily) -> &dyn ChainAdapter {
        self.adapters.get(chain)
    }
}
