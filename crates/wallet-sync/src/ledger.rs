//! Bounded history of sign and transfer operations

use std::collections::{HashSet, VecDeque};
use wallet_sync_core::{ChainFamily, TransactionRecord, TxStatus};

use crate::error::LedgerSaturatedError;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error(transparent)]
    Saturated(#[from] LedgerSaturatedError),
    #[error("transaction {0} is already recorded")]
    Duplicate(String),
}

/// Result of a status update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    /// The record already has a terminal status, or the update was not a status change
    Unchanged,
    /// No record with that id
    Unknown,
    /// The record belongs to another chain family, it is left untouched
    ForeignChain(ChainFamily),
}

/// Insertion ordered transaction records.
///
/// Once full, inserts evict the oldest confirmed or failed record. Pending records are never
/// evicted, if every record is pending new inserts are rejected.
#[derive(Debug)]
pub struct TransactionLedger {
    records: VecDeque<TransactionRecord>,
    capacity: usize,
    /// ids of the records above
    ids: HashSet<String>,
    /// ids of evicted records, bounded by `capacity`
    retired: VecDeque<String>,
    retired_ids: HashSet<String>,
}

// === impl TransactionLedger ===

impl TransactionLedger {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
            ids: HashSet::new(),
            retired: VecDeque::new(),
            retired_ids: HashSet::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&TransactionRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    /// Whether a record with this id was ever recorded, including evicted ones.
    pub fn knows(&self, id: &str) -> bool {
        self.ids.contains(id) || self.retired_ids.contains(id)
    }

    /// Whether the ledger is full and every record is pending.
    pub fn is_saturated(&self) -> bool {
        self.records.len() >= self.capacity &&
            self.records.iter().all(|record| record.status == TxStatus::Pending)
    }

    pub fn records(&self) -> impl Iterator<Item = &TransactionRecord> {
        self.records.iter()
    }

    /// Appends a record and returns its id.
    pub fn record(&mut self, record: TransactionRecord) -> Result<String, LedgerError> {
        if self.knows(&record.id) {
            return Err(LedgerError::Duplicate(record.id))
        }
        if self.records.len() >= self.capacity {
            let Some(pos) = self.records.iter().position(|r| r.status.is_terminal()) else {
                warn!(target: "sync::ledger", capacity = self.capacity, id = %record.id, "ledger saturated, rejecting record");
                return Err(LedgerSaturatedError { capacity: self.capacity }.into())
            };
            if let Some(evicted) = self.records.remove(pos) {
                trace!(target: "sync::ledger", id = %evicted.id, status = %evicted.status, "evicted record");
                self.retire(evicted.id);
            }
        }

        trace!(target: "sync::ledger", id = %record.id, kind = %record.kind, status = %record.status, "recorded");
        let id = record.id.clone();
        self.ids.insert(id.clone());
        self.records.push_back(record);
        Ok(id)
    }

    /// Moves a pending record to a terminal status.
    ///
    /// Unknown ids are expected for late or duplicate confirmations, they are logged and ignored.
    /// Only events of the record's own chain family may update it.
    pub fn update_status(
        &mut self,
        chain: ChainFamily,
        id: &str,
        status: TxStatus,
        confirmed_at: Option<u64>,
        error: Option<String>,
    ) -> UpdateOutcome {
        let Some(record) = self.records.iter_mut().find(|record| record.id == id) else {
            if self.retired_ids.contains(id) {
                trace!(target: "sync::ledger", %id, "status update for evicted record");
            } else {
                debug!(target: "sync::ledger", %id, %status, "status update for unknown record");
            }
            return UpdateOutcome::Unknown
        };
        if record.chain_family != chain {
            debug!(target: "sync::ledger", %id, %chain, owner = %record.chain_family, "status update from another chain family");
            return UpdateOutcome::ForeignChain(record.chain_family)
        }
        if record.status.is_terminal() || !status.is_terminal() {
            trace!(target: "sync::ledger", %id, current = %record.status, %status, "ignoring status update");
            return UpdateOutcome::Unchanged
        }

        trace!(target: "sync::ledger", %id, %status, "status updated");
        record.status = status;
        record.confirmed_at = confirmed_at;
        record.error = error;
        UpdateOutcome::Updated
    }

    fn retire(&mut self, id: String) {
        self.ids.remove(&id);
        self.retired_ids.insert(id.clone());
        self.retired.push_back(id);
        while self.retired.len() > self.capacity {
            if let Some(old) = self.retired.pop_front() {
                self.retired_ids.remove(&old);
            }
        }
    }
}
