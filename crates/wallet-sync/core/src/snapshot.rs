//! Immutable point in time view of all wallet sessions and recent transactions

use serde::{Deserialize, Serialize};

use crate::{
    chain::ChainFamily,
    types::{ConnectFailure, TransactionRecord, WalletSession, WalletStatus},
};

/// A published view of the synchronizer state.
///
/// Snapshots are copies, nothing in here aliases live state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Incremented for every published snapshot
    pub sequence: u64,
    /// Milliseconds since the unix epoch
    pub taken_at: u64,
    /// All sessions that are not disconnected, ordered by chain family
    pub sessions: Vec<WalletSession>,
    /// Ledger records in insertion order
    pub transactions: Vec<TransactionRecord>,
    /// Set while the ledger is full of pending records and rejects new ones
    pub ledger_saturated: bool,
    #[serde(default)]
    pub connect_failures: Vec<ConnectFailure>,
}

// === impl Snapshot ===

impl Snapshot {
    pub fn session(&self, chain: ChainFamily) -> Option<&WalletSession> {
        self.sessions.iter().find(|s| s.chain_family == chain)
    }

    /// Status of the chain family, `Disconnected` if there is no session.
    pub fn status(&self, chain: ChainFamily) -> WalletStatus {
        self.session(chain).map(|s| s.status).unwrap_or_default()
    }

    pub fn transaction(&self, id: &str) -> Option<&TransactionRecord> {
        self.transactions.iter().find(|tx| tx.id == id)
    }

    /// The `n` most recent records, oldest first.
    pub fn recent_transactions(&self, n: usize) -> &[TransactionRecord] {
        let start = self.transactions.len().saturating_sub(n);
        &self.transactions[start..]
    }

    pub fn connect_failure(&self, chain: ChainFamily) -> Option<&ConnectFailure> {
        self.connect_failures.iter().find(|f| f.chain_family == chain)
    }

    /// Returns a copy limited to the `n` most recent transactions.
    pub fn with_transaction_limit(&self, n: usize) -> Self {
        Self { transactions: self.recent_transactions(n).to_vec(), ..self.clone() }
    }
}
