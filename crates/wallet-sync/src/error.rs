//! Error types of the synchronizer

use wallet_sync_core::{
    ChainFamily, EventTag, MalformedEventError, UnknownChainError, WalletStatus,
};

/// An event referencing a chain family, or a session, that is no longer connected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("stale {event} event for {chain}: {reason}")]
pub struct StaleEventError {
    pub chain: ChainFamily,
    pub event: EventTag,
    pub reason: &'static str,
}

/// The ledger is filled with pending records and can not take new ones.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("transaction ledger is saturated with {capacity} pending records")]
pub struct LedgerSaturatedError {
    pub capacity: usize,
}

/// A session went silent for longer than the liveness window.
///
/// Internal only, it forces the session to disconnect.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{chain} session timed out after {silent_ms}ms without events")]
pub struct SessionTimeoutError {
    pub chain: ChainFamily,
    pub silent_ms: u128,
}

/// Reasons an inbound event was dropped.
///
/// These are contained in the ingestor and only recorded, they never stop ingestion.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Malformed(#[from] MalformedEventError),
    #[error(transparent)]
    UnknownChain(#[from] UnknownChainError),
    #[error(transparent)]
    Stale(#[from] StaleEventError),
    #[error(transparent)]
    LedgerSaturated(#[from] LedgerSaturatedError),
    #[error("{event} event is not valid for a {status} {chain} session")]
    InvalidTransition { chain: ChainFamily, status: WalletStatus, event: EventTag },
    #[error("{chain} event address {reported} does not match the connected wallet {connected}")]
    AddressMismatch { chain: ChainFamily, connected: String, reported: String },
    #[error("{chain} event can not update {owner} transaction {id}")]
    ForeignRecord { chain: ChainFamily, owner: ChainFamily, id: String },
}

/// Reasons an outbound command was rejected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("invalid command parameters: {0}")]
    InvalidParams(#[from] MalformedEventError),
    #[error("{chain} wallet is not connected ({status})")]
    NotConnected { chain: ChainFamily, status: WalletStatus },
    #[error(transparent)]
    LedgerSaturated(#[from] LedgerSaturatedError),
    #[error("ingestion queue is full")]
    QueueFull,
    #[error("synchronizer is shut down")]
    Closed,
}
