//! # wallet-sync-core
//!
//! Core wallet session types, wire messages and chain adapters for wallet-sync.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Chain adapters that normalize raw wallet events
pub mod adapter;
pub mod chain;
/// Outbound messages sent to the wallet page
pub mod command;
pub mod error;
pub mod event;
pub mod snapshot;
pub mod types;
pub mod units;

pub use chain::{ChainFamily, NetworkId};
pub use error::{MalformedEventError, UnknownChainError};
pub use event::{EventKind, EventTag, NormalizedEvent, RawEvent};
pub use snapshot::Snapshot;
pub use types::{ConnectFailure, TransactionRecord, TxKind, TxStatus, WalletSession, WalletStatus};
