//! Wallet session and transaction record types

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::chain::{ChainFamily, NetworkId};

/// Connection status of a chain family.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WalletStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    WrongNetwork,
    Error,
}

// === impl WalletStatus ===

impl WalletStatus {
    /// Whether a wallet address is attached to this status.
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Connected | Self::WrongNetwork)
    }
}

impl fmt::Display for WalletStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting",
            Self::Connected => "Connected",
            Self::WrongNetwork => "Wrong network",
            Self::Error => "Error",
        };
        f.write_str(s)
    }
}

/// The record of one wallet attached to one chain family.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSession {
    pub chain_family: ChainFamily,
    /// Identifier of the page/provider session that reported the connection
    pub session_id: String,
    /// Chain native encoding, empty while connecting
    pub address: String,
    /// Milliseconds since the unix epoch
    pub connected_at: u64,
    pub network_id: Option<NetworkId>,
    pub status: WalletStatus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxKind {
    Sign,
    Transfer,
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sign => f.write_str("sign"),
            Self::Transfer => f.write_str("transfer"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxStatus {
    Pending,
    Confirmed,
    Failed,
}

// === impl TxStatus ===

impl TxStatus {
    /// Terminal records are never updated again.
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("PENDING"),
            Self::Confirmed => f.write_str("CONFIRMED"),
            Self::Failed => f.write_str("FAILED"),
        }
    }
}

/// A sign or transfer operation reported by the wallet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    /// Provider issued id, unique within the ledger
    pub id: String,
    pub chain_family: ChainFamily,
    pub kind: TxKind,
    pub from: String,
    pub to: Option<String>,
    /// Decimal string in the chain's display unit
    pub amount: Option<String>,
    pub status: TxStatus,
    pub created_at: u64,
    pub confirmed_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The last failed connect attempt of a chain family.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectFailure {
    pub chain_family: ChainFamily,
    pub reason: String,
    pub at: u64,
}
