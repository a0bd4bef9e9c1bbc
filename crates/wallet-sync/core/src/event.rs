//! Inbound wallet events
//!
//! [`RawEvent`] is the loosely typed message the wallet page sends. A chain adapter turns it into a
//! [`NormalizedEvent`], past that point the payload shape is trusted.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::chain::{ChainFamily, NetworkId};

/// An event as received from the wallet page.
///
/// Everything but the routing discriminator is optional here, the chain adapter decides what is
/// required for the event type.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    #[serde(default)]
    pub chain_family: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Number, decimal or hex string for EVM, cluster name for Solana
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_id: Option<serde_json::Value>,
    /// Number or string, base units without a decimal point, display units with one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Milliseconds since the unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

// === impl RawEvent ===

impl RawEvent {
    /// Creates an event with the given discriminator and type.
    pub fn new(chain_family: impl Into<String>, kind: impl Into<String>) -> Self {
        Self { chain_family: chain_family.into(), kind: kind.into(), ..Default::default() }
    }
}

/// The event types of the wire protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventTag {
    Connect,
    Disconnect,
    NetworkChange,
    SignResult,
    TransferInitiated,
    TransferConfirmed,
    TransferFailed,
    /// Full state reported in reply to a refresh request
    State,
}

// === impl EventTag ===

impl EventTag {
    pub fn from_wire(s: &str) -> Option<Self> {
        let tag = match s {
            "connect" => Self::Connect,
            "disconnect" => Self::Disconnect,
            "network_change" => Self::NetworkChange,
            "sign_result" => Self::SignResult,
            "transfer_initiated" => Self::TransferInitiated,
            "transfer_confirmed" => Self::TransferConfirmed,
            "transfer_failed" => Self::TransferFailed,
            "state" => Self::State,
            _ => return None,
        };
        Some(tag)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::NetworkChange => "network_change",
            Self::SignResult => "sign_result",
            Self::TransferInitiated => "transfer_initiated",
            Self::TransferConfirmed => "transfer_confirmed",
            Self::TransferFailed => "transfer_failed",
            Self::State => "state",
        }
    }
}

impl fmt::Display for EventTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated, chain agnostic event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizedEvent {
    pub chain: ChainFamily,
    pub session_id: String,
    /// Milliseconds since the unix epoch
    pub timestamp: u64,
    pub kind: EventKind,
}

// === impl NormalizedEvent ===

impl NormalizedEvent {
    pub const fn tag(&self) -> EventTag {
        self.kind.tag()
    }

    /// The transaction id this event refers to, if any.
    pub fn tx_id(&self) -> Option<&str> {
        match &self.kind {
            EventKind::SignResult { tx_id, .. } |
            EventKind::TransferInitiated { tx_id, .. } |
            EventKind::TransferConfirmed { tx_id } |
            EventKind::TransferFailed { tx_id, .. } => Some(tx_id),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventKind {
    /// The wallet approved the connection
    Connected { address: String, network: NetworkId },
    /// The wallet rejected or failed the connection
    ConnectFailed { reason: String },
    Disconnect,
    NetworkChange { network: NetworkId },
    SignResult {
        tx_id: String,
        /// The signer, if reported
        address: Option<String>,
        /// `None` on success
        error: Option<String>,
    },
    TransferInitiated {
        tx_id: String,
        /// The sender, if reported
        from: Option<String>,
        to: String,
        /// Display units
        amount: String,
    },
    TransferConfirmed { tx_id: String },
    TransferFailed { tx_id: String, reason: Option<String> },
    /// Full state reply, `address` is `None` when the wallet is not connected
    State { address: Option<String>, network: Option<NetworkId> },
}

// === impl EventKind ===

impl EventKind {
    pub const fn tag(&self) -> EventTag {
        match self {
            Self::Connected { .. } | Self::ConnectFailed { .. } => EventTag::Connect,
            Self::Disconnect => EventTag::Disconnect,
            Self::NetworkChange { .. } => EventTag::NetworkChange,
            Self::SignResult { .. } => EventTag::SignResult,
            Self::TransferInitiated { .. } => EventTag::TransferInitiated,
            Self::TransferConfirmed { .. } => EventTag::TransferConfirmed,
            Self::TransferFailed { .. } => EventTag::TransferFailed,
            Self::State { .. } => EventTag::State,
        }
    }
}
