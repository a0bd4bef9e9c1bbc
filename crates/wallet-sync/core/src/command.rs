use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{
    chain::{ChainFamily, NetworkId},
    snapshot::Snapshot,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandKind {
    Connect,
    Disconnect,
    Sign,
    Transfer,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => f.write_str("CONNECT"),
            Self::Disconnect => f.write_str("DISCONNECT"),
            Self::Sign => f.write_str("SIGN"),
            Self::Transfer => f.write_str("TRANSFER"),
        }
    }
}

/// Parameters of an outbound command, which ones are required depends on the command.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandParams {
    /// Transfer recipient
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Transfer amount in display units
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    /// Message to sign
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Network the wallet should connect to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_id: Option<NetworkId>,
}

/// A request for the wallet page, its result comes back as an ordinary inbound event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundCommand {
    pub chain_family: ChainFamily,
    pub command: CommandKind,
    #[serde(default)]
    pub params: CommandParams,
}

// === impl OutboundCommand ===

impl OutboundCommand {
    pub fn new(chain_family: ChainFamily, command: CommandKind) -> Self {
        Self { chain_family, command, params: Default::default() }
    }

    pub fn connect(chain_family: ChainFamily) -> Self {
        Self::new(chain_family, CommandKind::Connect)
    }

    pub fn disconnect(chain_family: ChainFamily) -> Self {
        Self::new(chain_family, CommandKind::Disconnect)
    }

    pub fn sign(chain_family: ChainFamily, message: impl Into<String>) -> Self {
        let mut cmd = Self::new(chain_family, CommandKind::Sign);
        cmd.params.message = Some(message.into());
        cmd
    }

    pub fn transfer(
        chain_family: ChainFamily,
        to: impl Into<String>,
        amount: impl Into<String>,
    ) -> Self {
        let mut cmd = Self::new(chain_family, CommandKind::Transfer);
        cmd.params.to = Some(to.into());
        cmd.params.amount = Some(amount.into());
        cmd
    }

    pub fn with_network(mut self, network: NetworkId) -> Self {
        self.params.network_id = Some(network);
        self
    }
}

/// Messages pushed to connected wallet pages.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Forwarded command for the wallet extension
    Command(OutboundCommand),
    /// Asks the page to report its full wallet state as `state` events
    StateRequest {
        #[serde(rename = "chainFamily", skip_serializing_if = "Option::is_none")]
        chain_family: Option<ChainFamily>,
    },
    /// Current synchronizer state, sent on connect and after every change
    Snapshot(Snapshot),
}
