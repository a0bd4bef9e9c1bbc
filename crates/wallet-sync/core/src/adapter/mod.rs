//! Chain adapters
//!
//! Every chain family encodes addresses, amounts and networks differently. An adapter validates a
//! [`RawEvent`] against the rules of its family and turns it into a [`NormalizedEvent`].

use alloy_primitives::{U256, utils::Unit};
use serde_json::Value;
use std::fmt;

use crate::{
    chain::{ChainFamily, NetworkId},
    command::{CommandKind, OutboundCommand},
    error::{MalformedEventError, UnknownChainError},
    event::{EventKind, EventTag, NormalizedEvent, RawEvent},
    units,
};

mod evm;
mod solana;

pub use evm::EvmAdapter;
pub use solana::SolanaAdapter;

/// Normalizes the native representation of one chain family.
///
/// Only the encoding specific functions need to be implemented, [`Self::normalize_event`] builds
/// on them.
pub trait ChainAdapter: fmt::Debug + Send + Sync {
    fn family(&self) -> ChainFamily;

    /// The display unit, e.g. 18 decimals for ETH
    fn unit(&self) -> Unit;

    /// Whether `0x` hex encoded base amounts are accepted
    fn allows_hex_amounts(&self) -> bool {
        false
    }

    /// Upper bound for base unit amounts, if the chain has one
    fn max_base_units(&self) -> Option<U256> {
        None
    }

    /// Validates an address and returns its canonical form.
    fn normalize_address(&self, address: &str) -> Result<String, MalformedEventError>;

    /// Parses the network identifier reported by the wallet.
    fn parse_network(&self, value: &Value) -> Result<NetworkId, MalformedEventError>;

    /// Converts a base or display unit amount into a display unit decimal string.
    fn normalize_amount(&self, value: &Value) -> Result<String, MalformedEventError> {
        let input = match value {
            Value::String(s) => s.clone(),
            Value::Number(num) => num.to_string(),
            other => return Err(MalformedEventError::NonNumericAmount(other.to_string())),
        };
        let base = units::parse_amount(&input, self.unit(), self.allows_hex_amounts())?;
        if self.max_base_units().is_some_and(|max| base > max) {
            return Err(MalformedEventError::AmountOutOfRange(input))
        }
        Ok(units::format_units(base, self.unit()))
    }

    /// Validates an amount requested by the agent, which is always in display units.
    fn normalize_display_amount(&self, amount: &str) -> Result<String, MalformedEventError> {
        let base = units::parse_display_amount(amount, self.unit())?;
        if self.max_base_units().is_some_and(|max| base > max) {
            return Err(MalformedEventError::AmountOutOfRange(amount.to_string()))
        }
        Ok(units::format_units(base, self.unit()))
    }

    /// Validates a raw event of this family.
    fn normalize_event(&self, raw: &RawEvent) -> Result<NormalizedEvent, MalformedEventError> {
        let tag = EventTag::from_wire(raw.kind.trim())
            .ok_or_else(|| MalformedEventError::UnknownEventType(raw.kind.clone()))?;
        let session_id = required(raw.session_id.as_deref(), "sessionId")?.to_string();
        let timestamp = raw.timestamp.ok_or(MalformedEventError::MissingField("timestamp"))?;

        let kind = match tag {
            EventTag::Connect => match Outcome::parse(raw.status.as_deref())? {
                Outcome::Success => EventKind::Connected {
                    address: self.normalize_address(required(raw.address.as_deref(), "address")?)?,
                    network: self.parse_network(
                        raw.network_id.as_ref().ok_or(MalformedEventError::MissingField("networkId"))?,
                    )?,
                },
                Outcome::Failure(status) => {
                    EventKind::ConnectFailed { reason: raw.error.clone().unwrap_or(status) }
                }
            },
            EventTag::Disconnect => EventKind::Disconnect,
            EventTag::NetworkChange => EventKind::NetworkChange {
                network: self.parse_network(
                    raw.network_id.as_ref().ok_or(MalformedEventError::MissingField("networkId"))?,
                )?,
            },
            EventTag::SignResult => {
                let tx_id = required(raw.tx_id.as_deref(), "txId")?.to_string();
                let address = optional_address(self, raw.address.as_deref())?;
                let error = match Outcome::parse(raw.status.as_deref())? {
                    Outcome::Success => None,
                    Outcome::Failure(status) => Some(raw.error.clone().unwrap_or(status)),
                };
                EventKind::SignResult { tx_id, address, error }
            }
            EventTag::TransferInitiated => EventKind::TransferInitiated {
                tx_id: required(raw.tx_id.as_deref(), "txId")?.to_string(),
                from: optional_address(self, raw.address.as_deref())?,
                to: self.normalize_address(required(raw.to.as_deref(), "to")?)?,
                amount: self.normalize_amount(
                    raw.amount.as_ref().ok_or(MalformedEventError::MissingField("amount"))?,
                )?,
            },
            EventTag::TransferConfirmed => {
                EventKind::TransferConfirmed { tx_id: required(raw.tx_id.as_deref(), "txId")?.to_string() }
            }
            EventTag::TransferFailed => EventKind::TransferFailed {
                tx_id: required(raw.tx_id.as_deref(), "txId")?.to_string(),
                reason: raw.error.clone(),
            },
            EventTag::State => EventKind::State {
                address: optional_address(self, raw.address.as_deref())?,
                network: match &raw.network_id {
                    None | Some(Value::Null) => None,
                    Some(value) => Some(self.parse_network(value)?),
                },
            },
        };

        Ok(NormalizedEvent { chain: self.family(), session_id, timestamp, kind })
    }

    /// Validates the parameters of a command for this family and normalizes them.
    fn normalize_command(
        &self,
        command: &OutboundCommand,
    ) -> Result<OutboundCommand, MalformedEventError> {
        let mut cmd = command.clone();
        match cmd.command {
            CommandKind::Connect => {
                if let Some(network) = &cmd.params.network_id &&
                    network.family() != self.family()
                {
                    return Err(MalformedEventError::InvalidNetwork {
                        chain: self.family(),
                        value: network.to_string(),
                    })
                }
            }
            CommandKind::Disconnect => {}
            CommandKind::Sign => {
                required(cmd.params.message.as_deref(), "message")?;
            }
            CommandKind::Transfer => {
                let to = self.normalize_address(required(cmd.params.to.as_deref(), "to")?)?;
                let amount =
                    self.normalize_display_amount(required(cmd.params.amount.as_deref(), "amount")?)?;
                cmd.params.to = Some(to);
                cmd.params.amount = Some(amount);
            }
        }
        Ok(cmd)
    }
}

/// Normalizes an address that may be absent or empty.
fn optional_address<A: ChainAdapter + ?Sized>(
    adapter: &A,
    address: Option<&str>,
) -> Result<Option<String>, MalformedEventError> {
    match address.map(str::trim) {
        None | Some("") => Ok(None),
        Some(address) => adapter.normalize_address(address).map(Some),
    }
}

/// Returns the trimmed value of a required field.
fn required<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str, MalformedEventError> {
    match value.map(str::trim) {
        None => Err(MalformedEventError::MissingField(field)),
        Some("") => Err(MalformedEventError::EmptyField(field)),
        Some(value) => Ok(value),
    }
}

/// Reported result of a connect or sign request.
enum Outcome {
    Success,
    Failure(String),
}

impl Outcome {
    fn parse(status: Option<&str>) -> Result<Self, MalformedEventError> {
        let Some(status) = status else { return Ok(Self::Success) };
        match status.trim().to_ascii_lowercase().as_str() {
            "" | "success" | "ok" | "approved" | "connected" => Ok(Self::Success),
            s @ ("error" | "failed" | "failure" | "rejected") => Ok(Self::Failure(s.to_string())),
            _ => Err(MalformedEventError::UnknownStatus(status.to_string())),
        }
    }
}

/// The adapters of all supported chain families.
#[derive(Debug, Default)]
pub struct ChainAdapters {
    evm: EvmAdapter,
    solana: SolanaAdapter,
}

// === impl ChainAdapters ===

impl ChainAdapters {
    pub fn get(&self, chain: ChainFamily) -> &dyn ChainAdapter {
        match chain {
            ChainFamily::Evm => &self.evm,
            ChainFamily::Solana => &self.solana,
        }
    }

    /// Resolves the adapter for a transport level discriminator.
    pub fn route(&self, discriminator: &str) -> Result<&dyn ChainAdapter, UnknownChainError> {
        Ok(self.get(discriminator.parse()?))
    }
}
