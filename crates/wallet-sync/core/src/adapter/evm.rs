use alloy_primitives::{Address, utils::Unit};
use serde_json::Value;
use std::str::FromStr;

use super::ChainAdapter;
use crate::{
    chain::{ChainFamily, NetworkId},
    error::MalformedEventError,
};

/// Adapter for EVM compatible chains: hex addresses, wei amounts, numeric chain ids.
#[derive(Clone, Copy, Debug, Default)]
pub struct EvmAdapter;

impl ChainAdapter for EvmAdapter {
    fn family(&self) -> ChainFamily {
        ChainFamily::Evm
    }

    fn unit(&self) -> Unit {
        Unit::ETHER
    }

    fn allows_hex_amounts(&self) -> bool {
        true
    }

    /// Accepts all lower or all upper case hex, mixed case must be a valid EIP-55 checksum.
    ///
    /// Returns the checksummed address.
    fn normalize_address(&self, address: &str) -> Result<String, MalformedEventError> {
        let invalid = |reason: String| MalformedEventError::InvalidAddress {
            chain: ChainFamily::Evm,
            address: address.to_string(),
            reason,
        };
        let s = address.trim();
        let Some(hex) = s.strip_prefix("0x") else {
            return Err(invalid("missing 0x prefix".to_string()))
        };
        let mixed_case = hex.bytes().any(|b| b.is_ascii_lowercase()) &&
            hex.bytes().any(|b| b.is_ascii_uppercase());
        let parsed = if mixed_case {
            Address::parse_checksummed(s, None).map_err(|err| invalid(err.to_string()))?
        } else {
            Address::from_str(s).map_err(|err| invalid(err.to_string()))?
        };
        Ok(parsed.to_checksum(None))
    }

    /// Chain ids arrive as numbers, decimal strings or `0x` hex strings (`eth_chainId`).
    fn parse_network(&self, value: &Value) -> Result<NetworkId, MalformedEventError> {
        let invalid =
            || MalformedEventError::InvalidNetwork { chain: ChainFamily::Evm, value: value.to_string() };
        let id = match value {
            Value::Number(num) => num.as_u64().ok_or_else(invalid)?,
            Value::String(s) => {
                let s = s.trim();
                match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                    Some(hex) => u64::from_str_radix(hex, 16).map_err(|_| invalid())?,
                    None => s.parse::<u64>().map_err(|_| invalid())?,
                }
            }
            _ => return Err(invalid()),
        };
        Ok(NetworkId::Evm(id))
    }
}
