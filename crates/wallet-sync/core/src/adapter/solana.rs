use alloy_primitives::{U256, utils::Unit};
use serde_json::Value;

use super::ChainAdapter;
use crate::{
    chain::{ChainFamily, NetworkId, SOLANA_CLUSTERS},
    error::MalformedEventError,
};

/// Length of an ed25519 public key.
const PUBKEY_LEN: usize = 32;

/// Adapter for Solana: base58 addresses, lamport amounts, cluster names.
#[derive(Clone, Copy, Debug, Default)]
pub struct SolanaAdapter;

impl ChainAdapter for SolanaAdapter {
    fn family(&self) -> ChainFamily {
        ChainFamily::Solana
    }

    /// 1 SOL = 10^9 lamports
    fn unit(&self) -> Unit {
        Unit::GWEI
    }

    fn max_base_units(&self) -> Option<U256> {
        Some(U256::from(u64::MAX))
    }

    fn normalize_address(&self, address: &str) -> Result<String, MalformedEventError> {
        let s = address.trim();
        let invalid = |reason: String| MalformedEventError::InvalidAddress {
            chain: ChainFamily::Solana,
            address: address.to_string(),
            reason,
        };
        let bytes = bs58::decode(s).into_vec().map_err(|err| invalid(err.to_string()))?;
        if bytes.len() != PUBKEY_LEN {
            return Err(invalid(format!("expected {PUBKEY_LEN} bytes, got {}", bytes.len())))
        }
        Ok(s.to_string())
    }

    fn parse_network(&self, value: &Value) -> Result<NetworkId, MalformedEventError> {
        let invalid =
            || MalformedEventError::InvalidNetwork { chain: ChainFamily::Solana, value: value.to_string() };
        let Value::String(cluster) = value else { return Err(invalid()) };
        let cluster = match cluster.trim().to_ascii_lowercase().as_str() {
            "mainnet" => "mainnet-beta".to_string(),
            other => other.to_string(),
        };
        if !SOLANA_CLUSTERS.contains(&cluster.as_str()) {
            return Err(invalid())
        }
        Ok(NetworkId::Solana(cluster))
    }
}
