//! Chain families and network identifiers

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

use crate::error::UnknownChainError;

/// The protocol family a wallet session belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainFamily {
    Evm,
    Solana,
}

// === impl ChainFamily ===

impl ChainFamily {
    /// All supported families, in snapshot order.
    pub const ALL: [Self; 2] = [Self::Evm, Self::Solana];

    /// The wire discriminator of this family.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Evm => "evm",
            Self::Solana => "solana",
        }
    }

    /// Ticker of the native currency.
    pub const fn native_symbol(&self) -> &'static str {
        match self {
            Self::Evm => "ETH",
            Self::Solana => "SOL",
        }
    }
}

impl fmt::Display for ChainFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Evm => f.write_str("EVM"),
            Self::Solana => f.write_str("Solana"),
        }
    }
}

impl FromStr for ChainFamily {
    type Err = UnknownChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "evm" => Ok(Self::Evm),
            "solana" => Ok(Self::Solana),
            _ => Err(UnknownChainError(s.to_string())),
        }
    }
}

/// Known Solana clusters.
pub const SOLANA_CLUSTERS: [&str; 4] = ["devnet", "testnet", "mainnet-beta", "localnet"];

/// A chain specific network identifier.
///
/// EVM networks are identified by their numeric chain id, Solana networks by their cluster name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum NetworkId {
    /// An EVM chain id, e.g. `84532` for Base Sepolia
    Evm(u64),
    /// A Solana cluster name, e.g. `devnet`
    Solana(String),
}

// === impl NetworkId ===

impl NetworkId {
    /// Base Sepolia
    pub const BASE_SEPOLIA: Self = Self::Evm(84532);

    pub fn solana_devnet() -> Self {
        Self::Solana("devnet".to_string())
    }

    /// Returns the family this network belongs to.
    pub const fn family(&self) -> ChainFamily {
        match self {
            Self::Evm(_) => ChainFamily::Evm,
            Self::Solana(_) => ChainFamily::Solana,
        }
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Evm(id) => write!(f, "{id}"),
            Self::Solana(cluster) => f.write_str(cluster),
        }
    }
}

impl Serialize for NetworkId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Evm(id) => serializer.serialize_u64(*id),
            Self::Solana(cluster) => serializer.serialize_str(cluster),
        }
    }
}

impl<'de> Deserialize<'de> for NetworkId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // goes through `Value` so this also works with `arbitrary_precision` numbers
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Number(num) => num
                .as_u64()
                .map(Self::Evm)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid chain id {num}"))),
            serde_json::Value::String(cluster) => Ok(Self::Solana(cluster)),
            other => Err(serde::de::Error::custom(format!("invalid network id {other}"))),
        }
    }
}
