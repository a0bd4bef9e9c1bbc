//! Errors produced at the chain adapter boundary

use crate::chain::ChainFamily;

/// An inbound event that could not be normalized.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MalformedEventError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("unknown event type `{0}`")]
    UnknownEventType(String),
    #[error("unknown status `{0}`")]
    UnknownStatus(String),
    #[error("invalid {chain} address `{address}`: {reason}")]
    InvalidAddress { chain: ChainFamily, address: String, reason: String },
    #[error("invalid {chain} network `{value}`")]
    InvalidNetwork { chain: ChainFamily, value: String },
    #[error("amount `{0}` is not numeric")]
    NonNumericAmount(String),
    #[error("amount `{0}` is negative")]
    NegativeAmount(String),
    #[error("amount `{amount}` has more than {decimals} fractional digits")]
    ExcessPrecision { amount: String, decimals: u8 },
    #[error("amount `{0}` is out of range")]
    AmountOutOfRange(String),
    #[error("empty `{0}`")]
    EmptyField(&'static str),
}

/// An event whose chain discriminator matches no adapter.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("no chain adapter for `{0}`")]
pub struct UnknownChainError(pub String);
