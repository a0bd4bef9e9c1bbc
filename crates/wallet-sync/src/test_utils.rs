//! Fixtures shared by the unit tests

use serde_json::{Value, json};
use wallet_sync_core::{ChainFamily, EventKind, NetworkId, NormalizedEvent, RawEvent};

pub const EVM_ALICE: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
pub const EVM_BOB: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
pub const SOL_ALICE: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
pub const SOL_BOB: &str = "ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL";

pub const SESSION: &str = "page-1";
pub const TIMESTAMP: u64 = 1_700_000_000_000;

pub fn event(chain: ChainFamily, kind: EventKind) -> NormalizedEvent {
    NormalizedEvent { chain, session_id: SESSION.to_string(), timestamp: TIMESTAMP, kind }
}

pub fn evm_connect(address: &str, chain_id: u64) -> NormalizedEvent {
    event(
        ChainFamily::Evm,
        EventKind::Connected { address: address.to_string(), network: NetworkId::Evm(chain_id) },
    )
}

pub fn sol_connect(address: &str) -> NormalizedEvent {
    event(
        ChainFamily::Solana,
        EventKind::Connected { address: address.to_string(), network: NetworkId::solana_devnet() },
    )
}

pub fn evm_network_change(chain_id: u64) -> NormalizedEvent {
    event(ChainFamily::Evm, EventKind::NetworkChange { network: NetworkId::Evm(chain_id) })
}

pub fn connect_failed(reason: &str) -> EventKind {
    EventKind::ConnectFailed { reason: reason.to_string() }
}

pub fn raw_event(chain: &str, kind: &str) -> RawEvent {
    RawEvent {
        session_id: Some(SESSION.to_string()),
        timestamp: Some(TIMESTAMP),
        ..RawEvent::new(chain, kind)
    }
}

pub fn raw_evm_connect(address: &str, network: Value) -> RawEvent {
    RawEvent { address: Some(address.to_string()), network_id: Some(network), ..raw_event("evm", "connect") }
}

pub fn raw_sol_connect(address: &str) -> RawEvent {
    RawEvent {
        address: Some(address.to_string()),
        network_id: Some(json!("devnet")),
        ..raw_event("solana", "connect")
    }
}

pub fn raw_network_change(chain: &str, network: Value) -> RawEvent {
    RawEvent { network_id: Some(network), ..raw_event(chain, "network_change") }
}
