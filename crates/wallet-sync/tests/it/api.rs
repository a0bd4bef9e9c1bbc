//! tests for the `SyncApi` command surface

use crate::utils::*;
use futures::StreamExt;
use serde_json::json;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use wallet_sync::{CommandError, SyncConfig, build};
use wallet_sync_core::{
    ChainFamily, RawEvent, WalletStatus,
    command::{CommandKind, ServerMessage},
};

fn raw(value: serde_json::Value) -> RawEvent {
    serde_json::from_value(value).unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn connect_is_forwarded_and_optimistic() {
    let (api, service) = build(&SyncConfig::test());
    tokio::spawn(service);

    let mut outbound = api.subscribe_outbound();
    let mut snapshots = api.new_snapshot_notifications();

    let cmd = api.connect(ChainFamily::Solana).unwrap();
    assert_eq!(cmd.command, CommandKind::Connect);

    match outbound.next().await.unwrap() {
        ServerMessage::Command(forwarded) => assert_eq!(forwarded, cmd),
        msg => panic!("unexpected message {msg:?}"),
    }
    let snapshot = snapshots.next().await.unwrap();
    assert_eq!(snapshot.status(ChainFamily::Solana), WalletStatus::Connecting);
    assert_eq!(api.snapshot().sequence, snapshot.sequence);
}

#[tokio::test(flavor = "multi_thread")]
async fn sign_and_transfer_require_connection() {
    let (api, service) = build(&SyncConfig::test());
    tokio::spawn(service);

    assert_eq!(
        api.sign(ChainFamily::Evm, "hello").unwrap_err(),
        CommandError::NotConnected { chain: ChainFamily::Evm, status: WalletStatus::Disconnected }
    );

    // wrong network
    api.ingest(raw(evm_connect(EVM_ALICE, json!(1)))).await.unwrap();
    wait_processed(&api, 1).await;
    assert_eq!(
        api.transfer(ChainFamily::Evm, EVM_BOB, "0.1").unwrap_err(),
        CommandError::NotConnected { chain: ChainFamily::Evm, status: WalletStatus::WrongNetwork }
    );

    api.ingest(raw(event("evm", "network_change", json!({ "networkId": 84532 })))).await.unwrap();
    wait_processed(&api, 2).await;
    let cmd = api.transfer(ChainFamily::Evm, EVM_BOB.to_lowercase(), "0.1000").unwrap();
    assert_eq!(cmd.params.to.as_deref(), Some(EVM_BOB));
    assert_eq!(cmd.params.amount.as_deref(), Some("0.1"));
    assert!(api.sign(ChainFamily::Evm, "hello").is_ok());

    assert!(matches!(
        api.transfer(ChainFamily::Evm, EVM_BOB, "0.1234567890123456789"),
        Err(CommandError::InvalidParams(_))
    ));
    assert!(matches!(api.sign(ChainFamily::Evm, "  "), Err(CommandError::InvalidParams(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn saturated_ledger_rejects_transfers() {
    let (api, service) = build(&SyncConfig::test().with_ledger_capacity(1));
    tokio::spawn(service);

    api.ingest(raw(sol_connect(SOL_ALICE))).await.unwrap();
    api.ingest(raw(event(
        "solana",
        "transfer_initiated",
        json!({ "txId": "tx1", "to": SOL_BOB, "amount": "0.1" }),
    )))
    .await
    .unwrap();
    wait_processed(&api, 2).await;
    assert!(api.snapshot().ledger_saturated);

    assert_eq!(
        api.transfer(ChainFamily::Solana, SOL_BOB, "0.1").unwrap_err().to_string(),
        "transaction ledger is saturated with 1 pending records"
    );
    // signing does not need a ledger slot up front
    assert!(api.sign(ChainFamily::Solana, "hello").is_ok());

    api.ingest(raw(event("solana", "transfer_confirmed", json!({ "txId": "tx1" })))).await.unwrap();
    wait_processed(&api, 3).await;
    assert!(!api.snapshot().ledger_saturated);
    assert!(api.transfer(ChainFamily::Solana, SOL_BOB, "0.1").is_ok());
}

#[tokio::test(flavor = "multi_thread")]
async fn full_queue_fails_fast() {
    let (api, service) = build(&SyncConfig::test().with_queue_capacity(1));

    // nothing drains the queue yet
    api.connect(ChainFamily::Evm).unwrap();
    assert_eq!(api.connect(ChainFamily::Solana).unwrap_err(), CommandError::QueueFull);
    assert_eq!(api.try_ingest(RawEvent::new("evm", "disconnect")).unwrap_err(), CommandError::QueueFull);

    drop(service);
    assert_eq!(api.connect(ChainFamily::Solana).unwrap_err(), CommandError::Closed);
    assert_eq!(api.ingest(RawEvent::new("evm", "disconnect")).await.unwrap_err(), CommandError::Closed);
}

#[tokio::test(flavor = "multi_thread")]
async fn change_callbacks() {
    let (api, service) = build(&SyncConfig::test());
    tokio::spawn(service);

    let last = Arc::new(AtomicU64::new(0));
    let seen = Arc::clone(&last);
    api.on_change(move |snapshot| seen.store(snapshot.sequence, Ordering::SeqCst));

    api.ingest(raw(evm_connect(EVM_ALICE, json!(84532)))).await.unwrap();
    api.ingest(raw(sol_connect(SOL_ALICE))).await.unwrap();
    wait_processed(&api, 2).await;
    assert_eq!(last.load(Ordering::SeqCst), 2);
    assert_eq!(api.snapshot().sequence, 2);

    let summary = api.agent_summary(Some(0));
    assert!(summary.starts_with("Wallet status:\n- EVM: Connected (0xf39F...2266) on network 84532\n"));
    assert!(summary.ends_with("Recent transactions:\n- none\n"));
}
