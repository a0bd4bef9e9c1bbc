//! timer driven behaviour of the sync service

use crate::utils::*;
use futures::StreamExt;
use serde_json::json;
use std::time::Duration;
use tokio::time::Instant;
use wallet_sync::{SyncConfig, build};
use wallet_sync_core::{ChainFamily, RawEvent, WalletStatus, command::ServerMessage};

fn raw(value: serde_json::Value) -> RawEvent {
    serde_json::from_value(value).unwrap()
}

#[tokio::test(start_paused = true)]
async fn silent_session_is_disconnected() {
    let config = SyncConfig::test()
        .with_liveness_timeout(Duration::from_secs(120))
        .with_eviction_interval(Duration::from_secs(5));
    let (api, service) = build(&config);
    tokio::spawn(service);
    let mut snapshots = api.new_snapshot_notifications();

    let start = Instant::now();
    api.ingest(raw(evm_connect(EVM_ALICE, json!(84532)))).await.unwrap();
    let connected = snapshots.next().await.unwrap();
    assert_eq!(connected.status(ChainFamily::Evm), WalletStatus::Connected);

    let evicted = snapshots.next().await.unwrap();
    assert!(start.elapsed() > Duration::from_secs(120));
    assert!(evicted.session(ChainFamily::Evm).is_none());
    assert!(evicted.sequence > connected.sequence);
    assert_eq!(api.stats().expired_sessions, 1);
}

#[tokio::test(start_paused = true)]
async fn events_keep_session_alive() {
    let config = SyncConfig::test()
        .with_liveness_timeout(Duration::from_secs(60))
        .with_eviction_interval(Duration::from_secs(1));
    let (api, service) = build(&config);
    tokio::spawn(service);

    api.ingest(raw(sol_connect(SOL_ALICE))).await.unwrap();
    api.ingest(raw(evm_connect(EVM_ALICE, json!(84532)))).await.unwrap();
    for _ in 0..4 {
        tokio::time::sleep(Duration::from_secs(30)).await;
        let state = event(
            "solana",
            "state",
            json!({ "address": SOL_ALICE, "networkId": "devnet" }),
        );
        api.ingest(raw(state)).await.unwrap();
    }
    tokio::time::sleep(Duration::from_secs(1)).await;

    let snapshot = api.snapshot();
    assert_eq!(snapshot.status(ChainFamily::Solana), WalletStatus::Connected);
    assert!(snapshot.session(ChainFamily::Evm).is_none());
}

#[tokio::test(start_paused = true)]
async fn idle_pages_are_asked_for_state() {
    let config = SyncConfig::test().with_poll_interval(Duration::from_secs(30));
    let (api, service) = build(&config);
    tokio::spawn(service);
    let mut outbound = api.subscribe_outbound();

    let start = Instant::now();
    let msg = outbound.next().await.unwrap();
    assert_eq!(msg, ServerMessage::StateRequest { chain_family: None });
    assert!(start.elapsed() >= Duration::from_secs(30));

    // the reply is an ordinary event
    let state = event("evm", "state", json!({ "address": EVM_ALICE, "networkId": "0x14a34" }));
    api.ingest(raw(state)).await.unwrap();
    wait_processed(&api, 1).await;
    assert_eq!(api.snapshot().status(ChainFamily::Evm), WalletStatus::Connected);
}
