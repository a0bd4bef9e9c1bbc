//! tests for the websocket handler

use crate::utils::*;
use futures::StreamExt;
use serde_json::json;
use std::sync::atomic::Ordering;
use wallet_sync::{SyncConfig, build, server::WsSyncHandler};
use wallet_sync_core::{ChainFamily, RawEvent, WalletStatus, command::ServerMessage};
use wallet_sync_server::PubSubHandler;

#[tokio::test(flavor = "multi_thread")]
async fn pushes_snapshots_and_commands() {
    let (api, service) = build(&SyncConfig::test());
    tokio::spawn(service);

    let handler = WsSyncHandler::new(api.clone());
    let mut notifications = handler.on_connect();
    assert_eq!(handler.connections().load(Ordering::Relaxed), 1);

    // the current state comes first
    match notifications.next().await.unwrap() {
        ServerMessage::Snapshot(snapshot) => assert_eq!(snapshot.sequence, 0),
        msg => panic!("unexpected message {msg:?}"),
    }

    handler.on_request(serde_json::from_value(sol_connect(SOL_ALICE)).unwrap()).await;
    match notifications.next().await.unwrap() {
        ServerMessage::Snapshot(snapshot) => {
            assert_eq!(snapshot.status(ChainFamily::Solana), WalletStatus::Connected)
        }
        msg => panic!("unexpected message {msg:?}"),
    }

    api.disconnect(ChainFamily::Solana).unwrap();
    let msg = notifications.next().await.unwrap();
    assert_eq!(
        serde_json::to_value(&msg).unwrap(),
        json!({ "type": "command", "chainFamily": "solana", "command": "DISCONNECT", "params": {} })
    );

    handler.on_disconnect();
    assert_eq!(handler.connections().load(Ordering::Relaxed), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn slow_page_gets_latest_snapshot() {
    let (api, service) = build(&SyncConfig::test());
    tokio::spawn(service);
    let handler = WsSyncHandler::new(api.clone());
    let mut notifications = handler.on_connect();
    assert!(matches!(notifications.next().await.unwrap(), ServerMessage::Snapshot(_)));

    // the page does not read while state changes
    api.ingest(serde_json::from_value(sol_connect(SOL_ALICE)).unwrap()).await.unwrap();
    for network in ["testnet", "devnet", "testnet", "devnet"] {
        let change = event("solana", "network_change", json!({ "networkId": network }));
        api.ingest(serde_json::from_value(change).unwrap()).await.unwrap();
    }
    wait_processed(&api, 5).await;
    let latest = api.snapshot();
    assert_eq!(latest.sequence, 5);

    match notifications.next().await.unwrap() {
        ServerMessage::Snapshot(snapshot) => assert_eq!(snapshot, *latest),
        msg => panic!("unexpected message {msg:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn undecodable_messages_are_counted() {
    let (api, service) = build(&SyncConfig::test());
    tokio::spawn(service);
    let handler = WsSyncHandler::new(api.clone());

    let mistyped = r#"{"chainFamily":"evm","type":"connect","timestamp":"1700000000000"}"#;
    for text in [mistyped, "42", "{"] {
        let err = serde_json::from_str::<RawEvent>(text).unwrap_err();
        handler.on_invalid_request(err, text);
    }
    assert_eq!(api.stats().malformed, 3);
    assert_eq!(api.snapshot().sequence, 0);
}
