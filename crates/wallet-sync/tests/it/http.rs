//! tests for the HTTP routes

use crate::utils::*;
use reqwest::StatusCode;
use serde_json::json;
use wallet_sync::{SyncConfig, spawn};

#[tokio::test(flavor = "multi_thread")]
async fn network_change_round_trip() {
    let (api, handle) = spawn(SyncConfig::test()).await.unwrap();
    let client = HttpClient::new(handle.http_endpoint());

    let (status, _) = client.post("/api/event", &evm_connect(&EVM_ALICE.to_lowercase(), json!(84532))).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    wait_processed(&api, 1).await;

    let snapshot = client.get("/api/snapshot").await;
    let session = &snapshot["sessions"][0];
    assert_eq!(session["chainFamily"], "evm");
    assert_eq!(session["status"], "CONNECTED");
    assert_eq!(session["address"], EVM_ALICE);

    client.post("/api/event", &event("evm", "network_change", json!({ "networkId": 1 }))).await;
    wait_processed(&api, 2).await;
    assert_eq!(client.get("/api/snapshot").await["sessions"][0]["status"], "WRONG_NETWORK");

    client
        .post("/api/event", &event("evm", "network_change", json!({ "networkId": "0x14a34" })))
        .await;
    wait_processed(&api, 3).await;
    assert_eq!(client.get("/api/snapshot").await["sessions"][0]["status"], "CONNECTED");

    handle.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn transfer_lifecycle() {
    let (api, handle) = spawn(SyncConfig::test()).await.unwrap();
    let client = HttpClient::new(handle.http_endpoint());

    client.post("/api/event", &sol_connect(SOL_ALICE)).await;
    client
        .post(
            "/api/event",
            &event(
                "solana",
                "transfer_initiated",
                json!({ "txId": "tx1", "to": SOL_BOB, "amount": 500_000_000u64 }),
            ),
        )
        .await;
    wait_processed(&api, 2).await;

    let snapshot = client.get("/api/snapshot").await;
    let txs = snapshot["transactions"].as_array().unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0]["id"], "tx1");
    assert_eq!(txs[0]["status"], "PENDING");
    assert_eq!(txs[0]["amount"], "0.5");
    assert_eq!(txs[0]["from"], SOL_ALICE);
    assert!(txs[0]["confirmedAt"].is_null());

    let confirmed = event(
        "solana",
        "transfer_confirmed",
        json!({ "txId": "tx1", "timestamp": TIMESTAMP + 2_000 }),
    );
    client.post("/api/event", &confirmed).await;
    wait_processed(&api, 3).await;
    let snapshot = client.get("/api/snapshot").await;
    assert_eq!(snapshot["transactions"][0]["status"], "CONFIRMED");
    assert_eq!(snapshot["transactions"][0]["confirmedAt"], json!(TIMESTAMP + 2_000));

    // a repeated confirmation is a no-op
    client.post("/api/event", &confirmed).await;
    wait_processed(&api, 4).await;
    assert_eq!(client.get("/api/snapshot").await, snapshot);

    let summary = client.get_text("/api/summary").await;
    assert!(summary.contains("- Solana: Connected (Tokenk...Q5DA) on network devnet"), "{summary}");
    assert!(summary.contains("[CONFIRMED] Solana transfer 0.5 SOL"), "{summary}");

    handle.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn families_are_independent() {
    let (api, handle) = spawn(SyncConfig::test()).await.unwrap();
    let client = HttpClient::new(handle.http_endpoint());

    let evm_body = evm_connect(EVM_ALICE, json!(84532));
    let sol_body = sol_connect(SOL_ALICE);
    let (evm, sol) = tokio::join!(
        client.post("/api/event", &evm_body),
        client.post("/api/event", &sol_body),
    );
    assert_eq!((evm.0, sol.0), (StatusCode::ACCEPTED, StatusCode::ACCEPTED));
    wait_processed(&api, 2).await;

    let snapshot = client.get("/api/snapshot").await;
    assert_eq!(snapshot["sessions"].as_array().unwrap().len(), 2);
    let solana = snapshot["sessions"][1].clone();
    assert_eq!(solana["status"], "CONNECTED");

    client.post("/api/event", &event("evm", "disconnect", json!({}))).await;
    wait_processed(&api, 3).await;
    let snapshot = client.get("/api/snapshot").await;
    assert_eq!(snapshot["sessions"], json!([solana]));

    handle.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn replayed_events_do_not_change_snapshot() {
    let (api, handle) = spawn(SyncConfig::test()).await.unwrap();
    let client = HttpClient::new(handle.http_endpoint());

    let events = [
        evm_connect(EVM_ALICE, json!("84532")),
        sol_connect(SOL_ALICE),
        event("evm", "sign_result", json!({ "txId": "sig1", "status": "success" })),
        event("solana", "transfer_initiated", json!({ "txId": "tx1", "to": SOL_BOB, "amount": "1.25" })),
        event("solana", "transfer_failed", json!({ "txId": "tx1", "error": "blockhash expired" })),
    ];
    for event in &events {
        client.post("/api/event", event).await;
    }
    wait_processed(&api, 5).await;
    let snapshot = client.get("/api/snapshot").await;
    assert_eq!(snapshot["transactions"][1]["status"], "FAILED");
    assert_eq!(snapshot["transactions"][1]["error"], "blockhash expired");

    for event in &events {
        client.post("/api/event", event).await;
    }
    wait_processed(&api, 10).await;
    assert_eq!(client.get("/api/snapshot").await, snapshot);
    assert_eq!(api.stats().ignored, 5);

    handle.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn disconnect_before_connect_is_dropped() {
    let (api, handle) = spawn(SyncConfig::test()).await.unwrap();
    let client = HttpClient::new(handle.http_endpoint());

    client.post("/api/event", &event("evm", "disconnect", json!({ "timestamp": TIMESTAMP + 1 }))).await;
    client.post("/api/event", &evm_connect(EVM_ALICE, json!(84532))).await;
    wait_processed(&api, 2).await;

    assert_eq!(client.get("/api/snapshot").await["sessions"][0]["status"], "CONNECTED");
    assert_eq!(api.stats().stale, 1);

    handle.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_events_are_contained() {
    let (api, handle) = spawn(SyncConfig::test()).await.unwrap();
    let client = HttpClient::new(handle.http_endpoint());

    client.post("/api/event", &evm_connect(EVM_ALICE, json!(84532))).await;
    wait_processed(&api, 1).await;
    let snapshot = client.get("/api/snapshot").await;

    // accepted by the transport, dropped by the ingestor
    for event in [
        event("bitcoin", "connect", json!({})),
        event("evm", "teleport", json!({})),
        evm_connect("0x1234", json!(84532)),
        event("evm", "transfer_initiated", json!({ "txId": "tx1", "to": EVM_BOB, "amount": "-1" })),
    ] {
        let (status, _) = client.post("/api/event", &event).await;
        assert_eq!(status, StatusCode::ACCEPTED);
    }
    wait_processed(&api, 5).await;
    assert_eq!(client.get("/api/snapshot").await, snapshot);
    let stats = api.stats();
    assert_eq!((stats.unknown_chain, stats.malformed), (1, 3));

    // not even JSON
    let res = reqwest::Client::new()
        .post(format!("{}/api/event", handle.http_endpoint()))
        .header("content-type", "application/json")
        .body("{ nope")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // JSON, but not the shape of an event
    let mistyped = json!({
        "chainFamily": "evm",
        "type": "transfer_confirmed",
        "sessionId": SESSION,
        "txId": 42,
        "timestamp": TIMESTAMP.to_string(),
    });
    let (status, body) = client.post("/api/event", &mistyped).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");

    assert_eq!(client.get("/api/snapshot").await, snapshot);
    assert_eq!(api.stats().malformed, 5);

    handle.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn health() {
    let (api, handle) = spawn(SyncConfig::test()).await.unwrap();
    let client = HttpClient::new(handle.http_endpoint());

    let health = client.get("/health").await;
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["connections"], json!(0));
    assert_eq!(health["wallets"], json!([]));

    client.post("/api/event", &sol_connect(SOL_ALICE)).await;
    wait_processed(&api, 1).await;
    let health = client.get("/health").await;
    assert_eq!(health["wallets"][0]["address"], SOL_ALICE);

    handle.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn commands() {
    let (api, handle) = spawn(SyncConfig::test()).await.unwrap();
    let client = HttpClient::new(handle.http_endpoint());

    let transfer = json!({
        "chainFamily": "solana",
        "command": "TRANSFER",
        "params": { "to": SOL_BOB, "amount": "0.50" }
    });
    let (status, body) = client.post("/api/command", &transfer).await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    let (status, body) = client
        .post("/api/command", &json!({ "chainFamily": "evm", "command": "CONNECT" }))
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body, json!({ "chainFamily": "evm", "command": "CONNECT", "params": {} }));

    client.post("/api/event", &sol_connect(SOL_ALICE)).await;
    wait_processed(&api, 1).await;
    let (status, body) = client.post("/api/command", &transfer).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["params"]["amount"], "0.5");

    let invalid = json!({
        "chainFamily": "solana",
        "command": "TRANSFER",
        "params": { "to": EVM_BOB, "amount": "1" }
    });
    let (status, body) = client.post("/api/command", &invalid).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("invalid command parameters"));

    let (status, _) = client
        .post("/api/command", &json!({ "chainFamily": "bitcoin", "command": "CONNECT" }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    handle.shutdown().await;
}
