use serde_json::{Value, json};
use std::time::Duration;
use wallet_sync::SyncApi;

pub const EVM_ALICE: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
pub const EVM_BOB: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
pub const SOL_ALICE: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
pub const SOL_BOB: &str = "ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL";

pub const SESSION: &str = "page-1";
pub const TIMESTAMP: u64 = 1_700_000_000_000;

/// A wire event with the common fields set, `fields` are merged in.
pub fn event(chain: &str, kind: &str, fields: Value) -> Value {
    let mut event = json!({
        "chainFamily": chain,
        "type": kind,
        "sessionId": SESSION,
        "timestamp": TIMESTAMP,
    });
    if let (Some(event), Value::Object(fields)) = (event.as_object_mut(), fields) {
        event.extend(fields);
    }
    event
}

pub fn evm_connect(address: &str, network: Value) -> Value {
    event("evm", "connect", json!({ "address": address, "networkId": network }))
}

pub fn sol_connect(address: &str) -> Value {
    event("solana", "connect", json!({ "address": address, "networkId": "devnet" }))
}

/// Number of events the service has taken off the queue, whatever the outcome.
pub fn processed(api: &SyncApi) -> u64 {
    let c = api.stats();
    c.applied + c.ignored + c.malformed + c.unknown_chain + c.stale + c.rejected + c.saturated
}

/// Waits until the service processed `n` events in total.
pub async fn wait_processed(api: &SyncApi, n: u64) {
    tokio::time::timeout(Duration::from_secs(10), async {
        while processed(api) < n {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {n} events, processed {}", processed(api)));
}

/// A minimal client for the HTTP routes.
pub struct HttpClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpClient {
    pub fn new(endpoint: String) -> Self {
        Self { client: reqwest::Client::new(), endpoint }
    }

    pub async fn post(&self, path: &str, body: &Value) -> (reqwest::StatusCode, Value) {
        let res = self
            .client
            .post(format!("{}{path}", self.endpoint))
            .json(body)
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap())
    }

    pub async fn get(&self, path: &str) -> Value {
        let res = self.client.get(format!("{}{path}", self.endpoint)).send().await.unwrap();
        assert!(res.status().is_success(), "GET {path} failed: {}", res.status());
        res.json().await.unwrap()
    }

    pub async fn get_text(&self, path: &str) -> String {
        self.client.get(format!("{}{path}", self.endpoint)).send().await.unwrap().text().await.unwrap()
    }
}
