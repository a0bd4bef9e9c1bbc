use super::HttpState;
use crate::error::CommandError;
use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use std::sync::atomic::Ordering;
use wallet_sync_core::{RawEvent, Snapshot, command::OutboundCommand};

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    /// max number of transactions to include
    limit: Option<usize>,
}

/// Liveness of the server and the current wallet sessions
pub async fn health(State(state): State<HttpState>) -> Json<serde_json::Value> {
    let snapshot = state.api.snapshot();
    Json(json!({
        "status": "healthy",
        "connections": state.connections.load(Ordering::Relaxed),
        "wallets": snapshot.sessions,
    }))
}

pub async fn snapshot(
    State(state): State<HttpState>,
    Query(query): Query<LimitQuery>,
) -> Json<Snapshot> {
    let snapshot = state.api.snapshot();
    match query.limit {
        Some(limit) => Json(snapshot.with_transaction_limit(limit)),
        None => Json(Snapshot::clone(&snapshot)),
    }
}

/// The snapshot rendered as plain text
pub async fn summary(State(state): State<HttpState>, Query(query): Query<LimitQuery>) -> String {
    state.api.agent_summary(query.limit)
}

/// Queues a wallet event, the same as sending it over the websocket
pub async fn event(
    State(state): State<HttpState>,
    request: Result<Json<RawEvent>, JsonRejection>,
) -> Response {
    let Json(event) = match request {
        Ok(event) => event,
        Err(err) => {
            if matches!(err, JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_)) {
                state.api.reject_undecodable(&err);
            }
            return rejection(err)
        }
    };
    trace!(target: "server::http", chain = %event.chain_family, kind = %event.kind, "received event");
    match state.api.ingest(event).await {
        Ok(()) => (StatusCode::ACCEPTED, Json(json!({ "queued": true }))).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Validates a command and forwards it to the connected wallet pages
pub async fn command(
    State(state): State<HttpState>,
    request: Result<Json<OutboundCommand>, JsonRejection>,
) -> Response {
    let Json(command) = match request {
        Ok(command) => command,
        Err(err) => return rejection(err),
    };
    match state.api.dispatch(command) {
        Ok(command) => (StatusCode::ACCEPTED, Json(command)).into_response(),
        Err(err) => {
            debug!(target: "server::http", %err, "rejected command");
            err.into_response()
        }
    }
}

fn rejection(err: JsonRejection) -> Response {
    warn!(target: "server::http", %err, "invalid request body");
    (err.status(), Json(json!({ "error": err.body_text() }))).into_response()
}

impl IntoResponse for CommandError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidParams(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotConnected { .. } => StatusCode::CONFLICT,
            Self::LedgerSaturated(_) | Self::QueueFull | Self::Closed => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
