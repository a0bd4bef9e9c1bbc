//! Bootstrap [axum] servers

use crate::SyncApi;
use axum::{
    Router,
    routing::{get, post},
};
use std::{
    future::Future,
    sync::{Arc, atomic::AtomicUsize},
};
use tokio::net::TcpListener;
use wallet_sync_server::{ServerConfig, ServerError};

/// handlers for the HTTP routes
mod handler;

mod ws;
pub use ws::WsSyncHandler;

/// State shared by all HTTP handlers.
#[derive(Clone, Debug)]
pub struct HttpState {
    pub api: SyncApi,
    /// number of open websocket connections
    pub connections: Arc<AtomicUsize>,
}

/// The HTTP routes of the synchronizer.
pub fn http_router(state: HttpState) -> Router {
    Router::new()
        .route("/health", get(handler::health))
        .route("/api/snapshot", get(handler::snapshot))
        .route("/api/summary", get(handler::summary))
        .route("/api/event", post(handler::event))
        .route("/api/command", post(handler::command))
        .with_state(state)
}

/// Serves the HTTP routes and the websocket endpoint for `api` on `listener` until `shutdown`
/// resolves.
pub async fn serve<F>(
    listener: TcpListener,
    config: ServerConfig,
    api: SyncApi,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let ws = WsSyncHandler::new(api.clone());
    let http = http_router(HttpState { api, connections: ws.connections() });
    wallet_sync_server::serve_http_ws(listener, config, http, ws, shutdown).await
}
