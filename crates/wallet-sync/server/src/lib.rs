//! Bootstrap [axum] servers that connect wallet pages over websocket.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

use axum::{Router, http::header::InvalidHeaderValue, routing::get};
use std::future::Future;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

mod config;
pub use config::ServerConfig;

mod error;
pub use error::{ServerError, TransportError};

/// Connection handling shared by all duplex transports
pub mod pubsub;
pub use pubsub::{PubSubConnection, PubSubHandler};

/// Websocket transport
pub mod ws;

/// The path the websocket endpoint is served at.
pub const WS_PATH: &str = "/ws";

/// Combines the `http` routes with a websocket endpoint driven by `ws`.
pub fn router<Handler: PubSubHandler>(
    config: &ServerConfig,
    http: Router,
    ws: Handler,
) -> Result<Router, InvalidHeaderValue> {
    let mut router = Router::new()
        .route(WS_PATH, get(ws::handle_ws::<Handler>))
        .with_state(ws)
        .merge(http)
        .layer(TraceLayer::new_for_http());
    if let Some(cors) = config.cors_layer()? {
        router = router.layer(cors);
    }
    Ok(router)
}

/// Serves the HTTP routes and the websocket endpoint on `listener` until `shutdown` resolves.
pub async fn serve_http_ws<Handler, F>(
    listener: TcpListener,
    config: ServerConfig,
    http: Router,
    ws: Handler,
    shutdown: F,
) -> Result<(), ServerError>
where
    Handler: PubSubHandler,
    F: Future<Output = ()> + Send + 'static,
{
    let router = router(&config, http, ws)?;
    trace!(target: "server", addr = ?listener.local_addr().ok(), "serving http and ws");
    axum::serve(listener, router).with_graceful_shutdown(shutdown).await?;
    Ok(())
}
