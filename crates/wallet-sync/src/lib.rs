//! Keeps an agent informed about the browser wallets of a user.
//!
//! Wallet pages report connection, network and transaction events over websocket or HTTP. The
//! [`SyncService`] applies them in arrival order, per chain family, and publishes immutable
//! [`Snapshot`](wallet_sync_core::Snapshot)s that the agent reads through a [`SyncApi`].

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

use std::{io, net::SocketAddr, sync::Arc};
use tokio::{
    net::TcpListener,
    sync::{mpsc, oneshot},
    task::JoinHandle,
};

mod api;
pub use api::SyncApi;

mod config;
pub use config::*;

pub mod error;
pub use error::{CommandError, IngestError};

pub mod format;
pub use format::format_snapshot;

pub mod ingest;
pub mod ledger;
pub mod outbox;

/// background service
pub mod service;
pub use service::{SyncMessage, SyncService};

pub mod session;
pub mod snapshot;

/// axum server
pub mod server;

#[cfg(feature = "cmd")]
pub mod cmd;

#[cfg(test)]
mod test_utils;

/// Creates the synchronizer state and the service that drives it, without any transport.
///
/// The returned [`SyncService`] must be polled, e.g. spawned, for queued events and commands to be
/// applied. Must be called from within a tokio runtime.
pub fn build(config: &SyncConfig) -> (SyncApi, SyncService) {
    let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
    let publisher = Arc::new(snapshot::SnapshotPublisher::new());
    let stats = Arc::new(ingest::IngestStats::default());
    let outbox = outbox::Outbox::default();

    let expected = [config.evm_network.clone(), config.solana_network.clone()];
    let ingestor = ingest::EventIngestor::new(
        expected.into_iter().flatten(),
        config.ledger_capacity.max(1),
        Arc::clone(&publisher),
        Arc::clone(&stats),
    );
    let service = SyncService::new(
        rx,
        ingestor,
        outbox.clone(),
        config.liveness_timeout,
        config.eviction_interval,
        config.poll_interval,
    );
    let api = SyncApi::new(
        tx,
        publisher,
        outbox,
        stats,
        config.summary_transactions,
        config.ledger_capacity.max(1),
    );
    (api, service)
}

/// Binds the server and spawns the synchronizer.
///
/// # Example
///
/// ```no_run
/// # use wallet_sync::SyncConfig;
/// # async fn t() -> std::io::Result<()> {
/// let (api, handle) = wallet_sync::spawn(SyncConfig::default()).await?;
/// println!("{}", api.agent_summary(None));
/// handle.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub async fn spawn(config: SyncConfig) -> io::Result<(SyncApi, SyncHandle)> {
    let listener = TcpListener::bind(config.socket_addr()).await?;
    let addr = listener.local_addr()?;

    let (api, service) = build(&config);
    let service = tokio::task::spawn(service);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server = tokio::task::spawn(server::serve(
        listener,
        config.server_config.clone(),
        api.clone(),
        async move {
            let _ = shutdown_rx.await;
        },
    ));

    info!(target: "sync", %addr, "wallet sync listening");
    let handle = SyncHandle { config, addr, service, server, shutdown: Some(shutdown_tx) };
    Ok((api, handle))
}

/// A handle to the spawned synchronizer and its server.
///
/// Dropping the handle does not stop the synchronizer, see [`SyncHandle::shutdown`].
#[derive(Debug)]
pub struct SyncHandle {
    config: SyncConfig,
    /// the address the server is bound to
    addr: SocketAddr,
    service: JoinHandle<()>,
    server: JoinHandle<Result<(), wallet_sync_server::ServerError>>,
    shutdown: Option<oneshot::Sender<()>>,
}

// === impl SyncHandle ===

impl SyncHandle {
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The address of the launched server
    pub fn socket_address(&self) -> &SocketAddr {
        &self.addr
    }

    /// Returns the http endpoint
    pub fn http_endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Returns the websocket endpoint
    pub fn ws_endpoint(&self) -> String {
        format!("ws://{}{}", self.addr, wallet_sync_server::WS_PATH)
    }

    /// Stops accepting connections, waits for the server to finish and stops the service.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        match (&mut self.server).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => error!(target: "sync", %err, "server failed"),
            Err(err) => error!(target: "sync", %err, "server task failed"),
        }
        self.service.abort();
        debug!(target: "sync", addr = %self.addr, "shut down");
    }
}
