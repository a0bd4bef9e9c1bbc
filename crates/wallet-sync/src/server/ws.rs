use crate::SyncApi;
use futures::{
    StreamExt,
    future,
    stream::{self, BoxStream},
};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use wallet_sync_core::{RawEvent, Snapshot, command::ServerMessage};
use wallet_sync_server::PubSubHandler;

/// A `PubSubHandler` that feeds wallet page events into the [`SyncApi`].
///
/// Every connected page receives the current snapshot, every following snapshot and all
/// outbound commands.
#[derive(Clone, Debug)]
pub struct WsSyncHandler {
    api: SyncApi,
    connections: Arc<AtomicUsize>,
}

// === impl WsSyncHandler ===

impl WsSyncHandler {
    pub fn new(api: SyncApi) -> Self {
        Self { api, connections: Default::default() }
    }

    /// The counter of open connections.
    pub fn connections(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.connections)
    }
}

#[async_trait::async_trait]
impl PubSubHandler for WsSyncHandler {
    type Request = RawEvent;
    type Notification = ServerMessage;

    fn on_connect(&self) -> BoxStream<'static, ServerMessage> {
        let open = self.connections.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(target: "server::ws", open, "wallet page connected");

        // a page that falls behind gets the newest snapshot, not a backlog
        let mut latest = self.api.subscribe_latest_snapshot();
        let initial = ServerMessage::Snapshot(Snapshot::clone(&latest.borrow_and_update()));
        let snapshots = stream::unfold(latest, |mut latest| async move {
            latest.changed().await.ok()?;
            let snapshot = Snapshot::clone(&latest.borrow_and_update());
            Some((ServerMessage::Snapshot(snapshot), latest))
        });
        let outbound = self.api.subscribe_outbound();
        stream::once(future::ready(initial)).chain(stream::select(snapshots, outbound)).boxed()
    }

    async fn on_request(&self, event: RawEvent) {
        trace!(target: "server::ws", chain = %event.chain_family, kind = %event.kind, "received event");
        if let Err(err) = self.api.ingest(event).await {
            warn!(target: "server::ws", %err, "failed to queue event");
        }
    }

    fn on_invalid_request(&self, err: serde_json::Error, _text: &str) {
        self.api.reject_undecodable(&err);
    }

    fn on_disconnect(&self) {
        let open = self.connections.fetch_sub(1, Ordering::Relaxed).saturating_sub(1);
        debug!(target: "server::ws", open, "wallet page disconnected");
    }
}
