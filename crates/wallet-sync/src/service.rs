//! background service

use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};
use tokio::{
    sync::mpsc,
    time::{Instant, Interval, MissedTickBehavior},
};
use wallet_sync_core::{RawEvent, command::{OutboundCommand, ServerMessage}};

use crate::{ingest::EventIngestor, outbox::Outbox};

/// Max number of queued messages handled per poll before yielding.
const MAX_MESSAGES_PER_POLL: usize = 64;

/// Work items for the [`SyncService`].
#[derive(Clone, Debug)]
pub enum SyncMessage {
    /// An inbound event from the wallet page
    Event(RawEvent),
    /// A validated command for the wallet page
    Command(OutboundCommand),
}

/// The type that drives the synchronizer state.
///
/// This service is an endless future that applies queued events and commands in arrival order,
/// evicts silent sessions and asks idle wallet pages for a state refresh. It resolves once every
/// [`crate::SyncApi`] handle is dropped.
pub struct SyncService {
    /// queue filled by the transports
    queue: mpsc::Receiver<SyncMessage>,
    /// the single writer of the synchronizer state
    ingestor: EventIngestor,
    outbox: Outbox,
    liveness_timeout: Duration,
    eviction: Interval,
    refresh: Interval,
    poll_interval: Duration,
    /// when the last message arrived
    last_inbound: Instant,
}

// === impl SyncService ===

impl SyncService {
    pub fn new(
        queue: mpsc::Receiver<SyncMessage>,
        ingestor: EventIngestor,
        outbox: Outbox,
        liveness_timeout: Duration,
        eviction_interval: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            queue,
            ingestor,
            outbox,
            liveness_timeout,
            eviction: interval(eviction_interval),
            refresh: interval(poll_interval),
            poll_interval,
            last_inbound: Instant::now(),
        }
    }

    pub fn ingestor(&self) -> &EventIngestor {
        &self.ingestor
    }

    fn on_message(&mut self, msg: SyncMessage) {
        let now = Instant::now();
        match msg {
            SyncMessage::Event(event) => {
                self.last_inbound = now;
                self.ingestor.ingest_at(&event, now);
            }
            SyncMessage::Command(cmd) => {
                self.ingestor.on_command(&cmd, now);
                let chain = cmd.chain_family;
                let command = cmd.command;
                let receivers = self.outbox.send(ServerMessage::Command(cmd));
                if receivers == 0 {
                    warn!(target: "sync::service", %chain, %command, "no wallet page connected, command not delivered");
                } else {
                    debug!(target: "sync::service", %chain, %command, receivers, "forwarded command");
                }
            }
        }
    }

    fn on_refresh(&mut self) {
        let idle = Instant::now().saturating_duration_since(self.last_inbound);
        if idle < self.poll_interval {
            return
        }
        let receivers = self.outbox.send(ServerMessage::StateRequest { chain_family: None });
        trace!(target: "sync::service", idle_ms = idle.as_millis(), receivers, "requested state refresh");
    }
}

impl Future for SyncService {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let pin = self.get_mut();

        let mut handled = 0;
        loop {
            if handled == MAX_MESSAGES_PER_POLL {
                // yield to other tasks, but come back right away
                cx.waker().wake_by_ref();
                break
            }
            match pin.queue.poll_recv(cx) {
                Poll::Ready(Some(msg)) => {
                    pin.on_message(msg);
                    handled += 1;
                }
                Poll::Ready(None) => {
                    debug!(target: "sync::service", "all handles dropped, shutting down");
                    return Poll::Ready(())
                }
                Poll::Pending => break,
            }
        }

        while pin.eviction.poll_tick(cx).is_ready() {
            pin.ingestor.evict_expired(Instant::now(), pin.liveness_timeout);
        }

        while pin.refresh.poll_tick(cx).is_ready() {
            pin.on_refresh();
        }

        Poll::Pending
    }
}

/// An interval whose first tick is one period from now.
fn interval(period: Duration) -> Interval {
    let period = period.max(Duration::from_millis(1));
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}
