//! Fan out of messages to the connected wallet pages

use futures::channel::mpsc::{Receiver, Sender, channel};
use parking_lot::Mutex;
use std::sync::Arc;
use wallet_sync_core::command::ServerMessage;

/// Messages buffered per subscriber before new ones are dropped for it
pub const OUTBOX_BUFFER: usize = 64;

/// Delivers outbound messages to every subscribed connection.
#[derive(Clone, Debug, Default)]
pub struct Outbox {
    listeners: Arc<Mutex<Vec<Sender<ServerMessage>>>>,
}

// === impl Outbox ===

impl Outbox {
    /// Returns a stream of all messages sent from now on.
    pub fn subscribe(&self) -> Receiver<ServerMessage> {
        let (tx, rx) = channel(OUTBOX_BUFFER);
        self.listeners.lock().push(tx);
        rx
    }

    /// Sends the message to all live subscribers and returns how many received it.
    ///
    /// A subscriber with a full buffer misses the message, closed subscribers are removed.
    pub fn send(&self, msg: ServerMessage) -> usize {
        let mut delivered = 0;
        self.listeners.lock().retain_mut(|listener| match listener.try_send(msg.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(err) if err.is_full() => {
                warn!(target: "sync::outbox", "subscriber is not keeping up, dropping message");
                true
            }
            Err(_) => false,
        });
        delivered
    }
}
