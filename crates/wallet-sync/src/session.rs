//! Per chain family session state machine

use std::{collections::HashMap, time::Duration};
use tokio::time::Instant;
use wallet_sync_core::{
    ChainFamily, ConnectFailure, EventKind, NetworkId, NormalizedEvent, WalletSession,
    WalletStatus,
};

use crate::error::{IngestError, SessionTimeoutError, StaleEventError};

/// Result of applying an event that passed validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// State changed, a new snapshot is due
    Changed,
    /// The event carried no new information
    Unchanged,
}

#[derive(Clone, Debug)]
struct TrackedSession {
    session: WalletSession,
    /// when the last inbound event for this session arrived
    last_seen: Instant,
}

/// Holds the current connection of every chain family.
///
/// There is at most one session per family, a family without a session is `Disconnected`.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<ChainFamily, TrackedSession>,
    /// network each family is expected on, any network if absent
    expected: HashMap<ChainFamily, NetworkId>,
    /// last failed connect attempt per family
    failures: HashMap<ChainFamily, ConnectFailure>,
}

// === impl SessionStore ===

impl SessionStore {
    pub fn new(expected: impl IntoIterator<Item = NetworkId>) -> Self {
        Self {
            expected: expected.into_iter().map(|network| (network.family(), network)).collect(),
            ..Default::default()
        }
    }

    pub fn status(&self, chain: ChainFamily) -> WalletStatus {
        self.sessions.get(&chain).map(|t| t.session.status).unwrap_or_default()
    }

    pub fn get(&self, chain: ChainFamily) -> Option<&WalletSession> {
        self.sessions.get(&chain).map(|t| &t.session)
    }

    /// All sessions, ordered by chain family.
    pub fn sessions(&self) -> Vec<WalletSession> {
        ChainFamily::ALL.iter().filter_map(|chain| self.get(*chain).cloned()).collect()
    }

    pub fn failures(&self) -> Vec<ConnectFailure> {
        ChainFamily::ALL.iter().filter_map(|chain| self.failures.get(chain).cloned()).collect()
    }

    /// Whether `network` is the one wallets of its family are expected on.
    pub fn is_expected(&self, network: &NetworkId) -> bool {
        self.expected.get(&network.family()).is_none_or(|expected| expected == network)
    }

    /// Marks an event of `session_id` as observed, which keeps the session alive.
    ///
    /// Returns false if there is no matching session.
    pub fn touch(&mut self, chain: ChainFamily, session_id: &str, now: Instant) -> bool {
        match self.sessions.get_mut(&chain) {
            Some(tracked)
                if tracked.session.status == WalletStatus::Connecting ||
                    tracked.session.session_id == session_id =>
            {
                tracked.last_seen = now;
                true
            }
            _ => false,
        }
    }

    /// Optimistically moves a disconnected family to `Connecting` after a connect request.
    ///
    /// Returns false if the family already has a session.
    pub fn begin_connect(&mut self, chain: ChainFamily, now: Instant) -> bool {
        if self.sessions.contains_key(&chain) {
            return false
        }
        trace!(target: "sync::session", %chain, "connecting");
        let session = WalletSession {
            chain_family: chain,
            session_id: String::new(),
            address: String::new(),
            connected_at: 0,
            network_id: None,
            status: WalletStatus::Connecting,
        };
        self.sessions.insert(chain, TrackedSession { session, last_seen: now });
        true
    }

    /// Applies a session event.
    ///
    /// Transaction events are not handled here, see [`crate::ledger::TransactionLedger`].
    pub fn apply(
        &mut self,
        event: &NormalizedEvent,
        now: Instant,
    ) -> Result<ApplyOutcome, IngestError> {
        let chain = event.chain;
        match &event.kind {
            EventKind::Connected { address, network } => {
                Ok(self.on_connected(chain, &event.session_id, address, network, event.timestamp, now))
            }
            EventKind::ConnectFailed { reason } => self.on_connect_failed(chain, reason, event),
            EventKind::Disconnect => self.on_disconnect(event),
            EventKind::NetworkChange { network } => self.on_network_change(event, network),
            EventKind::State { address, network } => self.on_state(event, address, network, now),
            _ => Err(IngestError::InvalidTransition {
                chain,
                status: self.status(chain),
                event: event.tag(),
            }),
        }
    }

    /// Removes every session that was silent for longer than `timeout`.
    pub fn evict_expired(&mut self, now: Instant, timeout: Duration) -> Vec<SessionTimeoutError> {
        let mut expired = Vec::new();
        self.sessions.retain(|chain, tracked| {
            let silent = now.saturating_duration_since(tracked.last_seen);
            if silent > timeout {
                expired.push(SessionTimeoutError { chain: *chain, silent_ms: silent.as_millis() });
                return false
            }
            true
        });
        expired
    }

    fn on_connected(
        &mut self,
        chain: ChainFamily,
        session_id: &str,
        address: &str,
        network: &NetworkId,
        timestamp: u64,
        now: Instant,
    ) -> ApplyOutcome {
        let status =
            if self.is_expected(network) { WalletStatus::Connected } else { WalletStatus::WrongNetwork };

        if let Some(tracked) = self.sessions.get_mut(&chain) &&
            tracked.session.status.is_active() &&
            tracked.session.address == address
        {
            tracked.last_seen = now;
            let session = &mut tracked.session;
            if session.session_id == session_id &&
                session.network_id.as_ref() == Some(network) &&
                session.status == status
            {
                return ApplyOutcome::Unchanged
            }
            debug!(target: "sync::session", %chain, %network, %status, "connection updated");
            session.session_id = session_id.to_string();
            session.network_id = Some(network.clone());
            session.status = status;
            return ApplyOutcome::Changed
        }

        if let Some(previous) = self.get(chain) &&
            previous.status.is_active()
        {
            debug!(target: "sync::session", %chain, previous = %previous.address, "wallet account switched");
        }
        debug!(target: "sync::session", %chain, %address, %network, %status, "wallet connected");
        self.failures.remove(&chain);
        let session = WalletSession {
            chain_family: chain,
            session_id: session_id.to_string(),
            address: address.to_string(),
            connected_at: timestamp,
            network_id: Some(network.clone()),
            status,
        };
        self.sessions.insert(chain, TrackedSession { session, last_seen: now });
        ApplyOutcome::Changed
    }

    fn on_connect_failed(
        &mut self,
        chain: ChainFamily,
        reason: &str,
        event: &NormalizedEvent,
    ) -> Result<ApplyOutcome, IngestError> {
        let status = self.status(chain);
        if status.is_active() {
            return Err(IngestError::InvalidTransition { chain, status, event: event.tag() })
        }
        // passes through `Error`, which is not retained once the failure is recorded
        debug!(target: "sync::session", %chain, %reason, from = %status, to = %WalletStatus::Error, "connect failed");
        self.sessions.remove(&chain);
        self.failures.insert(
            chain,
            ConnectFailure { chain_family: chain, reason: reason.to_string(), at: event.timestamp },
        );
        trace!(target: "sync::session", %chain, "reverted to disconnected");
        Ok(ApplyOutcome::Changed)
    }

    fn on_disconnect(&mut self, event: &NormalizedEvent) -> Result<ApplyOutcome, IngestError> {
        let chain = event.chain;
        let Some(tracked) = self.sessions.get(&chain) else {
            return Err(stale(event, "no active session"))
        };
        if tracked.session.status != WalletStatus::Connecting &&
            tracked.session.session_id != event.session_id
        {
            return Err(stale(event, "session id does not match the active session"))
        }
        debug!(target: "sync::session", %chain, "wallet disconnected");
        self.sessions.remove(&chain);
        Ok(ApplyOutcome::Changed)
    }

    fn on_network_change(
        &mut self,
        event: &NormalizedEvent,
        network: &NetworkId,
    ) -> Result<ApplyOutcome, IngestError> {
        let chain = event.chain;
        let expected = self.is_expected(network);
        let Some(tracked) = self.sessions.get_mut(&chain) else {
            return Err(stale(event, "no active session"))
        };
        let session = &mut tracked.session;
        if !session.status.is_active() {
            return Err(IngestError::InvalidTransition {
                chain,
                status: session.status,
                event: event.tag(),
            })
        }

        let status = if expected { WalletStatus::Connected } else { WalletStatus::WrongNetwork };
        if session.network_id.as_ref() == Some(network) && session.status == status {
            return Ok(ApplyOutcome::Unchanged)
        }
        debug!(target: "sync::session", %chain, %network, from = %session.status, to = %status, "network changed");
        session.network_id = Some(network.clone());
        session.status = status;
        Ok(ApplyOutcome::Changed)
    }

    /// Reconciles a full state report with the store.
    fn on_state(
        &mut self,
        event: &NormalizedEvent,
        address: &Option<String>,
        network: &Option<NetworkId>,
        now: Instant,
    ) -> Result<ApplyOutcome, IngestError> {
        let chain = event.chain;
        let current = self.get(chain).filter(|s| s.status.is_active()).cloned();

        match (current, address) {
            // nothing connected on either side
            (None, None) => Ok(ApplyOutcome::Unchanged),
            // connected without us noticing
            (None, Some(address)) => {
                let Some(network) = network else {
                    return Err(IngestError::Malformed(
                        wallet_sync_core::MalformedEventError::MissingField("networkId"),
                    ))
                };
                Ok(self.on_connected(chain, &event.session_id, address, network, event.timestamp, now))
            }
            // disconnected without us noticing
            (Some(_), None) => {
                debug!(target: "sync::session", %chain, "wallet gone according to state report");
                self.sessions.remove(&chain);
                Ok(ApplyOutcome::Changed)
            }
            (Some(session), Some(address)) => {
                let network = network.as_ref().or(session.network_id.as_ref());
                match network {
                    Some(network) if *address != session.address || session.network_id.as_ref() != Some(network) => {
                        Ok(self.on_connected(chain, &event.session_id, address, network, event.timestamp, now))
                    }
                    _ => {
                        self.touch(chain, &session.session_id, now);
                        Ok(ApplyOutcome::Unchanged)
                    }
                }
            }
        }
    }
}

fn stale(event: &NormalizedEvent, reason: &'static str) -> IngestError {
    StaleEventError { chain: event.chain, event: event.tag(), reason }.into()
}
