use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};
use wallet_sync_core::{ChainFamily, NetworkId};
use wallet_sync_server::ServerConfig;

/// Default port the server listens on
pub const DEFAULT_PORT: u16 = 8001;

/// Base Sepolia
pub const DEFAULT_EVM_CHAIN_ID: u64 = 84532;

pub const DEFAULT_SOLANA_CLUSTER: &str = "devnet";

/// How long a session may stay silent before it is presumed gone
pub const DEFAULT_LIVENESS_TIMEOUT: Duration = Duration::from_secs(120);

/// How often sessions are checked against the liveness timeout
pub const DEFAULT_EVICTION_INTERVAL: Duration = Duration::from_secs(5);

/// Maximum number of ledger records
pub const DEFAULT_LEDGER_CAPACITY: usize = 100;

/// Silence after which the wallet page is asked for its full state
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Number of transactions included in the agent summary
pub const DEFAULT_SUMMARY_TRANSACTIONS: usize = 5;

/// Configures the synchronizer
#[derive(Clone, Debug)]
pub struct SyncConfig {
    /// The address to bind the server to
    pub host: IpAddr,
    /// Port to use, `0` binds a free port
    pub port: u16,
    /// Network the EVM wallet is expected on, any network if `None`
    pub evm_network: Option<NetworkId>,
    /// Cluster the Solana wallet is expected on, any cluster if `None`
    pub solana_network: Option<NetworkId>,
    pub liveness_timeout: Duration,
    pub eviction_interval: Duration,
    pub ledger_capacity: usize,
    pub poll_interval: Duration,
    /// Capacity of the ingestion queue shared by all transports
    pub queue_capacity: usize,
    pub summary_transactions: usize,
    /// Configures how the server handles requests
    pub server_config: ServerConfig,
}

impl SyncConfig {
    /// Returns a new config intended to be used in tests, which binds to a random, free port by
    /// setting it to `0`
    #[doc(hidden)]
    pub fn test() -> Self {
        Self { port: 0, ..Default::default() }
    }

    /// Sets the address to bind to
    #[must_use]
    pub fn with_host(mut self, host: IpAddr) -> Self {
        self.host = host;
        self
    }

    /// Sets the port to use
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the chain id the EVM wallet is expected on
    #[must_use]
    pub fn with_evm_chain_id(mut self, chain_id: Option<u64>) -> Self {
        self.evm_network = chain_id.map(NetworkId::Evm);
        self
    }

    /// Sets the cluster the Solana wallet is expected on
    ///
    /// Non Solana networks are ignored.
    #[must_use]
    pub fn with_solana_cluster(mut self, cluster: Option<NetworkId>) -> Self {
        self.solana_network = cluster.filter(|network| network.family() == ChainFamily::Solana);
        self
    }

    #[must_use]
    pub fn with_liveness_timeout(mut self, timeout: Duration) -> Self {
        self.liveness_timeout = timeout;
        self
    }

    /// Sets how often sessions are checked for expiry
    #[must_use]
    pub fn with_eviction_interval(mut self, interval: Duration) -> Self {
        self.eviction_interval = interval;
        self
    }

    /// Sets the maximum number of ledger records, at least one record is always kept
    #[must_use]
    pub fn with_ledger_capacity(mut self, capacity: usize) -> Self {
        self.ledger_capacity = capacity.max(1);
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    #[must_use]
    pub fn with_summary_transactions(mut self, count: usize) -> Self {
        self.summary_transactions = count;
        self
    }

    /// Sets the server config
    #[must_use]
    pub fn with_server_config(mut self, config: ServerConfig) -> Self {
        self.server_config = config;
        self
    }

    /// The network wallets of the given family are expected on.
    pub fn expected_network(&self, chain: ChainFamily) -> Option<&NetworkId> {
        match chain {
            ChainFamily::Evm => self.evm_network.as_ref(),
            ChainFamily::Solana => self.solana_network.as_ref(),
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            evm_network: Some(NetworkId::Evm(DEFAULT_EVM_CHAIN_ID)),
            solana_network: Some(NetworkId::Solana(DEFAULT_SOLANA_CLUSTER.to_string())),
            liveness_timeout: DEFAULT_LIVENESS_TIMEOUT,
            eviction_interval: DEFAULT_EVICTION_INTERVAL,
            ledger_capacity: DEFAULT_LEDGER_CAPACITY,
            poll_interval: DEFAULT_POLL_INTERVAL,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            summary_transactions: DEFAULT_SUMMARY_TRANSACTIONS,
            server_config: Default::default(),
        }
    }
}
