use crate::{
    SyncConfig,
    config::{
        DEFAULT_EVICTION_INTERVAL, DEFAULT_LEDGER_CAPACITY, DEFAULT_LIVENESS_TIMEOUT,
        DEFAULT_POLL_INTERVAL, DEFAULT_QUEUE_CAPACITY, DEFAULT_SUMMARY_TRANSACTIONS,
    },
};
use clap::Parser;
use std::{net::IpAddr, time::Duration};
use wallet_sync_core::{
    MalformedEventError, NetworkId,
    adapter::{ChainAdapter, SolanaAdapter},
};
use wallet_sync_server::ServerConfig;

/// Synchronizes browser wallet sessions for an agent.
#[derive(Clone, Debug, Parser)]
#[command(name = "wallet-sync", version)]
pub struct SyncArgs {
    /// Port number to listen on.
    #[arg(long, short, default_value = "8001", value_name = "NUM", env = "WALLET_SYNC_PORT")]
    pub port: u16,

    /// The host the server will listen on.
    #[arg(long, value_name = "IP_ADDR", default_value = "127.0.0.1", env = "WALLET_SYNC_HOST")]
    pub host: IpAddr,

    /// The chain id EVM wallets are expected on.
    #[arg(long, value_name = "CHAIN_ID", default_value = "84532", env = "WALLET_SYNC_EVM_CHAIN_ID")]
    pub evm_chain_id: u64,

    /// The cluster Solana wallets are expected on.
    #[arg(
        long,
        value_name = "CLUSTER",
        default_value = "devnet",
        value_parser = parse_solana_cluster,
        env = "WALLET_SYNC_SOLANA_CLUSTER"
    )]
    pub solana_cluster: NetworkId,

    /// Accept wallets on any network, nothing is reported as wrong network.
    #[arg(long, conflicts_with_all = ["evm_chain_id", "solana_cluster"])]
    pub any_network: bool,

    /// Seconds without events after which a session is considered gone.
    #[arg(long, value_name = "SECONDS", env = "WALLET_SYNC_LIVENESS_TIMEOUT")]
    pub liveness_timeout: Option<u64>,

    /// Milliseconds between checks for silent sessions.
    #[arg(long, value_name = "MILLIS")]
    pub eviction_interval: Option<u64>,

    /// Seconds of silence after which the wallet pages are asked for their state.
    #[arg(long, value_name = "SECONDS", env = "WALLET_SYNC_POLL_INTERVAL")]
    pub poll_interval: Option<u64>,

    /// Max number of transactions kept in the ledger.
    #[arg(long, value_name = "NUM", default_value_t = DEFAULT_LEDGER_CAPACITY, env = "WALLET_SYNC_LEDGER_CAPACITY")]
    pub ledger_capacity: usize,

    /// Max number of queued events and commands.
    #[arg(long, value_name = "NUM", default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// Number of transactions in the agent summary.
    #[arg(long, value_name = "NUM", default_value_t = DEFAULT_SUMMARY_TRANSACTIONS)]
    pub summary_transactions: usize,

    #[command(flatten)]
    pub server_config: ServerConfig,
}

impl SyncArgs {
    pub fn into_sync_config(self) -> SyncConfig {
        let (evm_chain_id, solana_cluster) = if self.any_network {
            (None, None)
        } else {
            (Some(self.evm_chain_id), Some(self.solana_cluster))
        };

        SyncConfig::default()
            .with_host(self.host)
            .with_port(self.port)
            .with_evm_chain_id(evm_chain_id)
            .with_solana_cluster(solana_cluster)
            .with_liveness_timeout(
                self.liveness_timeout.map(Duration::from_secs).unwrap_or(DEFAULT_LIVENESS_TIMEOUT),
            )
            .with_eviction_interval(
                self.eviction_interval.map(Duration::from_millis).unwrap_or(DEFAULT_EVICTION_INTERVAL),
            )
            .with_poll_interval(
                self.poll_interval.map(Duration::from_secs).unwrap_or(DEFAULT_POLL_INTERVAL),
            )
            .with_ledger_capacity(self.ledger_capacity)
            .with_queue_capacity(self.queue_capacity)
            .with_summary_transactions(self.summary_transactions)
            .with_server_config(self.server_config)
    }

    /// Starts the synchronizer and waits for ctrl-c.
    ///
    /// See also [crate::spawn()]
    pub async fn run(self) -> eyre::Result<()> {
        let (api, handle) = crate::spawn(self.into_sync_config()).await?;

        println!("Listening on {}", handle.socket_address());
        println!("Wallet pages connect to {}", handle.ws_endpoint());

        tokio::signal::ctrl_c().await?;
        trace!(target: "sync", "received shutdown signal, shutting down");
        debug!(target: "sync", stats = ?api.stats(), "ingestion stats");
        handle.shutdown().await;
        Ok(())
    }
}

/// Installs the default tracing subscriber, filtered by `RUST_LOG`.
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// Parses a cluster name the same way cluster names reported by wallets are parsed.
fn parse_solana_cluster(s: &str) -> Result<NetworkId, MalformedEventError> {
    SolanaAdapter.parse_network(&serde_json::Value::String(s.to_string()))
}
