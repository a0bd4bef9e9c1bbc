//! The `wallet-sync` CLI

use clap::Parser;
use wallet_sync::cmd::{SyncArgs, init_tracing};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    init_tracing();
    SyncArgs::parse().run().await
}
