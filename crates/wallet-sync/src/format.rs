//! Plain text rendering of a snapshot for agent prompts

use std::fmt::Write;
use wallet_sync_core::{ChainFamily, Snapshot, TransactionRecord, TxKind, WalletStatus};

/// Renders the wallet status of every chain family followed by the `recent` most recent
/// transactions.
pub fn format_snapshot(snapshot: &Snapshot, recent: usize) -> String {
    let mut s = String::from("Wallet status:\n");
    for chain in ChainFamily::ALL {
        let _ = write!(s, "- {chain}: ");
        match snapshot.session(chain) {
            Some(session) if session.status.is_active() => {
                let _ = write!(s, "{} ({})", session.status, shorten(&session.address));
                if let Some(network) = &session.network_id {
                    let _ = write!(s, " on network {network}");
                }
            }
            Some(session) => {
                let _ = write!(s, "{}", session.status);
            }
            None => {
                let _ = write!(s, "{}", WalletStatus::Disconnected);
                if let Some(failure) = snapshot.connect_failure(chain) {
                    let _ = write!(s, " (last connect failed: {})", failure.reason);
                }
            }
        }
        s.push('\n');
    }
    if snapshot.ledger_saturated {
        s.push_str("- Transaction ledger is full of pending transactions, new transfers are rejected\n");
    }

    s.push_str("Recent transactions:\n");
    let transactions = snapshot.recent_transactions(recent);
    if transactions.is_empty() {
        s.push_str("- none\n");
    }
    // newest first
    for tx in transactions.iter().rev() {
        s.push_str("- ");
        format_transaction(&mut s, tx);
        s.push('\n');
    }
    s
}

fn format_transaction(s: &mut String, tx: &TransactionRecord) {
    let _ = write!(s, "[{}] {} {}", tx.status, tx.chain_family, tx.kind);
    match tx.kind {
        TxKind::Transfer => {
            if let Some(amount) = &tx.amount {
                let _ = write!(s, " {amount} {}", tx.chain_family.native_symbol());
            }
            let _ = write!(s, " from {}", shorten(&tx.from));
            if let Some(to) = &tx.to {
                let _ = write!(s, " to {}", shorten(to));
            }
        }
        TxKind::Sign => {
            let _ = write!(s, " by {}", shorten(&tx.from));
        }
    }
    let _ = write!(s, " (tx: {})", tx.id);
    if let Some(error) = &tx.error {
        let _ = write!(s, ": {error}");
    }
}

/// Shortens an address to its first six and last four characters.
fn shorten(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 13 {
        return address.to_string()
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
