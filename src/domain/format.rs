//! Display helpers shared by notifications, bot replies and the CLI.

use chrono::{DateTime, Utc};

use super::account::WatchedAccount;
use super::snapshot::Snapshot;

const PREFIX_CHARS: usize = 10;
const SUFFIX_CHARS: usize = 8;

/// `0xabcdef01...89abcdef` (first 10 + last 8 characters)
pub fn short_identifier(identifier: &str) -> String {
    if identifier.len() <= PREFIX_CHARS + SUFFIX_CHARS {
        return identifier.to_string();
    }
    format!(
        "{}...{}",
        &identifier[..PREFIX_CHARS],
        &identifier[identifier.len() - SUFFIX_CHARS..]
    )
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Balance block used by `/balance` and the `balance` CLI command
pub fn format_balance(account: &WatchedAccount, snapshot: &Snapshot) -> String {
    let mut out = format!(
        "📍 {}\nChain: {}\nBalance: {}\n",
        short_identifier(&account.identifier),
        account.chain_tag.to_uppercase(),
        snapshot.primary_value
    );
    if let Some(usd) = snapshot.usd_value {
        out.push_str(&format!("USD: ${}\n", usd));
    }
    if let Some(count) = snapshot.asset_count {
        out.push_str(&format!("Assets: {}\n", count));
    }
    out
}

/// Last stored value or `pending`
pub fn format_observed(account: &WatchedAccount) -> String {
    account
        .last_observed_value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "pending".to_string())
}
