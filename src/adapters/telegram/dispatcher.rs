//! Bot command dispatcher
//!
//! Long-polls `getUpdates`, turns each message into a [`BotCommand`] and
//! replies to the chat that sent it. All registry access goes through the
//! shared [`WalletWatcher`]; `/check` runs a pass on the shared [`Scheduler`]
//! and is skipped when one is already in flight.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::application::{Scheduler, WalletWatcher, WatchError};
use crate::domain::{format_balance, format_observed, short_identifier, RegistryError};
use super::client::TelegramClient;
use super::commands::BotCommand;

/// Telegram rejects longer messages
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Wait after a failed getUpdates before polling again
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

pub struct CommandDispatcher {
    watcher: Arc<WalletWatcher>,
    scheduler: Scheduler,
    is_running: Arc<RwLock<bool>>,
}

impl CommandDispatcher {
    pub fn new(watcher: Arc<WalletWatcher>, scheduler: Scheduler) -> Self {
        Self {
            watcher,
            scheduler,
            is_running: Arc::new(RwLock::new(false)),
        }
    }

    /// Poll for commands until `stop` is called
    pub async fn run(&self, client: &TelegramClient) {
        *self.is_running.write().await = true;
        tracing::info!("Telegram command listener started");

        let mut offset: i64 = 0;
        while *self.is_running.read().await {
            let updates = match client.get_updates(offset).await {
                Ok(updates) => updates,
                Err(e) => {
                    tracing::warn!("getUpdates failed: {}", e);
                    tokio::time::sleep(ERROR_BACKOFF).await;
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);

                let Some(message) = update.message else { continue };
                let Some(command) = message.text.as_deref().and_then(BotCommand::parse) else {
                    continue;
                };

                tracing::debug!("Command from chat {}: {:?}", message.chat.id, command);
                let reply = self.dispatch(command).await;
                let chat_id = message.chat.id.to_string();
                for chunk in split_message(&reply, MAX_MESSAGE_CHARS) {
                    if let Err(e) = client.send_message(&chat_id, &chunk).await {
                        tracing::warn!("Failed to reply to chat {}: {}", chat_id, e);
                        break;
                    }
                }
            }
        }

        tracing::info!("Telegram command listener stopped");
    }

    /// Stop after the current long poll returns
    pub async fn stop(&self) {
        *self.is_running.write().await = false;
    }

    /// Execute one command and build the reply text
    pub async fn dispatch(&self, command: BotCommand) -> String {
        match command {
            BotCommand::Start => welcome_text(),
            BotCommand::Help => help_text(),
            BotCommand::AddWallet { address, chain } => self.add(&address, chain.as_deref()).await,
            BotCommand::RemoveWallet(address) => self.remove(&address).await,
            BotCommand::ListWallets => self.list().await,
            BotCommand::Balance(address) => self.balance(address.as_deref()).await,
            BotCommand::Status => self.status().await,
            BotCommand::Check => self.check().await,
            BotCommand::Usage(usage) => format!("Usage: {}", usage),
            BotCommand::Unknown(name) => {
                format!("❓ Unknown command /{}. Send /help for the command list.", name)
            }
        }
    }

    async fn add(&self, address: &str, chain: Option<&str>) -> String {
        match self.watcher.add_wallet(address, chain).await {
            Ok(change) => {
                let mut reply = format!(
                    "✅ Wallet added!\n{}\nChain: {}",
                    change.account.identifier, change.account.chain_tag
                );
                if change.persist_error.is_some() {
                    reply.push_str("\n⚠️ Could not save the wallet list; it will be lost on restart.");
                }
                reply
            }
            Err(WatchError::Registry(RegistryError::InvalidIdentifier(_))) => {
                "❌ Invalid EVM address format.".to_string()
            }
            Err(WatchError::Registry(RegistryError::InvalidChain(chain))) => {
                format!("❌ Invalid chain identifier: {}", chain)
            }
            Err(WatchError::Registry(RegistryError::AlreadyWatched(_))) => {
                "⚠️ This wallet is already being monitored.".to_string()
            }
            Err(e) => format!("❌ Error adding wallet: {}", e),
        }
    }

    async fn remove(&self, address: &str) -> String {
        match self.watcher.remove_wallet(address).await {
            Ok(change) => {
                let mut reply = format!("✅ Wallet removed!\n{}", change.account.identifier);
                if change.persist_error.is_some() {
                    reply.push_str("\n⚠️ Could not save the wallet list.");
                }
                reply
            }
            Err(WatchError::Registry(RegistryError::NotFound(_))) => {
                "❌ Wallet not found. Use /listwallet to see all wallets.".to_string()
            }
            Err(e) => format!("❌ Error removing wallet: {}", e),
        }
    }

    async fn list(&self) -> String {
        let accounts = self.watcher.list_wallets().await;
        if accounts.is_empty() {
            return "❌ No wallets monitored yet.\nUse /addwallet <address> to add one.".to_string();
        }

        let mut reply = format!("📋 Monitored Wallets ({}):\n\n", accounts.len());
        for (idx, account) in accounts.iter().enumerate() {
            reply.push_str(&format!(
                "{}. {}\n   Chain: {}\n\n",
                idx + 1,
                account.identifier,
                account.chain_tag
            ));
        }
        reply
    }

    async fn balance(&self, address: Option<&str>) -> String {
        let rows = match address {
            Some(address) => match self.watcher.query_one(address).await {
                Ok(row) => vec![row],
                Err(WatchError::Registry(_)) => {
                    return "❌ Wallet not found. Use /listwallet to see monitored wallets.".to_string()
                }
                Err(e) => return format!("❌ Error fetching balance: {}", e),
            },
            None => self.watcher.query_all().await,
        };

        if rows.is_empty() {
            return "❌ No wallets to check. Use /addwallet <address> to add one.".to_string();
        }

        let mut reply = "💰 Wallet Balances\n\n".to_string();
        for row in rows {
            match row.result {
                Ok(snapshot) => reply.push_str(&format_balance(&row.account, &snapshot)),
                Err(e) => reply.push_str(&format!(
                    "📍 {}\n❌ Error: {}\n",
                    short_identifier(&row.account.identifier),
                    e
                )),
            }
            reply.push('\n');
        }
        reply
    }

    async fn status(&self) -> String {
        let accounts = self.watcher.list_wallets().await;
        let mut reply = format!(
            "✅ Bot Status: Running\n\n📊 Monitored Wallets: {}\n⛓️ Default Chain: {}\n⏱️ Check Interval: {} seconds\n🔌 Source: {}\n\n",
            accounts.len(),
            self.watcher.default_chain(),
            self.scheduler.interval().as_secs(),
            self.watcher.source_name()
        );

        if accounts.is_empty() {
            reply.push_str("❌ No wallets monitored yet.\n");
            return reply;
        }

        reply.push_str("Wallets:\n");
        for account in &accounts {
            reply.push_str(&format!(
                "• {} ({}) - Balance: {}\n",
                short_identifier(&account.identifier),
                account.chain_tag,
                format_observed(account)
            ));
        }
        reply
    }

    async fn check(&self) -> String {
        match self.scheduler.run_pass().await {
            Some(report) => format!(
                "🔄 Check complete: {} checked, {} changed, {} initial, {} failed",
                report.checked, report.changed, report.initial, report.source_failures
            ),
            None => "⏳ A check is already running.".to_string(),
        }
    }
}

fn welcome_text() -> String {
    [
        "👋 Welcome to the wallet balance monitor!",
        "",
        "Wallet Management:",
        "/addwallet <address> [chain] - Add wallet to monitor",
        "/removewallet <address> - Remove wallet from monitoring",
        "/listwallet - List all monitored wallets",
        "",
        "Commands:",
        "/balance [address] - Get wallet balance (all if no address)",
        "/status - Check monitoring status",
        "/check - Run a balance check now",
        "/help - Show this message",
    ]
    .join("\n")
}

fn help_text() -> String {
    [
        "📖 Available Commands:",
        "",
        "🔧 Wallet Management:",
        "/addwallet <address> [chain] - Add wallet",
        "/removewallet <address> - Remove wallet",
        "/listwallet - List all wallets",
        "",
        "📊 Queries:",
        "/balance [address] - Get balance(s)",
        "/status - Bot status",
        "/check - Check all wallets now",
        "/start - Welcome message",
        "/help - This message",
    ]
    .join("\n")
}

/// Split on line boundaries so each chunk stays within `max_chars`
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let mut line = line;
        loop {
            let line_len = line.chars().count();
            if current_len + line_len <= max_chars {
                current.push_str(line);
                current_len += line_len;
                break;
            }
            if current_len > 0 {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
                continue;
            }
            // Single line longer than the limit
            let cut = line
                .char_indices()
                .nth(max_chars)
                .map(|(i, _)| i)
                .unwrap_or(line.len());
            chunks.push(line[..cut].to_string());
            line = &line[cut..];
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
