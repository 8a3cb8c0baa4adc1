//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Ankr: multichain balance API client
//! - Process: external valuation program
//! - Telegram: notifier and bot command dispatcher
//! - CLI: Command-line interface definitions

pub mod ankr;
pub mod process;
pub mod telegram;
pub mod cli;

pub use ankr::AnkrClient;
pub use process::ProcessBalanceSource;
pub use telegram::{CommandDispatcher, TelegramClient, TelegramNotifier};
pub use cli::CliApp;
