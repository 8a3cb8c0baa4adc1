//! Telegram Adapter
//!
//! Bot API client, the Notifier that posts change alerts to a fixed chat,
//! and the long-polling command dispatcher.

mod client;
mod commands;
pub mod dispatcher;
mod types;

pub use client::{TelegramClient, TelegramConfig, TelegramError, TelegramNotifier};
pub use commands::BotCommand;
pub use dispatcher::CommandDispatcher;
pub use types::{Chat, Message, Update};
