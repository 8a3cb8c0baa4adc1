//! CLI Command Definitions
//!
//! Arguments for every balance-sentinel subcommand.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Default configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/sentinel.toml";

/// Balance Sentinel - EVM wallet balance monitor with Telegram alerts
#[derive(Parser, Debug)]
#[command(
    name = "balance-sentinel",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "EVM wallet balance monitor with Telegram alerts",
    long_about = "Balance Sentinel polls the balance of every watched wallet at a fixed \
                  interval and posts a Telegram message whenever a balance changes. \
                  Wallets are managed from the bot chat."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start monitoring and the Telegram bot
    Run(RunCmd),

    /// Print the current balance of watched wallets (or one address)
    Balance(BalanceCmd),

    /// List watched wallets and their last recorded balances
    List(ListCmd),
}

impl Command {
    /// Configuration file named by the subcommand
    pub fn config_path(&self) -> &Path {
        match self {
            Command::Run(cmd) => &cmd.config,
            Command::Balance(cmd) => &cmd.config,
            Command::List(cmd) => &cmd.config,
        }
    }
}

/// Start monitoring
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Override the interval between passes
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// Monitor and notify only; do not answer bot commands
    #[arg(long)]
    pub no_commands: bool,
}

/// One-shot balance query
#[derive(Parser, Debug)]
pub struct BalanceCmd {
    /// Wallet address; every watched wallet when omitted
    #[arg(value_name = "ADDRESS")]
    pub address: Option<String>,

    /// Chain for an address that is not in the watch list
    #[arg(long, value_name = "CHAIN")]
    pub chain: Option<String>,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}

/// List watched wallets
#[derive(Parser, Debug)]
pub struct ListCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}
