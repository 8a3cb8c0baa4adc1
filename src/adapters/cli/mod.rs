//! CLI Adapter
//!
//! Command-line interface for balance-sentinel.
//! Uses clap derive macros for argument parsing.

mod commands;

pub use commands::{BalanceCmd, CliApp, Command, ListCmd, RunCmd, DEFAULT_CONFIG_PATH};
