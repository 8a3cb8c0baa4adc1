//! Balance Sentinel - EVM wallet balance monitor
//!
//! Polls the balance of a set of watched wallets at a fixed interval and
//! sends a Telegram message whenever one of them changes.
//!
//! # Modules
//!
//! - `domain`: Watched wallets, registry, change detection, store, formatting
//! - `ports`: Trait abstractions (BalanceSource, Notifier) and test doubles
//! - `adapters`: External implementations (Ankr, valuation process, Telegram, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Wallet watcher and scheduler

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod config;
pub mod application;
