//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that adapters must implement.
//! Following hexagonal architecture, these traits abstract:
//! - Balance reads (Ankr JSON-RPC, external valuation program)
//! - Notification delivery (Telegram)

pub mod balance_source;
pub mod notifier;
pub mod mocks;

pub use balance_source::{BalanceSource, SourceError};
pub use notifier::{Notifier, NotifyError};
