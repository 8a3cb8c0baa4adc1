//! Application Layer - Wallet watcher and balance check scheduler

pub mod watcher;
pub mod scheduler;

pub use watcher::{load_registry, BalanceQuery, WalletChange, WalletWatcher, WatchError};
pub use scheduler::{PassReport, Scheduler, SchedulerState};
