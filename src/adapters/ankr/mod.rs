//! Ankr Adapter
//!
//! Implementation of the BalanceSource port for the Ankr Advanced API.

mod client;
mod types;

pub use client::{AnkrClient, AnkrConfig};
pub use types::{AccountBalance, Asset};
