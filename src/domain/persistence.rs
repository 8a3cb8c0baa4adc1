//! Registry Persistence
//!
//! Flat JSON file mapping each normalized address to its chain and last
//! observed balance:
//!
//! ```json
//! {
//!   "0xabc...": { "chain": "eth", "last_balance": "1.5" },
//!   "0xdef...": { "chain": "bsc", "last_balance": null }
//! }
//! ```
//!
//! The file is read once at startup and rewritten in full after every
//! add/remove. Periodic refreshes are not persisted.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::account::WatchedAccount;
use super::registry::WalletRegistry;

/// Default store file name
pub const DEFAULT_STORE_FILE: &str = "wallets.json";

#[derive(Error, Debug, Clone)]
pub enum PersistError {
    #[error("Failed to serialize registry: {0}")]
    SerializationError(String),

    #[error("Failed to deserialize registry: {0}")]
    DeserializationError(String),

    #[error("Failed to write store file: {0}")]
    WriteError(String),

    #[error("Failed to read store file: {0}")]
    ReadError(String),

    #[error("Failed to create directory: {0}")]
    DirectoryError(String),
}

/// One entry of the store file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedWallet {
    pub chain: String,
    pub last_balance: Option<Decimal>,
}

/// Outcome of loading the store at startup
#[derive(Debug, Clone)]
pub enum RecoveryStatus {
    /// No file, or an empty one
    NoStore,
    Recovered(WalletRegistry),
    /// Unreadable or unparsable file; the caller starts empty
    Corrupted(String),
}

/// File-backed registry store
#[derive(Debug, Clone)]
pub struct RegistryStore {
    path: PathBuf,
}

impl RegistryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store file inside a data directory
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(DEFAULT_STORE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the whole file from the registry
    pub fn save(&self, registry: &WalletRegistry) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| PersistError::DirectoryError(e.to_string()))?;
            }
        }

        let mut map = serde_json::Map::new();
        for account in registry.list() {
            let entry = PersistedWallet {
                chain: account.chain_tag.clone(),
                last_balance: account.last_observed_value,
            };
            let value = serde_json::to_value(entry)
                .map_err(|e| PersistError::SerializationError(e.to_string()))?;
            map.insert(account.identifier.clone(), value);
        }

        let content = serde_json::to_string_pretty(&map)
            .map_err(|e| PersistError::SerializationError(e.to_string()))?;

        fs::write(&self.path, content).map_err(|e| PersistError::WriteError(e.to_string()))?;

        tracing::debug!("Saved {} wallet(s) to {}", registry.len(), self.path.display());
        Ok(())
    }

    /// Read the file. `Ok(None)` when there is nothing to restore.
    pub fn load(&self) -> Result<Option<WalletRegistry>, PersistError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content =
            fs::read_to_string(&self.path).map_err(|e| PersistError::ReadError(e.to_string()))?;

        if content.trim().is_empty() {
            return Ok(None);
        }

        let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&content)
            .map_err(|e| PersistError::DeserializationError(e.to_string()))?;

        let mut accounts = Vec::with_capacity(map.len());
        for (address, value) in map {
            let entry: PersistedWallet = serde_json::from_value(value)
                .map_err(|e| PersistError::DeserializationError(format!("{}: {}", address, e)))?;

            match WatchedAccount::new(&address, &entry.chain) {
                Ok(account) => accounts.push(account.with_observed(entry.last_balance)),
                Err(e) => tracing::warn!("Ignoring stored wallet: {}", e),
            }
        }

        let registry = WalletRegistry::from_accounts(accounts);
        tracing::info!("Loaded {} wallet(s) from {}", registry.len(), self.path.display());
        Ok(Some(registry))
    }

    /// Load for startup; never fails
    pub fn try_recover(&self) -> RecoveryStatus {
        match self.load() {
            Ok(Some(registry)) => RecoveryStatus::Recovered(registry),
            Ok(None) => RecoveryStatus::NoStore,
            Err(e) => RecoveryStatus::Corrupted(e.to_string()),
        }
    }
}
