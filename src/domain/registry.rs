//! Wallet Registry
//!
//! Insertion-ordered set of watched accounts. Pure in-memory state; locking
//! and persistence are handled by the application layer.

use rust_decimal::Decimal;
use thiserror::Error;

use super::account::{normalize_identifier, WatchedAccount};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Invalid wallet address: {0}")]
    InvalidIdentifier(String),

    #[error("Invalid chain tag: {0}")]
    InvalidChain(String),

    #[error("Wallet already monitored: {0}")]
    AlreadyWatched(String),

    #[error("Wallet not found: {0}")]
    NotFound(String),
}

/// The set of accounts under watch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalletRegistry {
    accounts: Vec<WatchedAccount>,
}

impl WalletRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from restored accounts, dropping later duplicates
    pub fn from_accounts(accounts: impl IntoIterator<Item = WatchedAccount>) -> Self {
        let mut registry = Self::new();
        for account in accounts {
            if let Err(e) = registry.insert(account) {
                tracing::warn!("Skipping restored wallet: {}", e);
            }
        }
        registry
    }

    /// Insert an already-validated account
    pub fn insert(&mut self, account: WatchedAccount) -> Result<(), RegistryError> {
        if self.position(&account.identifier).is_some() {
            return Err(RegistryError::AlreadyWatched(account.identifier));
        }
        self.accounts.push(account);
        Ok(())
    }

    /// Remove by identifier, any case
    pub fn remove(&mut self, identifier: &str) -> Result<WatchedAccount, RegistryError> {
        let key = lookup_key(identifier)?;
        let idx = self
            .position(&key)
            .ok_or_else(|| RegistryError::NotFound(key.clone()))?;
        Ok(self.accounts.remove(idx))
    }

    pub fn get(&self, identifier: &str) -> Result<&WatchedAccount, RegistryError> {
        let key = lookup_key(identifier)?;
        self.position(&key)
            .map(|idx| &self.accounts[idx])
            .ok_or(RegistryError::NotFound(key))
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.get(identifier).is_ok()
    }

    /// Accounts in insertion order
    pub fn list(&self) -> &[WatchedAccount] {
        &self.accounts
    }

    /// Replace the stored value for an account
    pub fn update_observed(&mut self, identifier: &str, value: Decimal) -> Result<(), RegistryError> {
        let key = lookup_key(identifier)?;
        let idx = self
            .position(&key)
            .ok_or_else(|| RegistryError::NotFound(key.clone()))?;
        self.accounts[idx].last_observed_value = Some(value);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    fn position(&self, normalized: &str) -> Option<usize> {
        self.accounts.iter().position(|a| a.identifier == normalized)
    }
}

/// Lookups of malformed input can never match, so they report NotFound
fn lookup_key(identifier: &str) -> Result<String, RegistryError> {
    normalize_identifier(identifier)
        .map_err(|_| RegistryError::NotFound(identifier.trim().to_string()))
}
