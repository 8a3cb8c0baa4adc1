//! Wallet Watcher
//!
//! Process-wide owner of the wallet registry. Every read or write of an
//! account goes through here so that the periodic pass and on-demand bot
//! commands share one lock:
//!
//! - add / remove persist the full registry (when a store is configured)
//! - `record_observation` evaluates and updates one account under a single
//!   write-lock acquisition
//! - balance source calls never hold the lock

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::domain::{
    evaluate, short_identifier, ChangeEvent, Evaluation, PersistError, RecoveryStatus,
    RegistryError, RegistryStore, Snapshot, WalletRegistry, WatchedAccount,
};
use crate::ports::{BalanceSource, Notifier, NotifyError, SourceError};

/// Default bound on one balance source call
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(20);

/// Default chain for wallets added without one
pub const DEFAULT_CHAIN: &str = "eth";

#[derive(Debug, Error)]
pub enum WatchError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Balance probe failed: {0}")]
    ProbeFailed(SourceError),

    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Result of an add or remove
#[derive(Debug, Clone)]
pub struct WalletChange {
    pub account: WatchedAccount,
    /// Set when the in-memory change could not be written to disk
    pub persist_error: Option<PersistError>,
}

/// One row of a balance query
#[derive(Debug, Clone)]
pub struct BalanceQuery {
    pub account: WatchedAccount,
    pub result: Result<Snapshot, SourceError>,
}

pub struct WalletWatcher {
    registry: RwLock<WalletRegistry>,
    source: Arc<dyn BalanceSource>,
    notifier: Arc<dyn Notifier>,
    store: Option<RegistryStore>,
    default_chain: String,
    source_timeout: Duration,
}

impl WalletWatcher {
    pub fn new(
        registry: WalletRegistry,
        source: Arc<dyn BalanceSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            registry: RwLock::new(registry),
            source,
            notifier,
            store: None,
            default_chain: DEFAULT_CHAIN.to_string(),
            source_timeout: DEFAULT_SOURCE_TIMEOUT,
        }
    }

    /// Persist add/remove to this store
    pub fn with_store(mut self, store: RegistryStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_default_chain(mut self, chain: impl Into<String>) -> Self {
        self.default_chain = chain.into();
        self
    }

    pub fn with_source_timeout(mut self, timeout: Duration) -> Self {
        self.source_timeout = timeout;
        self
    }

    pub fn default_chain(&self) -> &str {
        &self.default_chain
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Validate, probe once, then start watching
    pub async fn add_wallet(
        &self,
        identifier: &str,
        chain_tag: Option<&str>,
    ) -> Result<WalletChange, WatchError> {
        let account = WatchedAccount::new(identifier, chain_tag.unwrap_or(&self.default_chain))?;

        if self.registry.read().await.contains(&account.identifier) {
            return Err(RegistryError::AlreadyWatched(account.identifier).into());
        }

        self.fetch(&account).await.map_err(WatchError::ProbeFailed)?;

        let mut registry = self.registry.write().await;
        // Re-checked: the probe ran without the lock
        registry.insert(account.clone())?;
        let persist_error = self.persist(&registry);

        tracing::info!("Wallet added: {} ({})", account.identifier, account.chain_tag);
        Ok(WalletChange {
            account,
            persist_error,
        })
    }

    pub async fn remove_wallet(&self, identifier: &str) -> Result<WalletChange, WatchError> {
        let mut registry = self.registry.write().await;
        let account = registry.remove(identifier)?;
        let persist_error = self.persist(&registry);

        tracing::info!("Wallet removed: {}", account.identifier);
        Ok(WalletChange {
            account,
            persist_error,
        })
    }

    /// Copy of the watched accounts in insertion order
    pub async fn list_wallets(&self) -> Vec<WatchedAccount> {
        self.registry.read().await.list().to_vec()
    }

    pub async fn get_wallet(&self, identifier: &str) -> Result<WatchedAccount, WatchError> {
        Ok(self.registry.read().await.get(identifier)?.clone())
    }

    pub async fn wallet_count(&self) -> usize {
        self.registry.read().await.len()
    }

    /// One bounded balance source call
    pub async fn fetch(&self, account: &WatchedAccount) -> Result<Snapshot, SourceError> {
        match tokio::time::timeout(
            self.source_timeout,
            self.source.query(&account.identifier, &account.chain_tag),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout(self.source_timeout.as_secs())),
        }
    }

    /// Evaluate a snapshot against the stored value and record it, atomically.
    ///
    /// `listed` is the copy the snapshot was fetched for. When the stored
    /// account no longer matches it (removed, or re-added on another chain
    /// while the fetch ran) nothing is recorded and `NotFound` is returned.
    pub async fn record_observation(
        &self,
        listed: &WatchedAccount,
        snapshot: &Snapshot,
    ) -> Result<Evaluation, RegistryError> {
        let mut registry = self.registry.write().await;
        let stored = registry.get(&listed.identifier)?;
        let replaced = stored.chain_tag != listed.chain_tag
            || (stored.is_pending() && !listed.is_pending());
        if replaced {
            return Err(RegistryError::NotFound(listed.identifier.clone()));
        }

        let evaluation = evaluate(stored, snapshot);
        registry.update_observed(&listed.identifier, snapshot.primary_value)?;
        Ok(evaluation)
    }

    pub async fn notify(&self, event: &ChangeEvent) -> Result<(), NotifyError> {
        self.notifier.send(&event.render()).await
    }

    /// Fresh balance of one watched wallet; does not touch the stored value
    pub async fn query_one(&self, identifier: &str) -> Result<BalanceQuery, WatchError> {
        let account = self.get_wallet(identifier).await?;
        let snapshot = self.fetch(&account).await?;
        Ok(BalanceQuery {
            account,
            result: Ok(snapshot),
        })
    }

    /// Fresh balances of every watched wallet, failures included per row
    pub async fn query_all(&self) -> Vec<BalanceQuery> {
        let accounts = self.list_wallets().await;
        let mut rows = Vec::with_capacity(accounts.len());
        for account in accounts {
            let result = self.fetch(&account).await;
            if let Err(ref e) = result {
                tracing::warn!("Balance query failed for {}: {}", short_identifier(&account.identifier), e);
            }
            rows.push(BalanceQuery { account, result });
        }
        rows
    }

    fn persist(&self, registry: &WalletRegistry) -> Option<PersistError> {
        let store = self.store.as_ref()?;
        match store.save(registry) {
            Ok(()) => None,
            Err(e) => {
                tracing::error!("Failed to persist wallets to {}: {}", store.path().display(), e);
                Some(e)
            }
        }
    }
}

/// Build the startup registry: stored wallets first, then any seed
/// addresses from config/env that are not already present.
pub fn load_registry(
    store: Option<&RegistryStore>,
    seeds: &[String],
    default_chain: &str,
) -> WalletRegistry {
    let mut registry = match store.map(|s| (s, s.try_recover())) {
        Some((_, RecoveryStatus::Recovered(registry))) => registry,
        Some((s, RecoveryStatus::NoStore)) => {
            tracing::info!("No wallet store at {}, starting empty", s.path().display());
            WalletRegistry::new()
        }
        Some((s, RecoveryStatus::Corrupted(reason))) => {
            tracing::error!(
                "Wallet store {} is unreadable ({}), starting empty",
                s.path().display(),
                reason
            );
            WalletRegistry::new()
        }
        None => WalletRegistry::new(),
    };

    for seed in seeds {
        let account = match WatchedAccount::new(seed, default_chain) {
            Ok(account) => account,
            Err(e) => {
                tracing::warn!("Ignoring configured wallet: {}", e);
                continue;
            }
        };
        if !registry.contains(&account.identifier) {
            tracing::info!("Watching configured wallet {}", account.identifier);
            // contains() was checked just above
            let _ = registry.insert(account);
        }
    }

    registry
}
