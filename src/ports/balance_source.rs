//! Balance source port
//!
//! Anything that can turn `(address, chain)` into a [`Snapshot`].

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Snapshot;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SourceError {
    /// The source rejected the address itself
    #[error("Invalid or unsupported address: {0}")]
    InvalidAddress(String),

    #[error("Unsupported chain: {0}")]
    UnsupportedChain(String),

    /// Network failure, 5xx, rate limit, process crash...
    #[error("Balance source unavailable: {0}")]
    Unavailable(String),

    #[error("Balance source timed out after {0}s")]
    Timeout(u64),

    /// The source answered but the payload made no sense
    #[error("Malformed balance response: {0}")]
    Malformed(String),
}

impl SourceError {
    /// Transient errors are retried by the next pass; the rest are the
    /// address's (or config's) fault
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SourceError::Unavailable(_) | SourceError::Timeout(_) | SourceError::Malformed(_)
        )
    }
}

#[async_trait]
pub trait BalanceSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Read the current balance of one wallet
    async fn query(&self, identifier: &str, chain_tag: &str) -> Result<Snapshot, SourceError>;
}
