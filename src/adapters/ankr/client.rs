//! Ankr API Client
//!
//! HTTP client for the Ankr Advanced API (multichain JSON-RPC endpoint).

use std::time::Duration;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::domain::{ComparisonMetric, Snapshot};
use crate::ports::{BalanceSource, SourceError};
use super::types::{AccountBalance, RpcRequest, RpcResponse};

/// Ankr client configuration
#[derive(Debug, Clone)]
pub struct AnkrConfig {
    /// Multichain endpoint
    pub api_url: String,
    /// Appended to the endpoint path when set
    pub api_key: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Which value the snapshot reports as primary
    pub metric: ComparisonMetric,
}

impl Default for AnkrConfig {
    fn default() -> Self {
        Self {
            api_url: "https://rpc.ankr.com/multichain".to_string(),
            api_key: None,
            timeout: Duration::from_secs(15),
            metric: ComparisonMetric::Native,
        }
    }
}

impl AnkrConfig {
    /// Full endpoint URL including the API key segment
    pub fn endpoint(&self) -> String {
        let base = self.api_url.trim_end_matches('/');
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => format!("{}/{}", base, key),
            _ => base.to_string(),
        }
    }
}

/// Ankr balance source
#[derive(Debug, Clone)]
pub struct AnkrClient {
    config: AnkrConfig,
    http: Client,
}

impl AnkrClient {
    /// Create a new Ankr client with default configuration
    pub fn new() -> Result<Self, SourceError> {
        Self::with_config(AnkrConfig::default())
    }

    /// Create a new Ankr client with custom configuration
    pub fn with_config(config: AnkrConfig) -> Result<Self, SourceError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SourceError::Unavailable(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    pub fn metric(&self) -> ComparisonMetric {
        self.config.metric
    }

    /// Raw `ankr_getAccountBalance` call
    pub async fn get_account_balance(
        &self,
        wallet_address: &str,
        blockchain: &str,
    ) -> Result<AccountBalance, SourceError> {
        let request = RpcRequest::account_balance(wallet_address, blockchain);

        let response = self
            .http
            .post(self.config.endpoint())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(SourceError::Unavailable(format!("Ankr returned HTTP {}", status)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Unavailable(format!("Ankr returned HTTP {}: {}", status, body)));
        }

        let body: RpcResponse<AccountBalance> = response
            .json()
            .await
            .map_err(|e| SourceError::Malformed(e.to_string()))?;

        if let Some(error) = body.error {
            return Err(error.classify(wallet_address, blockchain));
        }

        body.result
            .ok_or_else(|| SourceError::Malformed("response has neither result nor error".to_string()))
    }

    fn map_transport_error(&self, err: reqwest::Error) -> SourceError {
        if err.is_timeout() {
            SourceError::Timeout(self.config.timeout.as_secs())
        } else {
            SourceError::Unavailable(err.to_string())
        }
    }
}

#[async_trait]
impl BalanceSource for AnkrClient {
    fn name(&self) -> &str {
        "ankr"
    }

    async fn query(&self, identifier: &str, chain_tag: &str) -> Result<Snapshot, SourceError> {
        let balance = self.get_account_balance(identifier, chain_tag).await?;
        tracing::debug!(
            "Ankr: {} on {} holds {} asset(s)",
            identifier,
            chain_tag,
            balance.assets.len()
        );
        balance.into_snapshot(self.config.metric)
    }
}
