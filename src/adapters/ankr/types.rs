//! Ankr Advanced API wire types
//!
//! Only `ankr_getAccountBalance` is used.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::{round_usd, ComparisonMetric, Snapshot};
use crate::ports::SourceError;

pub const GET_ACCOUNT_BALANCE: &str = "ankr_getAccountBalance";

#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: AccountBalanceParams<'a>,
    pub id: u64,
}

impl<'a> RpcRequest<'a> {
    pub fn account_balance(wallet_address: &'a str, blockchain: &'a str) -> Self {
        Self {
            jsonrpc: "2.0",
            method: GET_ACCOUNT_BALANCE,
            params: AccountBalanceParams {
                blockchain,
                wallet_address,
            },
            id: 1,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountBalanceParams<'a> {
    pub blockchain: &'a str,
    pub wallet_address: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct RpcResponse<T> {
    pub result: Option<T>,
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    #[serde(default)]
    pub code: i64,
    pub message: String,
}

impl RpcError {
    /// Sort a JSON-RPC error into permanent vs transient
    pub fn classify(&self, wallet_address: &str, blockchain: &str) -> SourceError {
        let msg = self.message.to_ascii_lowercase();

        if msg.contains("blockchain")
            && (msg.contains("unsupported") || msg.contains("not supported") || msg.contains("invalid"))
        {
            return SourceError::UnsupportedChain(format!("{}: {}", blockchain, self.message));
        }

        if (msg.contains("address") || msg.contains("wallet"))
            && (msg.contains("invalid") || msg.contains("unsupported") || msg.contains("not supported"))
        {
            return SourceError::InvalidAddress(format!("{}: {}", wallet_address, self.message));
        }

        SourceError::Unavailable(format!("RPC error {}: {}", self.code, self.message))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountBalance {
    #[serde(default)]
    pub total_balance_usd: Option<String>,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    #[serde(default)]
    pub contract_address: Option<String>,
    #[serde(default)]
    pub balance: Option<String>,
}

impl AccountBalance {
    /// Native coin balance: the asset without a contract address, falling
    /// back to the first asset, or zero for an empty wallet
    pub fn native_balance(&self) -> Result<Decimal, SourceError> {
        let asset = self
            .assets
            .iter()
            .find(|a| a.contract_address.is_none())
            .or_else(|| self.assets.first());

        match asset.and_then(|a| a.balance.as_deref()) {
            Some(raw) => parse_decimal(raw),
            None => Ok(Decimal::ZERO),
        }
    }

    /// Portfolio total in USD, `None` when the API omits it
    pub fn total_usd(&self) -> Result<Option<Decimal>, SourceError> {
        match self.total_balance_usd.as_deref() {
            Some(raw) if !raw.trim().is_empty() => parse_decimal(raw).map(|v| Some(round_usd(v))),
            _ => Ok(None),
        }
    }

    pub fn into_snapshot(self, metric: ComparisonMetric) -> Result<Snapshot, SourceError> {
        let usd = self.total_usd()?;
        let primary = match metric {
            ComparisonMetric::Native => self.native_balance()?,
            // A missing total must not be compared as zero
            ComparisonMetric::UsdAggregate => usd.ok_or_else(|| {
                SourceError::Malformed("response has no totalBalanceUsd".to_string())
            })?,
        };

        let mut snapshot = Snapshot::new(primary).with_asset_count(self.assets.len());
        if let Some(usd) = usd {
            snapshot = snapshot.with_usd(usd);
        }
        Ok(snapshot)
    }
}

/// Parse a decimal string, accepting scientific notation
pub fn parse_decimal(raw: &str) -> Result<Decimal, SourceError> {
    let trimmed = raw.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|e| SourceError::Malformed(format!("'{}' is not a number: {}", raw, e)))
}
