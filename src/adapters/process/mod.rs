//! External Valuation Process Adapter
//!
//! Runs `<command> <args...> <address>` and reads the wallet's total USD
//! value from the first line of stdout (e.g. `$12,345.67`). Used with
//! portfolio scrapers that value a wallet across every chain at once, so the
//! chain tag is not passed along.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::process::Stdio;
use std::str::FromStr;
use std::time::Duration;
use tokio::process::Command;

use crate::domain::{round_usd, Snapshot};
use crate::ports::{BalanceSource, SourceError};

#[derive(Debug, Clone)]
pub struct ProcessConfig {
    pub command: String,
    pub args: Vec<String>,
    /// The child is killed when this elapses
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ProcessBalanceSource {
    config: ProcessConfig,
}

impl ProcessBalanceSource {
    pub fn new(config: ProcessConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl BalanceSource for ProcessBalanceSource {
    fn name(&self) -> &str {
        "process"
    }

    async fn query(&self, identifier: &str, _chain_tag: &str) -> Result<Snapshot, SourceError> {
        let child = Command::new(&self.config.command)
            .args(&self.config.args)
            .arg(identifier)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.config.timeout, child)
            .await
            .map_err(|_| SourceError::Timeout(self.config.timeout.as_secs()))?
            .map_err(|e| {
                SourceError::Unavailable(format!("failed to run '{}': {}", self.config.command, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SourceError::Unavailable(format!(
                "'{}' exited with {}: {}",
                self.config.command,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let usd = parse_usd_line(&stdout)?;
        Ok(Snapshot::new(usd).with_usd(usd))
    }
}

/// First non-empty line, first token, `$` and thousands separators removed
pub fn parse_usd_line(stdout: &str) -> Result<Decimal, SourceError> {
    let token = stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .and_then(|line| line.split_whitespace().next())
        .ok_or_else(|| SourceError::Malformed("valuation program printed nothing".to_string()))?;

    let cleaned: String = token.chars().filter(|c| *c != '$' && *c != ',').collect();

    Decimal::from_str(&cleaned)
        .map(round_usd)
        .map_err(|e| SourceError::Malformed(format!("'{}' is not a USD amount: {}", token, e)))
}
