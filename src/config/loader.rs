//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching sentinel.toml
//! structure. Every section and key is optional; secrets usually come from
//! the environment (see [`Config::apply_env_overrides`]).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::adapters::ankr::AnkrConfig;
use crate::adapters::process::ProcessConfig;
use crate::domain::{normalize_chain_tag, normalize_identifier, ComparisonMetric};

/// Main configuration structure matching sentinel.toml
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub monitor: MonitorSection,
    pub source: SourceSection,
    pub telegram: TelegramSection,
    pub logging: LoggingSection,
}

/// Monitoring loop configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorSection {
    /// Seconds between passes
    pub interval_secs: u64,
    /// Upper bound on one balance source call
    pub source_timeout_secs: u64,
    /// Chain used when /addwallet omits one
    pub default_chain: String,
    /// "native" or "usd_aggregate"
    pub comparison_metric: ComparisonMetric,
    /// Wallet store file; no persistence when unset
    pub store_path: Option<String>,
    /// Wallets watched from startup
    pub wallets: Vec<String>,
}

impl Default for MonitorSection {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            source_timeout_secs: 20,
            default_chain: "eth".to_string(),
            comparison_metric: ComparisonMetric::Native,
            store_path: None,
            wallets: Vec::new(),
        }
    }
}

impl MonitorSection {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source_timeout_secs)
    }

    /// Store path with `~` expanded
    pub fn store_path(&self) -> Option<PathBuf> {
        self.store_path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| PathBuf::from(shellexpand::tilde(p).into_owned()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Ankr,
    Process,
}

/// Balance source configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceSection {
    pub kind: SourceKind,
    /// Ankr multichain endpoint
    pub ankr_url: String,
    /// Optional Ankr API key (appended to the URL path)
    pub ankr_api_key: Option<String>,
    /// HTTP request timeout
    pub request_timeout_secs: u64,
    /// Valuation program for the "process" kind
    pub command: Option<String>,
    /// Arguments placed before the wallet address
    pub args: Vec<String>,
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            kind: SourceKind::Ankr,
            ankr_url: "https://rpc.ankr.com/multichain".to_string(),
            ankr_api_key: None,
            request_timeout_secs: 15,
            command: None,
            args: Vec::new(),
        }
    }
}

/// Telegram configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelegramSection {
    /// Bot token (prefer TELEGRAM_BOT_TOKEN)
    pub bot_token: String,
    /// Chat that receives change notifications
    pub chat_id: String,
    pub api_url: String,
    /// getUpdates long-poll timeout
    pub poll_timeout_secs: u64,
}

impl Default for TelegramSection {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            api_url: "https://api.telegram.org".to_string(),
            poll_timeout_secs: 30,
        }
    }
}

impl TelegramSection {
    /// Bot token and chat id, both required to run the bot
    pub fn credentials(&self) -> Result<(&str, &str), ConfigError> {
        if self.bot_token.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "telegram bot_token is not set (TELEGRAM_BOT_TOKEN)".to_string(),
            ));
        }
        if self.chat_id.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "telegram chat_id is not set (TELEGRAM_CHAT_ID)".to_string(),
            ));
        }
        Ok((self.bot_token.trim(), self.chat_id.trim()))
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file, apply environment overrides, validate
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config: Config = toml::from_str(&content)?;
    config.apply_env_overrides(|name| std::env::var(name).ok());
    config.validate()?;
    Ok(config)
}

/// Like [`load_config`], but a missing file means defaults plus environment
pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    if path.exists() {
        return load_config(path);
    }

    let mut config = Config::default();
    config.apply_env_overrides(|name| std::env::var(name).ok());
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Environment variables take precedence over file values.
    /// `EVM_ADDRESS` adds one more startup wallet.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(token) = get("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = token;
        }
        if let Some(chat_id) = get("TELEGRAM_CHAT_ID") {
            self.telegram.chat_id = chat_id;
        }
        if let Some(chain) = get("BLOCKCHAIN_ID") {
            self.monitor.default_chain = chain;
        }
        if let Some(key) = get("ANKR_API_KEY") {
            self.source.ankr_api_key = Some(key);
        }
        if let Some(raw) = get("EVM_ADDRESS") {
            match normalize_identifier(&raw) {
                Ok(address) => {
                    let known = self
                        .monitor
                        .wallets
                        .iter()
                        .any(|w| w.trim().eq_ignore_ascii_case(&address));
                    if !known {
                        self.monitor.wallets.push(address);
                    }
                }
                Err(e) => tracing::warn!("Ignoring EVM_ADDRESS: {}", e),
            }
        }
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate monitor section
        if self.monitor.interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "interval_secs must be > 0".to_string(),
            ));
        }

        if self.monitor.source_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "source_timeout_secs must be > 0".to_string(),
            ));
        }

        normalize_chain_tag(&self.monitor.default_chain).map_err(|e| {
            ConfigError::ValidationError(format!("default_chain: {}", e))
        })?;

        for wallet in &self.monitor.wallets {
            normalize_identifier(wallet)
                .map_err(|e| ConfigError::ValidationError(format!("wallets: {}", e)))?;
        }

        // Validate source section
        if self.source.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_secs must be > 0".to_string(),
            ));
        }

        match self.source.kind {
            SourceKind::Ankr => {
                if self.source.ankr_url.trim().is_empty() {
                    return Err(ConfigError::ValidationError(
                        "ankr_url cannot be empty".to_string(),
                    ));
                }
            }
            SourceKind::Process => {
                let has_command = self
                    .source
                    .command
                    .as_deref()
                    .is_some_and(|c| !c.trim().is_empty());
                if !has_command {
                    return Err(ConfigError::ValidationError(
                        "source kind \"process\" requires a command".to_string(),
                    ));
                }
                if self.monitor.comparison_metric != ComparisonMetric::UsdAggregate {
                    return Err(ConfigError::ValidationError(
                        "source kind \"process\" only reports usd_aggregate".to_string(),
                    ));
                }
            }
        }

        // Validate Telegram
        if self.telegram.api_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "telegram api_url cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

impl From<&Config> for AnkrConfig {
    fn from(config: &Config) -> Self {
        AnkrConfig {
            api_url: config.source.ankr_url.clone(),
            api_key: config.source.ankr_api_key.clone(),
            timeout: Duration::from_secs(config.source.request_timeout_secs),
            metric: config.monitor.comparison_metric,
        }
    }
}

impl From<&Config> for ProcessConfig {
    fn from(config: &Config) -> Self {
        ProcessConfig {
            command: config.source.command.clone().unwrap_or_default(),
            args: config.source.args.clone(),
            timeout: config.monitor.source_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const ADDR: &str = "0xabcdef0123456789abcdef0123456789abcdef01";

    fn create_valid_config() -> String {
        format!(
            r#"
[monitor]
interval_secs = 60
source_timeout_secs = 10
default_chain = "bsc"
comparison_metric = "usd_aggregate"
store_path = "~/.sentinel/wallets.json"
wallets = ["{ADDR}"]

[source]
kind = "ankr"
ankr_url = "https://rpc.ankr.com/multichain"
request_timeout_secs = 8

[telegram]
bot_token = "123:abc"
chat_id = "-100123"

[logging]
level = "debug"
"#
        )
    }

    fn parse(toml_str: &str) -> Config {
        toml::from_str(toml_str).unwrap()
    }

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let file = write_temp(&create_valid_config());
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.monitor.interval(), Duration::from_secs(60));
        assert_eq!(config.monitor.default_chain, "bsc");
        assert_eq!(config.monitor.comparison_metric, ComparisonMetric::UsdAggregate);
        assert_eq!(config.source.kind, SourceKind::Ankr);
        assert_eq!(config.logging.level, "debug");
        assert!(config.monitor.wallets.iter().any(|w| w == ADDR));
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/nonexistent/path/sentinel.toml");
        assert!(matches!(result.unwrap_err(), ConfigError::IoError(_)));
    }

    #[test]
    fn test_invalid_toml() {
        let file = write_temp("[monitor\ninterval_secs = ");
        assert!(matches!(load_config(file.path()), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = parse("");
        assert_eq!(config.monitor.interval_secs, 30);
        assert_eq!(config.monitor.source_timeout_secs, 20);
        assert_eq!(config.monitor.default_chain, "eth");
        assert_eq!(config.monitor.comparison_metric, ComparisonMetric::Native);
        assert_eq!(config.source.ankr_url, "https://rpc.ankr.com/multichain");
        assert_eq!(config.telegram.api_url, "https://api.telegram.org");
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_interval() {
        let config = parse("[monitor]\ninterval_secs = 0\n");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("interval_secs"));
    }

    #[test]
    fn test_invalid_wallet() {
        let config = parse("[monitor]\nwallets = [\"0x1234\"]\n");
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_invalid_default_chain() {
        let config = parse("[monitor]\ndefault_chain = \"eth mainnet\"\n");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_process_source_requirements() {
        let no_command = parse("[source]\nkind = \"process\"\n[monitor]\ncomparison_metric = \"usd_aggregate\"\n");
        assert!(no_command.validate().unwrap_err().to_string().contains("command"));

        let native = parse("[source]\nkind = \"process\"\ncommand = \"python3\"\n");
        assert!(native.validate().unwrap_err().to_string().contains("usd_aggregate"));

        let ok = parse(
            "[source]\nkind = \"process\"\ncommand = \"python3\"\nargs = [\"fetch_balance.py\"]\n\
             [monitor]\ncomparison_metric = \"usd_aggregate\"\nsource_timeout_secs = 45\n",
        );
        assert!(ok.validate().is_ok());

        let process = ProcessConfig::from(&ok);
        assert_eq!(process.command, "python3");
        assert_eq!(process.args, vec!["fetch_balance.py".to_string()]);
        assert_eq!(process.timeout, Duration::from_secs(45));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("TELEGRAM_BOT_TOKEN", "999:env"),
            ("TELEGRAM_CHAT_ID", "42"),
            ("BLOCKCHAIN_ID", "polygon"),
            ("ANKR_API_KEY", " key "),
            ("EVM_ADDRESS", "0x1111111111111111111111111111111111111111"),
        ]);
        let mut config = parse(&create_valid_config());
        config.apply_env_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.telegram.credentials().unwrap(), ("999:env", "42"));
        assert_eq!(config.monitor.default_chain, "polygon");
        assert_eq!(config.source.ankr_api_key.as_deref(), Some("key"));
        assert_eq!(config.monitor.wallets.len(), 2);
    }

    #[test]
    fn test_env_address_not_duplicated() {
        let mut config = parse(&create_valid_config());
        let upper = ADDR.to_uppercase().replace("0X", "0x");
        config.apply_env_overrides(|name| (name == "EVM_ADDRESS").then(|| upper.clone()));
        assert_eq!(config.monitor.wallets.len(), 1);
    }

    #[test]
    fn test_placeholder_env_address_ignored() {
        let mut config = Config::default();
        config.apply_env_overrides(|name| {
            (name == "EVM_ADDRESS").then(|| "YOUR_EVM_ADDRESS".to_string())
        });
        assert!(config.monitor.wallets.is_empty());
        assert!(config.validate().is_ok());

        let mut config = parse(&create_valid_config());
        config.apply_env_overrides(|name| (name == "EVM_ADDRESS").then(|| "0x123".to_string()));
        assert_eq!(config.monitor.wallets, vec![ADDR.to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_env_values_ignored() {
        let mut config = parse(&create_valid_config());
        config.apply_env_overrides(|_| Some("   ".to_string()));
        assert_eq!(config.telegram.bot_token, "123:abc");
        assert_eq!(config.monitor.default_chain, "bsc");
    }

    #[test]
    fn test_missing_credentials() {
        let config = parse("");
        assert!(config.telegram.credentials().is_err());
    }

    #[test]
    fn test_store_path_expands_tilde() {
        let config = parse(&create_valid_config());
        let path = config.monitor.store_path().unwrap();
        assert!(!path.to_string_lossy().starts_with('~'));
        assert!(path.ends_with(".sentinel/wallets.json"));

        assert!(parse("").monitor.store_path().is_none());
    }

    #[test]
    fn test_config_to_ankr_config() {
        let config = parse(&create_valid_config());
        let ankr = AnkrConfig::from(&config);
        assert_eq!(ankr.timeout, Duration::from_secs(8));
        assert_eq!(ankr.metric, ComparisonMetric::UsdAggregate);
        assert_eq!(ankr.endpoint(), "https://rpc.ankr.com/multichain");
    }
}
