//! Configuration Module
//!
//! Loads and validates configuration from TOML files, with environment
//! variable overrides for secrets.

pub mod loader;

pub use loader::{
    Config, ConfigError, LoggingSection, MonitorSection, SourceKind, SourceSection,
    TelegramSection, load_config, load_config_or_default,
};
