//! Watched Account
//!
//! A single EVM wallet under observation plus the address/chain grammar
//! used to normalize user input before it reaches the registry.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::registry::RegistryError;

/// Length of the hex body of an EVM address (20 bytes)
pub const ADDRESS_HEX_LEN: usize = 40;

/// Required address prefix
pub const ADDRESS_PREFIX: &str = "0x";

/// One monitored wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchedAccount {
    /// Normalized (lower-case) address
    pub identifier: String,
    /// Source partition, e.g. "eth", "bsc", "polygon"
    pub chain_tag: String,
    /// Last value recorded by a successful observation, `None` while pending
    pub last_observed_value: Option<Decimal>,
}

impl WatchedAccount {
    /// Create a pending account. Both inputs are validated and normalized.
    pub fn new(identifier: &str, chain_tag: &str) -> Result<Self, RegistryError> {
        Ok(Self {
            identifier: normalize_identifier(identifier)?,
            chain_tag: normalize_chain_tag(chain_tag)?,
            last_observed_value: None,
        })
    }

    /// Attach a previously observed value (used when restoring from disk)
    pub fn with_observed(mut self, value: Option<Decimal>) -> Self {
        self.last_observed_value = value;
        self
    }

    /// True until the first successful observation
    pub fn is_pending(&self) -> bool {
        self.last_observed_value.is_none()
    }
}

/// Trim, lower-case and validate an EVM address (`0x` + 40 hex chars)
pub fn normalize_identifier(raw: &str) -> Result<String, RegistryError> {
    let candidate = raw.trim().to_ascii_lowercase();

    let body = candidate
        .strip_prefix(ADDRESS_PREFIX)
        .ok_or_else(|| RegistryError::InvalidIdentifier(raw.trim().to_string()))?;

    if body.len() != ADDRESS_HEX_LEN || !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(RegistryError::InvalidIdentifier(raw.trim().to_string()));
    }

    Ok(candidate)
}

/// Trim, lower-case and validate a chain tag
pub fn normalize_chain_tag(raw: &str) -> Result<String, RegistryError> {
    let tag = raw.trim().to_ascii_lowercase();

    let well_formed = !tag.is_empty()
        && tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if !well_formed {
        return Err(RegistryError::InvalidChain(raw.trim().to_string()));
    }

    Ok(tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const MIXED: &str = "0xABCDEF0123456789abcdef0123456789ABCDEF01";

    #[test]
    fn test_normalize_lowercases_and_trims() {
        let id = normalize_identifier(&format!("  {}\n", MIXED)).unwrap();
        assert_eq!(id, "0xabcdef0123456789abcdef0123456789abcdef01");
    }

    #[test]
    fn test_uppercase_prefix_accepted() {
        let raw = MIXED.replacen("0x", "0X", 1);
        assert!(normalize_identifier(&raw).is_ok());
    }

    #[test]
    fn test_rejects_bad_addresses() {
        // missing prefix
        assert!(normalize_identifier("abcdef0123456789abcdef0123456789abcdef01").is_err());
        // too short
        assert!(normalize_identifier("0xabcdef").is_err());
        // too long
        assert!(normalize_identifier(&format!("{}0", MIXED)).is_err());
        // non-hex
        assert!(normalize_identifier("0xzzcdef0123456789abcdef0123456789abcdef01").is_err());
        assert!(matches!(
            normalize_identifier(""),
            Err(RegistryError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_chain_tag_grammar() {
        assert_eq!(normalize_chain_tag(" ETH ").unwrap(), "eth");
        assert_eq!(normalize_chain_tag("polygon_zkevm").unwrap(), "polygon_zkevm");
        assert!(matches!(normalize_chain_tag(""), Err(RegistryError::InvalidChain(_))));
        assert!(normalize_chain_tag("eth mainnet").is_err());
    }

    #[test]
    fn test_new_account_is_pending() {
        let account = WatchedAccount::new(MIXED, "eth").unwrap();
        assert!(account.is_pending());

        let restored = account.with_observed(Some(dec!(1.5)));
        assert!(!restored.is_pending());
        assert_eq!(restored.last_observed_value, Some(dec!(1.5)));
    }
}
