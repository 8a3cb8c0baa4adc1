//! Balance Snapshot
//!
//! One point-in-time read of a wallet, and the metric that decides which
//! number in it is compared between passes.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Decimal places kept for USD aggregate values
pub const USD_DECIMALS: u32 = 2;

/// Which value is compared between observations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMetric {
    /// Native coin balance as reported by the source (ETH, BNB, ...)
    #[default]
    Native,
    /// Total portfolio value in USD, rounded to cents
    UsdAggregate,
}

impl ComparisonMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonMetric::Native => "native",
            ComparisonMetric::UsdAggregate => "usd_aggregate",
        }
    }
}

impl std::fmt::Display for ComparisonMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one balance source call
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// The compared value
    pub primary_value: Decimal,
    /// Total USD value, when the source knows it
    pub usd_value: Option<Decimal>,
    /// Number of distinct assets held (display only)
    pub asset_count: Option<usize>,
}

impl Snapshot {
    pub fn new(primary_value: Decimal) -> Self {
        Self {
            primary_value,
            usd_value: None,
            asset_count: None,
        }
    }

    pub fn with_usd(mut self, usd_value: Decimal) -> Self {
        self.usd_value = Some(usd_value);
        self
    }

    pub fn with_asset_count(mut self, count: usize) -> Self {
        self.asset_count = Some(count);
        self
    }
}

/// Round a USD amount to cents, midpoint away from zero
pub fn round_usd(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(USD_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_usd() {
        assert_eq!(round_usd(dec!(10.005)), dec!(10.01));
        assert_eq!(round_usd(dec!(10.004)), dec!(10.00));
        assert_eq!(round_usd(dec!(3)), dec!(3));
    }

    #[test]
    fn test_metric_serde_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            metric: ComparisonMetric,
        }

        let w: Wrapper = toml::from_str(r#"metric = "usd_aggregate""#).unwrap();
        assert_eq!(w.metric, ComparisonMetric::UsdAggregate);
        assert_eq!(ComparisonMetric::default().to_string(), "native");
    }

    #[test]
    fn test_snapshot_builders() {
        let snap = Snapshot::new(dec!(1.5)).with_usd(dec!(4200.10)).with_asset_count(3);
        assert_eq!(snap.primary_value, dec!(1.5));
        assert_eq!(snap.usd_value, Some(dec!(4200.10)));
        assert_eq!(snap.asset_count, Some(3));
    }
}
