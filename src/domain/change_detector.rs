//! Change Detector
//!
//! Decides whether a fresh snapshot represents a real balance change for an
//! account and, if so, builds the event that gets sent to the subscriber.
//!
//! Comparison is exact `Decimal` equality on the snapshot's primary value.
//! The caller is expected to record the new value after every evaluation,
//! whatever the outcome.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::account::WatchedAccount;
use super::format::{format_timestamp, short_identifier};
use super::snapshot::Snapshot;

/// Decimal places kept for the relative delta
pub const RELATIVE_DELTA_DECIMALS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Increased,
    Decreased,
}

impl Direction {
    pub fn glyph(&self) -> &'static str {
        match self {
            Direction::Increased => "📈",
            Direction::Decreased => "📉",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Direction::Increased => "Increased",
            Direction::Decreased => "Decreased",
        }
    }
}

/// A detected balance change
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub identifier: String,
    pub chain_tag: String,
    pub previous: Decimal,
    pub current: Decimal,
    pub direction: Direction,
    pub absolute_delta: Decimal,
    /// `None` when the previous value was zero
    pub relative_delta_pct: Option<Decimal>,
    pub usd_value: Option<Decimal>,
    pub asset_count: Option<usize>,
    pub timestamp: DateTime<Utc>,
}

/// Outcome of comparing a snapshot with the stored value
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// First successful observation, nothing to compare against
    Initial(Decimal),
    NoChange,
    Changed(ChangeEvent),
}

impl Evaluation {
    pub fn change(&self) -> Option<&ChangeEvent> {
        match self {
            Evaluation::Changed(event) => Some(event),
            _ => None,
        }
    }
}

/// Evaluate using the current wall-clock time
pub fn evaluate(account: &WatchedAccount, snapshot: &Snapshot) -> Evaluation {
    evaluate_at(account, snapshot, Utc::now())
}

pub fn evaluate_at(account: &WatchedAccount, snapshot: &Snapshot, at: DateTime<Utc>) -> Evaluation {
    let current = snapshot.primary_value;

    let previous = match account.last_observed_value {
        None => return Evaluation::Initial(current),
        Some(previous) => previous,
    };

    if previous == current {
        return Evaluation::NoChange;
    }

    let direction = if current > previous {
        Direction::Increased
    } else {
        Direction::Decreased
    };
    let absolute_delta = (current - previous).abs();

    Evaluation::Changed(ChangeEvent {
        identifier: account.identifier.clone(),
        chain_tag: account.chain_tag.clone(),
        previous,
        current,
        direction,
        absolute_delta,
        relative_delta_pct: relative_delta_pct(absolute_delta, previous),
        usd_value: snapshot.usd_value,
        asset_count: snapshot.asset_count,
        timestamp: at,
    })
}

/// `delta / previous * 100`, rounded. Undefined for a zero previous value.
pub fn relative_delta_pct(absolute_delta: Decimal, previous: Decimal) -> Option<Decimal> {
    if previous.is_zero() {
        return None;
    }
    absolute_delta
        .checked_div(previous)?
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|pct| {
            pct.round_dp_with_strategy(RELATIVE_DELTA_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
        })
}

impl ChangeEvent {
    /// Notification text sent to the subscriber
    pub fn render(&self) -> String {
        let mut msg = format!(
            "{} {} - Wallet balance changed!\n\
             Blockchain: {}\n\
             Address: {}\n\
             Previous: {}\n\
             Current: {}\n",
            self.direction.glyph(),
            self.direction.label(),
            self.chain_tag.to_uppercase(),
            short_identifier(&self.identifier),
            self.previous,
            self.current,
        );

        let sign = match self.direction {
            Direction::Increased => "+",
            Direction::Decreased => "-",
        };
        match self.relative_delta_pct {
            Some(pct) => msg.push_str(&format!("Change: {}{} ({}{}%)\n", sign, self.absolute_delta, sign, pct)),
            None => msg.push_str(&format!("Change: {}{}\n", sign, self.absolute_delta)),
        }

        if let Some(usd) = self.usd_value {
            msg.push_str(&format!("USD Value: ${}\n", usd));
        }
        if let Some(count) = self.asset_count {
            msg.push_str(&format!("Total Assets: {}\n", count));
        }
        msg.push_str(&format!("Timestamp: {}", format_timestamp(self.timestamp)));
        msg
    }
}
