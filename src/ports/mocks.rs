use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::Snapshot;
use super::balance_source::{BalanceSource, SourceError};
use super::notifier::{Notifier, NotifyError};

/// Balance source that replays scripted responses per address and records calls
#[derive(Debug, Default, Clone)]
pub struct ScriptedBalanceSource {
    calls: Arc<Mutex<Vec<(String, String)>>>,
    responses: Arc<Mutex<HashMap<String, VecDeque<Result<Snapshot, SourceError>>>>>,
}

impl ScriptedBalanceSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to queue a response for an address
    pub fn with_response(self, address: &str, response: Result<Snapshot, SourceError>) -> Self {
        self.push(address, response);
        self
    }

    /// Builder method to queue a plain balance for an address
    pub fn with_balance(self, address: &str, value: Decimal) -> Self {
        self.with_response(address, Ok(Snapshot::new(value)))
    }

    /// Queue a response after construction
    pub fn push(&self, address: &str, response: Result<Snapshot, SourceError>) {
        self.responses
            .lock()
            .unwrap()
            .entry(address.to_ascii_lowercase())
            .or_default()
            .push_back(response);
    }

    /// Get all recorded `(address, chain)` calls
    pub fn get_calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BalanceSource for ScriptedBalanceSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn query(&self, identifier: &str, chain_tag: &str) -> Result<Snapshot, SourceError> {
        self.calls
            .lock()
            .unwrap()
            .push((identifier.to_string(), chain_tag.to_string()));
        self.responses
            .lock()
            .unwrap()
            .get_mut(&identifier.to_ascii_lowercase())
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| Err(SourceError::Unavailable("No response configured".to_string())))
    }
}

/// Notifier that keeps every message it was asked to send
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every send fails (messages are still recorded)
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(text.to_string());
        if self.fail {
            return Err(NotifyError::Transport("simulated outage".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const ADDR: &str = "0xabcdef0123456789abcdef0123456789abcdef01";

    #[test]
    fn test_scripted_source_replays_in_order() {
        let source = ScriptedBalanceSource::new()
            .with_balance(ADDR, dec!(1))
            .with_response(ADDR, Err(SourceError::Timeout(5)));

        tokio_test::block_on(async {
            assert_eq!(source.query(ADDR, "eth").await.unwrap().primary_value, dec!(1));
            assert_eq!(source.query(ADDR, "eth").await, Err(SourceError::Timeout(5)));
            assert!(matches!(
                source.query(ADDR, "eth").await,
                Err(SourceError::Unavailable(_))
            ));
        });

        assert_eq!(source.get_calls().len(), 3);
        assert_eq!(source.get_calls()[0], (ADDR.to_string(), "eth".to_string()));
    }

    #[tokio::test]
    async fn test_recording_notifier() {
        let ok = RecordingNotifier::new();
        assert!(ok.send("hello").await.is_ok());
        assert_eq!(ok.messages(), vec!["hello".to_string()]);

        let broken = RecordingNotifier::failing();
        assert!(broken.send("lost").await.is_err());
        assert_eq!(broken.messages().len(), 1);
    }
}
