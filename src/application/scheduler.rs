//! Watch Scheduler
//!
//! Drives one pass over every watched wallet at a fixed period. Passes never
//! overlap: a tick or on-demand trigger that arrives while a pass is in
//! flight is skipped, not queued.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::MissedTickBehavior;

use crate::domain::{short_identifier, Evaluation, WatchedAccount};
use super::watcher::WalletWatcher;

/// Default time between passes
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

/// Tally of one pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub checked: usize,
    pub initial: usize,
    pub unchanged: usize,
    pub changed: usize,
    pub notify_failures: usize,
    pub source_failures: usize,
    /// Removed while the pass was running
    pub skipped: usize,
}

/// Periodic balance check loop
pub struct Scheduler {
    watcher: Arc<WalletWatcher>,
    interval: Duration,
    is_running: Arc<RwLock<bool>>,
    state: Arc<RwLock<SchedulerState>>,
    pass_guard: Arc<Mutex<()>>,
}

impl Scheduler {
    pub fn new(watcher: Arc<WalletWatcher>) -> Self {
        Self {
            watcher,
            interval: DEFAULT_INTERVAL,
            is_running: Arc::new(RwLock::new(false)),
            state: Arc::new(RwLock::new(SchedulerState::Idle)),
            pass_guard: Arc::new(Mutex::new(())),
        }
    }

    /// Set custom pass interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run passes until `stop` is called. The first pass starts immediately.
    pub async fn run(&self) {
        *self.is_running.write().await = true;

        tracing::info!(
            "Starting balance scheduler - {} wallet(s), interval {:?}, source {}",
            self.watcher.wallet_count().await,
            self.interval,
            self.watcher.source_name()
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while *self.is_running.read().await {
            ticker.tick().await;
            if !*self.is_running.read().await {
                break;
            }

            match self.run_pass().await {
                Some(report) => tracing::info!(
                    "Pass complete: {} checked, {} changed, {} initial, {} source failure(s), {} notify failure(s)",
                    report.checked,
                    report.changed,
                    report.initial,
                    report.source_failures,
                    report.notify_failures
                ),
                None => tracing::debug!("Previous pass still running, tick skipped"),
            }
        }

        tracing::info!("Balance scheduler stopped");
    }

    /// Stop the loop after the current tick
    pub async fn stop(&self) {
        *self.is_running.write().await = false;
        tracing::info!("Stop signal sent to scheduler");
    }

    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    pub async fn state(&self) -> SchedulerState {
        *self.state.read().await
    }

    /// One full pass. `None` if another pass holds the guard.
    pub async fn run_pass(&self) -> Option<PassReport> {
        let _guard = self.pass_guard.try_lock().ok()?;
        *self.state.write().await = SchedulerState::Running;

        let accounts = self.watcher.list_wallets().await;
        if accounts.is_empty() {
            tracing::info!("No wallets to monitor. Add wallets with /addwallet <address>");
        }

        let mut report = PassReport::default();
        for account in &accounts {
            self.check_account(account, &mut report).await;
        }

        *self.state.write().await = SchedulerState::Idle;
        Some(report)
    }

    async fn check_account(&self, account: &WatchedAccount, report: &mut PassReport) {
        report.checked += 1;
        let short = short_identifier(&account.identifier);

        let snapshot = match self.watcher.fetch(account).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("Error checking balance for {}: {}", account.identifier, e);
                report.source_failures += 1;
                return;
            }
        };

        let evaluation = match self
            .watcher
            .record_observation(account, &snapshot)
            .await
        {
            Ok(evaluation) => evaluation,
            Err(e) => {
                tracing::debug!("Skipping {}: {}", short, e);
                report.skipped += 1;
                return;
            }
        };

        match evaluation {
            Evaluation::Initial(value) => {
                tracing::info!("Initial balance retrieved for {}: {}", short, value);
                report.initial += 1;
            }
            Evaluation::NoChange => {
                tracing::debug!("No change for {}", short);
                report.unchanged += 1;
            }
            Evaluation::Changed(event) => {
                report.changed += 1;
                tracing::info!(
                    "{} {}: {} -> {}",
                    event.direction.label(),
                    short,
                    event.previous,
                    event.current
                );
                // The value is already recorded; a lost message is not resent
                if let Err(e) = self.watcher.notify(&event).await {
                    tracing::warn!("Failed to send notification for {}: {}", short, e);
                    report.notify_failures += 1;
                }
            }
        }
    }
}

// Clones share the running flag, state and pass guard
impl Clone for Scheduler {
    fn clone(&self) -> Self {
        Self {
            watcher: Arc::clone(&self.watcher),
            interval: self.interval,
            is_running: Arc::clone(&self.is_running),
            state: Arc::clone(&self.state),
            pass_guard: Arc::clone(&self.pass_guard),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WalletRegistry;
    use crate::ports::mocks::{RecordingNotifier, ScriptedBalanceSource};
    use crate::ports::notifier::{MockNotifier, NotifyError};
    use crate::ports::{Notifier, SourceError};
    use rust_decimal_macros::dec;

    const ADDR_A: &str = "0xabcdef0123456789abcdef0123456789abcdef01";
    const ADDR_B: &str = "0x1111111111111111111111111111111111111111";
    const ADDR_C: &str = "0x2222222222222222222222222222222222222222";

    fn registry_of(addrs: &[&str]) -> WalletRegistry {
        WalletRegistry::from_accounts(
            addrs.iter().map(|a| WatchedAccount::new(a, "eth").unwrap()),
        )
    }

    fn scheduler(
        addrs: &[&str],
        source: ScriptedBalanceSource,
        notifier: Arc<dyn Notifier>,
    ) -> Scheduler {
        let watcher = WalletWatcher::new(registry_of(addrs), Arc::new(source), notifier);
        Scheduler::new(Arc::new(watcher))
    }

    #[tokio::test]
    async fn test_first_pass_never_notifies() {
        let mut notifier = MockNotifier::new();
        notifier.expect_send().times(0);

        let source = ScriptedBalanceSource::new()
            .with_balance(ADDR_A, dec!(1.5))
            .with_balance(ADDR_B, dec!(0));
        let scheduler = scheduler(&[ADDR_A, ADDR_B], source, Arc::new(notifier));

        let report = scheduler.run_pass().await.unwrap();
        assert_eq!(report.checked, 2);
        assert_eq!(report.initial, 2);
        assert_eq!(report.changed, 0);
    }

    #[tokio::test]
    async fn test_change_notifies_once() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_send()
            .withf(|text| text.contains("📈 Increased") && text.contains("+33.33%"))
            .times(1)
            .returning(|_| Ok(()));

        let source = ScriptedBalanceSource::new()
            .with_balance(ADDR_A, dec!(1.5))
            .with_balance(ADDR_A, dec!(1.5))
            .with_balance(ADDR_A, dec!(2.0));
        let scheduler = scheduler(&[ADDR_A], source, Arc::new(notifier));

        assert_eq!(scheduler.run_pass().await.unwrap().initial, 1);
        assert_eq!(scheduler.run_pass().await.unwrap().unchanged, 1);
        assert_eq!(scheduler.run_pass().await.unwrap().changed, 1);
    }

    #[tokio::test]
    async fn test_source_failure_is_isolated() {
        let notifier = RecordingNotifier::new();
        let source = ScriptedBalanceSource::new()
            .with_balance(ADDR_A, dec!(1))
            .with_balance(ADDR_B, dec!(5))
            .with_balance(ADDR_C, dec!(10))
            .with_balance(ADDR_A, dec!(2))
            .with_response(ADDR_B, Err(SourceError::Unavailable("connection reset".into())))
            .with_balance(ADDR_C, dec!(9));
        let scheduler = scheduler(&[ADDR_A, ADDR_B, ADDR_C], source, Arc::new(notifier.clone()));

        scheduler.run_pass().await.unwrap();
        let report = scheduler.run_pass().await.unwrap();

        assert_eq!(report.checked, 3);
        assert_eq!(report.changed, 2);
        assert_eq!(report.source_failures, 1);
        assert_eq!(notifier.messages().len(), 2);

        let stored = scheduler.watcher.get_wallet(ADDR_B).await.unwrap();
        assert_eq!(stored.last_observed_value, Some(dec!(5)));
    }

    #[tokio::test]
    async fn test_notify_failure_still_records_value() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_send()
            .times(1)
            .returning(|_| Err(NotifyError::Transport("down".into())));

        let source = ScriptedBalanceSource::new()
            .with_balance(ADDR_A, dec!(1))
            .with_balance(ADDR_A, dec!(3))
            .with_balance(ADDR_A, dec!(3));
        let scheduler = scheduler(&[ADDR_A], source, Arc::new(notifier));

        scheduler.run_pass().await.unwrap();
        let report = scheduler.run_pass().await.unwrap();
        assert_eq!(report.notify_failures, 1);

        // No re-send on the following pass
        let report = scheduler.run_pass().await.unwrap();
        assert_eq!(report.unchanged, 1);
        assert_eq!(
            scheduler.watcher.get_wallet(ADDR_A).await.unwrap().last_observed_value,
            Some(dec!(3))
        );
    }

    #[tokio::test]
    async fn test_overlapping_pass_is_skipped() {
        let scheduler = scheduler(
            &[ADDR_A],
            ScriptedBalanceSource::new().with_balance(ADDR_A, dec!(1)),
            Arc::new(RecordingNotifier::new()),
        );

        let held = scheduler.pass_guard.lock().await;
        assert!(scheduler.run_pass().await.is_none());
        drop(held);

        assert!(scheduler.run_pass().await.is_some());
        assert_eq!(scheduler.state().await, SchedulerState::Idle);
    }

    #[tokio::test]
    async fn test_empty_registry_pass() {
        let scheduler = scheduler(&[], ScriptedBalanceSource::new(), Arc::new(RecordingNotifier::new()));
        assert_eq!(scheduler.run_pass().await, Some(PassReport::default()));
    }

    #[tokio::test]
    async fn test_run_starts_with_immediate_pass_and_stops() {
        let source = ScriptedBalanceSource::new().with_balance(ADDR_A, dec!(1));
        let scheduler = scheduler(&[ADDR_A], source.clone(), Arc::new(RecordingNotifier::new()))
            .with_interval(Duration::from_secs(3600));

        let runner = scheduler.clone();
        let handle = tokio::spawn(async move { runner.run().await });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(scheduler.is_running().await);
        assert_eq!(source.get_calls().len(), 1);

        scheduler.stop().await;
        assert!(!scheduler.is_running().await);
        handle.abort();
    }

    #[tokio::test]
    async fn test_with_interval() {
        let scheduler = scheduler(&[], ScriptedBalanceSource::new(), Arc::new(RecordingNotifier::new()))
            .with_interval(Duration::from_secs(5));
        assert_eq!(scheduler.interval(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_removed_mid_pass_is_skipped() {
        let source = ScriptedBalanceSource::new().with_balance(ADDR_A, dec!(1));
        let watcher = Arc::new(WalletWatcher::new(
            registry_of(&[ADDR_A]),
            Arc::new(source),
            Arc::new(RecordingNotifier::new()),
        ));
        let scheduler = Scheduler::new(Arc::clone(&watcher));

        let account = watcher.get_wallet(ADDR_A).await.unwrap();
        watcher.remove_wallet(ADDR_A).await.unwrap();

        let mut report = PassReport::default();
        scheduler.check_account(&account, &mut report).await;
        assert_eq!(report.skipped, 1);
    }

    #[tokio::test]
    async fn test_readded_on_other_chain_mid_pass_is_skipped() {
        let source = ScriptedBalanceSource::new()
            .with_balance(ADDR_A, dec!(1)) // probe for the re-add
            .with_balance(ADDR_A, dec!(5));
        let notifier = RecordingNotifier::new();
        let watcher = Arc::new(WalletWatcher::new(
            registry_of(&[ADDR_A]),
            Arc::new(source),
            Arc::new(notifier.clone()),
        ));
        let scheduler = Scheduler::new(Arc::clone(&watcher));

        let stale = watcher.get_wallet(ADDR_A).await.unwrap();
        watcher.remove_wallet(ADDR_A).await.unwrap();
        watcher.add_wallet(ADDR_A, Some("bsc")).await.unwrap();

        let mut report = PassReport::default();
        scheduler.check_account(&stale, &mut report).await;
        assert_eq!(report.skipped, 1);
        assert_eq!(report.initial, 0);

        let stored = watcher.get_wallet(ADDR_A).await.unwrap();
        assert_eq!(stored.chain_tag, "bsc");
        assert!(stored.is_pending());
        assert!(notifier.messages().is_empty());
    }
}
