//! Balance Sentinel - EVM wallet balance monitor
//!
//! Polls watched wallets and posts Telegram alerts when a balance changes.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

use balance_sentinel::adapters::ankr::{AnkrClient, AnkrConfig};
use balance_sentinel::adapters::cli::{BalanceCmd, CliApp, Command, ListCmd, RunCmd};
use balance_sentinel::adapters::process::{ProcessBalanceSource, ProcessConfig};
use balance_sentinel::adapters::telegram::{
    CommandDispatcher, TelegramClient, TelegramConfig, TelegramNotifier,
};
use balance_sentinel::application::{load_registry, Scheduler, WalletWatcher};
use balance_sentinel::config::{load_config_or_default, Config, SourceKind};
use balance_sentinel::domain::{
    format_balance, format_observed, RegistryStore, Snapshot, WalletRegistry, WatchedAccount,
};
use balance_sentinel::ports::{BalanceSource, SourceError};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (secrets go here, not in sentinel.toml)
    dotenvy::dotenv().ok();

    let app = CliApp::parse();
    let config_path = app.command.config_path().to_path_buf();
    let config = load_config_or_default(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;

    init_logging(app.verbose, app.debug, &config.logging.level);
    if !config_path.exists() {
        tracing::warn!(
            "Config file {} not found, using defaults and environment",
            config_path.display()
        );
    }

    match app.command {
        Command::Run(cmd) => run_command(cmd, config).await,
        Command::Balance(cmd) => balance_command(cmd, config).await,
        Command::List(cmd) => list_command(cmd, config),
    }
}

fn init_logging(verbose: bool, debug: bool, level: &str) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    fmt().with_env_filter(filter).with_target(false).init();
}

fn build_source(config: &Config) -> Result<Arc<dyn BalanceSource>> {
    let source: Arc<dyn BalanceSource> = match config.source.kind {
        SourceKind::Ankr => Arc::new(
            AnkrClient::with_config(AnkrConfig::from(config))
                .context("Failed to create Ankr client")?,
        ),
        SourceKind::Process => Arc::new(ProcessBalanceSource::new(ProcessConfig::from(config))),
    };
    Ok(source)
}

fn build_store(config: &Config) -> Option<RegistryStore> {
    config.monitor.store_path().map(RegistryStore::new)
}

fn startup_registry(config: &Config) -> WalletRegistry {
    let store = build_store(config);
    load_registry(
        store.as_ref(),
        &config.monitor.wallets,
        &config.monitor.default_chain,
    )
}

async fn run_command(cmd: RunCmd, mut config: Config) -> Result<()> {
    tracing::info!("Starting balance sentinel...");

    if let Some(secs) = cmd.interval {
        anyhow::ensure!(secs > 0, "--interval must be > 0");
        config.monitor.interval_secs = secs;
    }

    let (bot_token, chat_id) = config
        .telegram
        .credentials()
        .context("Telegram is required for the run command")?;

    let telegram = TelegramClient::new(TelegramConfig {
        api_url: config.telegram.api_url.clone(),
        bot_token: bot_token.to_string(),
        poll_timeout: config.telegram.poll_timeout(),
    })
    .context("Failed to create Telegram client")?;
    let notifier = Arc::new(TelegramNotifier::new(telegram.clone(), chat_id));

    let source = build_source(&config)?;
    let registry = startup_registry(&config);

    let mut watcher = WalletWatcher::new(registry, source, notifier)
        .with_default_chain(config.monitor.default_chain.clone())
        .with_source_timeout(config.monitor.source_timeout());
    if let Some(store) = build_store(&config) {
        tracing::info!("Persisting wallets to {}", store.path().display());
        watcher = watcher.with_store(store);
    }
    let watcher = Arc::new(watcher);

    tracing::info!(
        "Monitoring {} wallet(s), default chain {}, metric {}",
        watcher.wallet_count().await,
        watcher.default_chain(),
        config.monitor.comparison_metric
    );

    let scheduler = Scheduler::new(Arc::clone(&watcher)).with_interval(config.monitor.interval());
    let dispatcher = CommandDispatcher::new(Arc::clone(&watcher), scheduler.clone());

    let monitoring = async {
        if cmd.no_commands {
            scheduler.run().await;
        } else {
            tokio::join!(scheduler.run(), dispatcher.run(&telegram));
        }
    };

    tokio::select! {
        _ = monitoring => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
            scheduler.stop().await;
            dispatcher.stop().await;
        }
    }

    tracing::info!("Balance sentinel stopped");
    Ok(())
}

async fn balance_command(cmd: BalanceCmd, config: Config) -> Result<()> {
    let source = build_source(&config)?;
    let registry = startup_registry(&config);
    let timeout = config.monitor.source_timeout();

    let accounts = match cmd.address {
        Some(ref address) => {
            let account = match registry.get(address) {
                Ok(watched) => watched.clone(),
                Err(_) => WatchedAccount::new(
                    address,
                    cmd.chain.as_deref().unwrap_or(&config.monitor.default_chain),
                )
                .context("Invalid wallet address")?,
            };
            vec![account]
        }
        None => registry.list().to_vec(),
    };

    if accounts.is_empty() {
        println!("No wallets to check. Add one to [monitor] wallets or pass an address.");
        return Ok(());
    }

    println!("💰 Wallet Balances ({})\n", source.name());
    for account in &accounts {
        match query_with_timeout(source.as_ref(), account, timeout).await {
            Ok(snapshot) => println!("{}", format_balance(account, &snapshot)),
            Err(e) => println!("📍 {}\n❌ Error: {}\n", account.identifier, e),
        }
    }
    Ok(())
}

async fn query_with_timeout(
    source: &dyn BalanceSource,
    account: &WatchedAccount,
    timeout: Duration,
) -> Result<Snapshot, SourceError> {
    tokio::time::timeout(timeout, source.query(&account.identifier, &account.chain_tag))
        .await
        .unwrap_or(Err(SourceError::Timeout(timeout.as_secs())))
}

fn list_command(_cmd: ListCmd, config: Config) -> Result<()> {
    let registry = startup_registry(&config);

    if registry.is_empty() {
        println!("No wallets monitored yet.");
        return Ok(());
    }

    println!("📋 Monitored Wallets ({}):\n", registry.len());
    for (idx, account) in registry.list().iter().enumerate() {
        println!(
            "{}. {}\n   Chain: {}\n   Last balance: {}\n",
            idx + 1,
            account.identifier,
            account.chain_tag,
            format_observed(account)
        );
    }
    Ok(())
}
