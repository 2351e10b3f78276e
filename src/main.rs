use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use likesync::catalog::{CatalogAdapter, SpotifyCatalog, YandexCatalog};
use likesync::config::{AppConfig, CliConfig, FileConfig};
use likesync::notifier::{NoOpNotifier, Notifier, TelegramNotifier};
use likesync::server::run_control_server;
use likesync::suppression::SuppressionStore;
use likesync::sync::{CycleCoordinator, CycleStats, SyncEngine};

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to an optional TOML config file.
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    /// The port the control surface listens on.
    #[clap(short, long, default_value_t = 3600)]
    pub port: u16,

    /// Path to the suppression list file.
    #[clap(long, default_value = "suppressions.json")]
    pub suppression_file: PathBuf,

    /// Seconds between scheduled sync cycles.
    #[clap(long, default_value_t = 300)]
    pub check_interval_secs: u64,

    /// Timeout in seconds for catalog API requests.
    #[clap(long, default_value_t = 30)]
    pub http_timeout_sec: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let cli_config = CliConfig {
        port: cli_args.port,
        suppression_file: cli_args.suppression_file,
        check_interval_secs: cli_args.check_interval_secs,
        http_timeout_sec: cli_args.http_timeout_sec,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    let yandex: Arc<dyn CatalogAdapter> = Arc::new(YandexCatalog::new(
        config.yandex_token.clone(),
        config.http_timeout_sec,
    ));
    let spotify: Arc<dyn CatalogAdapter> = Arc::new(SpotifyCatalog::new(
        config.spotify_access_token.clone(),
        config.http_timeout_sec,
    ));

    let notifier: Arc<dyn Notifier> = match &config.telegram {
        Some(telegram) => {
            info!("Telegram notifications enabled for chat {}", telegram.chat_id);
            Arc::new(TelegramNotifier::new(
                telegram.bot_token.clone(),
                telegram.chat_id.clone(),
            ))
        }
        None => Arc::new(NoOpNotifier),
    };

    info!(
        "Loading suppression list from {:?}...",
        config.suppression_file
    );
    let suppression = SuppressionStore::load(&config.suppression_file, config.max_retries);

    let stats = Arc::new(CycleStats::new());
    let engine = SyncEngine::new(
        yandex,
        spotify,
        suppression,
        notifier,
        stats.clone(),
        config.sync.clone(),
    );
    let coordinator = Arc::new(CycleCoordinator::new(engine, stats));

    // First cycle right away, then on the interval
    info!(
        "Scheduling sync cycles every {}s",
        config.check_interval_secs
    );
    let interval_secs = config.check_interval_secs;
    let scheduled = coordinator.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            ticker.tick().await;
            // Busy ticks are dropped, never queued
            scheduled.run_cycle().await;
        }
    });

    info!("Ready to serve at port {}!", config.port);
    tokio::select! {
        result = run_control_server(coordinator, config.port) => {
            if let Err(err) = &result {
                error!("Control server failed: {:#}", err);
            }
            result
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
            Ok(())
        }
    }
}
