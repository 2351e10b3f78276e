mod file_config;

pub use file_config::{FileConfig, SyncConfig, TelegramConfig};

use anyhow::{bail, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::sync::SyncSettings;

/// CLI arguments that can be overridden by TOML config.
/// This struct mirrors the CLI arguments resolvable against a config file.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub port: u16,
    pub suppression_file: PathBuf,
    pub check_interval_secs: u64,
    pub http_timeout_sec: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub port: u16,
    pub suppression_file: PathBuf,
    pub check_interval_secs: u64,
    pub http_timeout_sec: u64,

    // Credentials
    pub yandex_token: String,
    pub spotify_access_token: String,
    pub telegram: Option<TelegramSettings>,

    // Sync tunables (with defaults)
    pub sync: SyncSettings,
    pub max_retries: u32,
}

#[derive(Debug, Clone)]
pub struct TelegramSettings {
    pub bot_token: String,
    pub chat_id: String,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file
    /// config. TOML values override CLI values where present; credentials
    /// fall back to environment variables.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let port = file.port.unwrap_or(cli.port);
        let suppression_file = file
            .suppression_file
            .map(PathBuf::from)
            .unwrap_or_else(|| cli.suppression_file.clone());
        let check_interval_secs = file.check_interval_secs.unwrap_or(cli.check_interval_secs);
        let http_timeout_sec = file.http_timeout_sec.unwrap_or(cli.http_timeout_sec);

        let Some(yandex_token) = file.yandex_token.or_else(|| env_var("YANDEX_TOKEN")) else {
            bail!("Yandex token must be set via config file or YANDEX_TOKEN");
        };
        let Some(spotify_access_token) = file
            .spotify_access_token
            .or_else(|| env_var("SPOTIFY_ACCESS_TOKEN"))
        else {
            bail!("Spotify token must be set via config file or SPOTIFY_ACCESS_TOKEN");
        };

        let telegram = resolve_telegram(file.telegram)?;

        // Sync settings - merge file config with defaults
        let sync_file = file.sync.unwrap_or_default();
        let defaults = SyncSettings::default();
        let sync = SyncSettings {
            scan_limit: sync_file.scan_limit.unwrap_or(defaults.scan_limit),
            text_threshold: sync_file
                .text_similarity_threshold
                .unwrap_or(defaults.text_threshold),
            duration_tolerance_secs: sync_file
                .duration_tolerance_secs
                .unwrap_or(defaults.duration_tolerance_secs),
            item_delay: sync_file
                .item_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.item_delay),
        };

        if !(0.0..=1.0).contains(&sync.text_threshold) {
            bail!(
                "text_similarity_threshold must be within [0, 1], got {}",
                sync.text_threshold
            );
        }

        let max_retries = sync_file.max_retries.unwrap_or(5);

        Ok(Self {
            port,
            suppression_file,
            check_interval_secs,
            http_timeout_sec,
            yandex_token,
            spotify_access_token,
            telegram,
            sync,
            max_retries,
        })
    }
}

fn resolve_telegram(file: Option<TelegramConfig>) -> Result<Option<TelegramSettings>> {
    let file = file.unwrap_or(TelegramConfig {
        bot_token: None,
        chat_id: None,
    });
    let bot_token = file.bot_token.or_else(|| env_var("TELEGRAM_BOT_TOKEN"));
    let chat_id = file.chat_id.or_else(|| env_var("TELEGRAM_CHAT_ID"));

    match (bot_token, chat_id) {
        (Some(bot_token), Some(chat_id)) => Ok(Some(TelegramSettings { bot_token, chat_id })),
        (None, None) => Ok(None),
        _ => bail!("Telegram config needs both bot_token and chat_id"),
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
