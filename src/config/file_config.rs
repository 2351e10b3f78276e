use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// TOML configuration file. Every field is optional; anything present
/// overrides the matching CLI argument, and credentials fall back to
/// environment variables.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub port: Option<u16>,
    pub suppression_file: Option<String>,
    pub check_interval_secs: Option<u64>,
    pub http_timeout_sec: Option<u64>,

    // Credentials (env vars take over when absent)
    pub yandex_token: Option<String>,
    pub spotify_access_token: Option<String>,

    // Feature configs
    pub sync: Option<SyncConfig>,
    pub telegram: Option<TelegramConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct SyncConfig {
    pub scan_limit: Option<usize>,
    pub text_similarity_threshold: Option<f64>,
    pub duration_tolerance_secs: Option<u64>,
    pub item_delay_ms: Option<u64>,
    pub max_retries: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {:?}", path))
    }
}
