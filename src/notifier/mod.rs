//! Best-effort add notifications.
//!
//! The engine announces every successful add through a [`Notifier`]. Delivery
//! is fire-and-forget: a notifier that cannot deliver logs and swallows the
//! problem, it never fails or delays a pass.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a human-readable message. Must not fail: implementations own
    /// their error handling.
    async fn notify(&self, message: &str);
}

/// Used when no notification channel is configured.
pub struct NoOpNotifier;

#[async_trait]
impl Notifier for NoOpNotifier {
    async fn notify(&self, message: &str) {
        debug!("Notification (no channel configured): {}", message);
    }
}

/// Sends messages to a Telegram chat via the Bot API.
pub struct TelegramNotifier {
    client: reqwest::Client,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(bot_token: String, chat_id: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            bot_token,
            chat_id,
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, message: &str) {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);
        let result = self
            .client
            .post(&url)
            .form(&[("chat_id", self.chat_id.as_str()), ("text", message)])
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => {
                warn!(
                    "Telegram rejected notification: status {}",
                    response.status()
                );
            }
            Err(err) => {
                warn!("Failed to send Telegram notification: {}", err);
            }
        }
    }
}
