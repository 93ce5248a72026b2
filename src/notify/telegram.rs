// src/notify/telegram.rs
use std::time::Duration;

use reqwest::Client;

use super::{Notification, Notifier};
use crate::error::DeliveryError;
use crate::ingest::truncate_chars;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(20);

/// Error bodies are kept short in logs.
const MAX_ERROR_BODY: usize = 300;

#[derive(Clone)]
pub struct TelegramNotifier {
    client: Client,
    token: String,
    chat_id: String,
    api_base: String,
    timeout: Duration,
}

impl TelegramNotifier {
    pub fn new(client: Client, token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            client,
            token: token.into(),
            chat_id: chat_id.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    /// Point at a different Bot API host (local test servers).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.token)
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, n: &Notification) -> Result<(), DeliveryError> {
        let disable_preview = if n.disable_preview { "true" } else { "false" };
        let form = [
            ("chat_id", self.chat_id.as_str()),
            ("text", n.text.as_str()),
            ("parse_mode", "HTML"),
            ("disable_web_page_preview", disable_preview),
        ];

        let resp = self
            .client
            .post(self.endpoint())
            .timeout(self.timeout)
            .form(&form)
            .send()
            .await
            .map_err(|e| DeliveryError::Http(e.without_url()))?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(DeliveryError::Status {
                status: status.as_u16(),
                body: truncate_chars(&body, MAX_ERROR_BODY).to_string(),
            });
        }

        tracing::info!(chars = n.text.chars().count(), "sent message");
        Ok(())
    }
}
