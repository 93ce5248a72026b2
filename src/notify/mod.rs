// src/notify/mod.rs
//! Outgoing notifications: formatting plus the sink trait the dispatcher talks to.

pub mod format;
pub mod telegram;

use crate::error::DeliveryError;

pub use format::{format_item, format_sample, FormatRules};
pub use telegram::TelegramNotifier;

/// One rendered message (Telegram HTML subset).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub text: String,
    pub disable_preview: bool,
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, n: &Notification) -> Result<(), DeliveryError>;
}
