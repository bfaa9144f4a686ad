// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram notification transport for the Wicket queue engine.
//!
//! Sends plain-text notices through the Telegram Bot API using teloxide.
//! The recipient string is the ticket's phone reduced to digits, which is
//! used as the Telegram chat id.

pub mod split;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatId, Recipient};
use tracing::{debug, info};
use wicket_config::model::TelegramConfig;
use wicket_core::{
    AdapterType, HealthStatus, MessageId, NotificationTransport, PluginAdapter, WicketError,
};

use crate::split::{MAX_MESSAGE_LEN, split_message};

/// Delivers notices as Telegram messages.
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    /// Creates a transport from config. Fails when no bot token is set.
    pub fn new(config: TelegramConfig) -> Result<Self, WicketError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            WicketError::Config("telegram.bot_token is required for the Telegram transport".into())
        })?;

        if token.trim().is_empty() {
            return Err(WicketError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }

        Ok(Self {
            bot: Bot::new(token),
        })
    }

    /// Returns a reference to the underlying teloxide Bot.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

/// Parses a digits-only recipient into a Telegram chat id.
fn chat_id(recipient: &str) -> Result<ChatId, WicketError> {
    recipient
        .parse::<i64>()
        .map(ChatId)
        .map_err(|e| WicketError::Transport {
            message: format!("recipient {recipient:?} is not a Telegram chat id"),
            source: Some(Box::new(e)),
        })
}

#[async_trait]
impl PluginAdapter for TelegramTransport {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, WicketError> {
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), WicketError> {
        debug!("Telegram transport shutting down");
        Ok(())
    }
}

#[async_trait]
impl NotificationTransport for TelegramTransport {
    /// Sends `text`, split across several messages when it exceeds the
    /// Telegram limit. The id of the first message is returned.
    async fn send(&self, recipient: &str, text: &str) -> Result<MessageId, WicketError> {
        let chat = chat_id(recipient)?;
        let mut first = None;

        for part in split_message(text, MAX_MESSAGE_LEN) {
            let sent = self
                .bot
                .send_message(Recipient::Id(chat), part)
                .await
                .map_err(|e| WicketError::Transport {
                    message: format!("Telegram send to {recipient} failed: {e}"),
                    source: Some(Box::new(e)),
                })?;
            first.get_or_insert(sent.id.0);
        }

        let id = first.ok_or_else(|| WicketError::Transport {
            message: "refusing to send an empty message".into(),
            source: None,
        })?;
        info!(chat_id = chat.0, message_id = id, "Telegram message sent");
        Ok(MessageId(id.to_string()))
    }
}
