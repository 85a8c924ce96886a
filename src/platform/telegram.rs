use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::net;
use teloxide::payloads::SetWebhookSetters;
use teloxide::prelude::*;
use teloxide::types::ChatId;
use tracing::{debug, info};

use crate::config::TelegramSettings;
use crate::platform::{Connector, Messenger};

/// Builds a fresh teloxide `Bot` per request and re-registers the webhook.
pub struct TelegramConnector {
    settings: TelegramSettings,
}

impl TelegramConnector {
    pub fn new(settings: TelegramSettings) -> Self {
        Self { settings }
    }

    fn build_bot(&self) -> Result<Bot> {
        // No retries: a failed call fails the request that made it
        let mut builder = net::default_reqwest_settings()
            .timeout(self.settings.request_timeout)
            .pool_max_idle_per_host(self.settings.pool_max_idle);

        if let Some(proxy_url) = &self.settings.proxy_url {
            let proxy = reqwest::Proxy::all(proxy_url)
                .with_context(|| format!("Invalid proxy URL: {proxy_url}"))?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().context("Failed to build HTTP client")?;
        Ok(Bot::with_client(&self.settings.bot_token, client))
    }

    /// Point Telegram at our webhook, with at most one concurrent delivery.
    pub async fn register_webhook(&self, bot: &Bot) -> Result<()> {
        let webhook_url = self.settings.webhook_url();
        let url = reqwest::Url::parse(&webhook_url)
            .with_context(|| format!("Invalid webhook URL: {webhook_url}"))?;

        bot.set_webhook(url)
            .max_connections(1)
            .await
            .context("setWebhook failed")?;

        debug!("Webhook registered at https://{}/***", self.settings.public_host);
        Ok(())
    }
}

#[async_trait]
impl Connector for TelegramConnector {
    async fn connect(&self) -> Result<Arc<dyn Messenger>> {
        let bot = self.build_bot()?;
        self.register_webhook(&bot).await?;
        Ok(Arc::new(TelegramMessenger { bot }))
    }
}

pub struct TelegramMessenger {
    bot: Bot,
}

/// Byte budget per message; stays under Telegram's 4096-character limit.
const MAX_MESSAGE_LEN: usize = 4000;

/// Split long messages for Telegram's 4096 char limit
pub fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + max_len).min(text.len());
        // Walk back to a valid UTF-8 char boundary so slicing doesn't panic
        while end > start && !text.is_char_boundary(end) {
            end -= 1;
        }
        if end == start {
            // max_len smaller than one char: take the whole char
            end = start + text[start..].chars().next().map_or(1, char::len_utf8);
        }
        let actual_end = if end < text.len() {
            text[start..end]
                .rfind('\n')
                .or_else(|| text[start..end].rfind(' '))
                .map(|pos| start + pos + 1)
                .unwrap_or(end)
        } else {
            end
        };

        chunks.push(text[start..actual_end].to_string());
        start = actual_end;
    }

    chunks
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()> {
        for chunk in split_message(text, MAX_MESSAGE_LEN) {
            self.bot
                .send_message(chat_id, chunk)
                .await
                .with_context(|| format!("sendMessage to chat {} failed", chat_id.0))?;
        }
        info!("Sent {} chars to chat {}", text.len(), chat_id.0);
        Ok(())
    }
}
