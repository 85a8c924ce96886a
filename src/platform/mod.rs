pub mod telegram;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use teloxide::types::ChatId;

/// The subset of a Telegram update this bot reads. Unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingUpdate {
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub message_id: i64,
    pub chat: IncomingChat,
    #[serde(default)]
    pub from: Option<Sender>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingChat {
    pub id: i64,
    /// Present only for public groups and channels.
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sender {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub username: Option<String>,
}

impl IncomingMessage {
    pub fn chat_id(&self) -> ChatId {
        ChatId(self.chat.id)
    }
}

/// Outbound side of the bot: anything that can post text to a chat.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()>;
}

/// Produces a ready `Messenger` for one incoming request.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn Messenger>>;
}
