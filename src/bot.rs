use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Mutex;
use tracing::info;

use crate::commands::Command;
use crate::matcher;
use crate::platform::{Connector, IncomingMessage, Messenger, Sender};
use crate::store::{ConfigStore, StoreKind};

/// Shared application state
pub struct AppState {
    pub connector: Arc<dyn Connector>,
    /// One lock for all three files: a request sees and writes them alone.
    pub store: Mutex<ConfigStore>,
}

impl AppState {
    pub fn new(connector: Arc<dyn Connector>, store: ConfigStore) -> Self {
        Self {
            connector,
            store: Mutex::new(store),
        }
    }
}

/// True when the sender's id or username is a whitelist line.
pub fn is_whitelisted(sender: Option<&Sender>, whitelist: &[String]) -> bool {
    let Some(sender) = sender else {
        return false;
    };
    let id = sender.id.map(|id| id.to_string());
    let found = [id.as_deref(), sender.username.as_deref()]
        .into_iter()
        .flatten()
        .any(|candidate| whitelist.iter().any(|entry| entry == candidate));
    found
}

/// Route one message: admin command (whitelisted senders only) or keyword scan.
pub async fn handle_message(
    store: &mut ConfigStore,
    messenger: &dyn Messenger,
    message: &IncomingMessage,
) -> Result<()> {
    let Some(text) = message.text.as_deref() else {
        return Ok(());
    };
    let chat_id = message.chat_id();
    info!("Message in chat {}", chat_id.0);

    let Some(command) = Command::parse(text) else {
        matcher::forward_if_matched(store, messenger, message).await?;
        return Ok(());
    };

    store.reload(StoreKind::Whitelist).await?;
    let allowed = is_whitelisted(message.from.as_ref(), store.whitelist());
    let (user_id, username) = message
        .from
        .as_ref()
        .map(|s| (s.id, s.username.clone()))
        .unwrap_or_default();

    if !allowed {
        info!(
            "User with id {:?} and username {:?} tried to use {}; not whitelisted",
            user_id,
            username,
            command.prefix()
        );
        return Ok(());
    }

    info!(
        "User with id {:?} and username {:?} used {}",
        user_id,
        username,
        command.prefix()
    );
    command.execute(store, messenger, chat_id, text).await
}
