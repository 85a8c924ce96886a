use anyhow::Result;
use tracing::{debug, info, warn};

use crate::platform::{IncomingMessage, Messenger};
use crate::store::{ConfigStore, StoreKind};

/// First keyword (in list order) contained in `text`, ignoring case.
pub fn find_keyword<'a>(text: &str, keywords: &'a [String]) -> Option<&'a str> {
    let text = text.to_lowercase();
    keywords
        .iter()
        .filter(|k| !k.trim().is_empty())
        .find(|k| text.contains(&k.to_lowercase()))
        .map(String::as_str)
}

/// What the base chat receives for a matched message: a deep link when the
/// source chat is public, otherwise the chat id and the lower-cased text.
pub fn notification(message: &IncomingMessage, lowered_text: &str) -> String {
    match &message.chat.username {
        Some(chat_name) => format!("https://t.me/{}/{}", chat_name, message.message_id),
        None => format!("Message in chat {}: {}", message.chat.id, lowered_text),
    }
}

/// Forward `message` to the base chat if it contains any keyword.
/// Returns whether a notification was sent.
pub async fn forward_if_matched(
    store: &mut ConfigStore,
    messenger: &dyn Messenger,
    message: &IncomingMessage,
) -> Result<bool> {
    let Some(text) = message.text.as_deref() else {
        return Ok(false);
    };

    store.reload(StoreKind::Keywords).await?;
    let Some(keyword) = find_keyword(text, store.keywords()) else {
        return Ok(false);
    };
    debug!("Keyword '{}' matched in chat {}", keyword, message.chat.id);

    store.reload(StoreKind::BaseChat).await?;
    let Some(base_chat) = store.base_chat() else {
        warn!(
            "Keyword match in chat {} but no base chat is set; use /make_this_chat_base",
            message.chat.id
        );
        return Ok(false);
    };

    let notice = notification(message, &text.to_lowercase());
    messenger.send_text(base_chat, &notice).await?;
    info!(
        "Forwarded message {} from chat {} to base chat {}",
        message.message_id, message.chat.id, base_chat.0
    );
    Ok(true)
}
