use anyhow::Result;
use teloxide::types::ChatId;
use tracing::info;

use crate::platform::Messenger;
use crate::store::{ConfigStore, SaveMode, StoreKind};

/// Admin commands, in dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ShowKeywords,
    SetKeywords,
    AddKeywords,
    ShowWhitelist,
    SetWhitelist,
    MakeBaseChat,
    Help,
}

impl Command {
    pub const ALL: [Command; 7] = [
        Command::ShowKeywords,
        Command::SetKeywords,
        Command::AddKeywords,
        Command::ShowWhitelist,
        Command::SetWhitelist,
        Command::MakeBaseChat,
        Command::Help,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            Command::ShowKeywords => "/show_keywords",
            Command::SetKeywords => "/set_keywords",
            Command::AddKeywords => "/add_keywords",
            Command::ShowWhitelist => "/show_whitelist",
            Command::SetWhitelist => "/set_whitelist",
            Command::MakeBaseChat => "/make_this_chat_base",
            Command::Help => "/help",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Command::ShowKeywords => "Show current list of keywords",
            Command::SetKeywords => {
                "Set new list of keywords.\nFormat:\n'/set_keywords\nkeyword1\nkeyword2'"
            }
            Command::AddKeywords => {
                "Add some words to the current keywords list.\nFormat:\n'/add_keywords\nkeyword\nkeyword'"
            }
            Command::ShowWhitelist => "Show current list of whitelisted users",
            Command::SetWhitelist => {
                "Set new list of whitelisted users.\nFormat:\n'/set_whitelist\nusername or user_id\nusername or user_id'"
            }
            Command::MakeBaseChat => {
                "Make this chat base. All messages with keywords will be directed here"
            }
            Command::Help => "Show this message",
        }
    }

    /// First command whose literal prefix starts `text`.
    pub fn parse(text: &str) -> Option<Command> {
        Command::ALL
            .into_iter()
            .find(|cmd| text.starts_with(cmd.prefix()))
    }

    /// Run the command for `chat_id`, replying in the same chat.
    pub async fn execute(
        self,
        store: &mut ConfigStore,
        messenger: &dyn Messenger,
        chat_id: ChatId,
        text: &str,
    ) -> Result<()> {
        let reply = match self {
            Command::ShowKeywords => {
                store.reload(StoreKind::Keywords).await?;
                if store.keywords().is_empty() {
                    "Keyword list is empty".to_string()
                } else {
                    store.keywords().join("\n")
                }
            }
            Command::SetKeywords => {
                let keywords = self.argument(text).to_lowercase();
                store
                    .save(StoreKind::Keywords, &keywords, SaveMode::Overwrite)
                    .await?;
                format!("New keywords list:\n{keywords}")
            }
            Command::AddKeywords => {
                let added = self.argument(text).to_lowercase();
                store
                    .save(StoreKind::Keywords, &format!("\n{added}"), SaveMode::Append)
                    .await?;
                format!("New keywords list:\n{}", store.keywords().join("\n"))
            }
            Command::ShowWhitelist => {
                store.reload(StoreKind::Whitelist).await?;
                format!("Whitelist:\n{}", distinct(store.whitelist()).join("\n"))
            }
            Command::SetWhitelist => {
                let whitelist = self.argument(text);
                store
                    .save(StoreKind::Whitelist, whitelist, SaveMode::Overwrite)
                    .await?;
                format!("New whitelist:\n{whitelist}")
            }
            Command::MakeBaseChat => {
                store.set_base_chat(chat_id).await?;
                info!("Chat {} is now the base chat", chat_id.0);
                "This is base chat now".to_string()
            }
            Command::Help => help_text(),
        };

        messenger.send_text(chat_id, &reply).await
    }

    /// Text after the command literal and the one separator that follows it.
    /// A `@botname` suffix, as group clients send it, is skipped first.
    fn argument(self, text: &str) -> &str {
        let mut rest = text.strip_prefix(self.prefix()).unwrap_or(text);
        if rest.starts_with('@') {
            rest = &rest[rest.find(char::is_whitespace).unwrap_or(rest.len())..];
        }
        let mut chars = rest.chars();
        chars.next();
        chars.as_str()
    }
}

pub fn help_text() -> String {
    let mut help = String::from("Welcome to the chat tracking bot. Here is a command list:\n");
    for cmd in Command::ALL {
        help.push_str(&format!("{}: {}\n\n", cmd.prefix(), cmd.description()));
    }
    help
}

fn distinct(entries: &[String]) -> Vec<&str> {
    let mut seen = Vec::new();
    for entry in entries {
        if !seen.contains(&entry.as_str()) {
            seen.push(entry.as_str());
        }
    }
    seen
}
