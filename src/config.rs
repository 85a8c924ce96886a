use anyhow::{bail, Context, Result};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const KEYWORDS_FILE: &str = "keywords.txt";
pub const WHITELIST_FILE: &str = "whitelist.txt";
pub const BASE_CHAT_FILE: &str = "base_chat.txt";

#[derive(Debug, Clone)]
pub struct Settings {
    pub telegram: TelegramSettings,
    pub server: ServerSettings,
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct TelegramSettings {
    pub bot_token: String,
    /// Path segment of the webhook route; also keeps the URL unguessable.
    pub webhook_secret: String,
    /// Public hostname Telegram reaches us on, e.g. "bot.example.com".
    pub public_host: String,
    pub proxy_url: Option<String>,
    pub request_timeout: Duration,
    pub pool_max_idle: usize,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub bind_addr: SocketAddr,
}

/// Locations of the three flat files backing the config store.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub keywords: PathBuf,
    pub whitelist: PathBuf,
    pub base_chat: PathBuf,
}

impl DataPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            keywords: dir.join(KEYWORDS_FILE),
            whitelist: dir.join(WHITELIST_FILE),
            base_chat: dir.join(BASE_CHAT_FILE),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_pool_max_idle() -> usize {
    10
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            get(key).with_context(|| format!("Missing required environment variable {key}"))
        };

        let bot_token = require("BOT_TOKEN")?;
        let webhook_secret = require("WEBHOOK_SECRET")?;
        let public_host = require("PUBLIC_HOST")?;

        // Becomes a literal route segment, so only URL-safe characters
        if !webhook_secret
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            bail!("WEBHOOK_SECRET may only contain A-Z, a-z, 0-9, '_' and '-'");
        }

        let bind_addr = match get("BIND_ADDR") {
            Some(v) => v
                .parse()
                .with_context(|| format!("Invalid BIND_ADDR: {v}"))?,
            None => default_bind_addr(),
        };

        let request_timeout = match get("REQUEST_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(
                v.parse()
                    .with_context(|| format!("Invalid REQUEST_TIMEOUT_SECS: {v}"))?,
            ),
            None => default_request_timeout(),
        };

        let pool_max_idle = match get("POOL_MAX_IDLE") {
            Some(v) => v
                .parse()
                .with_context(|| format!("Invalid POOL_MAX_IDLE: {v}"))?,
            None => default_pool_max_idle(),
        };

        Ok(Self {
            telegram: TelegramSettings {
                bot_token,
                webhook_secret,
                public_host: public_host.trim_end_matches('/').to_string(),
                proxy_url: get("PROXY_URL"),
                request_timeout,
                pool_max_idle,
            },
            server: ServerSettings { bind_addr },
            data_dir: get("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(default_data_dir),
        })
    }

    pub fn data_paths(&self) -> DataPaths {
        DataPaths::in_dir(&self.data_dir)
    }
}

impl TelegramSettings {
    pub fn webhook_path(&self) -> String {
        format!("/{}", self.webhook_secret)
    }

    pub fn webhook_url(&self) -> String {
        format!("https://{}/{}", self.public_host, self.webhook_secret)
    }
}
