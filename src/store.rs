use anyhow::{Context, Result};
use std::path::Path;
use teloxide::types::ChatId;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::config::DataPaths;

/// Which of the three backing files an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Keywords,
    Whitelist,
    BaseChat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    Overwrite,
    Append,
}

/// Flat-file configuration: keywords, whitelist and the base chat id.
///
/// The files are the source of truth. The in-memory copies are only valid
/// right after a `reload`, so callers reload before reading. Nothing here
/// locks the files; the webhook serializes access within one process.
#[derive(Debug)]
pub struct ConfigStore {
    paths: DataPaths,
    keywords: Vec<String>,
    whitelist: Vec<String>,
    base_chat: Option<ChatId>,
}

impl ConfigStore {
    /// Create missing files (empty) and load everything.
    pub async fn open(paths: DataPaths) -> Result<Self> {
        for path in [&paths.keywords, &paths.whitelist, &paths.base_chat] {
            ensure_file(path).await?;
        }

        let mut store = Self {
            paths,
            keywords: Vec::new(),
            whitelist: Vec::new(),
            base_chat: None,
        };
        store.reload_all().await?;

        info!(
            "Config store loaded: {} keywords, {} whitelist entries, base chat {:?}",
            store.keywords.len(),
            store.whitelist.len(),
            store.base_chat
        );
        Ok(store)
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn whitelist(&self) -> &[String] {
        &self.whitelist
    }

    pub fn base_chat(&self) -> Option<ChatId> {
        self.base_chat
    }

    fn path(&self, kind: StoreKind) -> &Path {
        match kind {
            StoreKind::Keywords => &self.paths.keywords,
            StoreKind::Whitelist => &self.paths.whitelist,
            StoreKind::BaseChat => &self.paths.base_chat,
        }
    }

    pub async fn reload_all(&mut self) -> Result<()> {
        self.reload(StoreKind::Keywords).await?;
        self.reload(StoreKind::Whitelist).await?;
        self.reload(StoreKind::BaseChat).await
    }

    /// Re-read one file, replacing the in-memory copy entirely.
    pub async fn reload(&mut self, kind: StoreKind) -> Result<()> {
        let path = self.path(kind).to_path_buf();
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;

        match kind {
            StoreKind::Keywords => self.keywords = parse_lines(&content),
            StoreKind::Whitelist => self.whitelist = parse_lines(&content),
            StoreKind::BaseChat => {
                self.base_chat = parse_chat_id(&content)
                    .with_context(|| format!("Invalid chat id in {}", path.display()))?
            }
        }
        Ok(())
    }

    /// Write `content` verbatim to the file for `kind`, then reload it.
    pub async fn save(&mut self, kind: StoreKind, content: &str, mode: SaveMode) -> Result<()> {
        let path = self.path(kind).to_path_buf();
        debug!("Saving {:?} ({:?}) to {}", kind, mode, path.display());

        match mode {
            SaveMode::Overwrite => tokio::fs::write(&path, content)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?,
            SaveMode::Append => {
                let mut file = tokio::fs::OpenOptions::new()
                    .append(true)
                    .open(&path)
                    .await
                    .with_context(|| format!("Failed to open {} for append", path.display()))?;
                file.write_all(content.as_bytes())
                    .await
                    .with_context(|| format!("Failed to append to {}", path.display()))?;
                file.flush().await?;
            }
        }

        self.reload(kind).await
    }

    pub async fn set_base_chat(&mut self, chat_id: ChatId) -> Result<()> {
        self.save(StoreKind::BaseChat, &chat_id.0.to_string(), SaveMode::Overwrite)
            .await
    }
}

async fn ensure_file(path: &Path) -> Result<()> {
    let exists = tokio::fs::try_exists(path)
        .await
        .with_context(|| format!("Failed to check {}", path.display()))?;
    if exists {
        return Ok(());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    tokio::fs::write(path, "")
        .await
        .with_context(|| format!("Failed to create {}", path.display()))?;
    info!("Created empty {}", path.display());
    Ok(())
}

/// One entry per line. Blank lines are skipped so an appended leading
/// newline never turns into an empty keyword that matches everything.
fn parse_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_chat_id(content: &str) -> Result<Option<ChatId>> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let id: i64 = trimmed.parse()?;
    Ok(Some(ChatId(id)))
}
