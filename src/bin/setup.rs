//! keyword-relay setup helper.
//!
//! Asks for the bot token, webhook secret and public host, writes `.env` to
//! the project root and seeds the data directory with the three state files.
//! Existing keyword and base-chat files are never overwritten; the whitelist
//! is only written when entries are given.

use anyhow::{Context, Result};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

// ── Env formatting ─────────────────────────────────────────────────────────────

struct EnvParams<'a> {
    bot_token: &'a str,
    webhook_secret: &'a str,
    public_host: &'a str,
    proxy_url: &'a str,
    data_dir: &'a str,
}

/// Produces the `.env` contents. Extracted so it can be unit-tested.
fn format_env(p: &EnvParams<'_>) -> String {
    let proxy_line = if p.proxy_url.is_empty() {
        "# PROXY_URL=http://proxy.server:3128".to_owned()
    } else {
        format!("PROXY_URL={}", p.proxy_url)
    };

    let bot_token = p.bot_token;
    let webhook_secret = p.webhook_secret;
    let public_host = p.public_host;
    let data_dir = p.data_dir;

    format!(
        "BOT_TOKEN={bot_token}
WEBHOOK_SECRET={webhook_secret}
PUBLIC_HOST={public_host}
{proxy_line}
DATA_DIR={data_dir}
# BIND_ADDR=0.0.0.0:8080
# REQUEST_TIMEOUT_SECS=30
# POOL_MAX_IDLE=10
"
    )
}

/// Whitelist file contents from "alice, 12345 bob" style input.
fn format_whitelist(entries: &str) -> String {
    entries
        .split([',', ' '])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Data directory ─────────────────────────────────────────────────────────────

fn seed_data_dir(dir: &Path, whitelist: &str) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Could not create {}", dir.display()))?;

    for name in ["keywords.txt", "whitelist.txt", "base_chat.txt"] {
        let path = dir.join(name);
        if !path.exists() {
            std::fs::write(&path, "")
                .with_context(|| format!("Could not write {}", path.display()))?;
        }
    }

    if !whitelist.is_empty() {
        let path = dir.join("whitelist.txt");
        std::fs::write(&path, whitelist)
            .with_context(|| format!("Could not write {}", path.display()))?;
    }
    Ok(())
}

// ── CLI ────────────────────────────────────────────────────────────────────────

fn run_cli(project_root: &Path) -> Result<()> {
    println!("=== keyword-relay setup ===\n");

    let read_line = |prompt: &str| -> Result<String> {
        print!("{prompt}");
        io::stdout().flush()?;
        let mut buf = String::new();
        io::stdin().read_line(&mut buf)?;
        Ok(buf.trim().to_owned())
    };

    let or_default = |s: String, default: &str| {
        if s.is_empty() {
            default.to_owned()
        } else {
            s
        }
    };

    let bot_token = read_line("Telegram bot token: ")?;
    let webhook_secret = read_line("Webhook secret (URL path segment): ")?;
    let public_host = read_line("Public host (e.g. bot.example.com): ")?;
    let proxy_url = read_line("HTTP proxy URL (optional): ")?;
    let data_dir = or_default(read_line("Data directory [data]: ")?, "data");
    let whitelist = read_line("Admin user ids or usernames (comma-separated, optional): ")?;

    let env = format_env(&EnvParams {
        bot_token: &bot_token,
        webhook_secret: &webhook_secret,
        public_host: &public_host,
        proxy_url: &proxy_url,
        data_dir: &data_dir,
    });

    let env_path = project_root.join(".env");
    std::fs::write(&env_path, &env)
        .with_context(|| format!("Could not write {}", env_path.display()))?;

    let data_path = project_root.join(&data_dir);
    seed_data_dir(&data_path, &format_whitelist(&whitelist))?;

    println!("\n✓  .env saved to {}", env_path.display());
    println!("✓  data files ready in {}", data_path.display());
    println!("   Run the bot with:  cargo run\n");
    Ok(())
}

fn main() -> Result<()> {
    // Resolve project root: prefer KEYWORD_RELAY_ROOT env, fall back to cwd.
    let project_root = PathBuf::from(
        std::env::var("KEYWORD_RELAY_ROOT").unwrap_or_else(|_| ".".to_string()),
    );
    run_cli(&project_root)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn env(proxy_url: &str) -> String {
        format_env(&EnvParams {
            bot_token: "123:abc",
            webhook_secret: "s3cret",
            public_host: "bot.example.com",
            proxy_url,
            data_dir: "data",
        })
    }

    #[test]
    fn test_required_vars_present() {
        let out = env("");
        assert!(out.contains("BOT_TOKEN=123:abc\n"));
        assert!(out.contains("WEBHOOK_SECRET=s3cret\n"));
        assert!(out.contains("PUBLIC_HOST=bot.example.com\n"));
        assert!(out.contains("DATA_DIR=data\n"));
    }

    #[test]
    fn test_proxy_commented_when_empty() {
        assert!(env("").contains("# PROXY_URL="));
        assert!(env("http://proxy:3128").contains("\nPROXY_URL=http://proxy:3128\n"));
    }

    #[test]
    fn test_format_whitelist() {
        assert_eq!(format_whitelist("alice, 123  bob"), "alice\n123\nbob");
        assert_eq!(format_whitelist("  "), "");
    }

    #[test]
    fn test_seed_creates_files_and_keeps_keywords() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("data");
        std::fs::create_dir_all(&data).unwrap();
        std::fs::write(data.join("keywords.txt"), "foo").unwrap();

        seed_data_dir(&data, "alice").unwrap();

        assert_eq!(std::fs::read_to_string(data.join("keywords.txt")).unwrap(), "foo");
        assert_eq!(std::fs::read_to_string(data.join("whitelist.txt")).unwrap(), "alice");
        assert_eq!(std::fs::read_to_string(data.join("base_chat.txt")).unwrap(), "");
    }

    #[test]
    fn test_seed_without_whitelist_keeps_existing() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("whitelist.txt"), "bob").unwrap();
        seed_data_dir(dir.path(), "").unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("whitelist.txt")).unwrap(),
            "bob"
        );
    }
}
