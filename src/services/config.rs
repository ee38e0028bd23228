use anyhow::Context as _;
use std::collections::HashSet;

/// Static configuration, loaded once at startup. Not mutable at runtime.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub bot_token: String,
    /// Chats the bot is allowed to act in. `None` means all chats.
    pub allowed_chat_ids: Option<HashSet<i64>>,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, crate::Error> {
        let bot_token = std::env::var("BOT_TOKEN").context("BOT_TOKEN must be set")?;

        let allowed_chat_ids = match std::env::var("ALLOWED_CHAT_IDS") {
            Ok(raw) => parse_allowed_chat_ids(&raw)?,
            Err(_) => None,
        };

        Ok(Self {
            bot_token,
            allowed_chat_ids,
        })
    }
}

/// Comma-separated chat id list. Empty segments are tolerated; an empty or
/// blank value means "no restriction".
fn parse_allowed_chat_ids(raw: &str) -> Result<Option<HashSet<i64>>, crate::Error> {
    let mut ids = HashSet::new();

    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let id: i64 = part
            .parse()
            .with_context(|| format!("invalid chat id in ALLOWED_CHAT_IDS: {part:?}"))?;
        ids.insert(id);
    }

    if ids.is_empty() {
        Ok(None)
    } else {
        Ok(Some(ids))
    }
}
