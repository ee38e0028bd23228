use crate::platform::api::ChatApi;
use crate::platform::types::Message;
use crate::{Data, Error};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{error, info};

static LINK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(https?://|t\.me/|www\.)").unwrap());

pub fn contains_link(text: &str) -> bool {
    LINK_REGEX.is_match(text)
}

/// Delete link and ad messages posted by non-admins in guarded groups.
/// Admin messages and commands pass through untouched.
pub async fn handle_message(api: &dyn ChatApi, message: &Message, data: &Data) -> Result<(), Error> {
    if !message.chat.kind.is_group() {
        return Ok(());
    }

    let chat_id = message.chat.id;
    if !data.auth.is_authorized(chat_id) {
        return Ok(());
    }

    let Some(text) = message.text_content() else {
        return Ok(());
    };
    if text.starts_with('/') || !contains_link(text) {
        return Ok(());
    }

    if let Some(sender) = &message.from {
        if data.auth.is_privileged(api, chat_id, sender.id).await {
            return Ok(());
        }
    }

    info!(
        "Removing link message {} in chat {chat_id}",
        message.message_id
    );
    if let Err(e) = api.delete_message(chat_id, message.message_id).await {
        error!(
            "Failed to delete link message {} in chat {chat_id}: {e}",
            message.message_id
        );
    }

    Ok(())
}
