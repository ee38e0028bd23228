use crate::platform::api::{ChatApi, RenderMode};
use crate::platform::types::{ChatKind, Message};
use crate::{Data, Error};
use tracing::{debug, error};

/// Reply to a forwarded message with whatever origin metadata survived.
/// Mainly a private-chat tool; in groups it only runs for authorized chats.
pub async fn handle_message(api: &dyn ChatApi, message: &Message, data: &Data) -> Result<(), Error> {
    let chat = &message.chat;
    if chat.kind != ChatKind::Private && !data.auth.is_authorized(chat.id) {
        return Ok(());
    }

    debug!(
        "Forward handler: chat_id={} has_origin={} has_from_chat={} has_from={} has_sender_name={}",
        chat.id,
        message.forward_origin.is_some(),
        message.forward_from_chat.is_some(),
        message.forward_from.is_some(),
        message.forward_sender_name.is_some(),
    );

    let reply = match build_forward_report(message) {
        Some(report) => report,
        None => {
            if chat.kind != ChatKind::Private {
                return Ok(());
            }
            "No forward details found. The message is probably protected or was \
             sent as a plain copy. Please forward the message directly."
                .to_string()
        }
    };

    if let Err(e) = api.send_text(chat.id, &reply, RenderMode::Plain).await {
        error!("Forward reply failed: chat_id={} ({e})", chat.id);
    }

    Ok(())
}

/// One line per piece of surviving forward metadata, `None` when the
/// message carried nothing beyond its own chat id.
pub fn build_forward_report(message: &Message) -> Option<String> {
    let mut parts = vec!["Forwarded message details:".to_string()];

    if let Some(origin) = &message.forward_origin {
        parts.push(format!("Origin type: {}", origin.kind));

        if let Some(user) = &origin.sender_user {
            parts.push(format!("Origin user ID: {}", user.id));
            parts.push(format!("Origin name: {}", user.full_name()));
        }

        if let Some(chat) = &origin.sender_chat {
            parts.push(format!("Origin chat ID: {}", chat.id));
            if let Some(title) = &chat.title {
                parts.push(format!("Origin chat title: {title}"));
            }
            if let Some(username) = &chat.username {
                parts.push(format!("Origin chat username: @{username}"));
            }
        }

        if let Some(name) = &origin.sender_user_name {
            parts.push(format!("Origin display name: {name}"));
        }
    }

    if let Some(chat) = &message.forward_from_chat {
        parts.push(format!("Forward chat ID: {}", chat.id));
        if let Some(title) = &chat.title {
            parts.push(format!("Forward chat title: {title}"));
        }
        if let Some(username) = &chat.username {
            parts.push(format!("Forward chat username: @{username}"));
        }
    }

    if let Some(user) = &message.forward_from {
        parts.push(format!("Forward user ID: {}", user.id));
        parts.push(format!("Forward name: {}", user.full_name()));
    }

    if let Some(date) = message.forward_date {
        let rendered = chrono::DateTime::from_timestamp(date, 0)
            .map(|ts| ts.to_rfc3339())
            .unwrap_or_else(|| date.to_string());
        parts.push(format!("Forwarded at (UTC): {rendered}"));
    }

    if let Some(id) = message.forward_from_message_id {
        parts.push(format!("Forward message ID: {id}"));
    }

    if let Some(name) = &message.forward_sender_name {
        parts.push(format!("Forward sender name: {name}"));
    }

    if let Some(signature) = &message.forward_signature {
        parts.push(format!("Forward signature: {signature}"));
    }

    parts.push(format!("Current chat ID: {}", message.chat.id));

    // Header plus our own chat id means nothing survived.
    if parts.len() == 2 {
        return None;
    }

    Some(parts.join("\n"))
}
