use crate::modules::invite_tracking::reports;
use crate::platform::api::{ChatApi, RenderMode};
use crate::platform::types::{ChatKind, Message};
use crate::{Data, Error};
use tracing::{error, info};

const DEFAULT_HISTORY_LIMIT: i64 = 20;
const MAX_HISTORY_LIMIT: i64 = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Stats,
    History { args: String },
    Start,
    ChatId,
}

/// Parse a command out of a text message. Accepts the `/command@botname`
/// form used in groups. Captions never carry commands.
pub fn parse(message: &Message) -> Option<Command> {
    let text = message.text.as_deref()?.trim();
    if !text.starts_with('/') {
        return None;
    }

    let mut parts = text.splitn(2, char::is_whitespace);
    let head = parts.next()?;
    let args = parts.next().unwrap_or("").trim();
    let name = head[1..].split('@').next()?;

    match name {
        "stats" => Some(Command::Stats),
        "history" => Some(Command::History {
            args: args.to_string(),
        }),
        "start" => Some(Command::Start),
        "chat_id" => Some(Command::ChatId),
        _ => None,
    }
}

pub async fn handle(
    api: &dyn ChatApi,
    message: &Message,
    command: Command,
    data: &Data,
) -> Result<(), Error> {
    match command {
        Command::Stats => handle_stats(api, message, data).await,
        Command::History { args } => handle_history(api, message, &args, data).await,
        Command::Start => handle_start(api, message, data).await,
        Command::ChatId => handle_chat_id(api, message, data).await,
    }
}

/// `/stats`: the invite leaderboard of the current chat. Admin-only in
/// groups; the invoking command message is removed there either way.
async fn handle_stats(api: &dyn ChatApi, message: &Message, data: &Data) -> Result<(), Error> {
    if message.chat.kind.is_group() {
        if !invoker_is_admin(api, message, data).await {
            info!("Stats denied (not admin): chat_id={}", message.chat.id);
            warn_and_cleanup_non_admin_command(api, message).await;
            return Ok(());
        }
    }

    send_stats(api, message, data).await?;

    if message.chat.kind.is_group() {
        delete_command_message(api, message).await;
    }

    Ok(())
}

async fn send_stats(api: &dyn ChatApi, message: &Message, data: &Data) -> Result<(), Error> {
    let chat_id = message.chat.id;
    if !data.auth.is_authorized(chat_id) {
        return Ok(());
    }

    info!(
        "Stats request: chat_id={chat_id} from_user={:?}",
        message.from.as_ref().map(|user| user.id)
    );

    match reports::build_leaderboard_text(api, &data.store, chat_id).await? {
        Some(text) => send_best_effort(api, chat_id, &text, RenderMode::Html).await,
        None => {
            info!("Stats empty: chat_id={chat_id}");
            send_best_effort(
                api,
                chat_id,
                "No invite or add activity recorded yet.",
                RenderMode::Plain,
            )
            .await;
        }
    }

    Ok(())
}

/// `/history <chat_id> [limit]`: recent membership events of a guarded
/// chat. Private context only; the invoker must be an admin of the target
/// chat and the target chat must be authorized.
async fn handle_history(
    api: &dyn ChatApi,
    message: &Message,
    args: &str,
    data: &Data,
) -> Result<(), Error> {
    if message.chat.kind != ChatKind::Private {
        if !invoker_is_admin(api, message, data).await {
            warn_and_cleanup_non_admin_command(api, message).await;
            return Ok(());
        }
        delete_command_message(api, message).await;
        if let Some(user) = &message.from {
            send_best_effort(
                api,
                user.id,
                "The /history command works in a private chat only.",
                RenderMode::Plain,
            )
            .await;
        }
        return Ok(());
    }

    let reply_to = message.chat.id;

    let Some((target_chat_id, limit)) = parse_history_args(args) else {
        send_best_effort(
            api,
            reply_to,
            "Usage: /history <chat_id> [limit]",
            RenderMode::Plain,
        )
        .await;
        return Ok(());
    };

    let Some(invoker) = &message.from else {
        return Ok(());
    };

    // One generic denial for both failure modes, so the reply does not leak
    // whether the chat is guarded at all.
    if !data.auth.is_authorized(target_chat_id)
        || !data.auth.is_privileged(api, target_chat_id, invoker.id).await
    {
        info!(
            "History denied: target_chat={target_chat_id} user_id={}",
            invoker.id
        );
        send_best_effort(
            api,
            reply_to,
            "You cannot view the history of that chat.",
            RenderMode::Plain,
        )
        .await;
        return Ok(());
    }

    match reports::build_history_text(api, &data.store, target_chat_id, limit).await? {
        Some(text) => send_best_effort(api, reply_to, &text, RenderMode::Html).await,
        None => {
            send_best_effort(
                api,
                reply_to,
                "No events recorded for that chat yet.",
                RenderMode::Plain,
            )
            .await;
        }
    }

    Ok(())
}

/// Arguments are a required integer chat id and an optional limit, clamped
/// to [1, 200]. Anything else is a usage error.
fn parse_history_args(args: &str) -> Option<(i64, u64)> {
    let mut parts = args.split_whitespace();

    let chat_id: i64 = parts.next()?.parse().ok()?;
    let limit: i64 = match parts.next() {
        Some(raw) => raw.parse().ok()?,
        None => DEFAULT_HISTORY_LIMIT,
    };
    if parts.next().is_some() {
        return None;
    }

    Some((chat_id, limit.clamp(1, MAX_HISTORY_LIMIT) as u64))
}

async fn handle_start(api: &dyn ChatApi, message: &Message, data: &Data) -> Result<(), Error> {
    if message.chat.kind.is_group() {
        if !invoker_is_admin(api, message, data).await {
            warn_and_cleanup_non_admin_command(api, message).await;
            return Ok(());
        }
        delete_command_message(api, message).await;
        return Ok(());
    }

    send_best_effort(
        api,
        message.chat.id,
        "Hi! Forward me a message and I will show what is known about its origin. \
         If nothing shows up, the message was protected or sent as a plain copy.",
        RenderMode::Plain,
    )
    .await;

    Ok(())
}

async fn handle_chat_id(api: &dyn ChatApi, message: &Message, data: &Data) -> Result<(), Error> {
    let text = format!("Chat ID: {}", message.chat.id);

    if message.chat.kind.is_group() {
        if !invoker_is_admin(api, message, data).await {
            warn_and_cleanup_non_admin_command(api, message).await;
            return Ok(());
        }
        delete_command_message(api, message).await;
        if let Some(user) = &message.from {
            send_best_effort(api, user.id, &text, RenderMode::Plain).await;
        }
        return Ok(());
    }

    send_best_effort(api, message.chat.id, &text, RenderMode::Plain).await;
    Ok(())
}

async fn invoker_is_admin(api: &dyn ChatApi, message: &Message, data: &Data) -> bool {
    match &message.from {
        Some(user) => data.auth.is_privileged(api, message.chat.id, user.id).await,
        None => false,
    }
}

/// Non-admins must not run commands in guarded groups: drop the command
/// message and warn the sender privately. Both steps are best-effort.
async fn warn_and_cleanup_non_admin_command(api: &dyn ChatApi, message: &Message) {
    if !message.chat.kind.is_group() {
        return;
    }

    delete_command_message(api, message).await;

    if let Some(user) = &message.from {
        if let Err(e) = api
            .send_text(
                user.id,
                "Please do not send commands in this group.",
                RenderMode::Plain,
            )
            .await
        {
            info!(
                "Failed to warn non-admin: chat_id={} user_id={} ({e})",
                message.chat.id, user.id
            );
        }
    }
}

async fn delete_command_message(api: &dyn ChatApi, message: &Message) {
    if let Err(e) = api.delete_message(message.chat.id, message.message_id).await {
        error!(
            "Failed to delete command message: chat_id={} ({e})",
            message.chat.id
        );
    }
}

async fn send_best_effort(api: &dyn ChatApi, target_id: i64, text: &str, mode: RenderMode) {
    if let Err(e) = api.send_text(target_id, text, mode).await {
        error!("Failed to send message to {target_id}: {e}");
    }
}
