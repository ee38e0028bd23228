//! Rendering of stored events and counters into user-facing text.
//!
//! Authorization happens before these are called; an `Ok(None)` here means
//! "nothing recorded", which callers word differently from a denial.

use crate::db::entities::invite_events::{self, EventType};
use crate::modules::invite_tracking::store::EventStore;
use crate::platform::api::ChatApi;
use crate::Error;
use tracing::warn;

/// Numbered leaderboard for one chat, highest count first, each entry a
/// clickable mention. `Ok(None)` when the chat has no counters yet.
pub async fn build_leaderboard_text(
    api: &dyn ChatApi,
    store: &EventStore,
    chat_id: i64,
) -> Result<Option<String>, Error> {
    let rows = store.leaderboard(chat_id).await?;
    if rows.is_empty() {
        return Ok(None);
    }

    let mut text = String::from("Invite and add leaderboard:\n");
    for (position, row) in rows.iter().enumerate() {
        let name = resolve_name(api, chat_id, row.user_id).await;
        text.push_str(&format!(
            "{}) {} - {}\n",
            position + 1,
            mention(row.user_id, &name),
            row.count
        ));
    }

    Ok(Some(text))
}

/// The most recent `limit` events of one chat, newest first, one line per
/// event. `Ok(None)` when nothing has been recorded.
pub async fn build_history_text(
    api: &dyn ChatApi,
    store: &EventStore,
    chat_id: i64,
    limit: u64,
) -> Result<Option<String>, Error> {
    let events = store.recent_events(chat_id, limit).await?;
    if events.is_empty() {
        return Ok(None);
    }

    let mut lines = Vec::with_capacity(events.len());
    for event in &events {
        lines.push(render_event_line(api, event).await);
    }

    Ok(Some(lines.join("\n")))
}

async fn render_event_line(api: &dyn ChatApi, event: &invite_events::Model) -> String {
    let actor = resolve_participant(api, event.chat_id, event.actor_id).await;
    let target = resolve_participant(api, event.chat_id, event.target_id).await;

    let mut line = format!(
        "{} {}",
        format_timestamp(&event.created_at),
        describe(event.event_type, &actor, &target)
    );

    if let Some(link) = &event.invite_link {
        line.push_str(&format!(" (<a href=\"{}\">link</a>)", escape_html(link)));
    }

    line
}

fn describe(kind: EventType, actor: &str, target: &str) -> String {
    match kind {
        EventType::JoinInvite => format!("{actor} invited {target} with an invite link"),
        EventType::JoinAdded => format!("{actor} added {target}"),
        EventType::JoinUnknown => format!("{target} joined"),
        EventType::LeaveLeft => format!("{target} left"),
        EventType::LeaveRemoved => format!("{actor} removed {target}"),
        EventType::Ban => format!("{actor} banned {target}"),
        EventType::Unban => format!("{actor} unbanned {target}"),
    }
}

async fn resolve_participant(api: &dyn ChatApi, chat_id: i64, user_id: Option<i64>) -> String {
    match user_id {
        Some(user_id) => mention(user_id, &resolve_name(api, chat_id, user_id).await),
        None => "unknown".to_string(),
    }
}

/// Display-name lookup with fallback to the literal id. One failed lookup
/// never aborts the surrounding report.
async fn resolve_name(api: &dyn ChatApi, chat_id: i64, user_id: i64) -> String {
    match api.display_name(chat_id, user_id).await {
        Ok(name) => name,
        Err(e) => {
            warn!("Name lookup failed for user {user_id} in chat {chat_id}: {e}");
            user_id.to_string()
        }
    }
}

fn mention(user_id: i64, name: &str) -> String {
    format!(
        "<a href=\"tg://user?id={user_id}\">{}</a>",
        escape_html(name)
    )
}

/// Stored timestamps are RFC 3339; a row that fails to parse is printed
/// verbatim rather than dropped.
fn format_timestamp(raw: &str) -> String {
    match chrono::DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => ts
            .with_timezone(&chrono::Utc)
            .format("%Y-%m-%d %H:%M:%S UTC")
            .to_string(),
        Err(_) => raw.to_string(),
    }
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
