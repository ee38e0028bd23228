use crate::platform::api::ChatApi;
use crate::services::config::BotConfig;
use std::collections::HashSet;
use tracing::warn;

/// Gates every mutating and reporting operation: a static per-chat
/// allow-list plus a live admin-role check.
pub struct AuthService {
    allowed_chat_ids: Option<HashSet<i64>>,
}

impl AuthService {
    pub fn new(config: &BotConfig) -> Self {
        Self {
            allowed_chat_ids: config.allowed_chat_ids.clone(),
        }
    }

    /// Allow-list check. An unset list authorizes every chat.
    pub fn is_authorized(&self, chat_id: i64) -> bool {
        match &self.allowed_chat_ids {
            Some(ids) => ids.contains(&chat_id),
            None => true,
        }
    }

    /// Whether the user holds the administrator or owner role in the chat.
    /// A failed role lookup is treated as "not privileged".
    pub async fn is_privileged(&self, api: &dyn ChatApi, chat_id: i64, user_id: i64) -> bool {
        match api.member_role(chat_id, user_id).await {
            Ok(role) => role.is_privileged(),
            Err(e) => {
                warn!("Role lookup failed for user {user_id} in chat {chat_id}: {e}");
                false
            }
        }
    }
}
