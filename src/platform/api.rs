use crate::platform::types::{ChatMember, MemberStatus, Update};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Failure talking to the chat platform. Callers treat any variant the same
/// way: single attempt, degrade (fail-closed roles, fallback names), never
/// retry inside a handler.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("platform rejected request: {0}")]
    Api(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Plain,
    /// HTML markup, used for clickable member mentions.
    Html,
}

/// The chat-platform collaborator consumed by handlers and reports. Live
/// traffic goes through [`BotApi`]; tests substitute in-process fakes.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn member_role(&self, chat_id: i64, user_id: i64) -> Result<MemberStatus, PlatformError>;

    async fn display_name(&self, chat_id: i64, user_id: i64) -> Result<String, PlatformError>;

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), PlatformError>;

    async fn send_text(
        &self,
        target_id: i64,
        text: &str,
        mode: RenderMode,
    ) -> Result<(), PlatformError>;
}

/// HTTP client for the Bot API.
pub struct BotApi {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

impl BotApi {
    pub fn new(token: String) -> Self {
        let client = reqwest::Client::builder()
            // Above the long-poll timeout, so getUpdates is not cut off.
            .timeout(Duration::from_secs(45))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: format!("https://api.telegram.org/bot{token}"),
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: serde_json::Value,
    ) -> Result<T, PlatformError> {
        let response = self
            .client
            .post(format!("{}/{method}", self.base_url))
            .json(&payload)
            .send()
            .await?;

        let body: ApiResponse<T> = response.json().await?;

        if body.ok {
            body.result
                .ok_or_else(|| PlatformError::Api("response missing result".to_string()))
        } else {
            Err(PlatformError::Api(
                body.description
                    .unwrap_or_else(|| "unknown error".to_string()),
            ))
        }
    }

    /// Long-poll for new updates. `chat_member` must be requested explicitly,
    /// the platform does not deliver it by default.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout: u64,
    ) -> Result<Vec<Update>, PlatformError> {
        let mut payload = json!({
            "timeout": timeout,
            "allowed_updates": ["message", "chat_member"],
        });
        if let Some(offset) = offset {
            payload["offset"] = json!(offset);
        }

        self.call("getUpdates", payload).await
    }

    async fn get_chat_member(&self, chat_id: i64, user_id: i64) -> Result<ChatMember, PlatformError> {
        self.call(
            "getChatMember",
            json!({"chat_id": chat_id, "user_id": user_id}),
        )
        .await
    }
}

#[async_trait]
impl ChatApi for BotApi {
    async fn member_role(&self, chat_id: i64, user_id: i64) -> Result<MemberStatus, PlatformError> {
        Ok(self.get_chat_member(chat_id, user_id).await?.status)
    }

    async fn display_name(&self, chat_id: i64, user_id: i64) -> Result<String, PlatformError> {
        Ok(self.get_chat_member(chat_id, user_id).await?.user.full_name())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), PlatformError> {
        self.call::<bool>(
            "deleteMessage",
            json!({"chat_id": chat_id, "message_id": message_id}),
        )
        .await?;
        Ok(())
    }

    async fn send_text(
        &self,
        target_id: i64,
        text: &str,
        mode: RenderMode,
    ) -> Result<(), PlatformError> {
        let mut payload = json!({
            "chat_id": target_id,
            "text": text,
        });
        if mode == RenderMode::Html {
            payload["parse_mode"] = json!("HTML");
            payload["disable_web_page_preview"] = json!(true);
        }

        self.call::<serde_json::Value>("sendMessage", payload).await?;
        Ok(())
    }
}
