use crate::db::entities::invite_events::EventType;
use crate::modules::invite_tracking::classifier;
use crate::platform::api::ChatApi;
use crate::platform::types::{ChatMemberUpdated, Message};
use crate::{Data, Error};
use tracing::{debug, error, info};

/// New members joined. Classify each join, persist it together with its
/// credit, then clean up the service message.
pub async fn handle_new_members(
    api: &dyn ChatApi,
    message: &Message,
    data: &Data,
) -> Result<(), Error> {
    let chat_id = message.chat.id;
    if !data.auth.is_authorized(chat_id) {
        return Ok(());
    }

    for member in &message.new_chat_members {
        let event = classifier::classify_join(
            chat_id,
            message.invite_link.as_ref(),
            message.from.as_ref(),
            member,
        );

        if event.kind == EventType::JoinUnknown {
            info!(
                "Join without invite or adder: chat_id={chat_id} user_id={}",
                member.id
            );
        }

        let id = data.store.record(&event).await?;
        debug!("Recorded {} event {id} in chat {chat_id}", event.kind);
    }

    delete_service_message(api, message).await;
    Ok(())
}

/// A member left or was removed.
pub async fn handle_member_left(
    api: &dyn ChatApi,
    message: &Message,
    data: &Data,
) -> Result<(), Error> {
    let Some(target) = &message.left_chat_member else {
        return Ok(());
    };

    let chat_id = message.chat.id;
    if !data.auth.is_authorized(chat_id) {
        return Ok(());
    }

    let event = classifier::classify_leave(chat_id, message.from.as_ref(), target);
    data.store.record(&event).await?;

    delete_service_message(api, message).await;
    Ok(())
}

/// A membership-status transition. Only transitions touching the kicked
/// state are recorded; everything else already arrives through the join and
/// leave service messages.
pub async fn handle_status_change(
    _api: &dyn ChatApi,
    change: &ChatMemberUpdated,
    data: &Data,
) -> Result<(), Error> {
    let chat_id = change.chat.id;
    if !data.auth.is_authorized(chat_id) {
        return Ok(());
    }

    let target = &change.new_chat_member.user;
    let Some(event) = classifier::classify_status_change(
        chat_id,
        change.from.as_ref(),
        target,
        change.old_chat_member.status,
        change.new_chat_member.status,
    ) else {
        return Ok(());
    };

    info!(
        "Recording {} for user {} in chat {chat_id}",
        event.kind, target.id
    );
    data.store.record(&event).await?;

    Ok(())
}

// Join/leave service messages are noise in guarded chats; removal is
// best-effort.
async fn delete_service_message(api: &dyn ChatApi, message: &Message) {
    if let Err(e) = api.delete_message(message.chat.id, message.message_id).await {
        error!(
            "Failed to delete service message {} in chat {}: {e}",
            message.message_id, message.chat.id
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::Migrator;
    use crate::modules::invite_tracking::store::EventStore;
    use crate::platform::api::{PlatformError, RenderMode};
    use crate::platform::types::{Chat, ChatInviteLink, ChatKind, ChatMember, MemberStatus, User};
    use crate::services::authorizer::AuthService;
    use crate::services::config::BotConfig;
    use async_trait::async_trait;
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;
    use std::sync::Mutex;

    const CHAT: i64 = -100123;

    #[derive(Default)]
    struct RecordingApi {
        deleted: Mutex<Vec<(i64, i64)>>,
    }

    #[async_trait]
    impl ChatApi for RecordingApi {
        async fn member_role(&self, _: i64, _: i64) -> Result<MemberStatus, PlatformError> {
            Ok(MemberStatus::Member)
        }

        async fn display_name(&self, _: i64, user_id: i64) -> Result<String, PlatformError> {
            Ok(user_id.to_string())
        }

        async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), PlatformError> {
            self.deleted.lock().unwrap().push((chat_id, message_id));
            Ok(())
        }

        async fn send_text(&self, _: i64, _: &str, _: RenderMode) -> Result<(), PlatformError> {
            Ok(())
        }
    }

    async fn test_data(allowed: Option<Vec<i64>>) -> Data {
        let mut opt = sea_orm::ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1);

        let db = Database::connect(opt).await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        let config = BotConfig {
            bot_token: "test-token".to_string(),
            allowed_chat_ids: allowed.map(|ids| ids.into_iter().collect()),
        };

        Data {
            auth: AuthService::new(&config),
            store: EventStore::new(db),
        }
    }

    fn user(id: i64) -> User {
        User {
            id,
            first_name: format!("user-{id}"),
            last_name: None,
        }
    }

    fn group_chat() -> Chat {
        Chat {
            id: CHAT,
            kind: ChatKind::Supergroup,
            title: Some("Guarded".to_string()),
            username: None,
        }
    }

    fn join_message(adder: Option<User>, invite: Option<ChatInviteLink>, members: Vec<User>) -> Message {
        Message {
            message_id: 42,
            chat: group_chat(),
            from: adder,
            text: None,
            caption: None,
            new_chat_members: members,
            left_chat_member: None,
            invite_link: invite,
            forward_origin: None,
            forward_from: None,
            forward_from_chat: None,
            forward_from_message_id: None,
            forward_sender_name: None,
            forward_signature: None,
            forward_date: None,
        }
    }

    #[tokio::test]
    async fn invite_link_join_records_event_and_credit() {
        let data = test_data(None).await;
        let api = RecordingApi::default();

        let invite = ChatInviteLink {
            url: Some("https://t.me/+abc".to_string()),
            creator: Some(user(10)),
        };
        let message = join_message(Some(user(20)), Some(invite), vec![user(20)]);

        handle_new_members(&api, &message, &data).await.unwrap();

        let events = data.store.recent_events(CHAT, 10).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EventType::JoinInvite);
        assert_eq!(events[0].actor_id, Some(10));
        assert_eq!(events[0].target_id, Some(20));

        let counters = data.store.leaderboard(CHAT).await.unwrap();
        assert_eq!((counters[0].user_id, counters[0].count), (10, 1));

        // Service message cleaned up.
        assert_eq!(*api.deleted.lock().unwrap(), vec![(CHAT, 42)]);
    }

    #[tokio::test]
    async fn manual_add_credits_the_adder() {
        let data = test_data(None).await;
        let api = RecordingApi::default();

        let message = join_message(Some(user(30)), None, vec![user(20)]);
        handle_new_members(&api, &message, &data).await.unwrap();

        let events = data.store.recent_events(CHAT, 10).await.unwrap();
        assert_eq!(events[0].event_type, EventType::JoinAdded);

        let counters = data.store.leaderboard(CHAT).await.unwrap();
        assert_eq!((counters[0].user_id, counters[0].count), (30, 1));
    }

    #[tokio::test]
    async fn self_join_records_join_unknown_without_credit() {
        let data = test_data(None).await;
        let api = RecordingApi::default();

        let message = join_message(Some(user(20)), None, vec![user(20)]);
        handle_new_members(&api, &message, &data).await.unwrap();

        let events = data.store.recent_events(CHAT, 10).await.unwrap();
        assert_eq!(events[0].event_type, EventType::JoinUnknown);
        assert_eq!(events[0].actor_id, None);
        assert!(data.store.leaderboard(CHAT).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unauthorized_chat_has_no_side_effects() {
        let data = test_data(Some(vec![-999])).await;
        let api = RecordingApi::default();

        let message = join_message(Some(user(30)), None, vec![user(20)]);
        handle_new_members(&api, &message, &data).await.unwrap();

        assert!(data.store.recent_events(CHAT, 10).await.unwrap().is_empty());
        assert!(data.store.leaderboard(CHAT).await.unwrap().is_empty());
        assert!(api.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn removal_by_admin_records_leave_removed() {
        let data = test_data(None).await;
        let api = RecordingApi::default();

        let mut message = join_message(Some(user(30)), None, vec![]);
        message.left_chat_member = Some(user(20));

        handle_member_left(&api, &message, &data).await.unwrap();

        let events = data.store.recent_events(CHAT, 10).await.unwrap();
        assert_eq!(events[0].event_type, EventType::LeaveRemoved);
        assert_eq!(events[0].actor_id, Some(30));
        assert!(data.store.leaderboard(CHAT).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn kick_transition_records_ban() {
        let data = test_data(None).await;
        let api = RecordingApi::default();

        let change = ChatMemberUpdated {
            chat: group_chat(),
            from: Some(user(10)),
            old_chat_member: ChatMember {
                status: MemberStatus::Member,
                user: user(20),
            },
            new_chat_member: ChatMember {
                status: MemberStatus::Kicked,
                user: user(20),
            },
        };

        handle_status_change(&api, &change, &data).await.unwrap();

        let events = data.store.recent_events(CHAT, 10).await.unwrap();
        assert_eq!(events[0].event_type, EventType::Ban);
        assert_eq!(events[0].actor_id, Some(10));
    }

    #[tokio::test]
    async fn promotion_transition_records_nothing() {
        let data = test_data(None).await;
        let api = RecordingApi::default();

        let change = ChatMemberUpdated {
            chat: group_chat(),
            from: Some(user(10)),
            old_chat_member: ChatMember {
                status: MemberStatus::Member,
                user: user(20),
            },
            new_chat_member: ChatMember {
                status: MemberStatus::Administrator,
                user: user(20),
            },
        };

        handle_status_change(&api, &change, &data).await.unwrap();
        assert!(data.store.recent_events(CHAT, 10).await.unwrap().is_empty());
    }
}
