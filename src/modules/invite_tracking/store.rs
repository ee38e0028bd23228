use crate::db::entities::{invite_events, invites};
use crate::modules::invite_tracking::classifier::MemberEvent;
use crate::Error;
use chrono::{SecondsFormat, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

/// Persistence for the audit log and the derived invite counters. The store
/// owns all rows exclusively; everything else goes through it.
#[derive(Clone)]
pub struct EventStore {
    db: DatabaseConnection,
}

impl EventStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Append one classified event and, when it credits an actor, apply
    /// exactly one counter increment. Both writes commit together or not at
    /// all. Returns the assigned event id.
    pub async fn record(&self, event: &MemberEvent) -> Result<i64, Error> {
        let txn = self.db.begin().await?;

        let id = Self::append_with(&txn, event).await?;
        if let Some(actor_id) = event.credited_actor() {
            Self::increment_with(&txn, actor_id, event.chat_id).await?;
        }

        txn.commit().await?;
        Ok(id)
    }

    /// Append without touching the counters.
    pub async fn append(&self, event: &MemberEvent) -> Result<i64, Error> {
        Self::append_with(&self.db, event).await
    }

    pub async fn increment_invite(&self, user_id: i64, chat_id: i64) -> Result<(), Error> {
        Self::increment_with(&self.db, user_id, chat_id).await
    }

    async fn append_with<C: ConnectionTrait>(conn: &C, event: &MemberEvent) -> Result<i64, Error> {
        let row = invite_events::ActiveModel {
            chat_id: Set(event.chat_id),
            event_type: Set(event.kind),
            actor_id: Set(event.actor_id),
            target_id: Set(event.target_id),
            invite_creator_id: Set(event.invite_creator_id),
            invite_link: Set(event.invite_link.clone()),
            created_at: Set(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
            ..Default::default()
        };

        let result = invite_events::Entity::insert(row).exec(conn).await?;
        Ok(result.last_insert_id)
    }

    // Single atomic upsert so concurrent credits for the same key cannot
    // lose updates.
    async fn increment_with<C: ConnectionTrait>(
        conn: &C,
        user_id: i64,
        chat_id: i64,
    ) -> Result<(), Error> {
        let row = invites::ActiveModel {
            user_id: Set(user_id),
            chat_id: Set(chat_id),
            count: Set(1),
        };

        invites::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([invites::Column::UserId, invites::Column::ChatId])
                    .value(
                        invites::Column::Count,
                        Expr::col(invites::Column::Count).add(1),
                    )
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;

        Ok(())
    }

    /// All counter rows for a chat, highest count first. Ties break on
    /// ascending user id so repeated reads are stable.
    pub async fn leaderboard(&self, chat_id: i64) -> Result<Vec<invites::Model>, Error> {
        let rows = invites::Entity::find()
            .filter(invites::Column::ChatId.eq(chat_id))
            .order_by_desc(invites::Column::Count)
            .order_by_asc(invites::Column::UserId)
            .all(&self.db)
            .await?;

        Ok(rows)
    }

    /// The most recent `limit` events for a chat, newest first by id.
    /// Callers clamp user input to [1, 200]; a zero limit here is a caller
    /// bug and is rejected.
    pub async fn recent_events(
        &self,
        chat_id: i64,
        limit: u64,
    ) -> Result<Vec<invite_events::Model>, Error> {
        anyhow::ensure!(limit > 0, "event history limit must be positive");

        let rows = invite_events::Entity::find()
            .filter(invite_events::Column::ChatId.eq(chat_id))
            .order_by_desc(invite_events::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok(rows)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::entities::invite_events::EventType;
    use crate::db::migrations::Migrator;
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    const CHAT: i64 = -100123;

    pub(crate) async fn memory_store() -> EventStore {
        // One pooled connection, so every query sees the same in-memory db.
        let mut opt = sea_orm::ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1);

        let db = Database::connect(opt).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        EventStore::new(db)
    }

    pub(crate) fn event(kind: EventType, actor_id: Option<i64>, target_id: i64) -> MemberEvent {
        MemberEvent {
            chat_id: CHAT,
            kind,
            actor_id,
            target_id: Some(target_id),
            invite_creator_id: None,
            invite_link: None,
        }
    }

    #[tokio::test]
    async fn append_assigns_monotonic_ids() {
        let store = memory_store().await;

        let first = store
            .append(&event(EventType::JoinUnknown, None, 20))
            .await
            .unwrap();
        let second = store
            .append(&event(EventType::LeaveLeft, Some(20), 20))
            .await
            .unwrap();

        assert!(second > first);

        let rows = store.recent_events(CHAT, 10).await.unwrap();
        assert_eq!(rows.len(), 2);
        // Stamped timestamps parse back as RFC 3339.
        for row in &rows {
            chrono::DateTime::parse_from_rfc3339(&row.created_at).unwrap();
        }
    }

    #[tokio::test]
    async fn increment_creates_then_accumulates() {
        let store = memory_store().await;

        store.increment_invite(10, CHAT).await.unwrap();
        store.increment_invite(10, CHAT).await.unwrap();
        store.increment_invite(10, CHAT).await.unwrap();

        let rows = store.leaderboard(CHAT).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_id, 10);
        assert_eq!(rows[0].count, 3);
    }

    #[tokio::test]
    async fn counters_are_scoped_per_chat() {
        let store = memory_store().await;

        store.increment_invite(10, CHAT).await.unwrap();
        store.increment_invite(10, -200).await.unwrap();

        let rows = store.leaderboard(CHAT).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].count, 1);
    }

    #[tokio::test]
    async fn record_crediting_event_updates_both_tables() {
        let store = memory_store().await;

        let mut invited = event(EventType::JoinInvite, Some(10), 20);
        invited.invite_creator_id = Some(10);
        invited.invite_link = Some("https://t.me/+abc".to_string());
        store.record(&invited).await.unwrap();

        let events = store.recent_events(CHAT, 10).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EventType::JoinInvite);
        assert_eq!(events[0].actor_id, Some(10));
        assert_eq!(events[0].invite_link.as_deref(), Some("https://t.me/+abc"));

        let counters = store.leaderboard(CHAT).await.unwrap();
        assert_eq!(counters.len(), 1);
        assert_eq!((counters[0].user_id, counters[0].count), (10, 1));
    }

    #[tokio::test]
    async fn record_join_added_credits_the_adder() {
        let store = memory_store().await;

        store
            .record(&event(EventType::JoinAdded, Some(30), 20))
            .await
            .unwrap();

        let counters = store.leaderboard(CHAT).await.unwrap();
        assert_eq!((counters[0].user_id, counters[0].count), (30, 1));
    }

    #[tokio::test]
    async fn record_join_unknown_leaves_counters_untouched() {
        let store = memory_store().await;

        store
            .record(&event(EventType::JoinUnknown, None, 20))
            .await
            .unwrap();

        assert_eq!(store.recent_events(CHAT, 10).await.unwrap().len(), 1);
        assert!(store.leaderboard(CHAT).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn record_leave_and_ban_events_never_credit() {
        let store = memory_store().await;

        store
            .record(&event(EventType::LeaveRemoved, Some(30), 20))
            .await
            .unwrap();
        store
            .record(&event(EventType::Ban, Some(30), 20))
            .await
            .unwrap();

        assert!(store.leaderboard(CHAT).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn leaderboard_orders_by_count_then_user_id() {
        let store = memory_store().await;

        store.increment_invite(30, CHAT).await.unwrap();
        store.increment_invite(10, CHAT).await.unwrap();
        store.increment_invite(10, CHAT).await.unwrap();
        store.increment_invite(20, CHAT).await.unwrap();

        let first = store.leaderboard(CHAT).await.unwrap();
        let order: Vec<(i64, i32)> = first.iter().map(|r| (r.user_id, r.count)).collect();
        assert_eq!(order, vec![(10, 2), (20, 1), (30, 1)]);

        // Stable across repeated reads with no intervening writes.
        let second = store.leaderboard(CHAT).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn recent_events_returns_newest_first_capped_at_limit() {
        let store = memory_store().await;

        let mut ids = Vec::new();
        for target in 1..=5 {
            ids.push(
                store
                    .append(&event(EventType::JoinUnknown, None, target))
                    .await
                    .unwrap(),
            );
        }

        let rows = store.recent_events(CHAT, 3).await.unwrap();
        assert_eq!(rows.len(), 3);
        let got: Vec<i64> = rows.iter().map(|r| r.id).collect();
        assert_eq!(got, vec![ids[4], ids[3], ids[2]]);
    }

    #[tokio::test]
    async fn reading_with_large_limit_returns_all_in_reverse_order() {
        let store = memory_store().await;

        let mut ids = Vec::new();
        for target in 1..=4 {
            ids.push(
                store
                    .append(&event(EventType::JoinUnknown, None, target))
                    .await
                    .unwrap(),
            );
        }

        let rows = store.recent_events(CHAT, 100).await.unwrap();
        let got: Vec<i64> = rows.iter().map(|r| r.id).collect();
        ids.reverse();
        assert_eq!(got, ids);
    }

    #[tokio::test]
    async fn zero_limit_is_a_precondition_violation() {
        let store = memory_store().await;
        assert!(store.recent_events(CHAT, 0).await.is_err());
    }
}
