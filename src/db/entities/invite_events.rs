use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Closed taxonomy of membership-change events. Anything the classifier
/// cannot attribute stays inside this set (`JoinUnknown`), it never grows
/// ad hoc values at runtime.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum EventType {
    #[sea_orm(string_value = "join_invite")]
    JoinInvite,
    #[sea_orm(string_value = "join_added")]
    JoinAdded,
    #[sea_orm(string_value = "join_unknown")]
    JoinUnknown,
    #[sea_orm(string_value = "leave_left")]
    LeaveLeft,
    #[sea_orm(string_value = "leave_removed")]
    LeaveRemoved,
    #[sea_orm(string_value = "ban")]
    Ban,
    #[sea_orm(string_value = "unban")]
    Unban,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventType::JoinInvite => write!(f, "join_invite"),
            EventType::JoinAdded => write!(f, "join_added"),
            EventType::JoinUnknown => write!(f, "join_unknown"),
            EventType::LeaveLeft => write!(f, "leave_left"),
            EventType::LeaveRemoved => write!(f, "leave_removed"),
            EventType::Ban => write!(f, "ban"),
            EventType::Unban => write!(f, "unban"),
        }
    }
}

/// Append-only audit log row. `id` order is the canonical chronological
/// order; `created_at` holds an RFC 3339 UTC string stamped by the store.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "invite_events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub chat_id: i64,
    pub event_type: EventType,
    pub actor_id: Option<i64>,
    pub target_id: Option<i64>,
    pub invite_creator_id: Option<i64>,
    pub invite_link: Option<String>,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
