//! Classification of raw membership changes into the event taxonomy.
//!
//! All functions here are pure and total: missing optional fields degrade to
//! `None`, nothing fails. Persistence and platform side effects stay with
//! the callers.

use crate::db::entities::invite_events::EventType;
use crate::platform::types::{ChatInviteLink, MemberStatus, User};

/// A classified membership change, not yet persisted. The store assigns the
/// id and timestamp on write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberEvent {
    pub chat_id: i64,
    pub kind: EventType,
    pub actor_id: Option<i64>,
    pub target_id: Option<i64>,
    pub invite_creator_id: Option<i64>,
    pub invite_link: Option<String>,
}

impl MemberEvent {
    /// The actor owed an invite credit for this event, if any. Only
    /// attributed joins earn credit; `join_unknown` never does.
    pub fn credited_actor(&self) -> Option<i64> {
        match self.kind {
            EventType::JoinInvite | EventType::JoinAdded => self.actor_id,
            _ => None,
        }
    }
}

/// Classify a join. Invite-link attribution wins over "who added": a join
/// that carries a link with a known creator is `join_invite` even when a
/// distinct adder is also present.
pub fn classify_join(
    chat_id: i64,
    invite: Option<&ChatInviteLink>,
    adder: Option<&User>,
    target: &User,
) -> MemberEvent {
    if let Some(creator) = invite.and_then(|link| link.creator.as_ref()) {
        return MemberEvent {
            chat_id,
            kind: EventType::JoinInvite,
            actor_id: Some(creator.id),
            target_id: Some(target.id),
            invite_creator_id: Some(creator.id),
            invite_link: invite.and_then(|link| link.url.clone()),
        };
    }

    if let Some(adder) = adder.filter(|adder| adder.id != target.id) {
        return MemberEvent {
            chat_id,
            kind: EventType::JoinAdded,
            actor_id: Some(adder.id),
            target_id: Some(target.id),
            invite_creator_id: None,
            invite_link: None,
        };
    }

    // Self-join with no captured invite object, e.g. via a public link.
    MemberEvent {
        chat_id,
        kind: EventType::JoinUnknown,
        actor_id: None,
        target_id: Some(target.id),
        invite_creator_id: None,
        invite_link: None,
    }
}

/// Classify a leave. A self-leave carries the target as its own actor, so
/// reports can print the same identity on both sides.
pub fn classify_leave(chat_id: i64, remover: Option<&User>, target: &User) -> MemberEvent {
    if let Some(remover) = remover.filter(|remover| remover.id != target.id) {
        return MemberEvent {
            chat_id,
            kind: EventType::LeaveRemoved,
            actor_id: Some(remover.id),
            target_id: Some(target.id),
            invite_creator_id: None,
            invite_link: None,
        };
    }

    MemberEvent {
        chat_id,
        kind: EventType::LeaveLeft,
        actor_id: Some(target.id),
        target_id: Some(target.id),
        invite_creator_id: None,
        invite_link: None,
    }
}

/// Classify a membership-status transition. Only transitions into or out of
/// the kicked state produce an event; everything else is `None`.
pub fn classify_status_change(
    chat_id: i64,
    actor: Option<&User>,
    target: &User,
    old_status: MemberStatus,
    new_status: MemberStatus,
) -> Option<MemberEvent> {
    let kind = if new_status.is_kicked() && !old_status.is_kicked() {
        EventType::Ban
    } else if old_status.is_kicked() && !new_status.is_kicked() {
        EventType::Unban
    } else {
        return None;
    };

    Some(MemberEvent {
        chat_id,
        kind,
        actor_id: actor.map(|actor| actor.id),
        target_id: Some(target.id),
        invite_creator_id: None,
        invite_link: None,
    })
}
