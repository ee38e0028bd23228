use crate::modules::{anti_link, forward_info, invite_tracking};
use crate::platform::api::ChatApi;
use crate::platform::types::Update;
use crate::{Data, Error};

/// Routes one inbound update to the module that owns it. Membership
/// notifications take precedence, then commands, then content moderation,
/// then the forward-metadata responder.
pub async fn dispatch(api: &dyn ChatApi, update: &Update, data: &Data) -> Result<(), Error> {
    if let Some(change) = &update.chat_member {
        return invite_tracking::events::handle_status_change(api, change, data).await;
    }

    let Some(message) = &update.message else {
        return Ok(());
    };

    if !message.new_chat_members.is_empty() {
        return invite_tracking::events::handle_new_members(api, message, data).await;
    }

    if message.left_chat_member.is_some() {
        return invite_tracking::events::handle_member_left(api, message, data).await;
    }

    if let Some(command) = invite_tracking::commands::parse(message) {
        return invite_tracking::commands::handle(api, message, command, data).await;
    }

    if message.chat.kind.is_group() && message.text_content().is_some() {
        return anti_link::events::handle_message(api, message, data).await;
    }

    if message.has_forward_metadata() {
        return forward_info::events::handle_message(api, message, data).await;
    }

    Ok(())
}
