//! Telegram update handlers.
//!
//! Only the configured admin group is served. Commands switch post-creation
//! mode on and off; while it is on, the next post from an admin is
//! crossposted.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};
use tracing::debug;

use crate::router::AppState;

mod commands;
mod post;

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let chat_id = msg.chat.id.0;
    if chat_id != state.cfg.admin_group_id {
        debug!(chat_id, "ignoring message outside the admin group");
        return Ok(());
    }

    if let Some(text) = msg.text() {
        if text.starts_with('/') {
            return commands::handle_command(bot, msg, state).await;
        }
    }

    if !state.sessions.is_active(chat_id).await {
        return Ok(());
    }

    // One post at a time per chat.
    let _guard = state.chat_locks.lock_chat(chat_id).await;
    post::handle_post(bot, msg, state).await
}

/// Whether the sender may publish: an anonymous admin posting as the group,
/// or a member with admin rights.
pub(crate) async fn can_manage(bot: &Bot, msg: &Message) -> bool {
    if let Some(sender_chat) = msg.sender_chat() {
        return sender_chat.id == msg.chat.id;
    }
    let Some(user) = msg.from() else {
        return false;
    };
    match bot.get_chat_member(msg.chat.id, user.id).await {
        Ok(member) => member.kind.is_privileged(),
        Err(e) => {
            debug!(error = %e, "get_chat_member failed");
            false
        }
    }
}
