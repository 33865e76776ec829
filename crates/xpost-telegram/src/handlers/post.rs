use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{info, warn};

use crate::router::AppState;
use crate::source_post;

use super::can_manage;

pub async fn handle_post(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    // Other bots in the group; anonymous admins also show up as a bot user.
    if msg.sender_chat().is_none() && msg.from().is_some_and(|u| u.is_bot) {
        return Ok(());
    }
    if !can_manage(&bot, &msg).await {
        warn!(chat_id = msg.chat.id.0, "post from a non-admin ignored");
        return Ok(());
    }

    let chat_id = msg.chat.id.0;
    let result = match source_post(&msg) {
        Ok(post) => state.crossposter.run(&post).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(published) => {
            state.sessions.end(chat_id).await;
            let titles: Vec<_> = published.iter().map(|t| t.lang.title()).collect();
            info!(chat_id, channels = %titles.join(", "), "post published");
            bot.send_message(
                msg.chat.id,
                format!("✅ Post published to channels: {}", titles.join(", ")),
            )
            .await?;
        }
        Err(e) => {
            warn!(chat_id, stage = e.stage(), error = %e, "crosspost failed");
            bot.send_message(msg.chat.id, e.user_message()).await?;
        }
    }

    Ok(())
}
