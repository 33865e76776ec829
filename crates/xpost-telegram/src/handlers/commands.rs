use std::sync::Arc;

use teloxide::prelude::*;
use tracing::info;

use xpost_core::guard::post_creator_prompt;

use crate::router::AppState;

use super::can_manage;

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

/// Commands that change or reveal post-creation mode; admins only.
fn requires_admin(cmd: &str) -> bool {
    matches!(cmd, "crosspost" | "create_post" | "cancel" | "status")
}

pub async fn handle_command(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let chat_id = msg.chat.id.0;
    let (cmd, _arg) = parse_command(text);
    let in_post_mode = state.sessions.is_active(chat_id).await;

    if requires_admin(&cmd) && !can_manage(&bot, &msg).await {
        bot.send_message(msg.chat.id, "⛔ Only group admins can manage posts.")
            .await?;
        return Ok(());
    }

    match cmd.as_str() {
        "crosspost" | "create_post" => {
            state.sessions.start(chat_id).await;
            info!(chat_id, "post creation started");
            bot.send_message(msg.chat.id, post_creator_prompt(&state.cfg.channels))
                .await?;
        }
        "cancel" => {
            let reply = if state.sessions.end(chat_id).await {
                info!(chat_id, "post creation cancelled");
                "Post creation cancelled."
            } else {
                "Nothing to cancel."
            };
            bot.send_message(msg.chat.id, reply).await?;
        }
        "status" => {
            let mut body = post_creator_prompt(&state.cfg.channels);
            if !in_post_mode {
                body.push_str("\n\nPost creation is off. Send /crosspost to start.");
            }
            bot.send_message(msg.chat.id, body).await?;
        }
        _ if in_post_mode => {
            bot.send_message(
                msg.chat.id,
                "Waiting for a post. Send the post itself, or /cancel to leave.",
            )
            .await?;
        }
        _ => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_mode_commands_are_admin_only() {
        for cmd in ["crosspost", "create_post", "cancel", "status"] {
            assert!(requires_admin(cmd), "{cmd}");
        }
        assert!(!requires_admin("start"));
        assert!(!requires_admin(""));
    }

    #[test]
    fn parses_command_with_bot_suffix() {
        assert_eq!(
            parse_command("/CrossPost@xpost_bot now"),
            ("crosspost".to_string(), "now".to_string())
        );
        assert_eq!(
            parse_command("  /cancel  "),
            ("cancel".to_string(), String::new())
        );
        assert_eq!(
            parse_command("/create_post"),
            ("create_post".to_string(), String::new())
        );
    }
}
