//! Telegram adapter (teloxide).
//!
//! Implements the `xpost-core` ChannelPort over the Bot API and converts
//! incoming admin messages into `SourcePost`s.

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{InputFile, Message, MessageEntity},
};

use tokio::time::sleep;

pub mod handlers;
pub mod router;

use xpost_core::{
    domain::{ChatId, MessageId, MessageRef},
    entities::WireEntity,
    errors::Error,
    messaging::{
        port::ChannelPort,
        types::{Media, MediaKind, OutgoingText, PostContent, SourcePost},
    },
    Result,
};

#[derive(Clone)]
pub struct TelegramChannels {
    bot: Bot,
}

impl TelegramChannels {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    teloxide::RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Self::map_err(other)),
                },
            }
        }
    }

    fn sent(chat_id: ChatId, msg: &Message) -> MessageRef {
        MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        }
    }
}

#[async_trait]
impl ChannelPort for TelegramChannels {
    async fn copy_post(&self, to: ChatId, source: MessageRef) -> Result<MessageRef> {
        let id = self
            .with_retry(|| {
                self.bot.copy_message(
                    Self::tg_chat(to),
                    Self::tg_chat(source.chat_id),
                    Self::tg_msg_id(source.message_id),
                )
            })
            .await?;
        Ok(MessageRef {
            chat_id: to,
            message_id: MessageId(id.0),
        })
    }

    async fn send_text(&self, to: ChatId, text: &OutgoingText) -> Result<MessageRef> {
        // No parse mode is set on the bot, so text without entities goes out raw.
        let entities = text.entities.as_deref().map(to_tg_entities).transpose()?;
        let msg = self
            .with_retry(|| {
                let mut req = self.bot.send_message(Self::tg_chat(to), text.text.clone());
                if let Some(e) = &entities {
                    req = req.entities(e.clone());
                }
                req
            })
            .await?;
        Ok(Self::sent(to, &msg))
    }

    async fn send_media(
        &self,
        to: ChatId,
        media: &Media,
        caption: Option<&OutgoingText>,
    ) -> Result<MessageRef> {
        let chat = Self::tg_chat(to);
        let file = || InputFile::file_id(media.file_id.clone());
        let text = caption.map(|c| c.text.clone());
        let entities = caption
            .and_then(|c| c.entities.as_deref())
            .map(to_tg_entities)
            .transpose()?;

        // Each request builder is its own type, hence one arm per media kind.
        macro_rules! send_with_caption {
            ($method:ident) => {
                self.with_retry(|| {
                    let mut req = self.bot.$method(chat, file());
                    if let Some(t) = &text {
                        req = req.caption(t.clone());
                    }
                    if let Some(e) = &entities {
                        req = req.caption_entities(e.clone());
                    }
                    req
                })
                .await?
            };
        }

        let msg = match media.kind {
            MediaKind::Photo => send_with_caption!(send_photo),
            MediaKind::Video => send_with_caption!(send_video),
            MediaKind::Document => send_with_caption!(send_document),
            MediaKind::Animation => send_with_caption!(send_animation),
        };
        Ok(Self::sent(to, &msg))
    }
}

/// Wire entities → teloxide entities. Both share the Bot API JSON shape.
fn to_tg_entities(wire: &[WireEntity]) -> Result<Vec<MessageEntity>> {
    wire.iter()
        .map(|w| -> Result<MessageEntity> {
            Ok(serde_json::from_value(serde_json::to_value(w)?)?)
        })
        .collect()
}

fn to_wire_entities(entities: &[MessageEntity]) -> Result<Vec<WireEntity>> {
    entities
        .iter()
        .map(|e| -> Result<WireEntity> {
            Ok(serde_json::from_value(serde_json::to_value(e)?)?)
        })
        .collect()
}

fn unsupported_label(msg: &Message) -> &'static str {
    if msg.sticker().is_some() {
        "sticker"
    } else if msg.voice().is_some() {
        "voice"
    } else if msg.video_note().is_some() {
        "video note"
    } else if msg.audio().is_some() {
        "audio"
    } else if msg.poll().is_some() {
        "poll"
    } else {
        "this kind of"
    }
}

/// Lift an admin message into a `SourcePost`.
pub fn source_post(msg: &Message) -> Result<SourcePost> {
    let media = |kind: MediaKind, file_id: &str| {
        PostContent::Media(Media {
            kind,
            file_id: file_id.to_string(),
        })
    };

    // Animation is checked before document: GIFs also carry a document.
    let content = if let Some(a) = msg.animation() {
        media(MediaKind::Animation, &a.file.id)
    } else if let Some(p) = msg.photo().and_then(|sizes| sizes.last()) {
        media(MediaKind::Photo, &p.file.id)
    } else if let Some(v) = msg.video() {
        media(MediaKind::Video, &v.file.id)
    } else if let Some(d) = msg.document() {
        media(MediaKind::Document, &d.file.id)
    } else if msg.text().is_some() {
        PostContent::Text
    } else {
        PostContent::Unsupported(unsupported_label(msg).to_string())
    };

    let (text, entities) = match (msg.text(), msg.caption()) {
        (Some(t), _) => (Some(t.to_string()), msg.entities()),
        (None, Some(c)) => (Some(c.to_string()), msg.caption_entities()),
        (None, None) => (None, None),
    };

    Ok(SourcePost {
        origin: MessageRef {
            chat_id: ChatId(msg.chat.id.0),
            message_id: MessageId(msg.id.0),
        },
        content,
        text,
        entities: to_wire_entities(entities.unwrap_or_default())?,
        media_group_id: msg.media_group_id().map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    const ADMIN_GROUP: i64 = -100123;

    /// A group message as the Bot API delivers it, plus `fields`.
    fn message(fields: Value) -> Message {
        let mut raw = json!({
            "message_id": 42,
            "date": 1_700_000_000,
            "chat": {"id": ADMIN_GROUP, "type": "supergroup", "title": "Admins"},
            "from": {"id": 7, "is_bot": false, "first_name": "Ana"}
        });
        if let (Some(raw), Value::Object(fields)) = (raw.as_object_mut(), fields) {
            raw.extend(fields);
        }
        serde_json::from_value(raw).unwrap()
    }

    fn file(id: &str) -> Value {
        json!({"file_id": id, "file_unique_id": format!("u-{id}")})
    }

    fn media_of(post: &SourcePost) -> &Media {
        match &post.content {
            PostContent::Media(media) => media,
            other => panic!("expected media, got {other:?}"),
        }
    }

    #[test]
    fn gif_is_an_animation_not_a_document() {
        let mut animation = file("CgAD");
        animation["width"] = json!(320);
        animation["height"] = json!(240);
        animation["duration"] = json!(3);
        let msg = message(json!({
            "animation": animation,
            "document": file("CgAD"),
            "caption": "Привет"
        }));

        let post = source_post(&msg).unwrap();
        assert_eq!(
            media_of(&post),
            &Media {
                kind: MediaKind::Animation,
                file_id: "CgAD".to_string()
            }
        );
        assert_eq!(post.text.as_deref(), Some("Привет"));
    }

    #[test]
    fn photo_uses_the_largest_size_and_keeps_the_album_id() {
        let size = |id: &str, side: u32| {
            let mut f = file(id);
            f["width"] = json!(side);
            f["height"] = json!(side);
            f
        };
        let msg = message(json!({
            "photo": [size("small", 90), size("big", 1280)],
            "media_group_id": "13579"
        }));

        let post = source_post(&msg).unwrap();
        assert_eq!(media_of(&post).kind, MediaKind::Photo);
        assert_eq!(media_of(&post).file_id, "big");
        assert_eq!(post.media_group_id.as_deref(), Some("13579"));
        assert_eq!(post.text, None);
        assert!(post.entities.is_empty());
    }

    #[test]
    fn caption_entities_come_with_the_caption() {
        let mut video = file("BAAD");
        video["width"] = json!(1920);
        video["height"] = json!(1080);
        video["duration"] = json!(10);
        let msg = message(json!({
            "video": video,
            "caption": "Привет 😀 мир",
            "caption_entities": [
                {"type": "custom_emoji", "offset": 7, "length": 2, "custom_emoji_id": "5368324170671202286"}
            ]
        }));

        let post = source_post(&msg).unwrap();
        assert_eq!(media_of(&post).kind, MediaKind::Video);
        assert_eq!(post.text.as_deref(), Some("Привет 😀 мир"));
        assert_eq!(
            post.entities,
            vec![WireEntity::custom_emoji(7, 2, "5368324170671202286")]
        );
        assert_eq!(
            post.origin,
            MessageRef {
                chat_id: ChatId(ADMIN_GROUP),
                message_id: MessageId(42),
            }
        );
        assert_eq!(post.media_group_id, None);
    }

    #[test]
    fn text_message_takes_text_entities() {
        let msg = message(json!({
            "text": "Привет мир",
            "entities": [{"type": "bold", "offset": 0, "length": 6}]
        }));

        let post = source_post(&msg).unwrap();
        assert_eq!(post.content, PostContent::Text);
        assert_eq!(post.entities.len(), 1);
        assert_eq!(post.entities[0].kind, "bold");
    }

    #[test]
    fn sticker_is_unsupported() {
        let mut sticker = file("CAAC");
        sticker["width"] = json!(512);
        sticker["height"] = json!(512);
        sticker["is_animated"] = json!(false);
        sticker["is_video"] = json!(false);
        sticker["type"] = json!("regular");
        sticker["emoji"] = json!("😀");
        let msg = message(json!({ "sticker": sticker }));

        let post = source_post(&msg).unwrap();
        assert_eq!(post.content, PostContent::Unsupported("sticker".to_string()));
        assert_eq!(post.text, None);
    }

    #[test]
    fn custom_emoji_entities_convert_both_ways() {
        let wire = vec![
            WireEntity::custom_emoji(6, 1, "5368324170671202286"),
            WireEntity {
                kind: "bold".to_string(),
                offset: 0,
                length: 5,
                custom_emoji_id: None,
            },
        ];
        let tg = to_tg_entities(&wire).unwrap();
        assert_eq!(tg[0].offset, 6);
        assert_eq!(tg[0].length, 1);
        assert_eq!(to_wire_entities(&tg).unwrap(), wire);
    }
}
