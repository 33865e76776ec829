use crate::{
    domain::MessageRef,
    entities::{Entity, WireEntity},
};

/// The admin-authored post to crosspost, lifted out of the Telegram update.
#[derive(Clone, Debug)]
pub struct SourcePost {
    pub origin: MessageRef,
    pub content: PostContent,
    /// Message text or media caption.
    pub text: Option<String>,
    pub entities: Vec<WireEntity>,
    pub media_group_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PostContent {
    Text,
    Media(Media),
    /// Anything else (stickers, polls, voice...). Carries a short label.
    Unsupported(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Video,
    Document,
    Animation,
}

impl MediaKind {
    pub fn label(self) -> &'static str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
            MediaKind::Document => "document",
            MediaKind::Animation => "animation",
        }
    }
}

/// Media already stored on Telegram, re-sent by file id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Media {
    pub kind: MediaKind,
    pub file_id: String,
}

/// Text or caption prepared for one channel.
///
/// `entities == None` means the text goes out without any formatting and with
/// parse mode disabled, so a placeholder glyph is never read as markup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutgoingText {
    pub text: String,
    pub entities: Option<Vec<WireEntity>>,
}

impl OutgoingText {
    pub fn new(text: String, entities: Option<Vec<Entity>>) -> Self {
        Self {
            text,
            entities: entities
                .filter(|e| !e.is_empty())
                .map(|e| e.iter().map(Entity::to_wire).collect()),
        }
    }
}
