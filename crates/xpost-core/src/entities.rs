//! Rich-text entities and extraction of `(text, entities)` from a source post.

use serde::{Deserialize, Serialize};

use crate::messaging::types::SourcePost;

/// Entity as it appears on the Bot API wire. Offsets are UTF-16 code units.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEntity {
    #[serde(rename = "type")]
    pub kind: String,
    pub offset: usize,
    pub length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_emoji_id: Option<String>,
}

impl WireEntity {
    pub fn custom_emoji(offset: usize, length: usize, emoji_id: impl Into<String>) -> Self {
        Self {
            kind: CUSTOM_EMOJI.to_string(),
            offset,
            length,
            custom_emoji_id: Some(emoji_id.into()),
        }
    }
}

const CUSTOM_EMOJI: &str = "custom_emoji";

/// Entity as the pipeline sees it. Only `CustomEmoji` survives translation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Entity {
    CustomEmoji {
        offset: usize,
        length: usize,
        emoji_id: String,
    },
    Other {
        kind: String,
        offset: usize,
        length: usize,
    },
}

impl Entity {
    pub fn offset(&self) -> usize {
        match self {
            Entity::CustomEmoji { offset, .. } | Entity::Other { offset, .. } => *offset,
        }
    }

    pub fn length(&self) -> usize {
        match self {
            Entity::CustomEmoji { length, .. } | Entity::Other { length, .. } => *length,
        }
    }

    pub fn emoji_id(&self) -> Option<&str> {
        match self {
            Entity::CustomEmoji { emoji_id, .. } => Some(emoji_id),
            Entity::Other { .. } => None,
        }
    }

    pub fn to_wire(&self) -> WireEntity {
        match self {
            Entity::CustomEmoji {
                offset,
                length,
                emoji_id,
            } => WireEntity::custom_emoji(*offset, *length, emoji_id.clone()),
            Entity::Other {
                kind,
                offset,
                length,
            } => WireEntity {
                kind: kind.clone(),
                offset: *offset,
                length: *length,
                custom_emoji_id: None,
            },
        }
    }
}

impl From<&WireEntity> for Entity {
    /// A `custom_emoji` entity without an id cannot be restored, so it is kept
    /// as an opaque `Other`.
    fn from(w: &WireEntity) -> Self {
        match w.custom_emoji_id.as_deref() {
            Some(id) if w.kind == CUSTOM_EMOJI && !id.is_empty() => Entity::CustomEmoji {
                offset: w.offset,
                length: w.length,
                emoji_id: id.to_string(),
            },
            _ => Entity::Other {
                kind: w.kind.clone(),
                offset: w.offset,
                length: w.length,
            },
        }
    }
}

/// Plain text plus its entities, ordered by source offset.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RichText {
    pub plain_text: String,
    pub entities: Vec<Entity>,
}

impl RichText {
    pub fn from_wire(text: Option<&str>, wire: &[WireEntity]) -> Self {
        let mut entities: Vec<Entity> = wire.iter().map(Entity::from).collect();
        entities.sort_by_key(Entity::offset);
        Self {
            plain_text: text.unwrap_or_default().to_string(),
            entities,
        }
    }
}

/// Pull the text (or caption) and its entities out of a source post.
///
/// Absent text is treated as the empty string.
pub fn extract(post: &SourcePost) -> RichText {
    RichText::from_wire(post.text.as_deref(), &post.entities)
}
