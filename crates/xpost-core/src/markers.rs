//! Custom-emoji protection across machine translation.
//!
//! Custom emoji are entities, not characters: a translator that only sees plain
//! text would drop them. Each custom-emoji span is replaced by an ASCII token
//! (`[[CE0]]`, `[[CE1]]`, ...) before translation and turned back into a
//! placeholder glyph plus a fresh entity afterwards.

use std::sync::OnceLock;

use regex::Regex;

use crate::{entities::Entity, errors::Error, utf16, Result};

/// Visible glyph the restored custom-emoji entity is anchored on.
pub const PLACEHOLDER: &str = "⭐";

/// A placeholder substituted for one custom-emoji span.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkerToken {
    pub index: usize,
    pub token: String,
    pub emoji_id: String,
}

impl MarkerToken {
    fn new(index: usize, emoji_id: String) -> Self {
        Self {
            index,
            token: format!("[[CE{index}]]"),
            emoji_id,
        }
    }
}

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[\[CE(\d+)\]\]").expect("valid regex"))
}

/// Replace every custom-emoji span in `text` with a marker token.
///
/// Tokens are numbered in ascending source-offset order. Spans that start
/// before the end of the previous one are skipped, as are entities whose span
/// is empty once mapped onto character boundaries.
///
/// Text that already contains something shaped like a marker is refused when
/// there is anything to tokenize: the literal would be indistinguishable from
/// a real token after translation.
pub fn tokenize(text: &str, entities: &[Entity]) -> Result<(String, Vec<MarkerToken>)> {
    if text.is_empty() {
        return Ok((text.to_string(), Vec::new()));
    }

    // (utf16 offset, byte start, byte end, emoji id)
    let mut spans: Vec<(usize, usize, usize, &str)> = entities
        .iter()
        .filter_map(|e| match e {
            Entity::CustomEmoji {
                offset,
                length,
                emoji_id,
            } if !emoji_id.is_empty() => {
                let start = utf16::byte_index(text, *offset);
                let end = utf16::byte_index(text, offset + length);
                (end > start).then_some((*offset, start, end, emoji_id.as_str()))
            }
            _ => None,
        })
        .collect();

    if spans.is_empty() {
        return Ok((text.to_string(), Vec::new()));
    }
    if let Some(m) = token_re().find(text) {
        return Err(Error::Validation(format!(
            "post text contains the reserved marker {}; remove it and send the post again",
            m.as_str()
        )));
    }
    spans.sort_by_key(|&(offset, start, _, _)| (offset, start));

    let mut out = String::with_capacity(text.len() + spans.len() * 8);
    let mut tokens = Vec::with_capacity(spans.len());
    let mut cursor = 0usize;
    for (_, start, end, emoji_id) in spans {
        if start < cursor {
            continue;
        }
        let tok = MarkerToken::new(tokens.len(), emoji_id.to_string());
        out.push_str(&text[cursor..start]);
        out.push_str(&tok.token);
        tokens.push(tok);
        cursor = end;
    }
    out.push_str(&text[cursor..]);

    Ok((out, tokens))
}

/// True when the tokens found in `text` are exactly `expected`, in order.
///
/// Ordered equality implies each expected token occurs exactly once and no
/// foreign or duplicated token is present.
pub fn tokens_intact(text: &str, expected: &[MarkerToken]) -> bool {
    if expected.is_empty() {
        return true;
    }
    let found = token_re().find_iter(text).map(|m| m.as_str());
    found.eq(expected.iter().map(|t| t.token.as_str()))
}

/// Turn tokens in translated text back into placeholder glyphs and rebuild
/// custom-emoji entities at their new UTF-16 offsets.
///
/// Returns `None` for the entities when there was nothing to restore.
pub fn restore(translated: &str, tokens: &[MarkerToken]) -> Result<(String, Option<Vec<Entity>>)> {
    if tokens.is_empty() {
        return Ok((translated.to_string(), None));
    }
    if !tokens_intact(translated, tokens) {
        return Err(Error::Translation(
            "translator corrupted the custom-emoji markers; send the post again".to_string(),
        ));
    }

    let placeholder_units = utf16::len(PLACEHOLDER);
    let mut out = String::with_capacity(translated.len());
    let mut entities = Vec::with_capacity(tokens.len());
    let mut cursor = 0usize;
    let mut units = 0usize;

    // Integrity was checked above, so the n-th match is tokens[n].
    for (m, tok) in token_re().find_iter(translated).zip(tokens) {
        let before = &translated[cursor..m.start()];
        out.push_str(before);
        units += utf16::len(before);

        out.push_str(PLACEHOLDER);
        entities.push(Entity::CustomEmoji {
            offset: units,
            length: placeholder_units,
            emoji_id: tok.emoji_id.clone(),
        });
        units += placeholder_units;
        cursor = m.end();
    }
    out.push_str(&translated[cursor..]);

    Ok((out, Some(entities)))
}
