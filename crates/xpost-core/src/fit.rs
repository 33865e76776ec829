//! Platform length limits.

use crate::{entities::Entity, errors::Error, utf16, Result};

/// Maximum caption length for photo/video/document/animation posts.
pub const CAPTION_LIMIT: usize = 1024;

/// Maximum length of a standalone text message.
pub const MESSAGE_LIMIT: usize = 4096;

const ELLIPSIS: char = '…';

/// Fit `text` into `limit` UTF-16 code units.
///
/// Plain text is cut to `limit - 1` units, right-trimmed and closed with an
/// ellipsis. Text that still carries entities is never cut, because the cut
/// could land inside an entity or past its offset; it fails with
/// [`Error::Length`] instead.
pub fn fit(
    text: &str,
    entities: Option<Vec<Entity>>,
    limit: usize,
) -> Result<(String, Option<Vec<Entity>>)> {
    let units = utf16::len(text);
    if units <= limit {
        return Ok((text.to_string(), entities));
    }

    if entities.as_ref().is_some_and(|e| !e.is_empty()) {
        return Err(Error::Length(format!(
            "translated {} is too long ({units} of {limit} allowed, counted as Telegram does); shorten the source post",
            if limit == CAPTION_LIMIT { "caption" } else { "text" },
        )));
    }

    let mut out = utf16::prefix(text, limit.saturating_sub(1))
        .trim_end()
        .to_string();
    out.push(ELLIPSIS);
    Ok((out, None))
}
