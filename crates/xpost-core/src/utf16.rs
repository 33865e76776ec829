//! UTF-16 code-unit arithmetic.
//!
//! Telegram measures entity offsets and text limits in UTF-16 code units, while
//! Rust strings index by byte. Everything that crosses that boundary goes
//! through these helpers.

/// Length of `s` in UTF-16 code units.
pub fn len(s: &str) -> usize {
    s.chars().map(char::len_utf16).sum()
}

/// Byte index in `text` reached after consuming `units` UTF-16 code units.
///
/// Walks characters accumulating their UTF-16 width and stops at the first
/// character boundary whose running total is `>= units`, so an offset that lands
/// inside a surrogate pair rounds up to the end of that character. Offsets past
/// the end clamp to `text.len()`.
pub fn byte_index(text: &str, units: usize) -> usize {
    if units == 0 {
        return 0;
    }
    let mut acc = 0usize;
    for (idx, ch) in text.char_indices() {
        acc += ch.len_utf16();
        if acc >= units {
            return idx + ch.len_utf8();
        }
    }
    text.len()
}

/// Longest prefix of `text` that fits in `max_units` UTF-16 code units without
/// splitting a character.
pub fn prefix(text: &str, max_units: usize) -> &str {
    let mut acc = 0usize;
    for (idx, ch) in text.char_indices() {
        let w = ch.len_utf16();
        if acc + w > max_units {
            return &text[..idx];
        }
        acc += w;
    }
    text
}
