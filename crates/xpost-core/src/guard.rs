//! Channel configuration guard.

use crate::{config::ChannelConfig, domain::Lang, errors::Error, Result};

/// Required target languages that have no channel configured.
pub fn missing_languages(channels: &ChannelConfig) -> Vec<Lang> {
    Lang::REQUIRED_TARGETS
        .into_iter()
        .filter(|lang| !channels.contains(*lang))
        .collect()
}

/// One `TITLE: ENV_A / ENV_B` line per language.
pub fn env_hints(langs: &[Lang]) -> String {
    langs
        .iter()
        .map(|l| format!("{}: {}", l.title(), l.channel_env_keys().join(" / ")))
        .collect::<Vec<_>>()
        .join("\n")
}

fn titles(langs: &[Lang]) -> String {
    langs.iter().map(|l| l.title()).collect::<Vec<_>>().join(", ")
}

/// Fail with [`Error::Config`] unless the origin and every required target
/// have a channel.
pub fn ensure_configured(channels: &ChannelConfig) -> Result<()> {
    let mut missing = Vec::new();
    if !channels.contains(Lang::ORIGIN) {
        missing.push(Lang::ORIGIN);
    }
    missing.extend(missing_languages(channels));
    if missing.is_empty() {
        return Ok(());
    }

    Err(Error::Config(format!(
        "publishing stopped: crosspost is not fully configured.\nMissing channels: {}.\nCheck the bot environment:\n{}",
        titles(&missing),
        env_hints(&missing),
    )))
}

/// Status text shown when the admin enters post-creation mode.
pub fn post_creator_prompt(channels: &ChannelConfig) -> String {
    let active: Vec<Lang> = channels.active().iter().map(|t| t.lang).collect();
    let langs = if active.is_empty() {
        Lang::ORIGIN.title().to_string()
    } else {
        titles(&active)
    };

    let mut text = format!(
        "📝 Post creation\n\nSend one post in Russian (text, or media with a caption).\nIt will be translated and published to: {langs}\n\nSend /cancel to leave without publishing."
    );

    let missing = missing_languages(channels);
    if !missing.is_empty() {
        text.push_str(&format!(
            "\n\n⚠️ Crosspost is not fully configured.\nMissing channels: {}.\nCheck the bot environment:\n{}",
            titles(&missing),
            env_hints(&missing),
        ));
    }
    text
}
