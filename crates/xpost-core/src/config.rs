use std::{collections::HashMap, env, fs, path::Path, time::Duration};

use crate::{
    domain::{ChatId, Lang},
    errors::Error,
    Result,
};

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Typed configuration, read once at startup and shared immutably.
#[derive(Clone, Debug)]
pub struct Config {
    // Telegram
    pub telegram_bot_token: String,
    pub admin_group_id: i64,

    // Translation service
    pub openai: OpenAiSettings,

    // Channels
    pub channels: ChannelConfig,
    pub channel_throttle: Duration,
}

#[derive(Clone, Debug)]
pub struct OpenAiSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub timeout: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let telegram_bot_token = env_str("BOT_TOKEN")
            .and_then(non_empty)
            .or_else(|| env_str("TELEGRAM_BOT_TOKEN").and_then(non_empty))
            .ok_or_else(|| Error::Config("BOT_TOKEN environment variable is required".to_string()))?;

        let admin_group_id = env_str("ADMIN_GROUP_ID")
            .and_then(|s| s.trim().parse::<i64>().ok())
            .ok_or_else(|| {
                Error::Config("ADMIN_GROUP_ID environment variable must be a number".to_string())
            })?;

        let openai = OpenAiSettings::from_lookup(env_str);
        let channels = ChannelConfig::from_lookup(env_str);
        let channel_throttle =
            Duration::from_millis(env_u64("CHANNEL_THROTTLE_MS").unwrap_or(1050));

        Ok(Self {
            telegram_bot_token,
            admin_group_id,
            openai,
            channels,
            channel_throttle,
        })
    }
}

impl OpenAiSettings {
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let api_key = get("OPENAI_API_KEY").and_then(non_empty);
        let model = get("OPENAI_TRANSLATE_MODEL")
            .and_then(non_empty)
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let api_base = get("OPENAI_API_BASE")
            .and_then(non_empty)
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        // Non-positive or unparsable values fall back to the default.
        let timeout_secs = get("OPENAI_HTTP_TIMEOUT_SECONDS")
            .and_then(|s| s.trim().parse::<i64>().ok())
            .filter(|&n| n > 0)
            .map(|n| n as u64)
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);

        Self {
            api_key,
            model,
            api_base,
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

/// One publication target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelTarget {
    pub lang: Lang,
    pub chat_id: ChatId,
}

/// Language → channel mapping.
#[derive(Clone, Debug, Default)]
pub struct ChannelConfig {
    by_lang: HashMap<Lang, ChatId>,
}

impl ChannelConfig {
    pub fn new(targets: impl IntoIterator<Item = (Lang, ChatId)>) -> Self {
        Self {
            by_lang: targets.into_iter().collect(),
        }
    }

    /// Resolve every language's channel id through its env aliases.
    ///
    /// The first alias holding an integer wins.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let by_lang = Lang::POST_ORDER
            .into_iter()
            .filter_map(|lang| {
                lang.channel_env_keys()
                    .iter()
                    .find_map(|key| get(key).and_then(|v| v.trim().parse::<i64>().ok()))
                    .map(|id| (lang, ChatId(id)))
            })
            .collect();
        Self { by_lang }
    }

    pub fn get(&self, lang: Lang) -> Option<ChatId> {
        self.by_lang.get(&lang).copied()
    }

    pub fn contains(&self, lang: Lang) -> bool {
        self.by_lang.contains_key(&lang)
    }

    /// Configured targets in publication order, origin included.
    pub fn active(&self) -> Vec<ChannelTarget> {
        Lang::POST_ORDER
            .into_iter()
            .filter_map(|lang| self.get(lang).map(|chat_id| ChannelTarget { lang, chat_id }))
            .collect()
    }

    /// Configured non-origin targets in publication order.
    pub fn translated(&self) -> Vec<ChannelTarget> {
        self.active()
            .into_iter()
            .filter(|t| t.lang != Lang::ORIGIN)
            .collect()
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn channel_aliases_resolve_in_order() {
        let channels = ChannelConfig::from_lookup(lookup(&[
            ("CHANNEL_ID", "-100"),
            ("CHANNEL_ID_EN", "-200"),
            ("CHANNEL_EN_ID", "not-a-number"),
            ("CHANNEL_BR_ID", " -300 "),
        ]));
        assert_eq!(channels.get(Lang::Ru), Some(ChatId(-100)));
        assert_eq!(channels.get(Lang::En), Some(ChatId(-200)));
        assert_eq!(channels.get(Lang::Pt), Some(ChatId(-300)));
        assert_eq!(channels.get(Lang::Es), None);
    }

    #[test]
    fn translated_targets_follow_post_order() {
        let channels = ChannelConfig::new([
            (Lang::Es, ChatId(4)),
            (Lang::Ru, ChatId(1)),
            (Lang::En, ChatId(2)),
        ]);
        let langs: Vec<_> = channels.translated().iter().map(|t| t.lang).collect();
        assert_eq!(langs, vec![Lang::En, Lang::Es]);
        assert_eq!(channels.active()[0].lang, Lang::Ru);
    }

    #[test]
    fn openai_settings_defaults_and_overrides() {
        let s = OpenAiSettings::from_lookup(lookup(&[("OPENAI_HTTP_TIMEOUT_SECONDS", "-5")]));
        assert_eq!(s.api_key, None);
        assert_eq!(s.model, "gpt-4o-mini");
        assert_eq!(s.api_base, "https://api.openai.com/v1");
        assert_eq!(s.timeout, Duration::from_secs(30));

        let s = OpenAiSettings::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_API_BASE", "http://localhost:8080/v1/"),
            ("OPENAI_HTTP_TIMEOUT_SECONDS", "7"),
        ]));
        assert_eq!(s.api_key.as_deref(), Some("sk-test"));
        assert_eq!(s.api_base, "http://localhost:8080/v1");
        assert_eq!(s.timeout, Duration::from_secs(7));
    }
}
