/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a Telegram message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Languages a post can be published in.
///
/// The set is closed: adding a language means adding a channel alias list,
/// a translation style and a slot in [`Lang::POST_ORDER`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Lang {
    Ru,
    En,
    Pt,
    Es,
}

impl Lang {
    /// Publication order. The origin channel always comes first.
    pub const POST_ORDER: [Lang; 4] = [Lang::Ru, Lang::En, Lang::Pt, Lang::Es];

    /// Language the admin authors posts in.
    pub const ORIGIN: Lang = Lang::Ru;

    /// Targets that must have a channel before anything is published.
    pub const REQUIRED_TARGETS: [Lang; 3] = [Lang::En, Lang::Pt, Lang::Es];

    pub fn code(self) -> &'static str {
        match self {
            Lang::Ru => "ru",
            Lang::En => "en",
            Lang::Pt => "pt",
            Lang::Es => "es",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Lang::Ru => "RU",
            Lang::En => "EN",
            Lang::Pt => "PT",
            Lang::Es => "ES",
        }
    }

    /// Environment variables accepted for this language's channel id, in
    /// lookup order.
    pub fn channel_env_keys(self) -> &'static [&'static str] {
        match self {
            Lang::Ru => &["CHANNEL_ID", "CHANNEL_RU_ID"],
            Lang::En => &["CHANNEL_EN_ID", "CHANNEL_ID_EN", "EN_CHANNEL_ID", "CHANNEL_ENG_ID"],
            Lang::Pt => &["CHANNEL_PT_ID", "CHANNEL_ID_PT", "PT_CHANNEL_ID", "CHANNEL_BR_ID"],
            Lang::Es => &[
                "CHANNEL_ES_ID",
                "CHANNEL_ID_ES",
                "ES_CHANNEL_ID",
                "CHANNEL_SPANISH_ID",
            ],
        }
    }

    /// Register the translator is asked to write in. `None` for the origin.
    pub fn translation_style(self) -> Option<&'static str> {
        match self {
            Lang::Ru => None,
            Lang::En => Some("natural, conversational English"),
            Lang::Pt => Some("natural, conversational Brazilian Portuguese"),
            Lang::Es => Some("natural, conversational Latin American Spanish"),
        }
    }
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
