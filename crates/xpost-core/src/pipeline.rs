//! End-to-end crosspost: guard, extract, tokenize, translate, restore, publish.

use tracing::info;

use crate::{
    broadcast::{preflight, Broadcaster, Translation},
    config::ChannelTarget,
    entities::extract,
    errors::Error,
    guard::ensure_configured,
    markers::{restore, tokenize},
    messaging::types::SourcePost,
    translation::Translator,
    Result,
};

pub struct Crossposter {
    broadcaster: Broadcaster,
    translator: Option<Translator>,
}

impl Crossposter {
    /// `translator` is `None` when no API key is configured; media posts
    /// without a caption still go through.
    pub fn new(broadcaster: Broadcaster, translator: Option<Translator>) -> Self {
        Self {
            broadcaster,
            translator,
        }
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    /// Translate and publish `post`. Returns the channels written, in order.
    pub async fn run(&self, post: &SourcePost) -> Result<Vec<ChannelTarget>> {
        let channels = self.broadcaster.channels();
        ensure_configured(channels)?;
        preflight(post, channels)?;

        let translations = self.translate(post).await?;
        self.broadcaster.broadcast(post, &translations).await
    }

    async fn translate(&self, post: &SourcePost) -> Result<Vec<Translation>> {
        let rich = extract(post);
        if rich.plain_text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let translator = self.translator.as_ref().ok_or_else(|| {
            Error::Config("OPENAI_API_KEY is not set; add it to enable auto-translation".to_string())
        })?;

        let (marked, tokens) = tokenize(&rich.plain_text, &rich.entities)?;
        let targets: Vec<_> = self
            .broadcaster
            .channels()
            .translated()
            .iter()
            .map(|t| t.lang)
            .collect();
        info!(
            targets = targets.len(),
            markers = tokens.len(),
            "translating post"
        );

        let translated = translator.translate_all(&marked, &targets, &tokens).await?;
        translated
            .into_iter()
            .map(|(lang, text)| {
                let (text, entities) = restore(&text, &tokens)?;
                Ok(Translation {
                    lang,
                    text,
                    entities,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::ChannelConfig,
        domain::{ChatId, Lang, MessageId, MessageRef},
        entities::{Entity, WireEntity},
        messaging::{
            port::ChannelPort,
            types::{Media, MediaKind, OutgoingText, PostContent},
        },
        model::{client::CompletionClient, types::CompletionRequest},
    };
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Fake translator: swaps the Russian words for the target language's and
    /// keeps markers where they were.
    #[derive(Default)]
    struct FakeCompletion {
        calls: Mutex<Vec<CompletionRequest>>,
        /// Extra characters appended to every translation.
        padding: usize,
    }

    #[async_trait]
    impl CompletionClient for FakeCompletion {
        async fn complete(&self, req: CompletionRequest) -> Result<String> {
            let system = req.messages[0].content.clone();
            let user = req.messages[1].content.clone();
            self.calls.lock().unwrap().push(req);

            let (hello, world) = if system.contains("English") {
                ("Hello", "world")
            } else if system.contains("Portuguese") {
                ("Olá", "mundo")
            } else {
                ("¡Hola", "mundo!")
            };
            let padding = "w".repeat(self.padding);
            Ok(user.replace("Привет", hello).replace("мир", world) + &padding)
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Sent {
        Copy(ChatId, MessageRef),
        Text(ChatId, OutgoingText),
        Media(ChatId, Media, Option<OutgoingText>),
    }

    #[derive(Default)]
    struct FakeChannels {
        sent: Mutex<Vec<Sent>>,
    }

    impl FakeChannels {
        fn sent(&self) -> Vec<Sent> {
            self.sent.lock().unwrap().clone()
        }

        fn ok(to: ChatId) -> MessageRef {
            MessageRef {
                chat_id: to,
                message_id: MessageId(1),
            }
        }
    }

    #[async_trait]
    impl ChannelPort for FakeChannels {
        async fn copy_post(&self, to: ChatId, source: MessageRef) -> Result<MessageRef> {
            self.sent.lock().unwrap().push(Sent::Copy(to, source));
            Ok(Self::ok(to))
        }

        async fn send_text(&self, to: ChatId, text: &OutgoingText) -> Result<MessageRef> {
            self.sent.lock().unwrap().push(Sent::Text(to, text.clone()));
            Ok(Self::ok(to))
        }

        async fn send_media(
            &self,
            to: ChatId,
            media: &Media,
            caption: Option<&OutgoingText>,
        ) -> Result<MessageRef> {
            self.sent
                .lock()
                .unwrap()
                .push(Sent::Media(to, media.clone(), caption.cloned()));
            Ok(Self::ok(to))
        }
    }

    const RU: ChatId = ChatId(-100);
    const EN: ChatId = ChatId(-200);
    const PT: ChatId = ChatId(-300);
    const ES: ChatId = ChatId(-400);

    fn origin() -> MessageRef {
        MessageRef {
            chat_id: ChatId(-999),
            message_id: MessageId(77),
        }
    }

    fn setup(
        langs: &[(Lang, ChatId)],
    ) -> (Crossposter, Arc<FakeCompletion>, Arc<FakeChannels>) {
        setup_with(langs, FakeCompletion::default())
    }

    fn setup_with(
        langs: &[(Lang, ChatId)],
        completion: FakeCompletion,
    ) -> (Crossposter, Arc<FakeCompletion>, Arc<FakeChannels>) {
        let completion = Arc::new(completion);
        let channels = Arc::new(FakeChannels::default());
        let crossposter = Crossposter::new(
            Broadcaster::new(ChannelConfig::new(langs.iter().copied()), channels.clone()),
            Some(Translator::new(completion.clone(), "gpt-4o-mini")),
        );
        (crossposter, completion, channels)
    }

    fn all_channels() -> Vec<(Lang, ChatId)> {
        vec![(Lang::Ru, RU), (Lang::En, EN), (Lang::Pt, PT), (Lang::Es, ES)]
    }

    fn emoji_post() -> SourcePost {
        SourcePost {
            origin: origin(),
            content: PostContent::Text,
            text: Some("Привет 😀 мир".to_string()),
            entities: vec![
                WireEntity {
                    kind: "bold".to_string(),
                    offset: 0,
                    length: 6,
                    custom_emoji_id: None,
                },
                WireEntity::custom_emoji(7, 2, "5368324170671202286"),
            ],
            media_group_id: None,
        }
    }

    fn emoji_at(offset: usize) -> Option<Vec<WireEntity>> {
        Some(vec![Entity::CustomEmoji {
            offset,
            length: 1,
            emoji_id: "5368324170671202286".to_string(),
        }
        .to_wire()])
    }

    #[tokio::test]
    async fn publishes_origin_copy_then_translations_with_restored_emoji() {
        let (xp, completion, channels) = setup(&all_channels());

        let published = xp.run(&emoji_post()).await.unwrap();
        let langs: Vec<_> = published.iter().map(|t| t.lang).collect();
        assert_eq!(langs, Lang::POST_ORDER.to_vec());
        assert_eq!(completion.calls.lock().unwrap().len(), 3);

        assert_eq!(
            channels.sent(),
            vec![
                Sent::Copy(RU, origin()),
                Sent::Text(
                    EN,
                    OutgoingText {
                        text: "Hello ⭐ world".to_string(),
                        entities: emoji_at(6),
                    }
                ),
                Sent::Text(
                    PT,
                    OutgoingText {
                        text: "Olá ⭐ mundo".to_string(),
                        entities: emoji_at(4),
                    }
                ),
                Sent::Text(
                    ES,
                    OutgoingText {
                        text: "¡Hola ⭐ mundo!".to_string(),
                        entities: emoji_at(6),
                    }
                ),
            ]
        );
    }

    #[tokio::test]
    async fn missing_channel_aborts_before_translation() {
        let (xp, completion, channels) =
            setup(&[(Lang::Ru, RU), (Lang::En, EN), (Lang::Es, ES)]);

        let err = xp.run(&emoji_post()).await.unwrap_err();
        let Error::Config(msg) = err else {
            panic!("expected config error");
        };
        assert!(msg.contains("Missing channels: PT."));
        assert!(completion.calls.lock().unwrap().is_empty());
        assert!(channels.sent().is_empty());
    }

    #[tokio::test]
    async fn plain_caption_goes_out_without_entities() {
        let (xp, _, channels) = setup(&all_channels());
        let post = SourcePost {
            origin: origin(),
            content: PostContent::Media(Media {
                kind: MediaKind::Video,
                file_id: "BAAD".to_string(),
            }),
            text: Some("Привет мир".to_string()),
            entities: vec![],
            media_group_id: None,
        };

        xp.run(&post).await.unwrap();
        let sent = channels.sent();
        assert_eq!(sent.len(), 4);
        let Sent::Media(to, media, Some(caption)) = &sent[1] else {
            panic!("expected media send, got {:?}", sent[1]);
        };
        assert_eq!(*to, EN);
        assert_eq!(media.kind, MediaKind::Video);
        assert_eq!(caption.text, "Hello world");
        assert!(caption.entities.is_none());
    }

    #[tokio::test]
    async fn captionless_media_skips_translation() {
        let (xp, completion, channels) = setup(&all_channels());
        let post = SourcePost {
            origin: origin(),
            content: PostContent::Media(Media {
                kind: MediaKind::Document,
                file_id: "BQAD".to_string(),
            }),
            text: None,
            entities: vec![],
            media_group_id: None,
        };

        xp.run(&post).await.unwrap();
        assert!(completion.calls.lock().unwrap().is_empty());
        assert!(channels
            .sent()
            .iter()
            .skip(1)
            .all(|s| matches!(s, Sent::Media(_, _, None))));
    }

    #[tokio::test]
    async fn over_long_caption_with_emoji_publishes_nothing() {
        let (xp, completion, channels) = setup_with(
            &all_channels(),
            FakeCompletion {
                padding: 1100,
                ..FakeCompletion::default()
            },
        );
        let mut post = emoji_post();
        post.content = PostContent::Media(Media {
            kind: MediaKind::Photo,
            file_id: "AgAD".to_string(),
        });

        let result = xp.run(&post).await;
        assert!(matches!(result, Err(Error::Length(_))), "{result:?}");
        assert_eq!(completion.calls.lock().unwrap().len(), 3);
        assert!(channels.sent().is_empty());
    }

    #[tokio::test]
    async fn reserved_marker_in_source_is_refused_before_translation() {
        let (xp, completion, channels) = setup(&all_channels());
        let post = SourcePost {
            text: Some("Привет [[CE0]] 😀".to_string()),
            entities: vec![WireEntity::custom_emoji(15, 2, "5368324170671202286")],
            ..emoji_post()
        };

        assert!(matches!(xp.run(&post).await, Err(Error::Validation(_))));
        assert!(completion.calls.lock().unwrap().is_empty());
        assert!(channels.sent().is_empty());
    }

    #[tokio::test]
    async fn album_is_refused_before_any_call() {
        let (xp, completion, channels) = setup(&all_channels());
        let mut post = emoji_post();
        post.media_group_id = Some("album".to_string());

        assert!(matches!(xp.run(&post).await, Err(Error::Validation(_))));
        assert!(completion.calls.lock().unwrap().is_empty());
        assert!(channels.sent().is_empty());
    }

    #[tokio::test]
    async fn text_post_without_translator_is_a_config_error() {
        let channels = Arc::new(FakeChannels::default());
        let xp = Crossposter::new(
            Broadcaster::new(ChannelConfig::new(all_channels()), channels.clone()),
            None,
        );
        assert!(matches!(xp.run(&emoji_post()).await, Err(Error::Config(_))));
        assert!(channels.sent().is_empty());
    }
}
