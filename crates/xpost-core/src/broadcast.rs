//! Channel fan-out: verbatim copy to the origin channel, translated sends to
//! the rest.

use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    config::{ChannelConfig, ChannelTarget},
    domain::Lang,
    entities::Entity,
    errors::Error,
    fit::{fit, CAPTION_LIMIT, MESSAGE_LIMIT},
    messaging::{
        port::ChannelPort,
        types::{OutgoingText, PostContent, SourcePost},
    },
    Result,
};

/// Restored translation for one language.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Translation {
    pub lang: Lang,
    pub text: String,
    pub entities: Option<Vec<Entity>>,
}

/// What one translated channel will receive, already length-fitted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedSend {
    pub target: ChannelTarget,
    pub text: Option<OutgoingText>,
}

fn has_cyrillic(s: &str) -> bool {
    s.chars().any(|c| matches!(c, 'А'..='я' | 'Ё' | 'ё'))
}

/// Checks that need no network: origin channel, album, content type, text.
pub fn preflight(post: &SourcePost, channels: &ChannelConfig) -> Result<()> {
    if !channels.contains(Lang::ORIGIN) {
        return Err(Error::Config(
            "CHANNEL_ID (Russian channel) is not set".to_string(),
        ));
    }
    if post.media_group_id.is_some() {
        return Err(Error::Validation(
            "albums are not supported; send a single post without a media group".to_string(),
        ));
    }
    if let PostContent::Unsupported(kind) = &post.content {
        return Err(Error::Validation(format!(
            "{kind} posts are not supported; send text, photo, video, gif or document"
        )));
    }

    let text = post.text.as_deref().unwrap_or_default();
    if post.content == PostContent::Text && text.trim().is_empty() {
        return Err(Error::Validation(
            "post text is empty; send the text again".to_string(),
        ));
    }
    if !text.trim().is_empty() && !has_cyrillic(text) {
        return Err(Error::Validation(
            "post text must be in Russian to be translated automatically".to_string(),
        ));
    }
    Ok(())
}

/// Resolve and length-fit everything the translated channels will receive.
///
/// Runs before any channel write so a missing translation or an over-long
/// entity-bearing caption aborts the whole broadcast.
pub fn prepare(
    post: &SourcePost,
    channels: &ChannelConfig,
    translations: &[Translation],
) -> Result<Vec<PreparedSend>> {
    preflight(post, channels)?;

    let targets = channels.translated();
    let has_text = post
        .text
        .as_deref()
        .is_some_and(|t| !t.trim().is_empty());
    let lookup = |lang: Lang| {
        translations
            .iter()
            .find(|t| t.lang == lang && !t.text.trim().is_empty())
    };

    if has_text {
        let missing: Vec<&str> = targets
            .iter()
            .filter(|t| lookup(t.lang).is_none())
            .map(|t| t.lang.title())
            .collect();
        if !missing.is_empty() {
            return Err(Error::Translation(format!(
                "no translation for: {}",
                missing.join(", ")
            )));
        }
    }

    let limit = match post.content {
        PostContent::Text => MESSAGE_LIMIT,
        _ => CAPTION_LIMIT,
    };

    targets
        .into_iter()
        .map(|target| {
            let text = match lookup(target.lang).filter(|_| has_text) {
                Some(tr) => {
                    let (text, entities) = fit(&tr.text, tr.entities.clone(), limit)?;
                    Some(OutgoingText::new(text, entities))
                }
                None => None,
            };
            Ok(PreparedSend { target, text })
        })
        .collect()
}

pub struct Broadcaster {
    channels: ChannelConfig,
    port: Arc<dyn ChannelPort>,
}

impl Broadcaster {
    pub fn new(channels: ChannelConfig, port: Arc<dyn ChannelPort>) -> Self {
        Self { channels, port }
    }

    pub fn channels(&self) -> &ChannelConfig {
        &self.channels
    }

    /// Publish `post` everywhere. Returns the targets written, in order.
    ///
    /// Sends are sequential: origin first, then [`Lang::POST_ORDER`]. Nothing
    /// is rolled back if a later send fails.
    pub async fn broadcast(
        &self,
        post: &SourcePost,
        translations: &[Translation],
    ) -> Result<Vec<ChannelTarget>> {
        let prepared = prepare(post, &self.channels, translations)?;
        let origin = self
            .channels
            .active()
            .into_iter()
            .find(|t| t.lang == Lang::ORIGIN)
            .ok_or_else(|| Error::Config("CHANNEL_ID (Russian channel) is not set".to_string()))?;

        self.port.copy_post(origin.chat_id, post.origin).await?;
        info!(lang = %origin.lang, chat_id = origin.chat_id.0, "origin copy published");

        let mut published = vec![origin];
        for send in prepared {
            let chat_id = send.target.chat_id;
            match &post.content {
                PostContent::Text => {
                    let text = send.text.as_ref().ok_or_else(|| {
                        Error::Translation(format!(
                            "empty translation for {}",
                            send.target.lang.title()
                        ))
                    })?;
                    self.port.send_text(chat_id, text).await?;
                }
                PostContent::Media(media) => {
                    debug!(
                        kind = media.kind.label(),
                        captioned = send.text.is_some(),
                        "sending media"
                    );
                    self.port
                        .send_media(chat_id, media, send.text.as_ref())
                        .await?;
                }
                PostContent::Unsupported(kind) => {
                    return Err(Error::Validation(format!("{kind} posts are not supported")));
                }
            }
            info!(lang = %send.target.lang, chat_id = chat_id.0, "translated post published");
            published.push(send.target);
        }

        Ok(published)
    }
}
