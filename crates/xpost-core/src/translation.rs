//! Translation of marker-bearing text through a chat-completion backend.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    domain::Lang,
    errors::Error,
    markers::{tokens_intact, MarkerToken},
    model::{
        client::CompletionClient,
        types::{ChatMessage, CompletionRequest},
    },
    Result,
};

/// Attempts per language before giving up.
pub const MAX_ATTEMPTS: usize = 3;

const TEMPERATURE_WITH_MARKERS: f32 = 0.4;
const TEMPERATURE_PLAIN: f32 = 0.6;

/// Outcome of one request for one language.
#[derive(Clone, Debug)]
pub struct TranslationAttempt {
    pub lang: Lang,
    pub number: usize,
    pub input_text: String,
    pub output_text: String,
    pub succeeded: bool,
}

impl TranslationAttempt {
    fn into_outcome(self) -> std::result::Result<String, Rejection> {
        if self.succeeded {
            Ok(self.output_text)
        } else if self.output_text.is_empty() {
            Err(Rejection::Empty)
        } else {
            Err(Rejection::Markers)
        }
    }
}

/// Why the output of an attempt was not accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Rejection {
    Empty,
    Markers,
}

impl Rejection {
    fn into_error(self, target: Lang) -> Error {
        Error::Translation(match self {
            Rejection::Empty => format!(
                "translation service returned an empty response for {}",
                target.title()
            ),
            Rejection::Markers => format!(
                "translator could not preserve the custom-emoji markers for {} after {MAX_ATTEMPTS} attempts; send the post again",
                target.title()
            ),
        })
    }
}

pub struct Translator {
    client: Arc<dyn CompletionClient>,
    model: String,
}

impl Translator {
    pub fn new(client: Arc<dyn CompletionClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Request for attempt `number` (0-based). Retries restate the markers in
    /// the user message.
    pub fn build_request(
        &self,
        text: &str,
        target: Lang,
        required: &[MarkerToken],
        number: usize,
    ) -> Result<CompletionRequest> {
        let style = target.translation_style().ok_or_else(|| {
            Error::Validation(format!("unsupported translation language: {target}"))
        })?;

        let mut system = format!(
            "You translate Russian Telegram posts into {style}. \
Keep tone lively and human, preserve structure, line breaks, emojis, hashtags, and CTA. \
Do not add explanations or comments. Return only translated text."
        );
        if !required.is_empty() {
            system.push_str(
                " Token markers in format [[CE0]] must be preserved exactly, without changes, \
without reordering, and each marker must appear exactly once.",
            );
        }

        let user = if !required.is_empty() && number > 0 {
            let list = required
                .iter()
                .map(|t| t.token.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            format!("{text}\n\nSTRICT MARKERS (KEEP UNCHANGED): {list}")
        } else {
            text.to_string()
        };

        Ok(CompletionRequest {
            model: self.model.clone(),
            temperature: if required.is_empty() {
                TEMPERATURE_PLAIN
            } else {
                TEMPERATURE_WITH_MARKERS
            },
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
        })
    }

    /// Run one attempt on a spawned task so the HTTP round trip never holds
    /// up the dispatcher.
    async fn attempt(
        &self,
        text: &str,
        target: Lang,
        required: &[MarkerToken],
        number: usize,
    ) -> Result<TranslationAttempt> {
        let req = self.build_request(text, target, required, number)?;
        let input_text = req
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();

        let client = Arc::clone(&self.client);
        let output_text = tokio::spawn(async move { client.complete(req).await })
            .await
            .map_err(|e| Error::Translation(format!("translation task failed: {e}")))??;

        let succeeded = !output_text.is_empty() && tokens_intact(&output_text, required);
        Ok(TranslationAttempt {
            lang: target,
            number,
            input_text,
            output_text,
            succeeded,
        })
    }

    /// Translate `text` into `target`, requiring every marker in `required` to
    /// come back exactly once and in order.
    ///
    /// Attempts are folded into a single outcome: the first accepted output
    /// wins, otherwise the last rejection is reported. Empty input
    /// short-circuits to an empty string without a request.
    pub async fn translate(
        &self,
        text: &str,
        target: Lang,
        required: &[MarkerToken],
    ) -> Result<String> {
        if text.is_empty() {
            return Ok(String::new());
        }

        let mut outcome: std::result::Result<String, Rejection> = Err(Rejection::Empty);
        for number in 0..MAX_ATTEMPTS {
            if outcome.is_ok() {
                break;
            }
            let attempt = self.attempt(text, target, required, number).await?;
            debug!(
                lang = %target,
                attempt = number + 1,
                input_len = attempt.input_text.len(),
                output_len = attempt.output_text.len(),
                succeeded = attempt.succeeded,
                "translation attempt"
            );
            if !attempt.succeeded {
                warn!(lang = %target, attempt = number + 1, "translation attempt rejected");
            }
            outcome = attempt.into_outcome();
        }

        outcome.map_err(|r| r.into_error(target))
    }

    /// Translate into each target in order. Any failure aborts the whole batch.
    pub async fn translate_all(
        &self,
        text: &str,
        targets: &[Lang],
        required: &[MarkerToken],
    ) -> Result<Vec<(Lang, String)>> {
        let mut out = Vec::with_capacity(targets.len());
        for &lang in targets {
            out.push((lang, self.translate(text, lang, required).await?));
        }
        Ok(out)
    }
}
