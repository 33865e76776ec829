//! OpenAI adapter (chat completions used for post translation).

use async_trait::async_trait;
use tracing::debug;

use xpost_core::{
    config::OpenAiSettings,
    errors::Error,
    model::{client::CompletionClient, types::CompletionRequest},
    Result,
};

#[derive(Clone, Debug)]
pub struct OpenAiClient {
    api_key: String,
    api_base: String,
    http: reqwest::Client,
}

impl OpenAiClient {
    /// `None` when no API key is configured.
    pub fn from_settings(settings: &OpenAiSettings) -> Result<Option<Self>> {
        let Some(api_key) = settings.api_key.clone() else {
            return Ok(None);
        };
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| Error::External(format!("reqwest client build: {e}")))?;
        Ok(Some(Self {
            api_key,
            api_base: settings.api_base.clone(),
            http,
        }))
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, req: CompletionRequest) -> Result<String> {
        debug!(model = %req.model, "chat completion request");
        let resp = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| {
                Error::Translation(format!(
                    "translation service unavailable; check the network and API settings ({e})"
                ))
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Translation(format!(
                "translation failed: {}",
                error_detail(status.as_u16(), &body)
            )));
        }

        let v: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| Error::Translation(format!("translation response is not JSON: {e}")))?;

        Ok(extract_text(&v))
    }
}

/// Assistant text from a chat-completion response.
///
/// `content` is either a string or an array of `{type, text}` parts, in which
/// case the `text` parts are concatenated. Anything else yields "".
pub fn extract_text(payload: &serde_json::Value) -> String {
    let Some(content) = payload
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
    else {
        return String::new();
    };

    if let Some(s) = content.as_str() {
        return s.trim().to_string();
    }
    let Some(parts) = content.as_array() else {
        return String::new();
    };
    parts
        .iter()
        .filter(|p| p.get("type").and_then(|t| t.as_str()) == Some("text"))
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Human-readable reason from an error response body.
pub fn error_detail(status: u16, body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    let message = parsed.as_ref().and_then(|v| {
        v.get("error")
            .and_then(|e| e.get("message"))
            .or_else(|| v.get("message"))
            .and_then(|m| m.as_str())
            .filter(|m| !m.is_empty())
    });
    if let Some(m) = message {
        return m.to_string();
    }
    if parsed.is_some() && !body.trim().is_empty() {
        return body.chars().take(300).collect();
    }
    format!("HTTP {status}")
}
