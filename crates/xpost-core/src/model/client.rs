use async_trait::async_trait;

use crate::Result;

use super::types::CompletionRequest;

/// Port for a chat-completion backend.
///
/// Implementations return the assistant text (trimmed, possibly empty) and map
/// transport or API failures to [`crate::Error::Translation`].
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, req: CompletionRequest) -> Result<String>;
}
