use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::types::{Media, OutgoingText},
    Result,
};

/// Port for writing to publication channels.
///
/// Telegram is the only implementation; the fake in the pipeline tests records
/// calls instead.
#[async_trait]
pub trait ChannelPort: Send + Sync {
    /// Copy `source` verbatim (formatting and custom emoji included).
    async fn copy_post(&self, to: ChatId, source: MessageRef) -> Result<MessageRef>;

    async fn send_text(&self, to: ChatId, text: &OutgoingText) -> Result<MessageRef>;

    async fn send_media(
        &self,
        to: ChatId,
        media: &Media,
        caption: Option<&OutgoingText>,
    ) -> Result<MessageRef>;
}
