use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

use crate::{
    domain::{ChatId, MessageRef},
    messaging::{
        port::ChannelPort,
        types::{Media, OutgoingText},
    },
    Result,
};

#[derive(Clone, Copy, Debug)]
pub struct ThrottleConfig {
    /// Minimum spacing between any two channel writes.
    pub global_min_interval: Duration,
    /// Minimum spacing between writes to the same channel.
    pub per_chat_min_interval: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            global_min_interval: Duration::from_millis(40),
            per_chat_min_interval: Duration::from_millis(1050),
        }
    }
}

impl ThrottleConfig {
    pub fn with_per_chat(per_chat_min_interval: Duration) -> Self {
        Self {
            per_chat_min_interval,
            ..Self::default()
        }
    }
}

/// Earliest instants at which the next write may start.
#[derive(Debug, Default)]
struct Schedule {
    any: Option<Instant>,
    per_chat: HashMap<ChatId, Instant>,
}

impl Schedule {
    /// Book a write to `chat` and return when it may start.
    fn book(&mut self, chat: ChatId, cfg: &ThrottleConfig, now: Instant) -> Instant {
        let start = [self.any, self.per_chat.get(&chat).copied()]
            .into_iter()
            .flatten()
            .fold(now, Instant::max);
        self.any = Some(start + cfg.global_min_interval);
        self.per_chat.insert(chat, start + cfg.per_chat_min_interval);
        start
    }
}

/// ChannelPort decorator that spaces out writes so a fan-out to several
/// channels stays under Telegram's flood limits.
pub struct ThrottledChannels {
    inner: Arc<dyn ChannelPort>,
    cfg: ThrottleConfig,
    schedule: Mutex<Schedule>,
}

impl ThrottledChannels {
    pub fn new(inner: Arc<dyn ChannelPort>, cfg: ThrottleConfig) -> Self {
        Self {
            inner,
            cfg,
            schedule: Mutex::new(Schedule::default()),
        }
    }

    async fn wait_turn(&self, chat: ChatId) {
        let start = self.schedule.lock().await.book(chat, &self.cfg, Instant::now());
        sleep_until(start).await;
    }
}

#[async_trait::async_trait]
impl ChannelPort for ThrottledChannels {
    async fn copy_post(&self, to: ChatId, source: MessageRef) -> Result<MessageRef> {
        self.wait_turn(to).await;
        self.inner.copy_post(to, source).await
    }

    async fn send_text(&self, to: ChatId, text: &OutgoingText) -> Result<MessageRef> {
        self.wait_turn(to).await;
        self.inner.send_text(to, text).await
    }

    async fn send_media(
        &self,
        to: ChatId,
        media: &Media,
        caption: Option<&OutgoingText>,
    ) -> Result<MessageRef> {
        self.wait_turn(to).await;
        self.inner.send_media(to, media, caption).await
    }
}
