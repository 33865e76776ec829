use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, warn};

use xpost_core::messaging::throttled::{ThrottleConfig, ThrottledChannels};
use xpost_core::{
    broadcast::Broadcaster, config::Config, guard::missing_languages,
    messaging::port::ChannelPort, pipeline::Crossposter, translation::Translator,
};

use crate::handlers;
use crate::TelegramChannels;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub crossposter: Arc<Crossposter>,
    pub sessions: Arc<PostSessions>,
    pub chat_locks: Arc<ChatLocks>,
}

#[derive(Default)]
pub struct ChatLocks {
    inner: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl ChatLocks {
    pub async fn lock_chat(&self, chat_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(chat_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

/// Chats currently in post-creation mode.
#[derive(Default)]
pub struct PostSessions {
    active: Mutex<HashSet<i64>>,
}

impl PostSessions {
    pub async fn start(&self, chat_id: i64) {
        self.active.lock().await.insert(chat_id);
    }

    /// Returns whether a session was open.
    pub async fn end(&self, chat_id: i64) -> bool {
        self.active.lock().await.remove(&chat_id)
    }

    pub async fn is_active(&self, chat_id: i64) -> bool {
        self.active.lock().await.contains(&chat_id)
    }
}

pub async fn run_polling(cfg: Arc<Config>, translator: Option<Translator>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    if let Ok(me) = bot.get_me().await {
        info!(username = %me.username(), "xpost started");
    }
    info!(
        admin_group_id = cfg.admin_group_id,
        channels = cfg.channels.active().len(),
        translation = translator.is_some(),
        "configuration loaded"
    );
    let missing = missing_languages(&cfg.channels);
    if !missing.is_empty() {
        let titles: Vec<_> = missing.iter().map(|l| l.title()).collect();
        warn!(missing = %titles.join(", "), "crosspost is not fully configured");
    }
    if translator.is_none() {
        warn!("OPENAI_API_KEY is not set; only posts without text can be published");
    }

    // Channel writes are spaced out here; 429 RetryAfter is still retried
    // once inside the Telegram adapter.
    let raw: Arc<dyn ChannelPort> = Arc::new(TelegramChannels::new(bot.clone()));
    let port: Arc<dyn ChannelPort> = Arc::new(ThrottledChannels::new(
        raw,
        ThrottleConfig::with_per_chat(cfg.channel_throttle),
    ));
    let broadcaster = Broadcaster::new(cfg.channels.clone(), port);

    let state = Arc::new(AppState {
        cfg: cfg.clone(),
        crossposter: Arc::new(Crossposter::new(broadcaster, translator)),
        sessions: Arc::new(PostSessions::default()),
        chat_locks: Arc::new(ChatLocks::default()),
    });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
