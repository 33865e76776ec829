use std::sync::Arc;

use tracing::info;

use xpost_openai::OpenAiClient;

use xpost_core::{config::Config, translation::Translator};

#[tokio::main]
async fn main() -> Result<(), xpost_core::Error> {
    xpost_core::logging::init("xpost")?;

    let cfg = Arc::new(Config::load()?);

    let translator = OpenAiClient::from_settings(&cfg.openai)?
        .map(|client| Translator::new(Arc::new(client), cfg.openai.model.clone()));
    if translator.is_some() {
        info!(model = %cfg.openai.model, "translation enabled");
    }

    xpost_telegram::router::run_polling(cfg, translator)
        .await
        .map_err(|e| xpost_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
