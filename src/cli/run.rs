// src/cli/run.rs — Default command: run the bot; token check

use std::path::Path;
use std::sync::Arc;

use crate::bot::Dispatcher;
use crate::infra::config::Config;
use crate::infra::daemon;
use crate::integrations::{BotCredentials, ChatTransport, TelegramAdapter};
use crate::store::{FileStore, SessionManager};

fn adapter(config: &Config) -> anyhow::Result<TelegramAdapter> {
    let creds = BotCredentials::load(Path::new(&config.telegram.token_file))?;
    creds.validate()?;
    Ok(
        TelegramAdapter::with_api_base(creds.bot_token, &config.telegram.api_base)
            .with_max_download_bytes(config.telegram.max_upload_bytes),
    )
}

/// Start long polling with file-backed sessions.
pub async fn run_bot(config: &Config) -> anyhow::Result<()> {
    let telegram = adapter(config)?;
    let who = telegram.validate().await?;
    tracing::info!("{who}");

    let data_dir = config.data_dir();
    let store = FileStore::new(&data_dir)?;
    tracing::info!("Session data in {}", data_dir.display());

    let dispatcher = Arc::new(Dispatcher::new(SessionManager::new(Arc::new(store))));
    let transport: Arc<dyn ChatTransport> = Arc::new(telegram);
    daemon::run_bot(transport, dispatcher, &config.telegram).await
}

/// Resolve the token and call getMe once.
pub async fn check_token(config: &Config) -> anyhow::Result<()> {
    let telegram = adapter(config)?;
    let who = telegram.validate().await?;
    println!("{who}");
    Ok(())
}
