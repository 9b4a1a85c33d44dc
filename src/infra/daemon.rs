// src/infra/daemon.rs — Long-polling bot loop
//
// Polls the transport, turns each update into an `Inbound` event, runs it
// through the dispatcher on the blocking pool, and sends the replies back.

use std::sync::Arc;
use std::time::Duration;

use crate::bot::{Dispatcher, Inbound, Reply};
use crate::infra::config::TelegramConfig;
use crate::integrations::types::{ChatTransport, IncomingEvent, Update};

const UPLOAD_TOO_LARGE: &str = "⛔ Файл слишком большой.";

/// Run the bot until Ctrl+C.
pub async fn run_bot(
    transport: Arc<dyn ChatTransport>,
    dispatcher: Arc<Dispatcher>,
    settings: &TelegramConfig,
) -> anyhow::Result<()> {
    tracing::info!(transport = transport.id(), "taxres bot starting");

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut offset: i64 = 0;
    loop {
        tokio::select! {
            polled = transport.poll(offset, settings.poll_timeout_secs) => {
                match polled {
                    Ok(updates) => {
                        for update in updates {
                            offset = offset.max(update.update_id + 1);
                            process_update(transport.as_ref(), &dispatcher, settings.max_upload_bytes, update).await;
                        }
                    }
                    Err(e) => {
                        tracing::error!("Polling failed: {e}");
                        tokio::time::sleep(Duration::from_secs(settings.retry_delay_secs)).await;
                    }
                }
            }
            _ = &mut shutdown => {
                tracing::info!("Shutdown signal received");
                break;
            }
        }
    }

    tracing::info!("taxres bot stopped");
    Ok(())
}

/// Handle one update end to end. Transport failures are logged, never fatal.
pub async fn process_update(
    transport: &dyn ChatTransport,
    dispatcher: &Arc<Dispatcher>,
    max_upload_bytes: u64,
    update: Update,
) {
    let inbound = match update.event {
        IncomingEvent::Text(text) => Inbound::Text(text),
        IncomingEvent::Callback { id, data } => {
            if let Err(e) = transport.answer_callback(&id).await {
                tracing::warn!("answerCallbackQuery failed: {e}");
            }
            Inbound::Button(data)
        }
        IncomingEvent::Document {
            file_id,
            file_name,
            file_size,
        } => {
            if file_size.is_some_and(|size| size > max_upload_bytes) {
                tracing::info!(
                    user = update.user_id,
                    size = file_size.unwrap_or_default(),
                    "Upload refused: too large"
                );
                send_all(transport, update.chat_id, vec![Reply::new(UPLOAD_TOO_LARGE)]).await;
                return;
            }
            let body = match transport.download(&file_id).await {
                Ok(body) => Some(body),
                Err(e) => {
                    tracing::warn!(
                        user = update.user_id,
                        file = file_name.as_deref().unwrap_or("?"),
                        "Upload download failed: {e}"
                    );
                    None
                }
            };
            Inbound::Document { body }
        }
        IncomingEvent::Unsupported => {
            tracing::debug!(update_id = update.update_id, "Ignoring unsupported update");
            return;
        }
    };

    let worker = Arc::clone(dispatcher);
    let user = update.user_id;
    let replies = match tokio::task::spawn_blocking(move || worker.handle(user, inbound)).await {
        Ok(replies) => replies,
        Err(e) => {
            tracing::error!(user, "Dispatcher task failed: {e}");
            vec![Reply::new(crate::bot::dispatcher::INTERNAL_ERROR)]
        }
    };
    send_all(transport, update.chat_id, replies).await;
}

async fn send_all(transport: &dyn ChatTransport, chat_id: i64, replies: Vec<Reply>) {
    for reply in replies {
        if let Err(e) = transport.send(chat_id, &reply).await {
            tracing::warn!(chat_id, "sendMessage failed: {e}");
        }
    }
}
