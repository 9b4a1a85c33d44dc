// src/integrations/types.rs — Chat transport trait and update types

use async_trait::async_trait;

use crate::bot::Reply;

/// One event received from the chat platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    /// Monotonic id; the next poll starts after the highest one seen.
    pub update_id: i64,
    pub chat_id: i64,
    pub user_id: i64,
    pub event: IncomingEvent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncomingEvent {
    Text(String),
    Document {
        file_id: String,
        file_name: Option<String>,
        file_size: Option<u64>,
    },
    /// Inline button press.
    Callback { id: String, data: String },
    /// Anything the bot does not react to (stickers, edits, joins).
    Unsupported,
}

/// Long-polling chat transport (Telegram Bot API and test doubles).
#[async_trait]
pub trait ChatTransport: Send + Sync {
    fn id(&self) -> &str;

    /// Updates with `update_id >= offset`, waiting up to `timeout_secs`.
    async fn poll(&self, offset: i64, timeout_secs: u64) -> anyhow::Result<Vec<Update>>;

    async fn send(&self, chat_id: i64, reply: &Reply) -> anyhow::Result<()>;

    /// Acknowledge a button press so the client stops its spinner.
    async fn answer_callback(&self, callback_id: &str) -> anyhow::Result<()>;

    /// Fetch an uploaded file as UTF-8 text.
    async fn download(&self, file_id: &str) -> anyhow::Result<String>;
}
