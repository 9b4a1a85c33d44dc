// src/integrations/telegram.rs — Telegram adapter (Bot API)
//
// Uses the Telegram Bot API (https://core.telegram.org/bots/api) with
// long polling. Replies are plain text; menus become inline keyboards.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::bot::{Menu, Reply};
use crate::integrations::types::{ChatTransport, IncomingEvent, Update};

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

const DEFAULT_MAX_DOWNLOAD_BYTES: u64 = 1024 * 1024;

/// Telegram transport adapter.
pub struct TelegramAdapter {
    client: Client,
    bot_token: String,
    api_base: String,
    max_download_bytes: u64,
}

impl TelegramAdapter {
    pub fn new(bot_token: String) -> Self {
        Self::with_api_base(bot_token, TELEGRAM_API_BASE)
    }

    /// Point at a self-hosted Bot API server.
    pub fn with_api_base(bot_token: String, api_base: &str) -> Self {
        Self {
            client: Client::new(),
            bot_token,
            api_base: api_base.trim_end_matches('/').to_string(),
            max_download_bytes: DEFAULT_MAX_DOWNLOAD_BYTES,
        }
    }

    /// Stop reading a downloaded file once it grows past `max` bytes.
    pub fn with_max_download_bytes(mut self, max: u64) -> Self {
        self.max_download_bytes = max;
        self
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.bot_token)
    }

    fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{file_path}", self.api_base, self.bot_token)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &serde_json::Value,
    ) -> anyhow::Result<T> {
        let resp: TelegramResponse<T> = self
            .client
            .post(self.api_url(method))
            .json(body)
            .send()
            .await?
            .json()
            .await?;

        if !resp.ok {
            anyhow::bail!(
                "Telegram {method} failed: {}",
                resp.description.unwrap_or_else(|| "unknown".into())
            );
        }
        resp.result
            .ok_or_else(|| anyhow::anyhow!("Telegram {method} returned no result"))
    }

    /// Validate the bot token by calling getMe.
    pub async fn validate(&self) -> anyhow::Result<String> {
        #[derive(Deserialize)]
        struct BotUser {
            username: Option<String>,
            first_name: Option<String>,
        }

        let bot: BotUser = self.call("getMe", &serde_json::json!({})).await?;
        Ok(format!(
            "Authenticated as @{}",
            bot.username
                .unwrap_or_else(|| bot.first_name.unwrap_or_default())
        ))
    }
}

// -- Telegram API response types --

#[derive(Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct TgUpdate {
    update_id: i64,
    message: Option<TgMessage>,
    callback_query: Option<TgCallbackQuery>,
}

#[derive(Deserialize)]
struct TgMessage {
    chat: TgChat,
    from: Option<TgUser>,
    text: Option<String>,
    document: Option<TgDocument>,
}

#[derive(Deserialize)]
struct TgChat {
    id: i64,
}

#[derive(Deserialize)]
struct TgUser {
    id: i64,
}

#[derive(Deserialize)]
struct TgDocument {
    file_id: String,
    file_name: Option<String>,
    file_size: Option<u64>,
}

#[derive(Deserialize)]
struct TgCallbackQuery {
    id: String,
    from: TgUser,
    message: Option<TgMessage>,
    data: Option<String>,
}

#[derive(Deserialize)]
struct TgFile {
    file_path: Option<String>,
    file_size: Option<u64>,
}

/// Append one body chunk, refusing to grow `buf` past `max` bytes.
fn append_capped(buf: &mut Vec<u8>, chunk: &[u8], max: u64) -> anyhow::Result<()> {
    if (buf.len() + chunk.len()) as u64 > max {
        anyhow::bail!("file exceeds {max} bytes");
    }
    buf.extend_from_slice(chunk);
    Ok(())
}

fn decode_text(bytes: Vec<u8>) -> anyhow::Result<String> {
    String::from_utf8(bytes).map_err(|e| anyhow::anyhow!("file is not valid UTF-8: {e}"))
}

fn convert_update(u: TgUpdate) -> Update {
    if let Some(q) = u.callback_query {
        let chat_id = q.message.as_ref().map(|m| m.chat.id).unwrap_or(q.from.id);
        return Update {
            update_id: u.update_id,
            chat_id,
            user_id: q.from.id,
            event: IncomingEvent::Callback {
                id: q.id,
                data: q.data.unwrap_or_default(),
            },
        };
    }

    let Some(m) = u.message else {
        return Update {
            update_id: u.update_id,
            chat_id: 0,
            user_id: 0,
            event: IncomingEvent::Unsupported,
        };
    };
    let user_id = m.from.as_ref().map(|f| f.id).unwrap_or(m.chat.id);
    let event = match (m.document, m.text) {
        (Some(doc), _) => IncomingEvent::Document {
            file_id: doc.file_id,
            file_name: doc.file_name,
            file_size: doc.file_size,
        },
        (None, Some(text)) => IncomingEvent::Text(text),
        (None, None) => IncomingEvent::Unsupported,
    };
    Update {
        update_id: u.update_id,
        chat_id: m.chat.id,
        user_id,
        event,
    }
}

fn inline_keyboard(menu: &Menu) -> serde_json::Value {
    let rows: Vec<Vec<serde_json::Value>> = menu
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|b| {
                    serde_json::json!({
                        "text": b.label,
                        "callback_data": b.action.as_str(),
                    })
                })
                .collect()
        })
        .collect();
    serde_json::json!({ "inline_keyboard": rows })
}

fn send_message_body(chat_id: i64, reply: &Reply) -> serde_json::Value {
    let mut body = serde_json::json!({
        "chat_id": chat_id,
        "text": reply.text,
    });
    if let Some(menu) = &reply.menu {
        body["reply_markup"] = inline_keyboard(menu);
    }
    body
}

// -- ChatTransport implementation --

#[async_trait]
impl ChatTransport for TelegramAdapter {
    fn id(&self) -> &str {
        "telegram"
    }

    async fn poll(&self, offset: i64, timeout_secs: u64) -> anyhow::Result<Vec<Update>> {
        let body = serde_json::json!({
            "offset": offset,
            "timeout": timeout_secs,
            "allowed_updates": ["message", "callback_query"],
        });
        let updates: Vec<TgUpdate> = self.call("getUpdates", &body).await?;
        Ok(updates.into_iter().map(convert_update).collect())
    }

    async fn send(&self, chat_id: i64, reply: &Reply) -> anyhow::Result<()> {
        let _: serde_json::Value = self
            .call("sendMessage", &send_message_body(chat_id, reply))
            .await?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> anyhow::Result<()> {
        let body = serde_json::json!({ "callback_query_id": callback_id });
        let _: bool = self.call("answerCallbackQuery", &body).await?;
        Ok(())
    }

    async fn download(&self, file_id: &str) -> anyhow::Result<String> {
        let file: TgFile = self
            .call("getFile", &serde_json::json!({ "file_id": file_id }))
            .await?;
        if file.file_size.is_some_and(|size| size > self.max_download_bytes) {
            anyhow::bail!("file exceeds {} bytes", self.max_download_bytes);
        }
        let path = file
            .file_path
            .ok_or_else(|| anyhow::anyhow!("Telegram getFile returned no file_path"))?;

        let mut resp = self.client.get(self.file_url(&path)).send().await?;
        if !resp.status().is_success() {
            anyhow::bail!("Telegram file download failed: HTTP {}", resp.status());
        }
        let mut body = Vec::new();
        while let Some(chunk) = resp.chunk().await? {
            append_capped(&mut body, &chunk, self.max_download_bytes)?;
        }
        decode_text(body)
    }
}
