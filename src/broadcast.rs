//! Broadcast dispatcher
//!
//! Fans a message out to every registered subscriber with one independent,
//! concurrent send per recipient. Outcomes are aggregated per call; a failed
//! send never blocks or cancels the others. The whole set goes out in one
//! burst with no batching or rate limiting, which can exceed the transport's
//! rate limit for large sets; acknowledged scaling gap.

use async_trait::async_trait;
use base64::Engine;
use futures::future::join_all;
use serde::Serialize;
use serde_json::json;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::db::subscribers;
use crate::error::{Error, Result};

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Image attachment for a photo broadcast: either a remotely resolvable
/// reference (sent by reference) or raw bytes (uploaded as an attachment)
#[derive(Debug, Clone)]
pub enum PhotoPayload {
    Url(String),
    Bytes(Vec<u8>),
}

impl PhotoPayload {
    /// Decode an embedded base64 payload into raw bytes
    pub fn from_base64(encoded: &str) -> Result<PhotoPayload> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| Error::InvalidInput(format!("invalid base64 image: {}", e)))?;
        Ok(PhotoPayload::Bytes(bytes))
    }
}

/// One failed delivery within a broadcast
#[derive(Debug, Clone, Serialize)]
pub struct SendFailure {
    pub chat_id: i64,
    pub error: String,
}

/// Aggregated outcome of one broadcast call
///
/// `successful` counts sends the transport accepted; it does not confirm
/// end-user receipt.
#[derive(Debug, Clone, Serialize)]
pub struct BroadcastResult {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub failures: Vec<SendFailure>,
}

/// Outbound message transport, one send per recipient
#[async_trait]
pub trait MessageTransport: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()>;
    async fn send_photo(&self, chat_id: i64, photo: &PhotoPayload, caption: &str) -> Result<()>;
}

/// Telegram Bot API transport
pub struct TelegramTransport {
    client: reqwest::Client,
    bot_token: Option<String>,
}

impl TelegramTransport {
    pub fn new(client: reqwest::Client, bot_token: Option<String>) -> Self {
        if bot_token.is_none() {
            warn!("Telegram bot token not configured; broadcasts will fail");
        }
        Self { client, bot_token }
    }

    fn method_url(&self, method: &str) -> Result<String> {
        let token = self
            .bot_token
            .as_deref()
            .ok_or_else(|| Error::Config("Telegram bot token not configured".to_string()))?;
        Ok(format!("{}/bot{}/{}", TELEGRAM_API_BASE, token, method))
    }

    async fn check(response: reqwest::Response) -> Result<()> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::Transport(format!("telegram API {}: {}", status, body)))
    }
}

#[async_trait]
impl MessageTransport for TelegramTransport {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()> {
        let response = self
            .client
            .post(self.method_url("sendMessage")?)
            .json(&json!({
                "chat_id": chat_id,
                "text": text,
                "parse_mode": "HTML",
            }))
            .send()
            .await?;
        Self::check(response).await
    }

    async fn send_photo(&self, chat_id: i64, photo: &PhotoPayload, caption: &str) -> Result<()> {
        let url = self.method_url("sendPhoto")?;
        let response = match photo {
            // Remote reference: Telegram fetches the image itself
            PhotoPayload::Url(image_url) => {
                self.client
                    .post(&url)
                    .json(&json!({
                        "chat_id": chat_id,
                        "photo": image_url,
                        "caption": caption,
                        "parse_mode": "HTML",
                    }))
                    .send()
                    .await?
            }
            // Raw bytes: multipart upload
            PhotoPayload::Bytes(bytes) => {
                let part = reqwest::multipart::Part::bytes(bytes.clone())
                    .file_name("milestone.jpg")
                    .mime_str("image/jpeg")?;
                let form = reqwest::multipart::Form::new()
                    .text("chat_id", chat_id.to_string())
                    .text("caption", caption.to_string())
                    .text("parse_mode", "HTML")
                    .part("photo", part);
                self.client.post(&url).multipart(form).send().await?
            }
        };
        Self::check(response).await
    }
}

/// Concurrent per-subscriber fan-out with aggregated result
#[derive(Clone)]
pub struct BroadcastDispatcher {
    transport: Arc<dyn MessageTransport>,
}

impl BroadcastDispatcher {
    pub fn new(transport: Arc<dyn MessageTransport>) -> Self {
        Self { transport }
    }

    /// Send a text message to every subscriber
    pub async fn send_text(&self, db: &SqlitePool, message: &str) -> Result<BroadcastResult> {
        let recipients = subscribers::list(db).await?;
        let sends = recipients.iter().map(|&chat_id| {
            let transport = &self.transport;
            async move { (chat_id, transport.send_text(chat_id, message).await) }
        });
        let result = aggregate(join_all(sends).await);
        info!(
            total = result.total,
            successful = result.successful,
            failed = result.failed,
            "Text broadcast finished"
        );
        Ok(result)
    }

    /// Send a photo with caption to every subscriber
    pub async fn send_photo(
        &self,
        db: &SqlitePool,
        photo: &PhotoPayload,
        caption: &str,
    ) -> Result<BroadcastResult> {
        let recipients = subscribers::list(db).await?;
        let sends = recipients.iter().map(|&chat_id| {
            let transport = &self.transport;
            async move { (chat_id, transport.send_photo(chat_id, photo, caption).await) }
        });
        let result = aggregate(join_all(sends).await);
        info!(
            total = result.total,
            successful = result.successful,
            failed = result.failed,
            "Photo broadcast finished"
        );
        Ok(result)
    }
}

fn aggregate(outcomes: Vec<(i64, Result<()>)>) -> BroadcastResult {
    let total = outcomes.len();
    let mut failures = Vec::new();
    for (chat_id, outcome) in outcomes {
        if let Err(e) = outcome {
            debug!(chat_id, "Send failed: {}", e);
            failures.push(SendFailure {
                chat_id,
                error: e.to_string(),
            });
        }
    }
    let failed = failures.len();
    BroadcastResult {
        total,
        successful: total - failed,
        failed,
        failures,
    }
}
