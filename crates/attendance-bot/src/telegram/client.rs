//! HTTP client for the Telegram Bot API.

use std::time::Duration;

use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use attendance_core::{ChatId, ReplyFormat};

use super::types::{ApiResponse, GetUpdates, SendMessage, Update};
use super::TelegramError;

/// Base URL of the Bot API
const API_BASE_URL: &str = "https://api.telegram.org";

/// How long the server may hold a `getUpdates` request open
pub const LONG_POLL_TIMEOUT_SECS: u64 = 30;

/// HTTP request timeout in seconds.
/// Must stay above the long poll timeout or every idle poll would fail.
const REQUEST_TIMEOUT_SECS: u64 = LONG_POLL_TIMEOUT_SECS + 15;

/// Only plain messages are routed to the dispatcher
const ALLOWED_UPDATES: &[&str] = &["message"];

/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(token: &str) -> Result<Self, TelegramError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: format!("{}/bot{}", API_BASE_URL, token),
        })
    }

    async fn call<T: DeserializeOwned, B: Serialize>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<T, TelegramError> {
        let url = format!("{}/{}", self.base_url, method);
        let response = self.client.post(&url).json(body).send().await?;

        // Error statuses still carry the JSON envelope with a description
        let envelope: ApiResponse<T> = response.json().await?;
        if !envelope.ok {
            return Err(TelegramError::Api {
                code: envelope.error_code,
                description: envelope.description.unwrap_or_default(),
            });
        }
        envelope.result.ok_or(TelegramError::MissingResult)
    }

    /// Long-poll for new updates starting at `offset`
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, TelegramError> {
        let body = GetUpdates {
            offset,
            timeout: LONG_POLL_TIMEOUT_SECS,
            allowed_updates: ALLOWED_UPDATES,
        };
        let updates: Vec<Update> = self.call("getUpdates", &body).await?;
        if !updates.is_empty() {
            debug!(count = updates.len(), "Received updates");
        }
        Ok(updates)
    }

    pub async fn send_message(
        &self,
        chat: ChatId,
        text: &str,
        format: ReplyFormat,
    ) -> Result<(), TelegramError> {
        let body = SendMessage::new(chat, text, format);
        let _: serde_json::Value = self.call("sendMessage", &body).await?;
        Ok(())
    }
}
