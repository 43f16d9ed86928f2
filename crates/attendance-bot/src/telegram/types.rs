//! Bot API payloads, limited to the fields the bot reads or sends.

use serde::{Deserialize, Serialize};

use attendance_core::{ChatId, ReplyFormat};

/// Envelope of every Bot API response
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

impl Message {
    pub fn chat_id(&self) -> ChatId {
        ChatId(self.chat.id)
    }
}

#[derive(Debug, Serialize)]
pub struct GetUpdates {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    pub timeout: u64,
    pub allowed_updates: &'static [&'static str],
}

#[derive(Debug, Serialize)]
pub struct SendMessage<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_web_page_preview: Option<bool>,
}

impl<'a> SendMessage<'a> {
    pub fn new(chat: ChatId, text: &'a str, format: ReplyFormat) -> Self {
        let (parse_mode, disable_web_page_preview) = match format {
            ReplyFormat::Plain => (None, None),
            ReplyFormat::Markdown => (Some("Markdown"), Some(true)),
        };
        Self {
            chat_id: chat.0,
            text,
            parse_mode,
            disable_web_page_preview,
        }
    }
}
