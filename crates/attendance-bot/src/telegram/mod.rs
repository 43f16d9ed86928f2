//! Minimal Telegram Bot API client.
//!
//! Only what the bot needs: long-polling `getUpdates` for inbound messages
//! and `sendMessage` for replies.

pub mod client;
pub mod error;
pub mod types;

pub use client::TelegramClient;
pub use error::TelegramError;
pub use types::Message;
