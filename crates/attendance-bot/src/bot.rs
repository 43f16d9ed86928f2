//! Receive loop: pulls updates from Telegram and answers them one by one.

use anyhow::Result;
use tracing::{debug, warn};

use attendance_core::{Command, DatasetSource, Dispatcher};

use crate::supervisor::ReceiveLoop;
use crate::telegram::{Message, TelegramClient};

pub struct Bot<S> {
    client: TelegramClient,
    dispatcher: Dispatcher<S>,
    /// Next update id to request; kept across restarts so a crash never
    /// replays an update that was already taken off the queue
    offset: Option<i64>,
}

impl<S: DatasetSource> Bot<S> {
    pub fn new(client: TelegramClient, dispatcher: Dispatcher<S>) -> Self {
        Self {
            client,
            dispatcher,
            offset: None,
        }
    }

    async fn handle_message(&mut self, message: Message) {
        let Some(text) = message.text.as_deref() else {
            return;
        };
        let Some(command) = Command::parse(text) else {
            debug!(chat = message.chat.id, "Ignoring non-command message");
            return;
        };

        let chat = message.chat_id();
        let reply = self.dispatcher.handle(chat, command).await;
        if let Err(e) = self.client.send_message(chat, &reply.text, reply.format).await {
            warn!(chat = %chat, error = %e, "Failed to send reply");
        }
    }
}

impl<S: DatasetSource> ReceiveLoop for Bot<S> {
    /// Poll forever. A failing `getUpdates` ends the loop with an error;
    /// shutdown is left to the supervisor.
    async fn run(&mut self) -> Result<()> {
        loop {
            let updates = self.client.get_updates(self.offset).await?;
            for update in updates {
                self.offset = Some(update.update_id + 1);
                if let Some(message) = update.message {
                    self.handle_message(message).await;
                }
            }
        }
    }
}
