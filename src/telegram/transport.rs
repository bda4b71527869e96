//! `ChatTransport` over the Telegram Bot API.

use async_trait::async_trait;
use std::path::Path;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, InputFile};

use crate::download::error::DeliveryError;
use crate::download::send::ChatTransport;

/// Sends files and messages to one chat.
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramTransport {
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self { bot, chat_id }
    }

    async fn announce(&self, action: ChatAction) {
        if let Err(e) = self.bot.send_chat_action(self.chat_id, action).await {
            log::debug!("Failed to send chat action: {}", e);
        }
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_media(&self, path: &Path, caption: &str) -> Result<(), DeliveryError> {
        self.announce(ChatAction::UploadVideo).await;
        self.bot
            .send_video(self.chat_id, InputFile::file(path))
            .caption(caption)
            .supports_streaming(true)
            .await
            .map(|_| ())
            .map_err(|e| DeliveryError::TransportRejected(e.to_string()))
    }

    async fn send_document(&self, path: &Path, caption: &str) -> Result<(), DeliveryError> {
        self.announce(ChatAction::UploadDocument).await;
        self.bot
            .send_document(self.chat_id, InputFile::file(path))
            .caption(caption)
            .await
            .map(|_| ())
            .map_err(|e| DeliveryError::TransportRejected(e.to_string()))
    }

    async fn send_text(&self, text: &str) -> Result<(), DeliveryError> {
        self.bot
            .send_message(self.chat_id, text)
            .await
            .map(|_| ())
            .map_err(|e| DeliveryError::TransportRejected(e.to_string()))
    }
}
