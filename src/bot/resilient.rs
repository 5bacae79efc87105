//! Resilient messaging: Telegram sends with automatic retry on transient
//! network failures, using exponential backoff with jitter.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InputFile, ParseMode};

use crate::utils::retry_telegram_operation;

/// Seam to the messaging surface. The production implementation sends through
/// a teloxide [`Bot`] with retries; tests inject a recording mock.
#[async_trait]
pub trait Delivery: Send + Sync {
    /// Send a text message.
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<()>;

    /// Send a video file with an HTML caption.
    async fn send_video(&self, chat_id: ChatId, file_path: &Path, caption: &str) -> Result<()>;
}

/// [`Delivery`] over a teloxide [`Bot`], retrying each send on transient
/// failures.
pub struct TelegramDelivery {
    bot: Bot,
}

impl TelegramDelivery {
    /// Wrap a bot handle.
    #[must_use]
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Delivery for TelegramDelivery {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<()> {
        retry_telegram_operation(|| async {
            let mut req = self.bot.send_message(chat_id, text.to_string());
            if let Some(pm) = parse_mode {
                req = req.parse_mode(pm);
            }
            req.await
                .map_err(|e| anyhow::anyhow!("Telegram send error: {e}"))
        })
        .await?;
        Ok(())
    }

    async fn send_video(&self, chat_id: ChatId, file_path: &Path, caption: &str) -> Result<()> {
        retry_telegram_operation(|| async {
            let mut req = self
                .bot
                .send_video(chat_id, InputFile::file(file_path))
                .supports_streaming(true);
            if !caption.is_empty() {
                req = req.caption(caption.to_string()).parse_mode(ParseMode::Html);
            }
            req.await
                .map_err(|e| anyhow::anyhow!("Telegram video send error: {e}"))
        })
        .await?;
        Ok(())
    }
}
