//! Command and message handlers.
//!
//! One inbound message is processed to completion (classify → probe → fetch →
//! deliver → cleanup) before the handler returns; extraction failures are
//! fully absorbed into a single user-facing reply and never escape.

use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::utils::command::BotCommands;
use tracing::{error, info, warn};

use crate::bot::caption::build_caption;
use crate::bot::resilient::{Delivery, TelegramDelivery};
use crate::extract::ytdlp::YtDlpRunner;
use crate::extract::{platform, Extractor, Pipeline, Platform, RelayError};
use crate::utils::format_duration;

/// Bot commands
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    /// Show the usage blurb
    #[command(description = "Show usage.")]
    Start,
    /// Liveness probe
    #[command(description = "Health check.")]
    Healthcheck,
}

/// Reply to `/start` with usage instructions.
///
/// # Errors
///
/// Propagates Telegram send failures.
pub async fn start(bot: Bot, msg: Message) -> Result<()> {
    let text = "<b>Hi!</b> Send me a video link (YouTube Shorts, TikTok, Instagram, ...) \
                and I will fetch it and post it back here.";
    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Reply to `/healthcheck`.
///
/// # Errors
///
/// Propagates Telegram send failures.
pub async fn healthcheck(bot: Bot, msg: Message) -> Result<()> {
    bot.send_message(msg.chat.id, "OK").await?;
    Ok(())
}

/// Reply to anything that parses as a command we do not know.
///
/// # Errors
///
/// Propagates Telegram send failures.
pub async fn unknown_command(bot: Bot, msg: Message) -> Result<()> {
    bot.send_message(msg.chat.id, "Unknown command. Just send me a video link.")
        .await?;
    Ok(())
}

/// Handle a plain text message: find a link, run the extraction pipeline,
/// deliver the video, clean up.
///
/// # Errors
///
/// Propagates only Telegram send failures for the reply itself; pipeline
/// failures are absorbed into the reply text.
pub async fn handle_text(
    bot: Bot,
    msg: Message,
    pipeline: Arc<Pipeline<YtDlpRunner>>,
) -> Result<()> {
    let text = msg.text().unwrap_or_default();
    let chat_id = msg.chat.id;
    let delivery = TelegramDelivery::new(bot);

    match relay_link(&delivery, chat_id, text, &pipeline).await {
        Ok(()) => Ok(()),
        Err(err) => {
            let reply = user_facing_message(&err);
            if let RelayError::Delivery(ref inner) = err {
                error!(chat_id = chat_id.0, error = %inner, "delivery failed");
            } else {
                info!(chat_id = chat_id.0, error = %err, "request rejected");
            }
            delivery.send_text(chat_id, &reply, None).await?;
            Ok(())
        }
    }
}

/// Run the pipeline for the first link in `text` and post the result back.
async fn relay_link<E: Extractor>(
    delivery: &dyn Delivery,
    chat_id: ChatId,
    text: &str,
    pipeline: &Pipeline<E>,
) -> Result<(), RelayError> {
    let url = platform::find_url(text).ok_or(RelayError::NoLink)?;
    if !platform::is_valid_url(url) {
        return Err(RelayError::InvalidUrl(url.to_string()));
    }

    let tag = Platform::classify(url);
    info!(url, platform = ?tag, "processing inbound link");

    delivery
        .send_text(chat_id, "⏳ Downloading…", None)
        .await
        .map_err(RelayError::Delivery)?;

    let result = pipeline.run(url, tag).await?;

    let caption = build_caption(&result.info, tag);
    let sent = delivery
        .send_video(chat_id, &result.file_path, &caption)
        .await;

    // Cleanup is unconditional: the file goes away whether or not the
    // delivery went through.
    if let Err(e) = tokio::fs::remove_file(&result.file_path).await {
        warn!(path = %result.file_path.display(), error = %e, "failed to remove downloaded file");
    }

    sent.map_err(RelayError::Delivery)?;
    info!(id = %result.info.id, chat_id = chat_id.0, "video delivered");
    Ok(())
}

/// Map a pipeline failure to the single user-facing reply for this request.
#[must_use]
pub fn user_facing_message(err: &RelayError) -> String {
    match err {
        RelayError::NoLink => "Send me a video link (http/https) and I'll fetch it.".to_string(),
        RelayError::InvalidUrl(url) => format!("That doesn't look like a valid link: {url}"),
        RelayError::DurationExceeded { actual, limit } => format!(
            "This video is {} long — over the {} limit. Skipping.",
            format_duration(*actual),
            format_duration(*limit)
        ),
        RelayError::Exhausted { kind, .. } => format!("Couldn't fetch that: {kind}."),
        RelayError::Delivery(_) => "The video was downloaded but sending it failed. Try again later.".to_string(),
    }
}
