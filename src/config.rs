//! Configuration and settings management
//!
//! Loads settings from environment variables and defines retry constants.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub telegram_token: String,

    /// Chat/channel id where feed-mode videos are posted
    pub target_chat_id: Option<i64>,

    /// YouTube channel id watched by the feed poller; feed mode is off
    /// unless both this and `target_chat_id` are set
    pub yt_channel_id: Option<String>,

    /// Seconds between feed polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    /// Videos longer than this (seconds) are rejected before any fetch
    #[serde(default = "default_max_duration_seconds")]
    pub max_duration_seconds: u32,

    /// Height cap applied to format selectors
    #[serde(default = "default_max_height")]
    pub max_height: u32,

    /// Directory for downloaded media; defaults to the system temp dir
    pub download_dir: Option<String>,

    /// yt-dlp binary name or path
    #[serde(default = "default_ytdlp_bin")]
    pub ytdlp_bin: String,
}

const fn default_poll_interval() -> u64 {
    300
}

const fn default_max_duration_seconds() -> u32 {
    75
}

const fn default_max_height() -> u32 {
    1080
}

fn default_ytdlp_bin() -> String {
    "yt-dlp".to_string()
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            // Environment::default() auto-converts UPPER_SNAKE_CASE to
            // snake_case; ignore_empty treats empty env vars as unset
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        let mut settings: Self = s.try_deserialize()?;

        // Fallback: read directly if the automatic mapping missed these
        if settings.yt_channel_id.is_none() {
            if let Ok(val) = std::env::var("YT_CHANNEL_ID") {
                if !val.is_empty() {
                    settings.yt_channel_id = Some(val);
                }
            }
        }
        if settings.target_chat_id.is_none() {
            if let Ok(val) = std::env::var("TARGET_CHAT_ID") {
                if let Ok(id) = val.parse() {
                    settings.target_chat_id = Some(id);
                }
            }
        }

        Ok(settings)
    }

    /// Directory for downloaded media files.
    #[must_use]
    pub fn download_dir(&self) -> std::path::PathBuf {
        self.download_dir
            .as_ref()
            .map_or_else(std::env::temp_dir, std::path::PathBuf::from)
    }

    /// The RSS endpoint for the watched channel, when feed mode is enabled.
    #[must_use]
    pub fn feed_url(&self) -> Option<String> {
        self.yt_channel_id
            .as_ref()
            .map(|id| format!("https://www.youtube.com/feeds/videos.xml?channel_id={id}"))
    }
}

// Telegram API retry configuration
/// Initial backoff for resilient Telegram sends
pub const TELEGRAM_API_INITIAL_BACKOFF_MS: u64 = 500;
/// Backoff ceiling
pub const TELEGRAM_API_MAX_BACKOFF_MS: u64 = 8_000;
/// Attempts before a send is considered failed
pub const TELEGRAM_API_MAX_RETRIES: usize = 3;

/// Telegram caption hard limit in characters
pub const CAPTION_LIMIT: usize = 1024;

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    // Runs alone in this module to avoid environment variable races
    #[test]
    fn test_config_env_loading() -> Result<(), Box<dyn std::error::Error>> {
        env::set_var("TELEGRAM_TOKEN", "dummy_token");
        env::set_var("YT_CHANNEL_ID", "UCdummy");
        env::set_var("TARGET_CHAT_ID", "-1001234567890");

        let settings = Settings::new()?;
        assert_eq!(settings.telegram_token, "dummy_token");
        assert_eq!(settings.yt_channel_id.as_deref(), Some("UCdummy"));
        assert_eq!(settings.target_chat_id, Some(-1_001_234_567_890));
        assert_eq!(settings.poll_interval, 300);
        assert_eq!(settings.max_duration_seconds, 75);
        assert_eq!(settings.max_height, 1080);
        assert_eq!(
            settings.feed_url().as_deref(),
            Some("https://www.youtube.com/feeds/videos.xml?channel_id=UCdummy")
        );

        env::remove_var("YT_CHANNEL_ID");
        env::remove_var("TARGET_CHAT_ID");

        // Empty env var is treated as unset
        env::set_var("YT_CHANNEL_ID", "");
        let settings = Settings::new()?;
        assert_eq!(settings.yt_channel_id, None);
        assert_eq!(settings.feed_url(), None);

        env::remove_var("YT_CHANNEL_ID");
        env::remove_var("TELEGRAM_TOKEN");
        Ok(())
    }
}
