#![deny(missing_docs)]
//! clip-relay: Telegram video link relay bot
//!
//! Relays video links from chat messages to yt-dlp, downloads the media, and
//! re-uploads it with a caption. Optionally watches a channel RSS feed and
//! auto-posts new items through the same extraction pipeline.

/// Telegram bot implementation
pub mod bot;
/// Configuration management
pub mod config;
/// Link classification, presets, and the fallback executor
pub mod extract;
/// RSS feed watcher
pub mod feed;
pub mod utils;
