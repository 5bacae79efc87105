//! Link detection and platform classification.
//!
//! Maps raw message text to the first contained URL, and a URL to the
//! platform tag that selects its extraction strategy. Pure functions, no I/O.

use lazy_regex::lazy_regex;
use serde::Serialize;

/// Match the first http(s) URL embedded in arbitrary text.
static RE_URL: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r#"https?://[^\s<>"']+"#);

/// Platform tag derived from a link. Immutable once classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Platform {
    /// YouTube Shorts (short-form; gets the mobile-client presets)
    YoutubeShorts,
    /// Regular YouTube videos (youtube.com, youtu.be)
    Youtube,
    /// Instagram reels/posts
    Instagram,
    /// TikTok videos
    TikTok,
    /// Twitter / X videos
    Twitter,
    /// VK videos and clips
    Vk,
    /// Anything else yt-dlp might still handle
    Other,
}

impl Platform {
    /// Classify a URL by domain substring, first matching rule wins.
    ///
    /// The `shorts` path check runs before the generic YouTube rule so that
    /// short-form links get the short-form preset ordering.
    #[must_use]
    pub fn classify(url: &str) -> Self {
        let url = url.to_lowercase();

        if url.contains("/shorts/") && (url.contains("youtube.com") || url.contains("youtu.be")) {
            return Self::YoutubeShorts;
        }
        if url.contains("youtube.com") || url.contains("youtu.be") {
            return Self::Youtube;
        }
        if url.contains("instagram.com") {
            return Self::Instagram;
        }
        if url.contains("tiktok.com") {
            return Self::TikTok;
        }
        if url.contains("twitter.com") || url.contains("//x.com") || url.contains("www.x.com") {
            return Self::Twitter;
        }
        if url.contains("vk.com") || url.contains("vkvideo.ru") {
            return Self::Vk;
        }
        Self::Other
    }

    /// Whether this platform serves primarily short-form vertical video.
    #[must_use]
    pub const fn is_short_form(self) -> bool {
        matches!(self, Self::YoutubeShorts | Self::TikTok | Self::Instagram)
    }

    /// Human-readable platform name used in captions.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::YoutubeShorts => "YouTube Shorts",
            Self::Youtube => "YouTube",
            Self::Instagram => "Instagram",
            Self::TikTok => "TikTok",
            Self::Twitter => "Twitter",
            Self::Vk => "VK",
            Self::Other => "Video",
        }
    }
}

/// Find the first http(s) URL in a message, if any.
#[must_use]
pub fn find_url(text: &str) -> Option<&str> {
    RE_URL.find(text).map(|m| m.as_str())
}

/// Validate that a matched link is a well-formed http(s) URL.
#[must_use]
pub fn is_valid_url(url: &str) -> bool {
    url::Url::parse(url)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}
