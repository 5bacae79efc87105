//! Delivery formatter: turns an extraction result into a Telegram caption.
//!
//! Pure transformation, Telegram HTML markup. Absent metadata fields are
//! omitted rather than rendered as placeholders. The plain-text fields are
//! capped before any markup is added, so truncation can never split a tag or
//! an entity.

use crate::extract::{MediaInfo, Platform};
use crate::utils::{format_duration, truncate_str};
use html_escape::{encode_double_quoted_attribute, encode_text};

// Caps on the variable fields keep the parsed caption under Telegram's
// 1024-char limit with room for the duration and link lines.
const TITLE_MAX_CHARS: usize = 850;
const UPLOADER_MAX_CHARS: usize = 100;

/// Build the HTML caption for a delivered video.
#[must_use]
pub fn build_caption(info: &MediaInfo, platform: Platform) -> String {
    let mut caption = String::new();

    if let Some(title) = info.title.as_deref().filter(|t| !t.is_empty()) {
        let title = truncate_str(title, TITLE_MAX_CHARS);
        caption.push_str(&format!("<b>{}</b>\n", encode_text(&title)));
    }

    let mut meta_line = String::new();
    if let Some(duration) = info.duration_secs() {
        meta_line.push_str(&format!("⏱ {}", format_duration(duration)));
    }
    if let Some(uploader) = info.uploader_name().filter(|u| !u.is_empty()) {
        let uploader = truncate_str(uploader, UPLOADER_MAX_CHARS);
        if !meta_line.is_empty() {
            meta_line.push_str("  •  ");
        }
        meta_line.push_str(&format!("👤 {}", encode_text(&uploader)));
    }
    if !meta_line.is_empty() {
        caption.push_str(&meta_line);
        caption.push('\n');
    }

    if let Some(url) = info.webpage_url.as_deref().filter(|u| !u.is_empty()) {
        caption.push_str(&format!(
            "\n<a href=\"{}\">{}</a>",
            encode_double_quoted_attribute(url),
            platform.display_name()
        ));
    }

    caption
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(title: Option<&str>, duration: Option<f64>, uploader: Option<&str>, url: Option<&str>) -> MediaInfo {
        MediaInfo {
            id: "abc123".to_string(),
            title: title.map(String::from),
            duration,
            uploader: uploader.map(String::from),
            channel: None,
            webpage_url: url.map(String::from),
        }
    }

    #[test]
    fn full_caption_has_all_lines() {
        let caption = build_caption(
            &info(
                Some("A clip"),
                Some(75.0),
                Some("someone"),
                Some("https://youtube.com/shorts/abc123"),
            ),
            Platform::YoutubeShorts,
        );
        assert!(caption.contains("<b>A clip</b>"));
        assert!(caption.contains("⏱ 1:15"));
        assert!(caption.contains("👤 someone"));
        assert!(caption.contains(">YouTube Shorts</a>"));
    }

    #[test]
    fn absent_fields_are_omitted() {
        let caption = build_caption(&info(None, None, None, None), Platform::Other);
        assert!(caption.is_empty());

        let caption = build_caption(&info(Some("only title"), None, None, None), Platform::Other);
        assert_eq!(caption, "<b>only title</b>\n");
    }

    #[test]
    fn html_in_metadata_is_escaped() {
        let caption = build_caption(
            &info(Some("<script>bad</script>"), None, Some("a & b"), None),
            Platform::Youtube,
        );
        assert!(caption.contains("&lt;script&gt;"));
        assert!(caption.contains("a &amp; b"));
        assert!(!caption.contains("<script>"));
    }

    #[test]
    fn long_titles_are_capped_without_breaking_markup() {
        let long_title = "x".repeat(3000);
        let caption = build_caption(
            &info(
                Some(&long_title),
                Some(75.0),
                Some("someone"),
                Some("https://youtube.com/watch?v=abc123"),
            ),
            Platform::Youtube,
        );
        // Every tag survives the cap and the whole caption fits the limit
        assert!(caption.contains("</b>\n"));
        assert!(caption.ends_with("</a>"));
        assert!(caption.chars().count() <= crate::config::CAPTION_LIMIT);
    }

    #[test]
    fn quotes_in_the_link_target_are_escaped() {
        let caption = build_caption(
            &info(None, None, None, Some(r#"https://example.com/watch?v=a"b"#)),
            Platform::Other,
        );
        assert!(caption.contains("&quot;"));
        assert!(!caption.contains(r#"v=a"b"#));
    }
}
