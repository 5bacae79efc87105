//! Extraction strategy list: ordered, static yt-dlp parameter presets.
//!
//! Ordering encodes empirically-discovered reliability per platform:
//! platform-specific presets (mobile user-agent + restricted player client for
//! short-form video, desktop user-agent for the rest) come before the generic
//! `best` / `worst` / bare presets. The tables are static configuration; the
//! only runtime input is the configured height cap, applied when a symbolic
//! selector is rendered into a concrete yt-dlp format expression.

use crate::extract::platform::Platform;

/// Mobile user-agent paired with the restricted android player client.
const MOBILE_UA: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Mobile Safari/537.36";

/// Desktop user-agent for platforms that dislike the mobile one.
const DESKTOP_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Symbolic format selector, rendered against the configured max height at
/// invocation time so the preset tables can stay `'static`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatSelector {
    /// mp4-preferring chain capped at the configured height
    CappedMp4,
    /// best video+audio capped at the configured height
    Capped,
    /// plain `best`
    Best,
    /// plain `worst`
    Worst,
    /// no `-f` argument at all; let yt-dlp pick
    None,
}

impl FormatSelector {
    /// Render into a concrete yt-dlp `-f` expression, or `None` when the
    /// preset passes no format argument.
    #[must_use]
    pub fn render(self, max_height: u32) -> Option<String> {
        match self {
            Self::CappedMp4 => Some(format!(
                "bestvideo[ext=mp4][height<={h}]+bestaudio[ext=m4a]\
                 /best[ext=mp4][height<={h}]/best[height<={h}]/best",
                h = max_height
            )),
            Self::Capped => Some(format!(
                "bestvideo[height<={h}]+bestaudio/best[height<={h}]/best",
                h = max_height
            )),
            Self::Best => Some("best".to_string()),
            Self::Worst => Some("worst".to_string()),
            Self::None => None,
        }
    }
}

/// One configuration preset handed to the extraction tool. Static and
/// immutable; reliability ordering lives in the tables below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionPreset {
    /// Short label used in logs when an attempt fails
    pub name: &'static str,
    /// Format selector, rendered per request
    pub format: FormatSelector,
    /// Optional `--user-agent` header
    pub user_agent: Option<&'static str>,
    /// Optional `--extractor-args` payload
    pub extractor_args: Option<&'static str>,
    /// Extra flags appended verbatim
    pub extra_flags: &'static [&'static str],
}

/// Mobile client preset: short-form platforms serve usable formats to the
/// android player client far more consistently than to the web client.
const MOBILE_CLIENT: ExtractionPreset = ExtractionPreset {
    name: "mobile-client",
    format: FormatSelector::CappedMp4,
    user_agent: Some(MOBILE_UA),
    extractor_args: Some("youtube:player_client=android"),
    extra_flags: &[],
};

const DESKTOP: ExtractionPreset = ExtractionPreset {
    name: "desktop",
    format: FormatSelector::CappedMp4,
    user_agent: Some(DESKTOP_UA),
    extractor_args: None,
    extra_flags: &[],
};

const CAPPED: ExtractionPreset = ExtractionPreset {
    name: "capped",
    format: FormatSelector::Capped,
    user_agent: None,
    extractor_args: None,
    extra_flags: &[],
};

/// Minimal `best` preset, also the first last-resort fetch attempt.
pub const BEST: ExtractionPreset = ExtractionPreset {
    name: "best",
    format: FormatSelector::Best,
    user_agent: None,
    extractor_args: None,
    extra_flags: &[],
};

/// Minimal `worst` preset, the final last-resort fetch attempt.
pub const WORST: ExtractionPreset = ExtractionPreset {
    name: "worst",
    format: FormatSelector::Worst,
    user_agent: None,
    extractor_args: None,
    extra_flags: &[],
};

const BARE: ExtractionPreset = ExtractionPreset {
    name: "bare",
    format: FormatSelector::None,
    user_agent: None,
    extractor_args: None,
    extra_flags: &[],
};

/// Probe ordering for short-form platforms (Shorts, TikTok, Instagram).
const SHORT_FORM_PRESETS: &[ExtractionPreset] = &[MOBILE_CLIENT, DESKTOP, CAPPED, BEST, WORST, BARE];

/// Probe ordering for everything else.
const STANDARD_PRESETS: &[ExtractionPreset] = &[DESKTOP, CAPPED, BEST, WORST, BARE];

/// Last-resort fetch presets, tried in order when re-using the probe winner
/// fails during the fetch phase.
pub const LAST_RESORT: &[ExtractionPreset] = &[BEST, WORST];

/// The ordered metadata-probe preset sequence for a platform.
#[must_use]
pub fn probe_presets(platform: Platform) -> &'static [ExtractionPreset] {
    if platform.is_short_form() {
        SHORT_FORM_PRESETS
    } else {
        STANDARD_PRESETS
    }
}
