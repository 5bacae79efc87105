//! Fallback executor: the ordered-preset retry core.
//!
//! One generic attempt-in-order function drives both phases of a request:
//! a metadata probe across the platform's preset sequence, then a fetch that
//! re-uses whichever preset the probe succeeded with (the inspected formats
//! and the fetched one stay consistent that way), falling back to exactly two
//! minimal last-resort presets. Every inbound link is an independent run; no
//! state carries across requests.

use std::future::Future;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::extract::errors::{CallFailure, FailureKind, RelayError};
use crate::extract::platform::Platform;
use crate::extract::preset::{self, ExtractionPreset};

/// Metadata record returned by a successful probe (`--dump-json`, no media
/// body transferred). Field names follow the extraction tool's JSON output.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaInfo {
    /// Unique id, also used as the local file stem
    pub id: String,
    /// Video title
    #[serde(default)]
    pub title: Option<String>,
    /// Duration in seconds; the tool emits floats for some extractors
    #[serde(default)]
    pub duration: Option<f64>,
    /// Uploader display name
    #[serde(default)]
    pub uploader: Option<String>,
    /// Channel name, used when `uploader` is absent
    #[serde(default)]
    pub channel: Option<String>,
    /// Canonical URL
    #[serde(default)]
    pub webpage_url: Option<String>,
}

impl MediaInfo {
    /// Probed duration rounded down to whole seconds, when reported.
    #[must_use]
    pub fn duration_secs(&self) -> Option<u32> {
        self.duration.map(|d| d.max(0.0) as u32)
    }

    /// Uploader, falling back to the channel name.
    #[must_use]
    pub fn uploader_name(&self) -> Option<&str> {
        self.uploader.as_deref().or(self.channel.as_deref())
    }
}

/// A downloaded video ready for delivery. The file is removed after the
/// delivery attempt; at most one exists per in-flight request.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// Metadata from the winning probe
    pub info: MediaInfo,
    /// Local path of the fetched media
    pub file_path: PathBuf,
}

/// Seam to the external extraction tool. The production implementation shells
/// out to yt-dlp; tests inject a scripted mock.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Probe a URL for metadata without transferring the media body.
    async fn probe(&self, url: &str, preset: &ExtractionPreset) -> Result<MediaInfo, CallFailure>;

    /// Download the media to `output` using the given preset.
    async fn fetch(
        &self,
        url: &str,
        preset: &ExtractionPreset,
        output: &Path,
    ) -> Result<(), CallFailure>;
}

/// Attempt presets strictly in order; first success wins and its index is
/// returned alongside the result. Each failure is logged and the next preset
/// tried; when every preset fails the last failure is surfaced.
pub async fn try_in_order<T, F, Fut>(
    presets: &[ExtractionPreset],
    phase: &str,
    mut call: F,
) -> Result<(T, usize), CallFailure>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, CallFailure>>,
{
    let mut last_failure: Option<CallFailure> = None;

    for (index, preset) in presets.iter().enumerate() {
        debug!(
            phase,
            preset = preset.name,
            attempt = index + 1,
            total = presets.len(),
            "trying preset"
        );
        match call(index).await {
            Ok(value) => {
                info!(phase, preset = preset.name, "preset succeeded");
                return Ok((value, index));
            }
            Err(failure) => {
                warn!(phase, preset = preset.name, error = %failure, "preset failed");
                last_failure = Some(failure);
            }
        }
    }

    Err(last_failure.unwrap_or_else(|| CallFailure::new("no presets to try")))
}

/// Probe-then-fetch orchestration for one link.
pub struct Pipeline<E> {
    extractor: E,
    max_duration_secs: u32,
    download_dir: PathBuf,
}

impl<E: Extractor> Pipeline<E> {
    /// Build a pipeline around an extractor and the configured limits.
    pub fn new(extractor: E, max_duration_secs: u32, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            extractor,
            max_duration_secs,
            download_dir: download_dir.into(),
        }
    }

    /// The underlying extractor (exposed for call-count assertions in tests).
    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    /// Run the full extraction for one URL: probe across the platform's
    /// preset sequence, validate the duration ceiling, then fetch.
    ///
    /// # Errors
    ///
    /// [`RelayError::Exhausted`] when every preset of a phase fails, with the
    /// classification of the terminal failure; [`RelayError::DurationExceeded`]
    /// when the probe reports a duration above the ceiling (no fetch occurs).
    pub async fn run(&self, url: &str, platform: Platform) -> Result<ExtractionResult, RelayError> {
        let probe_presets = preset::probe_presets(platform);

        let (info, winner) = try_in_order(probe_presets, "probe", |index| {
            self.extractor.probe(url, &probe_presets[index])
        })
        .await
        .map_err(exhausted)?;

        if let Some(duration) = info.duration_secs() {
            if duration > self.max_duration_secs {
                info!(duration, limit = self.max_duration_secs, "duration ceiling hit, skipping fetch");
                return Err(RelayError::DurationExceeded {
                    actual: duration,
                    limit: self.max_duration_secs,
                });
            }
        }

        let output = self.download_dir.join(format!("{}.mp4", info.id));

        // Re-use the probe winner first, then the two minimal last resorts.
        let fetch_presets: Vec<ExtractionPreset> = std::iter::once(probe_presets[winner])
            .chain(preset::LAST_RESORT.iter().copied())
            .collect();

        try_in_order(&fetch_presets, "fetch", |index| {
            self.extractor.fetch(url, &fetch_presets[index], &output)
        })
        .await
        .map_err(exhausted)?;

        Ok(ExtractionResult {
            info,
            file_path: output,
        })
    }
}

fn exhausted(failure: CallFailure) -> RelayError {
    RelayError::Exhausted {
        kind: FailureKind::classify(&failure.message),
        message: failure.message,
    }
}
