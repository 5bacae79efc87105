//! yt-dlp process boundary.
//!
//! Builds an argv from an [`ExtractionPreset`], spawns the binary, and turns
//! its output into either a parsed metadata record (probe) or a verified file
//! on disk (fetch). Failures carry the tool's free-text diagnostics so the
//! pipeline can classify them. No timeout is imposed on the child process.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::extract::errors::CallFailure;
use crate::extract::fallback::{Extractor, MediaInfo};
use crate::extract::preset::ExtractionPreset;

/// Shells out to the yt-dlp binary configured at construction.
pub struct YtDlpRunner {
    bin: String,
    max_height: u32,
}

impl YtDlpRunner {
    /// Create a runner for the given binary name/path and height cap.
    #[must_use]
    pub fn new(bin: impl Into<String>, max_height: u32) -> Self {
        Self {
            bin: bin.into(),
            max_height,
        }
    }

    /// Arguments shared by both phases, derived from the preset.
    fn preset_args(&self, preset: &ExtractionPreset) -> Vec<String> {
        let mut args = vec![
            "--no-warnings".to_string(),
            "--no-playlist".to_string(),
            "--restrict-filenames".to_string(),
        ];
        if let Some(format) = preset.format.render(self.max_height) {
            args.push("-f".to_string());
            args.push(format);
        }
        if let Some(ua) = preset.user_agent {
            args.push("--user-agent".to_string());
            args.push(ua.to_string());
        }
        if let Some(extractor_args) = preset.extractor_args {
            args.push("--extractor-args".to_string());
            args.push(extractor_args.to_string());
        }
        for flag in preset.extra_flags {
            args.push((*flag).to_string());
        }
        args
    }

    async fn run(&self, args: &[String]) -> Result<String, CallFailure> {
        debug!(bin = %self.bin, ?args, "spawning yt-dlp");

        let output = Command::new(&self.bin)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| CallFailure::new(format!("failed to spawn {}: {e}", self.bin)))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let diagnostic = if stderr.trim().is_empty() {
                String::from_utf8_lossy(&output.stdout).into_owned()
            } else {
                stderr.into_owned()
            };
            Err(CallFailure::new(diagnostic))
        }
    }
}

#[async_trait]
impl Extractor for YtDlpRunner {
    async fn probe(&self, url: &str, preset: &ExtractionPreset) -> Result<MediaInfo, CallFailure> {
        let mut args = self.preset_args(preset);
        args.push("--dump-json".to_string());
        args.push("--".to_string());
        args.push(url.to_string());

        let stdout = self.run(&args).await?;
        // --dump-json emits one JSON object per line; a single video yields one
        let line = stdout
            .lines()
            .find(|l| !l.trim().is_empty())
            .ok_or_else(|| CallFailure::new("probe produced no metadata output"))?;

        serde_json::from_str(line)
            .map_err(|e| CallFailure::new(format!("unparseable metadata output: {e}")))
    }

    async fn fetch(
        &self,
        url: &str,
        preset: &ExtractionPreset,
        output: &Path,
    ) -> Result<(), CallFailure> {
        let mut args = self.preset_args(preset);
        args.push("--merge-output-format".to_string());
        args.push("mp4".to_string());
        args.push("-o".to_string());
        args.push(output.to_string_lossy().into_owned());
        args.push("--".to_string());
        args.push(url.to_string());

        self.run(&args).await?;

        if tokio::fs::try_exists(output).await.unwrap_or(false) {
            Ok(())
        } else {
            Err(CallFailure::new(format!(
                "download reported success but {} does not exist",
                output.display()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::platform::Platform;
    use crate::extract::preset::{probe_presets, BEST};

    #[test]
    fn preset_args_include_format_and_headers() {
        let runner = YtDlpRunner::new("yt-dlp", 1080);
        let mobile = probe_presets(Platform::YoutubeShorts)[0];
        let args = runner.preset_args(&mobile);

        let format_pos = args.iter().position(|a| a == "-f").expect("-f present");
        assert!(args[format_pos + 1].contains("height<=1080"));
        assert!(args.contains(&"--user-agent".to_string()));
        assert!(args.contains(&"--extractor-args".to_string()));
    }

    #[test]
    fn minimal_preset_builds_minimal_args() {
        let runner = YtDlpRunner::new("yt-dlp", 720);
        let args = runner.preset_args(&BEST);
        assert!(args.contains(&"-f".to_string()));
        assert!(args.contains(&"best".to_string()));
        assert!(!args.contains(&"--user-agent".to_string()));
        assert!(!args.contains(&"--extractor-args".to_string()));
    }

    #[test]
    fn probe_metadata_parses_tool_json() {
        let line = r#"{"id":"abc123","title":"A clip","duration":42.5,"uploader":"someone","webpage_url":"https://youtube.com/watch?v=abc123"}"#;
        let info: MediaInfo = serde_json::from_str(line).expect("valid metadata");
        assert_eq!(info.id, "abc123");
        assert_eq!(info.duration_secs(), Some(42));
        assert_eq!(info.uploader_name(), Some("someone"));
    }
}
