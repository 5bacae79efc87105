//! Link classification, extraction presets, and the fallback executor.

/// Error taxonomy and failure classification
pub mod errors;
/// Fallback executor and the extractor seam
pub mod fallback;
/// URL detection and platform tags
pub mod platform;
/// Static preset tables
pub mod preset;
/// yt-dlp process runner
pub mod ytdlp;

pub use errors::{CallFailure, FailureKind, RelayError};
pub use fallback::{Extractor, ExtractionResult, MediaInfo, Pipeline};
pub use platform::Platform;
pub use preset::ExtractionPreset;
pub use ytdlp::YtDlpRunner;
