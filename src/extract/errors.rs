//! Error taxonomy for the relay pipeline.
//!
//! The extraction tool reports failures as free-text diagnostics on stderr, so
//! the classification here is a best-effort substring match over known yt-dlp
//! wordings. The tables drift when upstream changes its messages; there is no
//! structured error contract on the CLI boundary to replace them with.

use thiserror::Error;

/// Free-text diagnostic from a single failed extraction-tool invocation.
#[derive(Debug, Clone)]
pub struct CallFailure {
    /// Raw diagnostic output (stderr, or stdout when stderr was empty)
    pub message: String,
}

impl CallFailure {
    /// Wrap a diagnostic message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for CallFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Classified reason for an exhausted extraction, derived from the terminal
/// failure's message. Drives the user-facing reply text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Private, members-only, or geo/copyright restricted content
    PrivateOrRestricted,
    /// Removed, deleted, or otherwise gone
    Removed,
    /// yt-dlp does not support the URL or could not extract from it
    Unsupported,
    /// Age confirmation required
    AgeRestricted,
    /// Platform wants a logged-in session (rate limiting, bot checks)
    AuthRequired,
    /// Anything we could not pin down
    Generic,
}

const PRIVATE_PATTERNS: &[&str] = &[
    "Private video",
    "This video is private",
    "members-only",
    "Join this channel to get access",
    "blocked it in your country",
    "geo-restricted",
    "who has blocked it on copyright grounds",
    "copyright claim",
];

const REMOVED_PATTERNS: &[&str] = &[
    "Video unavailable",
    "This video is not available",
    "removed by the uploader",
    "This video has been removed",
    "no longer available",
    "terminated account",
    "HTTP Error 404",
];

const UNSUPPORTED_PATTERNS: &[&str] = &[
    "Unsupported URL",
    "is not a valid URL",
    "Unable to extract video data",
    "No video formats found",
    "Requested format is not available",
];

const AGE_PATTERNS: &[&str] = &["Sign in to confirm your age", "age-restricted"];

const AUTH_PATTERNS: &[&str] = &[
    "Sign in to confirm you're not a bot",
    "Sign in to view this video",
    "Login required",
    "login required",
    "rate-limit reached",
    "HTTP Error 403",
    "HTTP Error 429",
];

impl FailureKind {
    /// Match a diagnostic message against the known substrings, first table
    /// wins. Falls back to [`FailureKind::Generic`].
    #[must_use]
    pub fn classify(message: &str) -> Self {
        let tables: &[(&[&str], Self)] = &[
            (AGE_PATTERNS, Self::AgeRestricted),
            (PRIVATE_PATTERNS, Self::PrivateOrRestricted),
            (REMOVED_PATTERNS, Self::Removed),
            (UNSUPPORTED_PATTERNS, Self::Unsupported),
            (AUTH_PATTERNS, Self::AuthRequired),
        ];
        for (patterns, kind) in tables {
            if patterns.iter().any(|p| message.contains(p)) {
                return *kind;
            }
        }
        Self::Generic
    }

    /// Short description used when composing the user-facing reply.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::PrivateOrRestricted => "the video is private or restricted",
            Self::Removed => "the video was removed or is unavailable",
            Self::Unsupported => "the link is not supported",
            Self::AgeRestricted => "the video is age-restricted",
            Self::AuthRequired => "the platform requires a signed-in session",
            Self::Generic => "the video could not be downloaded",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.describe())
    }
}

/// Everything that can go wrong handling one inbound link. Fully absorbed at
/// the handler boundary; one user-facing message per failed request.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The message contained no http(s) link at all
    #[error("no link found in message")]
    NoLink,

    /// A link was found but does not parse as an http(s) URL
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Probed duration exceeds the configured ceiling; fetch never attempted
    #[error("duration {actual}s exceeds the {limit}s limit")]
    DurationExceeded {
        /// Duration reported by the probe
        actual: u32,
        /// Configured ceiling
        limit: u32,
    },

    /// Every preset failed; carries the classification of the last failure
    #[error("extraction exhausted: {kind}")]
    Exhausted {
        /// Classified reason derived from the terminal failure
        kind: FailureKind,
        /// Terminal failure diagnostic, for logs
        message: String,
    },

    /// The media was extracted but could not be delivered to the chat
    #[error("delivery failed: {0}")]
    Delivery(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_wordings() {
        assert_eq!(
            FailureKind::classify("ERROR: Private video. Sign in if you've been granted access"),
            FailureKind::PrivateOrRestricted
        );
        assert_eq!(
            FailureKind::classify("ERROR: Video unavailable"),
            FailureKind::Removed
        );
        assert_eq!(
            FailureKind::classify("ERROR: Unsupported URL: https://example.com"),
            FailureKind::Unsupported
        );
        assert_eq!(
            FailureKind::classify("ERROR: Sign in to confirm your age"),
            FailureKind::AgeRestricted
        );
        assert_eq!(
            FailureKind::classify("ERROR: Sign in to confirm you're not a bot"),
            FailureKind::AuthRequired
        );
    }

    #[test]
    fn age_check_wins_over_auth_wording() {
        // "Sign in to confirm your age" must not fall into the auth bucket
        let msg = "ERROR: Sign in to confirm your age. This video may be inappropriate";
        assert_eq!(FailureKind::classify(msg), FailureKind::AgeRestricted);
    }

    #[test]
    fn unknown_wordings_are_generic() {
        assert_eq!(
            FailureKind::classify("something entirely new from upstream"),
            FailureKind::Generic
        );
        assert_eq!(FailureKind::classify(""), FailureKind::Generic);
    }
}
