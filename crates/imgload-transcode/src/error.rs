//! Transcoding errors
//!
//! None of these are retryable: the input is already in memory, so a second
//! run would fail the same way.

use imgload_core::ErrorKind;

/// Transcoding failures
#[derive(Debug, thiserror::Error)]
pub enum TranscodeError {
    /// Target bounds or quality out of range
    #[error("invalid transcode spec: {0}")]
    InvalidSpec(String),

    /// Input bytes are not a decodable image
    #[error("failed to decode image: {0}")]
    Decode(String),

    /// No encoder for the requested output type
    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),

    /// Encoder rejected the resized image
    #[error("failed to encode {format}: {reason}")]
    Encode {
        /// Output format name
        format: String,
        /// Encoder message
        reason: String,
    },

    /// Blocking worker ended abnormally
    #[error("transcode task failed: {0}")]
    Task(String),
}

impl TranscodeError {
    /// Error classification shared with the loader
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidSpec(_) | Self::UnsupportedFormat(_) => ErrorKind::Validation,
            Self::Decode(_) | Self::Encode { .. } | Self::Task(_) => ErrorKind::Unknown,
        }
    }

    /// Always `false`
    #[allow(clippy::unused_self)]
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        false
    }
}
