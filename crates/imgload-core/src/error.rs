//! Error types for imgload
//!
//! Two layers:
//! - Typed errors (`LoadError`, `SourceError`, `ResolveError`, `ConfigError`)
//!   used inside the loader pipeline
//! - `ErrorInfo`, the settled, serializable record carried by a failed
//!   [`LoadResult`](crate::types::LoadResult)
//!
//! Public loader operations never return `Err`; failures are captured into
//! `ErrorInfo` at the boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error classification surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Transport-level failure
    Network,
    /// Resource resolution failure or resource absence
    Firebase,
    /// Attempt budget exceeded
    Timeout,
    /// Malformed request or configuration
    Validation,
    /// Uncategorized
    Unknown,
}

impl ErrorKind {
    /// Whether a failure of this kind may succeed on a later attempt
    #[inline]
    #[must_use]
    pub fn is_retryable(self) -> bool {
        !matches!(self, Self::Validation)
    }

    /// Stable lowercase name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Firebase => "firebase",
            Self::Timeout => "timeout",
            Self::Validation => "validation",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settled error record attached to a failed load
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error classification
    pub kind: ErrorKind,
    /// Human-readable message
    pub message: String,
    /// Whether retrying the whole load could help
    pub retryable: bool,
    /// When the failure was recorded
    pub occurred_at: DateTime<Utc>,
}

impl ErrorInfo {
    /// Create error info stamped with the current time
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable: kind.is_retryable(),
            occurred_at: Utc::now(),
        }
    }
}

impl From<&LoadError> for ErrorInfo {
    fn from(err: &LoadError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

impl From<LoadError> for ErrorInfo {
    fn from(err: LoadError) -> Self {
        Self::from(&err)
    }
}

/// Loader pipeline errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    /// Transport failed
    #[error("network error: {0}")]
    Network(String),

    /// Resource could not be resolved or does not exist
    #[error("{0}")]
    Firebase(String),

    /// Attempt exceeded its time budget
    #[error("image load timed out after {timeout_ms}ms")]
    Timeout {
        /// Budget that was exceeded
        timeout_ms: u64,
    },

    /// Request or configuration is malformed
    #[error("invalid request: {0}")]
    Validation(String),

    /// Anything else
    #[error("{0}")]
    Unknown(String),
}

impl LoadError {
    /// Error classification
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::Network,
            Self::Firebase(_) => ErrorKind::Firebase,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

impl From<SourceError> for LoadError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::NotFound(url) => Self::Firebase(format!("image not found: {url}")),
            SourceError::Network(msg) => Self::Network(msg),
            SourceError::Decode(msg) => Self::Unknown(format!("image decode failed: {msg}")),
            SourceError::Other(msg) => Self::Unknown(msg),
        }
    }
}

impl From<ConfigError> for LoadError {
    fn from(err: ConfigError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Failures reported by an [`ImageSource`](crate::source::ImageSource)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// Resource does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Transport failed
    #[error("network: {0}")]
    Network(String),

    /// Bytes arrived but could not be decoded as an image
    #[error("decode: {0}")]
    Decode(String),

    /// Anything else
    #[error("{0}")]
    Other(String),
}

impl SourceError {
    /// Classification once surfaced by the loader
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::Firebase,
            Self::Network(_) => ErrorKind::Network,
            Self::Decode(_) | Self::Other(_) => ErrorKind::Unknown,
        }
    }

    /// Check if another attempt may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Whether the failure means the resource is absent
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Failures reported by a [`RemoteResolver`](crate::resolver::RemoteResolver)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// No object stored at the path
    #[error("object not found: {0}")]
    NotFound(String),

    /// Path rejected before resolution
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Backend failure
    #[error("{0}")]
    Backend(String),
}

impl ResolveError {
    /// Always [`ErrorKind::Firebase`]
    #[allow(clippy::unused_self)]
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Firebase
    }

    /// Rejected paths stay rejected
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvalidPath(_))
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A value is out of range
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// Config file could not be read
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config file could not be parsed
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ConfigError {
    /// Always [`ErrorKind::Validation`]
    #[allow(clippy::unused_self)]
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }

    /// Always `false`
    #[allow(clippy::unused_self)]
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        false
    }

    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collaborator_errors_classify() {
        assert_eq!(SourceError::NotFound("a".into()).kind(), ErrorKind::Firebase);
        assert_eq!(SourceError::Network("reset".into()).kind(), ErrorKind::Network);
        assert!(SourceError::Decode("eof".into()).is_retryable());
        assert!(ResolveError::Backend("503".into()).is_retryable());
        assert!(!ResolveError::InvalidPath("..".into()).is_retryable());
        assert_eq!(ConfigError::invalid("x", "bad").kind(), ErrorKind::Validation);
    }

    #[test]
    fn only_validation_is_fatal() {
        assert!(ErrorKind::Network.is_retryable());
        assert!(ErrorKind::Firebase.is_retryable());
        assert!(ErrorKind::Timeout.is_retryable());
        assert!(ErrorKind::Unknown.is_retryable());
        assert!(!ErrorKind::Validation.is_retryable());
    }

    #[test]
    fn source_errors_map_to_kinds() {
        let not_found: LoadError = SourceError::NotFound("a.png".into()).into();
        assert_eq!(not_found.kind(), ErrorKind::Firebase);

        let network: LoadError = SourceError::Network("reset".into()).into();
        assert_eq!(network.kind(), ErrorKind::Network);

        let decode: LoadError = SourceError::Decode("bad header".into()).into();
        assert_eq!(decode.kind(), ErrorKind::Unknown);
    }

    #[test]
    fn error_info_carries_retryability() {
        let info = ErrorInfo::from(LoadError::Timeout { timeout_ms: 50 });
        assert_eq!(info.kind, ErrorKind::Timeout);
        assert!(info.retryable);
        assert!(info.message.contains("50ms"));

        let info = ErrorInfo::from(LoadError::Validation("empty url".into()));
        assert!(!info.retryable);
    }

    #[test]
    fn error_kind_serializes_snake_case() {
        assert_eq!(ErrorKind::Firebase.to_string(), "firebase");
        assert_eq!(ErrorKind::Validation.as_str(), "validation");
    }
}
