//! Core types for imgload
//!
//! Defines the request/result model of the loader:
//! - Per-call load options and the immutable request built from them
//! - Settled load results
//! - Cache entries

use crate::config::LoaderConfig;
use crate::error::{ErrorInfo, LoadError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-call options; unset fields fall back to [`LoaderConfig`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Attempts on the primary URL
    pub retry_attempts: Option<u32>,
    /// Per-attempt timeout
    pub timeout: Option<Duration>,
    /// URL tried once after the primary budget is exhausted
    pub fallback_url: Option<String>,
}

impl LoadOptions {
    /// Create empty options
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With retry attempts
    #[inline]
    #[must_use]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = Some(attempts);
        self
    }

    /// With per-attempt timeout
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// With fallback URL
    #[inline]
    #[must_use]
    pub fn with_fallback(mut self, url: impl Into<String>) -> Self {
        self.fallback_url = Some(url.into());
        self
    }
}

/// Immutable description of one load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    /// Canonical URL, also the cache/dedup key
    pub key: String,
    /// Alternate URL
    pub fallback_key: Option<String>,
    /// Per-attempt timeout
    pub timeout: Duration,
    /// Attempts on `key`
    pub max_attempts: u32,
}

impl LoadRequest {
    /// Create request with explicit budget and no fallback
    #[must_use]
    pub fn new(key: impl Into<String>, timeout: Duration, max_attempts: u32) -> Self {
        Self {
            key: key.into(),
            fallback_key: None,
            timeout,
            max_attempts,
        }
    }

    /// Build from options, filling gaps from config
    #[must_use]
    pub fn from_options(
        key: impl Into<String>,
        options: &LoadOptions,
        config: &LoaderConfig,
    ) -> Self {
        Self {
            key: key.into(),
            fallback_key: options.fallback_url.clone(),
            timeout: options.timeout.unwrap_or_else(|| config.default_timeout()),
            max_attempts: options
                .retry_attempts
                .unwrap_or(config.default_retry_attempts),
        }
    }

    /// With fallback
    #[inline]
    #[must_use]
    pub fn with_fallback(mut self, url: impl Into<String>) -> Self {
        self.fallback_key = Some(url.into());
        self
    }

    /// Reject requests that can never succeed
    ///
    /// # Errors
    /// `LoadError::Validation` describing the first problem found
    pub fn validate(&self) -> Result<(), LoadError> {
        if self.key.trim().is_empty() {
            return Err(LoadError::Validation("image url is empty".to_string()));
        }
        if self.max_attempts == 0 {
            return Err(LoadError::Validation(
                "retry attempts must be at least 1".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(LoadError::Validation("timeout must be positive".to_string()));
        }
        if matches!(&self.fallback_key, Some(fallback) if fallback.trim().is_empty()) {
            return Err(LoadError::Validation("fallback url is empty".to_string()));
        }
        Ok(())
    }
}

/// Settled outcome of a load
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadResult {
    /// Whether an image was loaded
    pub success: bool,
    /// URL that loaded (fallback URL when the fallback won), or the requested key
    pub url: String,
    /// Served from cache without touching the source
    pub from_cache: bool,
    /// Wall time from issue to settlement, rounded up; zero only for cache hits
    pub load_time_ms: u64,
    /// Underlying loader invocations for this settlement
    pub attempts: u32,
    /// Failure details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl LoadResult {
    /// Cache hit
    #[must_use]
    pub fn cached(url: impl Into<String>) -> Self {
        Self {
            success: true,
            url: url.into(),
            from_cache: true,
            load_time_ms: 0,
            attempts: 0,
            error: None,
        }
    }

    /// Fresh success
    #[must_use]
    pub fn loaded(url: impl Into<String>, elapsed: Duration, attempts: u32) -> Self {
        Self {
            success: true,
            url: url.into(),
            from_cache: false,
            load_time_ms: fresh_millis(elapsed),
            attempts,
            error: None,
        }
    }

    /// Terminal failure
    #[must_use]
    pub fn failed(
        url: impl Into<String>,
        error: impl Into<ErrorInfo>,
        elapsed: Duration,
        attempts: u32,
    ) -> Self {
        Self {
            success: false,
            url: url.into(),
            from_cache: false,
            load_time_ms: fresh_millis(elapsed),
            attempts,
            error: Some(error.into()),
        }
    }

    /// Error kind, if failed
    #[inline]
    #[must_use]
    pub fn error_kind(&self) -> Option<crate::error::ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}

/// A zero reading is reserved for cache hits.
fn fresh_millis(elapsed: Duration) -> u64 {
    let nanos = elapsed.as_nanos();
    let millis = nanos.div_ceil(1_000_000);
    u64::try_from(millis).unwrap_or(u64::MAX).max(1)
}

/// Memoized successful load
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Requested key
    pub key: String,
    /// URL that actually loaded
    pub resolved_url: String,
    /// When the load settled
    pub resolved_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Create entry stamped with the current time
    #[must_use]
    pub fn new(key: impl Into<String>, resolved_url: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            resolved_url: resolved_url.into(),
            resolved_at: Utc::now(),
        }
    }
}
