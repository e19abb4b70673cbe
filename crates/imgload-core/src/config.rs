//! Loader configuration
//!
//! Defaults applied when a caller does not pass explicit
//! [`LoadOptions`](crate::types::LoadOptions), plus the inter-attempt delay
//! policy.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Delay applied between failed attempts of the same key
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum RetryDelay {
    /// Retry immediately
    #[default]
    None,
    /// Constant delay
    Fixed {
        /// Delay in milliseconds
        delay_ms: u64,
    },
    /// Exponential backoff capped at `max_ms`
    Exponential {
        /// Delay before the first retry
        initial_ms: u64,
        /// Upper bound for any single delay
        max_ms: u64,
        /// Multiplier applied per retry
        base: f32,
    },
}

impl RetryDelay {
    /// Delay to wait after the `failed_attempt`-th failure (1-based)
    #[must_use]
    pub fn delay_for(&self, failed_attempt: u32) -> Duration {
        match *self {
            Self::None => Duration::ZERO,
            Self::Fixed { delay_ms } => Duration::from_millis(delay_ms),
            Self::Exponential {
                initial_ms,
                max_ms,
                base,
            } => {
                let exponent = i32::try_from(failed_attempt.saturating_sub(1).min(31)).unwrap_or(31);
                let factor = f64::from(base.max(1.0)).powi(exponent);
                #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let millis = (initial_ms as f64 * factor).min(max_ms as f64) as u64;
                Duration::from_millis(millis)
            }
        }
    }
}

/// Loader configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Attempts per key before giving up (or moving to the fallback)
    pub default_retry_attempts: u32,
    /// Per-attempt timeout in milliseconds
    pub default_timeout_ms: u64,
    /// Inter-attempt delay policy
    pub retry_delay: RetryDelay,
}

impl LoaderConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With default retry attempts
    #[inline]
    #[must_use]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.default_retry_attempts = attempts;
        self
    }

    /// With default per-attempt timeout
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With inter-attempt delay policy
    #[inline]
    #[must_use]
    pub fn with_retry_delay(mut self, delay: RetryDelay) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Default per-attempt timeout
    #[inline]
    #[must_use]
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// `ConfigError::Invalid` naming the first offending field
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_retry_attempts == 0 {
            return Err(ConfigError::invalid(
                "default_retry_attempts",
                "must be at least 1",
            ));
        }
        if self.default_timeout_ms == 0 {
            return Err(ConfigError::invalid("default_timeout_ms", "must be positive"));
        }
        if let RetryDelay::Exponential {
            initial_ms,
            max_ms,
            base,
        } = self.retry_delay
        {
            if !(base.is_finite() && base >= 1.0) {
                return Err(ConfigError::invalid("retry_delay.base", "must be >= 1.0"));
            }
            if initial_ms > max_ms {
                return Err(ConfigError::invalid(
                    "retry_delay.initial_ms",
                    "must not exceed max_ms",
                ));
            }
        }
        Ok(())
    }

    /// Parse and validate a TOML document
    ///
    /// # Errors
    /// Parse errors or out-of-range values
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    /// I/O, parse errors or out-of-range values
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            default_retry_attempts: 3,
            default_timeout_ms: 10_000,
            retry_delay: RetryDelay::None,
        }
    }
}
