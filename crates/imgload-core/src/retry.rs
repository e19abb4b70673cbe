//! Bounded retry with fallback substitution
//!
//! Drives the [`Loader`] through up to `max_attempts` tries on the primary
//! URL, then at most one try on the fallback. Between primary attempts the
//! configured [`RetryDelay`] applies; the default is to retry immediately.

use crate::config::RetryDelay;
use crate::error::{ErrorInfo, ErrorKind, LoadError};
use crate::loader::Loader;
use crate::types::{LoadRequest, LoadResult};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// Retry policy around a [`Loader`]
#[derive(Debug, Clone)]
pub struct RetryController {
    loader: Loader,
    delay: RetryDelay,
}

impl RetryController {
    /// Create controller that retries immediately
    #[inline]
    #[must_use]
    pub fn new(loader: Loader) -> Self {
        Self {
            loader,
            delay: RetryDelay::None,
        }
    }

    /// With inter-attempt delay policy
    #[inline]
    #[must_use]
    pub fn with_delay(mut self, delay: RetryDelay) -> Self {
        self.delay = delay;
        self
    }

    /// Run the full attempt sequence for `request`
    pub async fn attempt(&self, request: &LoadRequest) -> LoadResult {
        self.attempt_tracked(request, &AtomicU32::new(0)).await
    }

    /// Run the attempt sequence, bumping `attempts` as each try starts
    pub async fn attempt_tracked(&self, request: &LoadRequest, attempts: &AtomicU32) -> LoadResult {
        if let Err(err) = request.validate() {
            tracing::warn!(url = %request.key, error = %err, "rejected image request");
            return LoadResult::failed(&request.key, err, Duration::ZERO, 0);
        }

        let started = Instant::now();
        let mut last_error = None;

        for attempt in 1..=request.max_attempts {
            attempts.fetch_add(1, Ordering::SeqCst);
            let outcome = self.loader.try_load(&request.key, request.timeout).await;

            match outcome.outcome {
                Ok(()) => {
                    tracing::info!(
                        url = %request.key,
                        attempt,
                        elapsed_ms = started.elapsed().as_millis(),
                        "image loaded"
                    );
                    return LoadResult::loaded(&request.key, started.elapsed(), attempt);
                }
                Err(err) => {
                    tracing::warn!(
                        url = %request.key,
                        attempt,
                        max_attempts = request.max_attempts,
                        error = %err,
                        "image load attempt failed"
                    );
                    last_error = Some(err);

                    if attempt < request.max_attempts {
                        let delay = self.delay.delay_for(attempt);
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                    }
                }
            }
        }

        let mut total = request.max_attempts;

        if let Some(fallback) = &request.fallback_key {
            attempts.fetch_add(1, Ordering::SeqCst);
            total += 1;
            tracing::info!(url = %request.key, fallback = %fallback, "trying fallback image");

            let outcome = self.loader.try_load(fallback, request.timeout).await;
            match outcome.outcome {
                Ok(()) => {
                    tracing::info!(
                        url = %request.key,
                        fallback = %fallback,
                        elapsed_ms = started.elapsed().as_millis(),
                        "fallback image loaded"
                    );
                    return LoadResult::loaded(fallback, started.elapsed(), total);
                }
                Err(err) => {
                    tracing::warn!(fallback = %fallback, error = %err, "fallback image failed");
                    last_error = Some(err);
                }
            }
        }

        let error = exhausted_error(&request.key, total, last_error.as_ref());
        tracing::error!(url = %request.key, attempts = total, error = %error.message, "image load failed");
        LoadResult::failed(&request.key, error, started.elapsed(), total)
    }
}

/// Absence of the resource surfaces as `Firebase`; anything else is `Unknown`.
fn exhausted_error(key: &str, attempts: u32, last: Option<&LoadError>) -> ErrorInfo {
    let kind = match last.map(LoadError::kind) {
        Some(ErrorKind::Firebase) => ErrorKind::Firebase,
        _ => ErrorKind::Unknown,
    };
    let cause = last.map_or_else(|| "no attempt made".to_string(), ToString::to_string);
    let mut info = ErrorInfo::new(
        kind,
        format!("failed to load image {key} after {attempts} attempts: {cause}"),
    );
    info.retryable = true;
    info
}
