//! Single-attempt image loader
//!
//! One call to [`Loader::try_load`] starts exactly one fetch on the
//! [`ImageSource`] and races it against a timer. Three events can settle the
//! attempt: the fetch succeeding, the fetch failing, or the timer firing.
//! Whichever arrives first wins; the [`Settlement`] guard drops the rest.
//!
//! A timeout does not abort the fetch. It keeps running on its own task and
//! its eventual result is discarded.

use crate::error::LoadError;
use crate::source::ImageSource;
use futures::FutureExt;
use parking_lot::Mutex;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;

/// One-shot settlement guard
///
/// Any number of producers may call [`Settlement::settle`]; only the first
/// value reaches the receiver.
#[derive(Debug)]
pub struct Settlement<T> {
    slot: Mutex<Option<oneshot::Sender<T>>>,
}

impl<T> Settlement<T> {
    /// Create guard and the receiver that observes the winning value
    #[must_use]
    pub fn new() -> (Arc<Self>, oneshot::Receiver<T>) {
        let (tx, rx) = oneshot::channel();
        let settlement = Arc::new(Self {
            slot: Mutex::new(Some(tx)),
        });
        (settlement, rx)
    }

    /// Offer a value; returns `false` if already settled
    pub fn settle(&self, value: T) -> bool {
        let Some(tx) = self.slot.lock().take() else {
            return false;
        };
        // The receiver may be gone if the caller stopped waiting.
        let _ = tx.send(value);
        true
    }

    /// Whether a value has been accepted
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.slot.lock().is_none()
    }
}

/// Settled single attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    /// URL that was tried
    pub url: String,
    /// Issue to settlement
    pub elapsed: Duration,
    /// Success or the attempt-level error
    pub outcome: Result<(), LoadError>,
}

impl Attempt {
    /// Check if the attempt loaded the image
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Drives single fetch attempts against an [`ImageSource`]
#[derive(Debug, Clone)]
pub struct Loader {
    source: Arc<dyn ImageSource>,
}

impl Loader {
    /// Create loader over a source
    #[inline]
    #[must_use]
    pub fn new(source: Arc<dyn ImageSource>) -> Self {
        Self { source }
    }

    /// Run one attempt bounded by `timeout`
    pub async fn try_load(&self, url: &str, timeout: Duration) -> Attempt {
        let started = Instant::now();
        let (settlement, mut settled) = Settlement::new();

        let fetch_guard = Arc::clone(&settlement);
        let source = Arc::clone(&self.source);
        let fetch_url = url.to_string();
        tokio::spawn(async move {
            let outcome = match AssertUnwindSafe(source.load(&fetch_url)).catch_unwind().await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(err)) => Err(LoadError::from(err)),
                Err(_) => Err(LoadError::Unknown("image source panicked".to_string())),
            };
            if !fetch_guard.settle(outcome) {
                tracing::trace!(url = %fetch_url, "late image settlement discarded");
            }
        });

        let outcome = tokio::select! {
            biased;
            winner = &mut settled => winner,
            () = tokio::time::sleep(timeout) => {
                let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
                settlement.settle(Err(LoadError::Timeout { timeout_ms }));
                settled.await
            }
        };

        // The guard keeps a sender alive until settled, so the channel only
        // closes after a value was sent.
        let outcome = outcome
            .unwrap_or_else(|_| Err(LoadError::Unknown("attempt abandoned".to_string())));

        let attempt = Attempt {
            url: url.to_string(),
            elapsed: started.elapsed(),
            outcome,
        };

        match &attempt.outcome {
            Ok(()) => tracing::debug!(
                url = %attempt.url,
                elapsed_ms = attempt.elapsed.as_millis(),
                "image attempt loaded"
            ),
            Err(err) => tracing::debug!(
                url = %attempt.url,
                elapsed_ms = attempt.elapsed.as_millis(),
                error = %err,
                "image attempt failed"
            ),
        }

        attempt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, SourceError};
    use async_trait::async_trait;

    #[derive(Debug)]
    struct Ready;

    #[async_trait]
    impl ImageSource for Ready {
        async fn load(&self, _url: &str) -> Result<(), SourceError> {
            Ok(())
        }
    }

    #[derive(Debug)]
    struct Missing;

    #[async_trait]
    impl ImageSource for Missing {
        async fn load(&self, url: &str) -> Result<(), SourceError> {
            Err(SourceError::NotFound(url.to_string()))
        }
    }

    #[derive(Debug)]
    struct Never;

    #[async_trait]
    impl ImageSource for Never {
        async fn load(&self, _url: &str) -> Result<(), SourceError> {
            futures::future::pending().await
        }
    }

    #[derive(Debug)]
    struct Slow(Duration);

    #[async_trait]
    impl ImageSource for Slow {
        async fn load(&self, _url: &str) -> Result<(), SourceError> {
            tokio::time::sleep(self.0).await;
            Ok(())
        }
    }

    #[derive(Debug)]
    struct Panicking;

    #[async_trait]
    impl ImageSource for Panicking {
        async fn load(&self, _url: &str) -> Result<(), SourceError> {
            panic!("boom")
        }
    }

    #[test]
    fn settlement_accepts_first_value_only() {
        let (settlement, mut rx) = Settlement::new();
        assert!(!settlement.is_settled());

        assert!(settlement.settle(1));
        assert!(!settlement.settle(2));
        assert!(settlement.is_settled());
        assert_eq!(rx.try_recv().unwrap(), 1);
    }

    #[tokio::test]
    async fn success_before_timeout() {
        let loader = Loader::new(Arc::new(Ready));
        let attempt = loader.try_load("https://img/a.png", Duration::from_secs(1)).await;

        assert!(attempt.is_success());
        assert_eq!(attempt.url, "https://img/a.png");
    }

    #[tokio::test]
    async fn failure_settles_immediately() {
        let loader = Loader::new(Arc::new(Missing));
        let attempt = loader.try_load("https://img/a.png", Duration::from_secs(30)).await;

        let err = attempt.outcome.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Firebase);
        assert!(attempt.elapsed < Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn never_settling_source_times_out() {
        let loader = Loader::new(Arc::new(Never));
        let attempt = loader.try_load("https://img/a.png", Duration::from_millis(50)).await;

        assert_eq!(attempt.outcome, Err(LoadError::Timeout { timeout_ms: 50 }));
        assert!(attempt.elapsed >= Duration::from_millis(50));
        assert!(attempt.elapsed < Duration::from_millis(60));
    }

    #[tokio::test(start_paused = true)]
    async fn late_success_is_discarded() {
        let loader = Loader::new(Arc::new(Slow(Duration::from_millis(200))));
        let attempt = loader.try_load("https://img/a.png", Duration::from_millis(50)).await;
        assert_eq!(attempt.outcome.unwrap_err().kind(), ErrorKind::Timeout);

        // Let the fetch finish; its result has nowhere to go.
        tokio::time::sleep(Duration::from_millis(300)).await;
    }

    #[tokio::test]
    async fn panicking_source_is_unknown_failure() {
        let loader = Loader::new(Arc::new(Panicking));
        let attempt = loader.try_load("https://img/a.png", Duration::from_secs(5)).await;
        assert_eq!(attempt.outcome.unwrap_err().kind(), ErrorKind::Unknown);
    }
}
