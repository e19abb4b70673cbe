//! Request deduplication
//!
//! Maps each key to at most one in-flight attempt sequence. Callers arriving
//! while a key is pending register as waiters and receive the same settled
//! [`LoadResult`] as the caller that started it.
//!
//! Two critical sections touch shared state, each under the in-flight lock
//! with no suspension point inside:
//! - check cache, then join or register the in-flight request
//! - promote to cache on success, then remove the in-flight request
//!
//! The attempt sequence runs on its own task, so it settles and cleans up
//! even if every waiter stops waiting.

use crate::cache::CacheStore;
use crate::error::LoadError;
use crate::retry::RetryController;
use crate::types::{LoadRequest, LoadResult};
use futures::FutureExt;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

/// Pending load shared by every caller of the same key
#[derive(Debug)]
struct InFlightRequest {
    /// Completion handles in registration order
    waiters: Vec<oneshot::Sender<LoadResult>>,
    /// Loader invocations started so far
    attempts: Arc<AtomicU32>,
}

#[derive(Debug)]
struct Shared {
    cache: CacheStore,
    in_flight: Mutex<HashMap<String, InFlightRequest>>,
    retry: RetryController,
}

impl Shared {
    fn settle(&self, key: &str, result: &LoadResult) {
        let flight = {
            let mut table = self.in_flight.lock();
            // Only the URL that actually loaded is known-loadable; a key
            // rescued by its fallback stays uncached.
            if result.success {
                self.cache.put(&result.url, &result.url);
            }
            table.remove(key)
        };

        let Some(flight) = flight else {
            return;
        };

        tracing::debug!(
            url = %key,
            waiters = flight.waiters.len(),
            success = result.success,
            "settling in-flight image request"
        );

        for waiter in flight.waiters {
            // A waiter that stopped listening just misses the result.
            let _ = waiter.send(result.clone());
        }
    }
}

/// Deduplicating front of the retry pipeline
///
/// Cloning is cheap; clones share the cache and in-flight table.
#[derive(Debug, Clone)]
pub struct RequestCoordinator {
    inner: Arc<Shared>,
}

impl RequestCoordinator {
    /// Create coordinator with an empty cache
    #[must_use]
    pub fn new(retry: RetryController) -> Self {
        Self {
            inner: Arc::new(Shared {
                cache: CacheStore::new(),
                in_flight: Mutex::new(HashMap::new()),
                retry,
            }),
        }
    }

    /// Load through cache, in-flight table, then retry pipeline
    ///
    /// Callers that join a pending request observe the outcome of the
    /// request that started it, including its fallback and budget.
    pub async fn load(&self, request: LoadRequest) -> LoadResult {
        // Attempt budget and timeout are irrelevant to a hit.
        if let Some(entry) = self.inner.cache.get(&request.key) {
            tracing::debug!(url = %request.key, "image cache hit");
            return LoadResult::cached(entry.resolved_url);
        }
        if let Err(err) = request.validate() {
            tracing::warn!(url = %request.key, error = %err, "rejected image request");
            return LoadResult::failed(&request.key, err, Duration::ZERO, 0);
        }

        let key = request.key.clone();
        let receiver = {
            let mut table = self.inner.in_flight.lock();

            if let Some(entry) = self.inner.cache.get(&key) {
                tracing::debug!(url = %key, "image cache hit");
                return LoadResult::cached(entry.resolved_url);
            }

            let (tx, rx) = oneshot::channel();
            if let Some(flight) = table.get_mut(&key) {
                flight.waiters.push(tx);
                tracing::debug!(
                    url = %key,
                    waiters = flight.waiters.len(),
                    "joined in-flight image request"
                );
            } else {
                let attempts = Arc::new(AtomicU32::new(0));
                table.insert(
                    key.clone(),
                    InFlightRequest {
                        waiters: vec![tx],
                        attempts: Arc::clone(&attempts),
                    },
                );
                self.spawn_sequence(request, attempts);
            }
            rx
        };

        receiver.await.unwrap_or_else(|_| {
            LoadResult::failed(
                &key,
                LoadError::Unknown("image request dropped before settling".to_string()),
                Duration::ZERO,
                0,
            )
        })
    }

    fn spawn_sequence(&self, request: LoadRequest, attempts: Arc<AtomicU32>) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let run = inner.retry.attempt_tracked(&request, &attempts);
            let result = match AssertUnwindSafe(run).catch_unwind().await {
                Ok(result) => result,
                Err(_) => LoadResult::failed(
                    &request.key,
                    LoadError::Unknown("image load task panicked".to_string()),
                    Duration::ZERO,
                    attempts.load(Ordering::SeqCst),
                ),
            };
            inner.settle(&request.key, &result);
        });
    }

    /// Shared cache
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &CacheStore {
        &self.inner.cache
    }

    /// Number of keys with a pending resolution
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.inner.in_flight.lock().len()
    }

    /// Waiters registered on a pending key
    #[must_use]
    pub fn waiter_count(&self, key: &str) -> Option<usize> {
        self.inner
            .in_flight
            .lock()
            .get(key)
            .map(|flight| flight.waiters.len())
    }

    /// Loader invocations started for a pending key
    #[must_use]
    pub fn attempt_count(&self, key: &str) -> Option<u32> {
        self.inner
            .in_flight
            .lock()
            .get(key)
            .map(|flight| flight.attempts.load(Ordering::SeqCst))
    }
}
