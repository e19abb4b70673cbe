//! Resolution cache in front of a slower resolver

use async_trait::async_trait;
use dashmap::DashMap;
use imgload_core::{RemoteResolver, ResolveError};
use std::sync::Arc;
use tracing::{debug, trace};

/// Remembers successful resolutions
///
/// Failures are never stored, so a path that was missing resolves again on
/// the next call. Two concurrent misses on the same path may both reach the
/// inner resolver; load deduplication happens downstream in the coordinator.
#[derive(Debug)]
pub struct MemoizedResolver {
    inner: Arc<dyn RemoteResolver>,
    resolved: DashMap<String, String>,
}

impl MemoizedResolver {
    /// Wrap `inner`
    pub fn new(inner: Arc<dyn RemoteResolver>) -> Self {
        Self {
            inner,
            resolved: DashMap::new(),
        }
    }

    /// Number of remembered paths
    #[must_use]
    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    /// Whether nothing is remembered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }

    /// Drop one path; returns whether it was remembered
    pub fn forget(&self, path: &str) -> bool {
        self.resolved.remove(path).is_some()
    }

    /// Drop everything
    pub fn clear(&self) {
        self.resolved.clear();
    }
}

#[async_trait]
impl RemoteResolver for MemoizedResolver {
    async fn resolve(&self, path: &str) -> Result<String, ResolveError> {
        if let Some(url) = self.resolved.get(path) {
            trace!(path = %path, "resolution cache hit");
            return Ok(url.value().clone());
        }

        let url = self.inner.resolve(path).await?;
        debug!(path = %path, url = %url, "caching resolution");
        self.resolved.insert(path.to_string(), url.clone());
        Ok(url)
    }
}
