//! Public loader facade
//!
//! Wires an [`ImageSource`] and an optional [`RemoteResolver`] into the
//! cache / coordinator / retry pipeline. Every operation is total: failures
//! come back inside [`LoadResult`], never as `Err` or a panic.
//!
//! Each `ImageLoader` owns its cache. Construct one per process (or per test)
//! and reset it with [`ImageLoader::clear_image_cache`].

use crate::config::LoaderConfig;
use crate::coordinator::RequestCoordinator;
use crate::error::{ConfigError, ErrorInfo, ErrorKind, LoadError};
use crate::loader::Loader;
use crate::resolver::RemoteResolver;
use crate::retry::RetryController;
use crate::sizes::{generate_image_sizes, ImageSizes};
use crate::source::ImageSource;
use crate::types::{LoadOptions, LoadRequest, LoadResult};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

/// Deduplicating, caching image loader
#[derive(Debug, Clone)]
pub struct ImageLoader {
    config: LoaderConfig,
    coordinator: RequestCoordinator,
    resolver: Option<Arc<dyn RemoteResolver>>,
}

impl ImageLoader {
    /// Create loader with default configuration
    #[must_use]
    pub fn new(source: Arc<dyn ImageSource>) -> Self {
        Self::build(source, LoaderConfig::default())
    }

    /// Create loader with validated configuration
    ///
    /// # Errors
    /// `ConfigError::Invalid` if the configuration is out of range
    pub fn with_config(
        source: Arc<dyn ImageSource>,
        config: LoaderConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(source, config))
    }

    fn build(source: Arc<dyn ImageSource>, config: LoaderConfig) -> Self {
        let retry = RetryController::new(Loader::new(source)).with_delay(config.retry_delay);
        Self {
            config,
            coordinator: RequestCoordinator::new(retry),
            resolver: None,
        }
    }

    /// With resolver for [`ImageLoader::load_remote_image`]
    #[inline]
    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn RemoteResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Underlying coordinator, for diagnostics
    #[inline]
    #[must_use]
    pub fn coordinator(&self) -> &RequestCoordinator {
        &self.coordinator
    }

    /// Load an image by URL
    pub async fn load_image(&self, url: &str, options: &LoadOptions) -> LoadResult {
        let request = LoadRequest::from_options(url, options, &self.config);
        self.coordinator.load(request).await
    }

    /// Resolve a storage path, then load the resulting URL with default options
    pub async fn load_remote_image(&self, path: &str) -> LoadResult {
        self.load_remote_image_with(path, &LoadOptions::default())
            .await
    }

    /// Resolve a storage path, then load the resulting URL
    pub async fn load_remote_image_with(&self, path: &str, options: &LoadOptions) -> LoadResult {
        let Some(resolver) = &self.resolver else {
            return LoadResult::failed(
                path,
                LoadError::Validation("no remote resolver configured".to_string()),
                Duration::ZERO,
                0,
            );
        };

        match resolver.resolve(path).await {
            Ok(url) => {
                tracing::debug!(path = %path, url = %url, "resolved storage path");
                self.load_image(&url, options).await
            }
            Err(err) => {
                tracing::warn!(path = %path, error = %err, "storage path resolution failed");
                LoadResult::failed(
                    path,
                    ErrorInfo::new(
                        ErrorKind::Firebase,
                        format!("Firebase image loading failed: {err}"),
                    ),
                    Duration::ZERO,
                    0,
                )
            }
        }
    }

    /// Load many URLs concurrently; results follow input order
    pub async fn preload_images<S: AsRef<str>>(
        &self,
        urls: &[S],
        options: &LoadOptions,
    ) -> Vec<LoadResult> {
        tracing::debug!(count = urls.len(), "preloading images");
        join_all(
            urls.iter()
                .map(|url| self.load_image(url.as_ref(), options)),
        )
        .await
    }

    /// Drop every cached entry
    pub fn clear_image_cache(&self) {
        tracing::debug!(entries = self.cache_size(), "clearing image cache");
        self.coordinator.cache().clear();
    }

    /// Number of cached URLs
    #[inline]
    #[must_use]
    pub fn cache_size(&self) -> usize {
        self.coordinator.cache().size()
    }

    /// Whether `url` is cached
    #[inline]
    #[must_use]
    pub fn is_image_cached(&self, url: &str) -> bool {
        self.coordinator.cache().has(url)
    }

    /// Drop one cached entry; returns `true` if it was cached
    pub fn invalidate(&self, url: &str) -> bool {
        self.coordinator.cache().invalidate(url)
    }

    /// Size-variant URLs for `url`
    #[inline]
    #[must_use]
    pub fn generate_image_sizes(&self, url: &str) -> ImageSizes {
        generate_image_sizes(url)
    }
}
