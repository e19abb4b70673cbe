//! Download URLs for objects in a storage bucket

use async_trait::async_trait;
use imgload_core::{RemoteResolver, ResolveError};
use serde::{Deserialize, Serialize};

/// Public download endpoint of the storage service
pub const DEFAULT_ENDPOINT: &str = "https://firebasestorage.googleapis.com/v0/b";

/// Builds media download URLs from bucket-relative object paths
///
/// `manuals/bike/step-1.jpg` in bucket `demo` becomes
/// `<endpoint>/demo/o/manuals%2Fbike%2Fstep-1.jpg?alt=media`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageUrlResolver {
    endpoint: String,
    bucket: String,
}

impl StorageUrlResolver {
    /// Resolver for `bucket` on the default endpoint
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            bucket: bucket.into(),
        }
    }

    /// Point at another endpoint, e.g. a local emulator
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Bucket name
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Download URL for `path`
    ///
    /// # Errors
    ///
    /// - [`ResolveError::InvalidPath`] for empty paths, empty segments, or
    ///   `.`/`..` segments
    /// - [`ResolveError::Backend`] when no bucket is configured
    pub fn url_for(&self, path: &str) -> Result<String, ResolveError> {
        if self.bucket.trim().is_empty() {
            return Err(ResolveError::Backend("no storage bucket configured".to_string()));
        }
        let object = normalize(path)?;
        Ok(format!(
            "{}/{}/o/{}?alt=media",
            self.endpoint,
            urlencoding::encode(&self.bucket),
            urlencoding::encode(object)
        ))
    }
}

fn normalize(path: &str) -> Result<&str, ResolveError> {
    let object = path.trim().trim_start_matches('/');
    if object.is_empty() {
        return Err(ResolveError::InvalidPath("empty path".to_string()));
    }
    if object
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(ResolveError::InvalidPath(path.to_string()));
    }
    Ok(object)
}

#[async_trait]
impl RemoteResolver for StorageUrlResolver {
    async fn resolve(&self, path: &str) -> Result<String, ResolveError> {
        self.url_for(path)
    }
}
