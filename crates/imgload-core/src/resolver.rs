//! Logical path to URL resolution
//!
//! Remote storage lives outside this crate. The loader only needs one
//! capability from it: turn a storage path into a fetchable URL.

use crate::error::ResolveError;
use async_trait::async_trait;
use std::fmt::Debug;

/// Resolves storage paths to download URLs
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteResolver: Send + Sync + Debug {
    /// Resolve `path` to a URL the [`ImageSource`](crate::source::ImageSource) can load
    ///
    /// # Errors
    /// Any [`ResolveError`]; the loader reports it as a `Firebase` failure.
    async fn resolve(&self, path: &str) -> Result<String, ResolveError>;
}
