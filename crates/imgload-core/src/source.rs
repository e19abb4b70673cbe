//! Platform transport seam
//!
//! The loader never performs I/O itself. An [`ImageSource`] fetches and
//! decodes one URL and reports whether the image is usable.

use crate::error::SourceError;
use async_trait::async_trait;
use std::fmt::Debug;

/// Fetches and decodes images on behalf of the loader
///
/// Implementations must be cancel-safe in the weak sense: the loader may stop
/// waiting on a call (timeout) while the call keeps running to completion.
#[async_trait]
pub trait ImageSource: Send + Sync + Debug {
    /// Fetch and decode `url`
    ///
    /// # Errors
    /// `SourceError::NotFound` when the resource does not exist, other
    /// variants for transport or decode failures.
    async fn load(&self, url: &str) -> Result<(), SourceError>;
}
