//! imgload Core - deduplicating async image loader
//!
//! The loading pipeline, leaf first:
//! - [`CacheStore`]: memo of keys known to load
//! - [`Loader`]: one fetch attempt raced against a timeout
//! - [`RetryController`]: bounded attempts plus one fallback try
//! - [`RequestCoordinator`]: at most one attempt sequence per key
//! - [`ImageLoader`]: the facade callers use
//!
//! Transport is supplied by the platform through [`ImageSource`]; storage
//! path resolution through [`RemoteResolver`].
//!
//! # Example
//!
//! ```rust,ignore
//! use imgload_core::{ImageLoader, LoadOptions};
//! use std::sync::Arc;
//!
//! # async fn example(source: Arc<dyn imgload_core::ImageSource>) {
//! let loader = ImageLoader::new(source);
//! let result = loader
//!     .load_image("https://cdn.example.com/a.png", &LoadOptions::new().with_fallback("https://cdn.example.com/placeholder.png"))
//!     .await;
//!
//! if result.success {
//!     println!("loaded {} in {}ms", result.url, result.load_time_ms);
//! }
//! # }
//! ```

#![warn(unreachable_pub)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod image_loader;
pub mod loader;
pub mod resolver;
pub mod retry;
pub mod sizes;
pub mod source;
pub mod types;

// Re-exports for convenience
pub use cache::CacheStore;
pub use config::{LoaderConfig, RetryDelay};
pub use coordinator::RequestCoordinator;
pub use error::{ConfigError, ErrorInfo, ErrorKind, LoadError, ResolveError, SourceError};
pub use image_loader::ImageLoader;
pub use loader::{Attempt, Loader, Settlement};
pub use resolver::RemoteResolver;
pub use retry::RetryController;
pub use sizes::{generate_image_sizes, size_variant, ImageSizes, SizePreset};
pub use source::ImageSource;
pub use types::{CacheEntry, LoadOptions, LoadRequest, LoadResult};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with imgload
    pub use crate::{
        ErrorKind, ImageLoader, ImageSource, LoadOptions, LoadResult, LoaderConfig,
        RemoteResolver, SourceError,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
