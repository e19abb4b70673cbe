//! # imgload Remote
//!
//! [`RemoteResolver`](imgload_core::RemoteResolver) implementations for
//! bucket-backed image storage.
//!
//! - [`StorageUrlResolver`]: builds download URLs from object paths
//! - [`MemoizedResolver`]: remembers successful resolutions of any resolver

pub mod memoized;
pub mod storage;

pub use memoized::MemoizedResolver;
pub use storage::{StorageUrlResolver, DEFAULT_ENDPOINT};
