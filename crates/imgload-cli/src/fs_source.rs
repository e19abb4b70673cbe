//! Local files as an image source

use async_trait::async_trait;
use imgload_core::{ImageSource, SourceError};
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use tracing::trace;

/// Loads `file://` URLs and plain paths from disk
///
/// A load succeeds once the file is read and its header decodes to image
/// dimensions. Relative paths resolve against the root.
#[derive(Debug, Clone, Default)]
pub struct FsImageSource {
    root: Option<PathBuf>,
}

impl FsImageSource {
    /// Source resolving relative paths against the working directory
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Source resolving relative paths against `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    /// Filesystem path addressed by `url`
    #[must_use]
    pub fn path_for(&self, url: &str) -> PathBuf {
        let raw = Path::new(url.strip_prefix("file://").unwrap_or(url));
        match &self.root {
            Some(root) if raw.is_relative() => root.join(raw),
            _ => raw.to_path_buf(),
        }
    }
}

#[async_trait]
impl ImageSource for FsImageSource {
    async fn load(&self, url: &str) -> Result<(), SourceError> {
        let path = self.path_for(url);
        let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => SourceError::NotFound(url.to_string()),
            _ => SourceError::Other(format!("{}: {e}", path.display())),
        })?;

        let (width, height) = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| SourceError::Decode(e.to_string()))?
            .into_dimensions()
            .map_err(|e| SourceError::Decode(e.to_string()))?;
        trace!(path = %path.display(), width, height, "read image header");
        Ok(())
    }
}
