//! In-memory image files

use crate::error::TranscodeError;
use crate::transcoder::{TranscodeSpec, Transcoder};
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Named image payload with its MIME type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFile {
    /// File name, carried through unchanged
    pub name: String,
    /// MIME type, also selects the output encoder
    pub mime_type: String,
    /// Encoded contents
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl ImageFile {
    /// Create a file
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Build a file, deriving the MIME type from the content
    ///
    /// # Errors
    ///
    /// Returns [`TranscodeError::Decode`] when the bytes match no known format.
    pub fn sniff(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, TranscodeError> {
        let format = image::guess_format(&bytes).map_err(|e| TranscodeError::Decode(e.to_string()))?;
        Ok(Self::new(name, format.to_mime_type(), bytes))
    }

    /// Encoder format named by the MIME type
    #[must_use]
    pub fn format(&self) -> Option<ImageFormat> {
        ImageFormat::from_mime_type(&self.mime_type)
    }
}

/// Shrink `file` into the bounds and re-encode it as its own MIME type
///
/// # Errors
///
/// - [`TranscodeError::UnsupportedFormat`] when the MIME type has no encoder
/// - any error from [`Transcoder::transcode_as`]
pub fn compress_image(
    file: &ImageFile,
    max_width: u32,
    max_height: u32,
    quality: f32,
) -> Result<ImageFile, TranscodeError> {
    let spec = TranscodeSpec::new(max_width, max_height, quality);
    spec.validate()?;
    let format = file
        .format()
        .ok_or_else(|| TranscodeError::UnsupportedFormat(file.mime_type.clone()))?;

    let out = Transcoder::new().transcode_as(&file.bytes, &spec, format)?;
    info!(
        name = %file.name,
        before = file.bytes.len(),
        after = out.bytes.len(),
        width = out.width,
        height = out.height,
        "compressed image"
    );

    Ok(ImageFile {
        name: file.name.clone(),
        mime_type: file.mime_type.clone(),
        bytes: out.bytes,
    })
}

/// [`compress_image`] on the blocking pool
///
/// # Errors
///
/// Same as [`compress_image`], plus [`TranscodeError::Task`] if the worker
/// panics or is cancelled.
pub async fn compress_image_async(
    file: ImageFile,
    max_width: u32,
    max_height: u32,
    quality: f32,
) -> Result<ImageFile, TranscodeError> {
    tokio::task::spawn_blocking(move || compress_image(&file, max_width, max_height, quality))
        .await
        .map_err(|e| TranscodeError::Task(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;
    use imgload_test_utils::{jpeg_bytes, png_bytes};
    use pretty_assertions::assert_eq;

    #[test]
    fn preserves_name_and_mime() {
        let file = ImageFile::new("wheel.jpg", "image/jpeg", jpeg_bytes(2000, 1000));
        let out = compress_image(&file, 1000, 1000, 0.8).unwrap();

        assert_eq!(out.name, "wheel.jpg");
        assert_eq!(out.mime_type, "image/jpeg");
        let decoded = image::load_from_memory(&out.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (1000, 500));
    }

    #[test]
    fn mime_type_picks_encoder() {
        // PNG content labelled as JPEG comes out as JPEG
        let file = ImageFile::new("odd.jpg", "image/jpeg", png_bytes(20, 20));
        let out = compress_image(&file, 10, 10, 0.8).unwrap();
        assert_eq!(image::guess_format(&out.bytes).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn unknown_mime_is_rejected() {
        let file = ImageFile::new("doc.pdf", "application/pdf", png_bytes(4, 4));
        let err = compress_image(&file, 10, 10, 0.8).unwrap_err();
        assert!(matches!(err, TranscodeError::UnsupportedFormat(_)));
    }

    #[test]
    fn sniff_detects_png() {
        let file = ImageFile::sniff("a", png_bytes(2, 2)).unwrap();
        assert_eq!(file.mime_type, "image/png");
        assert!(ImageFile::sniff("b", b"plain text".to_vec()).is_err());
    }

    #[tokio::test]
    async fn async_variant_matches_sync() {
        let file = ImageFile::new("a.png", "image/png", png_bytes(300, 600));
        let expected = compress_image(&file, 100, 100, 0.5).unwrap();
        let actual = compress_image_async(file, 100, 100, 0.5).await.unwrap();
        assert_eq!(actual, expected);
    }
}
