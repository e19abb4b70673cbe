//! Decode, fit, resize and re-encode

use crate::error::TranscodeError;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use tracing::debug;

/// Target bounds and encoder quality
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TranscodeSpec {
    /// Maximum output width in pixels
    pub max_width: u32,
    /// Maximum output height in pixels
    pub max_height: u32,
    /// Encoder quality in `(0, 1]`
    pub quality: f32,
}

impl TranscodeSpec {
    /// Create a spec
    #[must_use]
    pub const fn new(max_width: u32, max_height: u32, quality: f32) -> Self {
        Self {
            max_width,
            max_height,
            quality,
        }
    }

    /// Reject zero bounds and out-of-range quality
    ///
    /// # Errors
    ///
    /// Returns [`TranscodeError::InvalidSpec`] naming the offending field.
    pub fn validate(&self) -> Result<(), TranscodeError> {
        if self.max_width == 0 || self.max_height == 0 {
            return Err(TranscodeError::InvalidSpec(format!(
                "bounds must be positive, got {}x{}",
                self.max_width, self.max_height
            )));
        }
        if !(self.quality > 0.0 && self.quality <= 1.0) {
            return Err(TranscodeError::InvalidSpec(format!(
                "quality must be in (0, 1], got {}",
                self.quality
            )));
        }
        Ok(())
    }

    /// JPEG encoder quality on the 1..=100 scale
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn jpeg_quality(&self) -> u8 {
        (f64::from(self.quality) * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

/// Re-encoded image with its final geometry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcoded {
    /// Encoded bytes
    pub bytes: Vec<u8>,
    /// Output width
    pub width: u32,
    /// Output height
    pub height: u32,
    /// Output container format
    pub format: ImageFormat,
}

/// Largest size fitting inside the bounds with the source aspect ratio
///
/// Never upscales. Each side is at least 1 and at most its bound.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::similar_names
)]
pub fn fit_dimensions(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width.min(max_width), height.min(max_height));
    }
    let scale = (f64::from(max_width) / f64::from(width))
        .min(f64::from(max_height) / f64::from(height))
        .min(1.0);
    let fit = |side: u32, bound: u32| {
        let scaled = (f64::from(side) * scale).round() as u32;
        scaled.clamp(1, bound.max(1))
    };
    (fit(width, max_width), fit(height, max_height))
}

/// Formats with an enabled encoder
#[must_use]
pub fn can_encode(format: ImageFormat) -> bool {
    matches!(
        format,
        ImageFormat::Png
            | ImageFormat::Jpeg
            | ImageFormat::Gif
            | ImageFormat::Bmp
            | ImageFormat::WebP
    )
}

/// Resizing image transcoder
#[derive(Debug, Clone, Copy)]
pub struct Transcoder {
    filter: FilterType,
}

impl Default for Transcoder {
    fn default() -> Self {
        Self {
            filter: FilterType::Triangle,
        }
    }
}

impl Transcoder {
    /// Transcoder with bilinear resampling
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different resampling filter
    #[must_use]
    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    /// Resize into the spec's bounds, keeping the input's format
    ///
    /// Inputs in a format without an encoder come out as PNG.
    ///
    /// # Errors
    ///
    /// See [`Transcoder::transcode_as`].
    pub fn transcode(&self, input: &[u8], spec: &TranscodeSpec) -> Result<Transcoded, TranscodeError> {
        spec.validate()?;
        let format = image::guess_format(input)
            .ok()
            .filter(|f| can_encode(*f))
            .unwrap_or(ImageFormat::Png);
        self.transcode_as(input, spec, format)
    }

    /// Resize into the spec's bounds and encode as `format`
    ///
    /// # Errors
    ///
    /// - [`TranscodeError::InvalidSpec`] for zero bounds or bad quality
    /// - [`TranscodeError::UnsupportedFormat`] when `format` has no encoder
    /// - [`TranscodeError::Decode`] when `input` is not an image
    /// - [`TranscodeError::Encode`] when the encoder fails
    pub fn transcode_as(
        &self,
        input: &[u8],
        spec: &TranscodeSpec,
        format: ImageFormat,
    ) -> Result<Transcoded, TranscodeError> {
        spec.validate()?;
        if !can_encode(format) {
            return Err(TranscodeError::UnsupportedFormat(format!("{format:?}")));
        }

        let decoded =
            image::load_from_memory(input).map_err(|e| TranscodeError::Decode(e.to_string()))?;
        let (src_w, src_h) = decoded.dimensions();
        let (width, height) = fit_dimensions(src_w, src_h, spec.max_width, spec.max_height);

        let resized = if (width, height) == (src_w, src_h) {
            decoded
        } else {
            decoded.resize_exact(width, height, self.filter)
        };
        debug!(src_w, src_h, width, height, ?format, "transcoding image");

        let bytes = encode(&resized, format, spec)?;
        Ok(Transcoded {
            bytes,
            width,
            height,
            format,
        })
    }
}

fn encode(img: &DynamicImage, format: ImageFormat, spec: &TranscodeSpec) -> Result<Vec<u8>, TranscodeError> {
    let encode_err = |e: image::ImageError| TranscodeError::Encode {
        format: format!("{format:?}"),
        reason: e.to_string(),
    };
    let mut cursor = Cursor::new(Vec::new());

    match format {
        ImageFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut cursor, spec.jpeg_quality());
            img.to_rgb8().write_with_encoder(encoder).map_err(encode_err)?;
        }
        ImageFormat::Png => img.write_to(&mut cursor, format).map_err(encode_err)?,
        // GIF, BMP and lossless WebP encoders all accept RGBA8
        _ => DynamicImage::ImageRgba8(img.to_rgba8())
            .write_to(&mut cursor, format)
            .map_err(encode_err)?,
    }

    Ok(cursor.into_inner())
}
