//! # imgload Transcode
//!
//! Aspect-preserving resize and re-encode for image uploads.
//!
//! ```rust,no_run
//! use imgload_transcode::{compress_image, ImageFile};
//!
//! # fn main() -> Result<(), imgload_transcode::TranscodeError> {
//! let photo = ImageFile::new("wheel.jpg", "image/jpeg", std::fs::read("wheel.jpg").unwrap());
//! let smaller = compress_image(&photo, 1200, 1200, 0.8)?;
//! assert_eq!(smaller.name, "wheel.jpg");
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod file;
pub mod transcoder;

pub use error::TranscodeError;
pub use file::{compress_image, compress_image_async, ImageFile};
pub use image::ImageFormat;
pub use transcoder::{can_encode, fit_dimensions, TranscodeSpec, Transcoded, Transcoder};
