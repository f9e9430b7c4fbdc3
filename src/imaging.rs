//! Decoded image handling.
//!
//! Wraps the `image` crate behind the small surface the cache and loader
//! need: decode arbitrary photo bytes, report the in-memory cost, and
//! re-encode as JPEG for the disk tier.

use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::io::Cursor;
use thiserror::Error;

/// JPEG quality used when persisting images to the disk cache.
///
/// Matches a compression quality of roughly 0.8 on a 0.0-1.0 scale.
pub const JPEG_QUALITY: u8 = 80;

/// Image decode/encode errors.
#[derive(Debug, Error)]
pub enum ImagingError {
    /// The bytes could not be decoded as a supported image format
    #[error("Failed to decode image: {0}")]
    Decode(image::ImageError),

    /// The image could not be re-encoded as JPEG
    #[error("Failed to encode image: {0}")]
    Encode(image::ImageError),
}

/// A decoded raster image.
///
/// This is the unit stored in the memory cache tier and handed to
/// rendering callers. The cost accounting for cache eviction uses the
/// decoded byte size, not the encoded size on disk.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    inner: DynamicImage,
}

impl DecodedImage {
    /// Decode an image from encoded bytes (JPEG, PNG, ...).
    pub fn decode(bytes: &[u8]) -> Result<Self, ImagingError> {
        let inner = image::load_from_memory(bytes).map_err(ImagingError::Decode)?;
        Ok(Self { inner })
    }

    /// Wrap an already-decoded image.
    pub fn from_dynamic(inner: DynamicImage) -> Self {
        Self { inner }
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.inner.width()
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.inner.height()
    }

    /// Decoded size in bytes, used as the memory-cache cost.
    pub fn byte_size(&self) -> usize {
        self.inner.as_bytes().len()
    }

    /// Access the underlying raster for rendering or pixel inspection.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.inner
    }

    /// Encode as JPEG at the fixed disk-cache quality.
    ///
    /// JPEG has no alpha channel, so the image is flattened to RGB first.
    pub fn to_jpeg(&self) -> Result<Vec<u8>, ImagingError> {
        let mut buf = Cursor::new(Vec::new());
        let encoder = JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY);
        self.inner
            .to_rgb8()
            .write_with_encoder(encoder)
            .map_err(ImagingError::Encode)?;
        Ok(buf.into_inner())
    }
}
