//! Page image codec.
//!
//! This module handles decoding source page images and re-encoding
//! reassembled pages as JPEG at a specified quality level.
//!
//! # Design Decisions
//!
//! - **Guessed-format decode**: Upstream serves WebP, JPEG and PNG pages, and
//!   occasionally mislabels them. Decoding sniffs the real format from magic
//!   bytes instead of trusting the upstream content type.
//!
//! - **JPEG output for reassembled pages**: Once a page has been cut apart and
//!   reassembled there is no original byte stream to preserve, so the result
//!   is always encoded as JPEG. Pages that need no reassembly never reach the
//!   codec and are passed through byte-identical.
//!
//! - **Quality control**: JPEG quality is configurable per request, allowing
//!   clients to trade off file size vs image quality.

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, ImageReader, RgbImage};
use std::io::Cursor;

use crate::error::PageError;

/// Default JPEG quality for reassembled pages (1-100).
pub const DEFAULT_PAGE_QUALITY: u8 = 85;

/// Minimum allowed JPEG quality.
pub const MIN_PAGE_QUALITY: u8 = 1;

/// Maximum allowed JPEG quality.
pub const MAX_PAGE_QUALITY: u8 = 100;

/// Content type of reassembled pages.
pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";

// =============================================================================
// Page Codec
// =============================================================================

/// Codec for decoding page images and re-encoding reassembled pages.
///
/// The codec takes raw upstream bytes, decodes them to pixels for the
/// reassembly step, and encodes the reassembled image as JPEG at the
/// requested quality level.
///
/// # Example
///
/// ```ignore
/// use comic_descrambler::page::PageCodec;
///
/// let codec = PageCodec::new();
///
/// // Raw bytes fetched from upstream
/// let source: &[u8] = /* ... */;
///
/// let image = codec.decode(source)?.into_rgb8();
/// let output = codec.encode_jpeg(&image, 85)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct PageCodec {
    // Currently stateless, but struct allows future extension
    // (e.g., shared thread pool, encoder settings)
}

impl PageCodec {
    /// Create a new page codec.
    pub fn new() -> Self {
        Self {}
    }

    /// Decode source bytes into an image, sniffing the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the format cannot be recognized or the data is
    /// truncated or corrupt.
    pub fn decode(&self, source: &[u8]) -> Result<DynamicImage, PageError> {
        let reader = ImageReader::new(Cursor::new(source))
            .with_guessed_format()
            .map_err(|e| PageError::Decode(e.to_string()))?;

        reader.decode().map_err(|e| PageError::Decode(e.to_string()))
    }

    /// Encode an image as JPEG at the specified quality.
    ///
    /// # Arguments
    ///
    /// * `image` - The reassembled page pixels
    /// * `quality` - Output JPEG quality (1-100, clamped)
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn encode_jpeg(&self, image: &RgbImage, quality: u8) -> Result<Bytes, PageError> {
        let quality = quality.clamp(MIN_PAGE_QUALITY, MAX_PAGE_QUALITY);

        let mut output = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut output, quality);

        encoder
            .encode_image(image)
            .map_err(|e| PageError::Encode(e.to_string()))?;

        Ok(Bytes::from(output))
    }

    /// Get image dimensions without fully decoding.
    ///
    /// # Returns
    ///
    /// `(width, height)` in pixels.
    pub fn dimensions(&self, source: &[u8]) -> Result<(u32, u32), PageError> {
        let reader = ImageReader::new(Cursor::new(source))
            .with_guessed_format()
            .map_err(|e| PageError::Decode(e.to_string()))?;

        reader
            .into_dimensions()
            .map_err(|e| PageError::Decode(e.to_string()))
    }
}

// =============================================================================
// Utility Functions
// =============================================================================

/// Sniff the content type of image bytes from their magic number.
///
/// Returns `None` if the format is not recognized.
pub fn sniff_content_type(source: &[u8]) -> Option<&'static str> {
    image::guess_format(source).ok().map(|f| f.to_mime_type())
}

/// Check whether the bytes are a GIF payload.
///
/// GIF pages are never scrambled upstream and must be passed through intact
/// to preserve animation.
pub fn is_gif(source: &[u8]) -> bool {
    matches!(image::guess_format(source), Ok(ImageFormat::Gif))
}

/// Validate JPEG quality parameter.
///
/// Returns `true` if quality is in the valid range (1-100).
#[inline]
pub fn is_valid_quality(quality: u8) -> bool {
    quality >= MIN_PAGE_QUALITY && quality <= MAX_PAGE_QUALITY
}

/// Clamp quality to valid range.
///
/// Values below 1 become 1, values above 100 become 100.
#[inline]
pub fn clamp_quality(quality: u8) -> u8 {
    quality.clamp(MIN_PAGE_QUALITY, MAX_PAGE_QUALITY)
}

// =============================================================================
// Tests
// =============================================================================
