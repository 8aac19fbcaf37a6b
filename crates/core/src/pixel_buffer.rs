//! Pixel buffer loading and encoding.
//!
//! Every operation that touches pixels decodes its own copy of the source
//! image, so concurrent callers never share a buffer. Large images are
//! downscaled to a bounded working size before any per-pixel work runs.
//!
//! # Coordinate Mapping
//!
//! The loader preserves aspect ratio when it downscales: both dimensions are
//! multiplied by the same ratio and floored, so a 4000x1000 source becomes
//! 2000x500.

use crate::error::{Result, StudioError};
use crate::image_source::ImageRef;
use image::imageops::FilterType;
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use tracing::debug;

/// Largest width or height the loader hands to pixel operations.
pub const MAX_WORKING_DIMENSION: u32 = 2000;

/// Loader for addressable RGBA pixel grids.
pub struct PixelBufferLoader;

impl PixelBufferLoader {
    /// Decodes an image at its native resolution.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Decode`] if the bytes are not a supported image,
    /// or whatever [`ImageRef::resolve_bytes`] reports.
    pub fn load(image: &ImageRef) -> Result<RgbaImage> {
        let bytes = image.resolve_bytes()?;
        let decoded = image::load_from_memory(&bytes)
            .map_err(|e| StudioError::decode(format!("Failed to decode image: {}", e)))?;

        let rgba = decoded.to_rgba8();
        debug!(width = rgba.width(), height = rgba.height(), "Image decoded");
        Ok(rgba)
    }

    /// Decodes an image and downscales it so neither side exceeds `max_dim`.
    pub fn load_bounded(image: &ImageRef, max_dim: u32) -> Result<RgbaImage> {
        let rgba = Self::load(image)?;
        Ok(Self::bound(rgba, max_dim))
    }

    /// Downscales `rgba` proportionally when either side exceeds `max_dim`.
    pub fn bound(rgba: RgbaImage, max_dim: u32) -> RgbaImage {
        let (width, height) = rgba.dimensions();
        match bounded_dimensions(width, height, max_dim) {
            Some((w, h)) => {
                debug!(from_w = width, from_h = height, to_w = w, to_h = h, "Downscaling working image");
                image::imageops::resize(&rgba, w, h, FilterType::Triangle)
            }
            None => rgba,
        }
    }

    /// Encodes an RGBA buffer as PNG bytes (keeps transparency).
    pub fn encode_png(rgba: &RgbaImage) -> Result<Vec<u8>> {
        let mut buffer: Vec<u8> = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);

        rgba.write_to(&mut cursor, ImageFormat::Png)
            .map_err(|e| StudioError::encode(format!("Failed to encode image: {}", e)))?;

        Ok(buffer)
    }

    /// Resolves a reference to PNG bytes, re-encoding other formats.
    pub fn to_png(image: &ImageRef) -> Result<Vec<u8>> {
        let bytes = image.resolve_bytes()?;
        if bytes.starts_with(PNG_SIGNATURE) {
            return Ok(bytes);
        }
        debug!(len = bytes.len(), "Re-encoding non-PNG source as PNG");
        let rgba = image::load_from_memory(&bytes)
            .map_err(|e| StudioError::decode(format!("Failed to decode image: {}", e)))?
            .to_rgba8();
        Self::encode_png(&rgba)
    }

    /// Encodes an RGBA buffer as a PNG data URI reference.
    pub fn encode_data_uri(rgba: &RgbaImage) -> Result<ImageRef> {
        let png = Self::encode_png(rgba)?;
        Ok(ImageRef::png_data_uri(&png))
    }
}

const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Computes the downscaled size, or `None` when no scaling is needed.
///
/// Working-size rule: `ratio = min(max/w, max/h)`, both sides floored, never
/// below one pixel. Integer arithmetic keeps the long side at exactly `max_dim`.
pub fn bounded_dimensions(width: u32, height: u32, max_dim: u32) -> Option<(u32, u32)> {
    if width == 0 || height == 0 || (width <= max_dim && height <= max_dim) {
        return None;
    }
    let scale = |side: u32, long: u32| -> u32 {
        ((side as u64 * max_dim as u64) / long as u64).max(1) as u32
    };
    if width >= height {
        Some((max_dim, scale(height, width)))
    } else {
        Some((scale(width, height), max_dim))
    }
}
