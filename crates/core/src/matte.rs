//! Background matte extraction.
//!
//! A single-reference-color flood fill: the color at (0,0) is taken as the
//! background, the fill is seeded from all four corners, and it spreads
//! through 4-connected neighbors whose every channel is within
//! [`BACKGROUND_TOLERANCE`] of the reference. Reached pixels get alpha 0;
//! non-matching pixels stop the fill.
//!
//! Busy or gradient backgrounds produce wrong mattes, as do
//! background-colored holes that open onto an edge.

use crate::error::Result;
use crate::image_source::ImageRef;
use crate::pixel_buffer::{PixelBufferLoader, MAX_WORKING_DIMENSION};
use image::RgbaImage;
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Per-channel tolerance (exclusive) for a pixel to count as background.
pub const BACKGROUND_TOLERANCE: u8 = 40;

/// Summary of one extraction pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatteStats {
    /// Pixels reached by the fill (alpha set to zero).
    pub cleared: usize,
    /// Total pixels in the working image.
    pub total: usize,
}

/// Clears the background of `pixels` in place.
///
/// Degenerate (zero-area) images are left untouched.
pub fn extract_matte(pixels: &mut RgbaImage) -> MatteStats {
    let (w, h) = pixels.dimensions();
    let total = (w as usize) * (h as usize);
    if total == 0 {
        return MatteStats::default();
    }

    let reference = pixels.get_pixel(0, 0).0;
    let matches = |p: [u8; 4]| {
        reference[0].abs_diff(p[0]) < BACKGROUND_TOLERANCE
            && reference[1].abs_diff(p[1]) < BACKGROUND_TOLERANCE
            && reference[2].abs_diff(p[2]) < BACKGROUND_TOLERANCE
    };

    let mut visited = vec![false; total];
    let mut queue: VecDeque<(u32, u32)> = VecDeque::with_capacity(1024);

    // Corners are seeds: visited up front, cleared when dequeued.
    for (x, y) in [(0, 0), (w - 1, 0), (0, h - 1), (w - 1, h - 1)] {
        let idx = (y * w + x) as usize;
        if !visited[idx] {
            visited[idx] = true;
            queue.push_back((x, y));
        }
    }

    let mut cleared = 0usize;
    while let Some((px, py)) = queue.pop_front() {
        pixels.get_pixel_mut(px, py).0[3] = 0;
        cleared += 1;

        let neighbors = [
            (px + 1, py),
            (px.wrapping_sub(1), py),
            (px, py + 1),
            (px, py.wrapping_sub(1)),
        ];
        for (nx, ny) in neighbors {
            if nx >= w || ny >= h {
                continue;
            }
            let idx = (ny * w + nx) as usize;
            if visited[idx] {
                continue;
            }
            // Walls are marked visited but never enqueued
            visited[idx] = true;
            if matches(pixels.get_pixel(nx, ny).0) {
                queue.push_back((nx, ny));
            }
        }
    }

    debug!(width = w, height = h, cleared, "Background matte extracted");
    MatteStats { cleared, total }
}

/// Removes the background from an image reference.
///
/// Decodes its own working copy (bounded to `max_dim`), runs the fill and
/// encodes the result as a PNG data URI. Any decode or encode failure returns
/// the original reference unchanged.
pub fn remove_background(image: &ImageRef, max_dim: u32) -> ImageRef {
    match try_remove_background(image, max_dim) {
        Ok(matted) => matted,
        Err(e) => {
            warn!(error = %e, "Background removal skipped");
            image.clone()
        }
    }
}

/// Same as [`remove_background`] with the default working size.
pub fn remove_background_default(image: &ImageRef) -> ImageRef {
    remove_background(image, MAX_WORKING_DIMENSION)
}

fn try_remove_background(image: &ImageRef, max_dim: u32) -> Result<ImageRef> {
    let mut pixels = PixelBufferLoader::load_bounded(image, max_dim)?;
    extract_matte(&mut pixels);
    PixelBufferLoader::encode_data_uri(&pixels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const BG: Rgba<u8> = Rgba([240, 240, 240, 255]);
    const FG: Rgba<u8> = Rgba([200, 30, 30, 255]);

    fn block_image() -> RgbaImage {
        let mut img = RgbaImage::from_pixel(10, 10, BG);
        for y in 3..7 {
            for x in 3..7 {
                img.put_pixel(x, y, FG);
            }
        }
        img
    }

    #[test]
    fn corner_seeded_fill_keeps_the_center_block() {
        let mut img = block_image();
        let stats = extract_matte(&mut img);

        assert_eq!(stats.cleared, 100 - 16);
        for y in 0..10 {
            for x in 0..10 {
                let inside = (3..7).contains(&x) && (3..7).contains(&y);
                let alpha = img.get_pixel(x, y).0[3];
                if inside {
                    assert_eq!(alpha, 255, "center pixel ({x},{y}) must stay opaque");
                } else {
                    assert_eq!(alpha, 0, "background pixel ({x},{y}) must be cleared");
                }
            }
        }
    }

    #[test]
    fn second_pass_changes_nothing() {
        let mut img = block_image();
        extract_matte(&mut img);
        let once = img.clone();
        extract_matte(&mut img);
        assert_eq!(img, once);
    }

    #[test]
    fn tolerance_is_exclusive() {
        let mut img = RgbaImage::from_pixel(3, 1, BG);
        // 40 away on one channel: a wall
        img.put_pixel(1, 0, Rgba([200, 240, 240, 255]));
        let mut near = img.clone();
        near.put_pixel(1, 0, Rgba([201, 240, 240, 255]));

        extract_matte(&mut img);
        extract_matte(&mut near);

        assert_eq!(img.get_pixel(1, 0).0[3], 255);
        assert_eq!(near.get_pixel(1, 0).0[3], 0);
    }

    #[test]
    fn enclosed_background_holes_survive() {
        // Ring of foreground around a background-colored hole
        let mut img = RgbaImage::from_pixel(7, 7, BG);
        for i in 1..6 {
            img.put_pixel(i, 1, FG);
            img.put_pixel(i, 5, FG);
            img.put_pixel(1, i, FG);
            img.put_pixel(5, i, FG);
        }
        extract_matte(&mut img);
        assert_eq!(img.get_pixel(3, 3).0[3], 255);
        assert_eq!(img.get_pixel(0, 3).0[3], 0);
    }

    #[test]
    fn open_holes_leak() {
        // Same ring with a gap on the left edge: the hole is reachable.
        let mut img = RgbaImage::from_pixel(7, 7, BG);
        for i in 1..6 {
            img.put_pixel(i, 1, FG);
            img.put_pixel(i, 5, FG);
            img.put_pixel(5, i, FG);
        }
        for i in [1, 2, 4, 5] {
            img.put_pixel(1, i, FG);
        }
        extract_matte(&mut img);
        assert_eq!(img.get_pixel(3, 3).0[3], 0);
    }

    #[test]
    fn corners_are_always_cleared() {
        let mut img = RgbaImage::from_pixel(4, 4, FG);
        img.put_pixel(0, 0, BG);
        extract_matte(&mut img);
        assert_eq!(img.get_pixel(3, 3).0[3], 0);
        assert_eq!(img.get_pixel(3, 0).0[3], 0);
        assert_eq!(img.get_pixel(1, 1).0[3], 255);
    }

    #[test]
    fn degenerate_images_do_not_panic() {
        let mut single = RgbaImage::from_pixel(1, 1, BG);
        assert_eq!(extract_matte(&mut single).cleared, 1);

        let mut row = RgbaImage::from_pixel(5, 1, BG);
        assert_eq!(extract_matte(&mut row).cleared, 5);

        let mut empty = RgbaImage::new(0, 0);
        assert_eq!(extract_matte(&mut empty), MatteStats::default());
    }

    #[test]
    fn undecodable_reference_is_returned_unchanged() {
        let image = ImageRef::from_bytes(vec![1u8, 2, 3]);
        assert_eq!(remove_background_default(&image), image);
    }

    #[test]
    fn reference_round_trip_produces_transparent_png() {
        let image = PixelBufferLoader::encode_data_uri(&block_image()).unwrap();
        let matted = remove_background_default(&image);
        let pixels = PixelBufferLoader::load(&matted).unwrap();
        assert_eq!(pixels.get_pixel(0, 0).0[3], 0);
        assert_eq!(pixels.get_pixel(5, 5).0[3], 255);
    }
}
