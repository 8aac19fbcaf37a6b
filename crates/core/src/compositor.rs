//! Image compositing pipeline
//!
//! Renders background fill, base image and the transformed print into one
//! raster at the base image's native resolution. Rendering is a pure function
//! of the [`DesignSessionState`]: the same snapshot always yields the same
//! bytes.

use crate::error::Result;
use crate::image_source::ImageRef;
use crate::pixel_buffer::PixelBufferLoader;
use crate::placement::{PlacementTransform, NOMINAL_PRINT_WIDTH, VIRTUAL_CANVAS_SIZE, VIRTUAL_PADDING};
use crate::session::{BackgroundSpec, DesignSessionState, FilterSettings};
use image::{Rgba, RgbaImage};
use tracing::debug;

/// How the background is treated in a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Fill with the session's background spec.
    Opaque,
    /// Leave the background transparent whatever the spec says.
    Transparent,
}

/// Where the print lands in output pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayGeometry {
    /// Output pixels per virtual canvas unit.
    pub px_per_unit: f64,
    pub center_x: f64,
    pub center_y: f64,
    /// Drawn width of the print in output pixels.
    pub width: f64,
    /// Drawn height of the print in output pixels.
    pub height: f64,
    pub radians: f64,
}

impl OverlayGeometry {
    /// Maps a placement onto a `base_w`x`base_h` output for a print of the
    /// given native size.
    pub fn compute(
        base_w: u32,
        base_h: u32,
        overlay_w: u32,
        overlay_h: u32,
        placement: &PlacementTransform,
    ) -> Self {
        let available = VIRTUAL_CANVAS_SIZE - VIRTUAL_PADDING * 2.0;
        let px_per_unit = base_w.max(base_h) as f64 / available;
        let width = NOMINAL_PRINT_WIDTH * placement.scale * px_per_unit;
        let height = if overlay_w == 0 {
            0.0
        } else {
            overlay_h as f64 / overlay_w as f64 * width
        };

        Self {
            px_per_unit,
            center_x: base_w as f64 / 2.0 + placement.x * px_per_unit,
            center_y: base_h as f64 / 2.0 + placement.y * px_per_unit,
            width,
            height,
            radians: placement.radians(),
        }
    }
}

/// Image compositor for design renders.
pub struct Compositor;

impl Compositor {
    /// Decodes the session's images and renders the export raster.
    ///
    /// Filters are not applied.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Decode`](crate::StudioError::Decode) when the
    /// base image or the print cannot be loaded.
    pub fn render(state: &DesignSessionState, mode: RenderMode) -> Result<RgbaImage> {
        let base = PixelBufferLoader::load(&state.base_image)?;
        let overlay = match &state.overlay_image {
            Some(image) => Some(PixelBufferLoader::load(image)?),
            None => None,
        };

        let output = Self::compose(&base, overlay.as_ref(), state.background, &state.placement, mode);
        debug!(width = output.width(), height = output.height(), ?mode, "Design rendered");
        Ok(output)
    }

    /// Renders and encodes as a PNG data URI.
    pub fn render_data_uri(state: &DesignSessionState, mode: RenderMode) -> Result<ImageRef> {
        let output = Self::render(state, mode)?;
        PixelBufferLoader::encode_data_uri(&output)
    }

    /// Renders the live preview: like an opaque export, but with the
    /// brightness/contrast filters baked into the base layer.
    pub fn render_preview(state: &DesignSessionState) -> Result<RgbaImage> {
        let mut base = PixelBufferLoader::load(&state.base_image)?;
        apply_filters(&mut base, state.filters);
        let overlay = match &state.overlay_image {
            Some(image) => Some(PixelBufferLoader::load(image)?),
            None => None,
        };
        Ok(Self::compose(
            &base,
            overlay.as_ref(),
            state.background,
            &state.placement,
            RenderMode::Opaque,
        ))
    }

    /// Composites already-decoded layers.
    pub fn compose(
        base: &RgbaImage,
        overlay: Option<&RgbaImage>,
        background: BackgroundSpec,
        placement: &PlacementTransform,
        mode: RenderMode,
    ) -> RgbaImage {
        let (width, height) = base.dimensions();
        let fill = match mode {
            RenderMode::Opaque => background.fill(),
            RenderMode::Transparent => Rgba([0, 0, 0, 0]),
        };
        let mut output = RgbaImage::from_pixel(width, height, fill);

        // Base at (0,0), native size
        for (dst, src) in output.pixels_mut().zip(base.pixels()) {
            *dst = blend_over(*dst, *src, 1.0);
        }

        if let Some(print) = overlay {
            draw_overlay(&mut output, print, placement);
        }

        output
    }
}

/// Draws `print` centered, rotated and scaled per `placement`.
fn draw_overlay(output: &mut RgbaImage, print: &RgbaImage, placement: &PlacementTransform) {
    let (out_w, out_h) = output.dimensions();
    let (src_w, src_h) = print.dimensions();
    if out_w == 0 || out_h == 0 || src_w == 0 || src_h == 0 || !(placement.opacity > 0.0) {
        return;
    }

    let geo = OverlayGeometry::compute(out_w, out_h, src_w, src_h, placement);
    let finite = [geo.center_x, geo.center_y, geo.width, geo.height, geo.radians]
        .iter()
        .all(|v| v.is_finite());
    if !finite || geo.width <= 0.0 || geo.height <= 0.0 {
        return;
    }

    let (sin, cos) = geo.radians.sin_cos();
    let half_w = geo.width / 2.0;
    let half_h = geo.height / 2.0;

    // Axis-aligned bounds of the rotated rectangle
    let extent_x = (half_w * cos).abs() + (half_h * sin).abs();
    let extent_y = (half_w * sin).abs() + (half_h * cos).abs();
    let x0 = (geo.center_x - extent_x).floor().max(0.0) as u32;
    let y0 = (geo.center_y - extent_y).floor().max(0.0) as u32;
    let x1 = (geo.center_x + extent_x).ceil().min(out_w as f64).max(0.0) as u32;
    let y1 = (geo.center_y + extent_y).ceil().min(out_h as f64).max(0.0) as u32;

    let to_src_x = src_w as f64 / geo.width;
    let to_src_y = src_h as f64 / geo.height;
    let opacity = placement.opacity.clamp(0.0, 1.0);

    for y in y0..y1 {
        for x in x0..x1 {
            // Inverse-rotate the pixel center into print space
            let dx = x as f64 + 0.5 - geo.center_x;
            let dy = y as f64 + 0.5 - geo.center_y;
            let local_x = dx * cos + dy * sin + half_w;
            let local_y = -dx * sin + dy * cos + half_h;
            if local_x < 0.0 || local_y < 0.0 || local_x >= geo.width || local_y >= geo.height {
                continue;
            }

            let sample = sample_bilinear(print, local_x * to_src_x, local_y * to_src_y);
            if sample[3] == 0 {
                continue;
            }
            let dst = output.get_pixel_mut(x, y);
            *dst = blend_over(*dst, sample, opacity);
        }
    }
}

/// Bilinear sample at continuous source coordinates, clamped to the edges.
///
/// Interpolates premultiplied values.
fn sample_bilinear(src: &RgbaImage, u: f64, v: f64) -> Rgba<u8> {
    let (w, h) = src.dimensions();
    let fx = (u - 0.5).clamp(0.0, (w - 1) as f64);
    let fy = (v - 0.5).clamp(0.0, (h - 1) as f64);
    let x0 = fx.floor() as u32;
    let y0 = fy.floor() as u32;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let tx = fx - x0 as f64;
    let ty = fy - y0 as f64;

    let taps = [
        (src.get_pixel(x0, y0), (1.0 - tx) * (1.0 - ty)),
        (src.get_pixel(x1, y0), tx * (1.0 - ty)),
        (src.get_pixel(x0, y1), (1.0 - tx) * ty),
        (src.get_pixel(x1, y1), tx * ty),
    ];

    let mut acc = [0.0f64; 4];
    for (p, weight) in taps {
        let a = p[3] as f64 / 255.0;
        acc[0] += p[0] as f64 * a * weight;
        acc[1] += p[1] as f64 * a * weight;
        acc[2] += p[2] as f64 * a * weight;
        acc[3] += a * weight;
    }

    if acc[3] <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    Rgba([
        to_channel(acc[0] / acc[3]),
        to_channel(acc[1] / acc[3]),
        to_channel(acc[2] / acc[3]),
        to_channel(acc[3] * 255.0),
    ])
}

/// Source-over blend of straight-alpha pixels; `opacity` scales the source.
fn blend_over(dst: Rgba<u8>, src: Rgba<u8>, opacity: f64) -> Rgba<u8> {
    let sa = src[3] as f64 / 255.0 * opacity;
    if sa <= 0.0 {
        return dst;
    }
    let da = dst[3] as f64 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let mut out = [0u8; 4];
    for i in 0..3 {
        let c = (src[i] as f64 * sa + dst[i] as f64 * da * (1.0 - sa)) / out_a;
        out[i] = to_channel(c);
    }
    out[3] = to_channel(out_a * 255.0);
    Rgba(out)
}

/// Applies CSS-style `brightness()` then `contrast()` to the color channels.
pub fn apply_filters(pixels: &mut RgbaImage, filters: FilterSettings) {
    if filters.is_identity() {
        return;
    }
    let brightness = filters.brightness as f64 / 100.0;
    let contrast = filters.contrast as f64 / 100.0;

    for pixel in pixels.pixels_mut() {
        for channel in pixel.0.iter_mut().take(3) {
            let lit = (*channel as f64 / 255.0 * brightness).min(1.0);
            let contrasted = (lit - 0.5) * contrast + 0.5;
            *channel = to_channel(contrasted * 255.0);
        }
    }
}

fn to_channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
