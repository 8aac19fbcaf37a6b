//! Placement of the print over the base image.
//!
//! Offsets live in virtual canvas units: the editing canvas is nominally
//! [`VIRTUAL_CANVAS_SIZE`] units wide whatever its on-screen or export pixel
//! size, so a placement survives window resizes and full-resolution export.

use serde::{Deserialize, Serialize};

/// Nominal width of the virtual editing canvas.
pub const VIRTUAL_CANVAS_SIZE: f64 = 500.0;

/// Padding reserved on each side of the virtual canvas.
pub const VIRTUAL_PADDING: f64 = 19.0;

/// Width of the print at scale 1, in virtual units.
pub const NOMINAL_PRINT_WIDTH: f64 = 400.0;

pub const MIN_SCALE: f64 = 0.05;
pub const MAX_SCALE: f64 = 3.0;

/// Scale given to a freshly loaded print.
pub const DEFAULT_SCALE: f64 = 0.5;

/// Clamps a scale factor into the supported range.
pub fn clamp_scale(scale: f64) -> f64 {
    scale.clamp(MIN_SCALE, MAX_SCALE)
}

/// Affine placement state of the print.
///
/// Deserialized values go through the same clamps as the setters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawPlacement")]
pub struct PlacementTransform {
    /// Horizontal offset of the print center from the canvas center.
    pub x: f64,
    /// Vertical offset of the print center from the canvas center.
    pub y: f64,
    /// Uniform scale, always within `[MIN_SCALE, MAX_SCALE]`.
    pub scale: f64,
    /// Rotation in degrees, stored unwrapped.
    pub rotate: f64,
    /// Global alpha in `[0, 1]`.
    pub opacity: f64,
}

impl Default for PlacementTransform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: DEFAULT_SCALE,
            rotate: 0.0,
            opacity: 1.0,
        }
    }
}

/// Unchecked wire form of [`PlacementTransform`]; missing fields take defaults.
#[derive(Deserialize)]
#[serde(default)]
struct RawPlacement {
    x: f64,
    y: f64,
    scale: f64,
    rotate: f64,
    opacity: f64,
}

impl Default for RawPlacement {
    fn default() -> Self {
        let p = PlacementTransform::default();
        Self {
            x: p.x,
            y: p.y,
            scale: p.scale,
            rotate: p.rotate,
            opacity: p.opacity,
        }
    }
}

impl From<RawPlacement> for PlacementTransform {
    fn from(raw: RawPlacement) -> Self {
        PlacementTransform {
            x: raw.x,
            y: raw.y,
            scale: raw.scale,
            rotate: raw.rotate,
            opacity: raw.opacity,
        }
        .sanitized()
    }
}

impl PlacementTransform {
    /// Copy with every field passed through its setter.
    ///
    /// Out-of-range scale and opacity are clamped; non-finite fields fall
    /// back to the defaults.
    pub fn sanitized(self) -> Self {
        let mut out = Self::default();
        out.translate(self.x, 0.0);
        out.translate(0.0, self.y);
        out.set_scale(self.scale);
        out.set_rotation(self.rotate);
        out.set_opacity(self.opacity);
        out
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        if dx.is_finite() && dy.is_finite() {
            self.x += dx;
            self.y += dy;
        }
    }

    /// Sets the scale, clamped. Non-finite input is ignored.
    pub fn set_scale(&mut self, scale: f64) {
        if scale.is_finite() {
            self.scale = clamp_scale(scale);
        }
    }

    pub fn set_rotation(&mut self, degrees: f64) {
        if degrees.is_finite() {
            self.rotate = degrees;
        }
    }

    /// Adds `degrees` to the rotation (quarter-turn buttons use ±90).
    pub fn rotate_by(&mut self, degrees: f64) {
        self.set_rotation(self.rotate + degrees);
    }

    pub fn set_opacity(&mut self, opacity: f64) {
        if opacity.is_finite() {
            self.opacity = opacity.clamp(0.0, 1.0);
        }
    }

    /// Moves the print back to the canvas center. Scale and rotation stay.
    pub fn reset(&mut self) {
        self.x = 0.0;
        self.y = 0.0;
    }

    /// Alias of [`reset`](Self::reset) matching the toolbar wording.
    pub fn center(&mut self) {
        self.reset();
    }

    pub fn reset_rotation(&mut self) {
        self.rotate = 0.0;
    }

    /// Rotation in radians.
    pub fn radians(&self) -> f64 {
        self.rotate.to_radians()
    }
}
