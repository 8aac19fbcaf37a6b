//! Pointer events and gesture math.
//!
//! Positions are in on-screen pixels. Conversion to virtual canvas units only
//! happens for drags, through [`scale_correction`].

use crate::placement::VIRTUAL_CANVAS_SIZE;

/// Distances below this are treated as zero when starting a resize.
pub const MIN_GESTURE_DISTANCE: f64 = 1e-6;

/// A position in on-screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Angle in degrees of the vector from `center` to `self`.
    pub fn angle_from(self, center: Point) -> f64 {
        (self.y - center.y).atan2(self.x - center.x).to_degrees()
    }

    fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Where a pointer-down landed on the print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    /// The print itself, not a handle.
    Body,
    ResizeHandle,
    RotateHandle,
}

/// Which input device produced an event. The math is identical for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerSource {
    #[default]
    Mouse,
    Touch,
}

/// On-screen bounding box of the print at pointer-down time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OverlayBounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl OverlayBounds {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }
}

/// A pointer or single-finger touch event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down {
        source: PointerSource,
        position: Point,
        target: HitTarget,
        overlay: OverlayBounds,
    },
    Move {
        source: PointerSource,
        position: Point,
    },
    /// Release anywhere (mouse-up or touch-end).
    Up { source: PointerSource },
}

impl PointerEvent {
    pub fn mouse_down(position: Point, target: HitTarget, overlay: OverlayBounds) -> Self {
        Self::Down {
            source: PointerSource::Mouse,
            position,
            target,
            overlay,
        }
    }

    pub fn mouse_move(position: Point) -> Self {
        Self::Move {
            source: PointerSource::Mouse,
            position,
        }
    }

    pub fn mouse_up() -> Self {
        Self::Up {
            source: PointerSource::Mouse,
        }
    }

    /// Touch start; only the first touch point is used.
    pub fn touch_start(touches: &[Point], target: HitTarget, overlay: OverlayBounds) -> Option<Self> {
        touches.first().map(|&position| Self::Down {
            source: PointerSource::Touch,
            position,
            target,
            overlay,
        })
    }

    /// Touch move; `None` when no touch point is reported.
    pub fn touch_move(touches: &[Point]) -> Option<Self> {
        touches.first().map(|&position| Self::Move {
            source: PointerSource::Touch,
            position,
        })
    }

    pub fn touch_end() -> Self {
        Self::Up {
            source: PointerSource::Touch,
        }
    }

    pub fn source(&self) -> PointerSource {
        match self {
            Self::Down { source, .. } | Self::Move { source, .. } | Self::Up { source } => *source,
        }
    }

    /// Whether the event carries only finite coordinates.
    pub(crate) fn is_well_formed(&self) -> bool {
        match self {
            Self::Down { position, overlay, .. } => position.is_finite() && overlay.center().is_finite(),
            Self::Move { position, .. } => position.is_finite(),
            Self::Up { .. } => true,
        }
    }
}

/// Virtual units per on-screen pixel for a canvas rendered `canvas_width` wide.
///
/// Falls back to 1 when the width is unknown or degenerate.
pub fn scale_correction(canvas_width: f64) -> f64 {
    if canvas_width.is_finite() && canvas_width > 0.0 {
        VIRTUAL_CANVAS_SIZE / canvas_width
    } else {
        1.0
    }
}

/// Scale after a resize gesture, unclamped.
///
/// Returns `None` when the gesture started on the print center, where the
/// ratio is undefined.
pub fn resize_scale(start_scale: f64, start_distance: f64, current_distance: f64) -> Option<f64> {
    if !(start_distance.is_finite() && start_distance > MIN_GESTURE_DISTANCE) {
        return None;
    }
    let scale = start_scale * (current_distance / start_distance);
    scale.is_finite().then_some(scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_size_canvas_doubles_drag() {
        assert_eq!(scale_correction(250.0), 2.0);
        assert_eq!(scale_correction(1000.0), 0.5);
    }

    #[test]
    fn degenerate_canvas_has_unit_correction() {
        assert_eq!(scale_correction(0.0), 1.0);
        assert_eq!(scale_correction(-10.0), 1.0);
        assert_eq!(scale_correction(f64::NAN), 1.0);
    }

    #[test]
    fn resize_ratio() {
        assert_eq!(resize_scale(0.5, 10.0, 20.0), Some(1.0));
        assert_eq!(resize_scale(0.5, 0.0, 20.0), None);
    }

    #[test]
    fn angles_are_in_degrees() {
        let center = Point::new(10.0, 10.0);
        assert_eq!(Point::new(20.0, 10.0).angle_from(center), 0.0);
        assert!((Point::new(10.0, 20.0).angle_from(center) - 90.0).abs() < 1e-9);
    }

    #[test]
    fn touch_uses_first_point() {
        let touches = [Point::new(1.0, 2.0), Point::new(50.0, 50.0)];
        assert_eq!(
            PointerEvent::touch_move(&touches),
            Some(PointerEvent::Move {
                source: PointerSource::Touch,
                position: Point::new(1.0, 2.0),
            })
        );
        assert_eq!(PointerEvent::touch_move(&[]), None);
    }
}
