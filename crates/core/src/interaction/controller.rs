//! Routes pointer events to placement updates.

use super::gesture::{resize_scale, scale_correction, HitTarget, PointerEvent};
use super::state::{InteractionEvent, InteractionKind, InteractionMode};
use crate::placement::PlacementTransform;
use tracing::trace;

/// Converts gestures into [`PlacementTransform`] mutations.
///
/// The controller owns only the gesture state. The placement it edits is
/// passed in per event so the session stays its sole owner.
#[derive(Debug, Clone, Default)]
pub struct ManipulationController {
    mode: InteractionMode,
    canvas_width: f64,
}

impl ManipulationController {
    /// Creates an idle controller for a canvas shown `canvas_width` pixels wide.
    pub fn new(canvas_width: f64) -> Self {
        Self {
            mode: InteractionMode::Idle,
            canvas_width,
        }
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn is_active(&self) -> bool {
        !self.mode.is_idle()
    }

    /// Updates the on-screen canvas width after a layout change.
    pub fn set_canvas_width(&mut self, canvas_width: f64) {
        self.canvas_width = canvas_width;
    }

    pub fn canvas_width(&self) -> f64 {
        self.canvas_width
    }

    /// Feeds one event; mutates `placement` for moves of an active gesture.
    pub fn handle(&mut self, event: PointerEvent, placement: &mut PlacementTransform) -> InteractionEvent {
        if !event.is_well_formed() {
            return InteractionEvent::Ignored;
        }

        match event {
            PointerEvent::Down {
                position,
                target,
                overlay,
                ..
            } => {
                // One gesture at a time
                if !self.mode.is_idle() {
                    return InteractionEvent::Ignored;
                }
                let center = overlay.center();
                self.mode = match target {
                    HitTarget::Body => InteractionMode::Dragging { last: position },
                    HitTarget::ResizeHandle => InteractionMode::Resizing {
                        center,
                        start_distance: position.distance(center),
                        start_scale: placement.scale,
                    },
                    HitTarget::RotateHandle => InteractionMode::Rotating {
                        center,
                        start_angle: position.angle_from(center),
                        start_rotation: placement.rotate,
                    },
                };
                match self.mode.kind() {
                    Some(kind) => {
                        trace!(?kind, source = ?event.source(), "Gesture started");
                        InteractionEvent::Started(kind)
                    }
                    None => InteractionEvent::Ignored,
                }
            }

            PointerEvent::Move { position, .. } => match &mut self.mode {
                InteractionMode::Idle => InteractionEvent::Ignored,
                InteractionMode::Dragging { last } => {
                    let correction = scale_correction(self.canvas_width);
                    let dx = (position.x - last.x) * correction;
                    let dy = (position.y - last.y) * correction;
                    placement.translate(dx, dy);
                    *last = position;
                    InteractionEvent::Updated(InteractionKind::Drag)
                }
                InteractionMode::Resizing {
                    center,
                    start_distance,
                    start_scale,
                } => {
                    // Zero start distance: leave the scale alone
                    if let Some(scale) = resize_scale(*start_scale, *start_distance, position.distance(*center)) {
                        placement.set_scale(scale);
                    }
                    InteractionEvent::Updated(InteractionKind::Resize)
                }
                InteractionMode::Rotating {
                    center,
                    start_angle,
                    start_rotation,
                } => {
                    let angle = position.angle_from(*center);
                    placement.set_rotation(*start_rotation + (angle - *start_angle));
                    InteractionEvent::Updated(InteractionKind::Rotate)
                }
            },

            PointerEvent::Up { .. } => match self.mode.kind() {
                Some(kind) => {
                    self.mode = InteractionMode::Idle;
                    trace!(?kind, "Gesture ended");
                    InteractionEvent::Ended(kind)
                }
                None => InteractionEvent::Ignored,
            },
        }
    }

    /// Drops any active gesture without touching the placement.
    pub fn cancel(&mut self) {
        self.mode = InteractionMode::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::gesture::{OverlayBounds, Point};
    use crate::placement::{MAX_SCALE, MIN_SCALE};

    // Print centered at (100, 100)
    const BOUNDS: OverlayBounds = OverlayBounds::new(50.0, 50.0, 100.0, 100.0);

    #[test]
    fn drag_is_scale_corrected() {
        let mut placement = PlacementTransform::default();
        let mut controller = ManipulationController::new(250.0);

        controller.handle(PointerEvent::mouse_down(Point::new(10.0, 10.0), HitTarget::Body, BOUNDS), &mut placement);
        controller.handle(PointerEvent::mouse_move(Point::new(15.0, 7.0)), &mut placement);
        controller.handle(PointerEvent::mouse_move(Point::new(20.0, 4.0)), &mut placement);

        assert_eq!(placement.x, 20.0);
        assert_eq!(placement.y, -12.0);
    }

    #[test]
    fn resize_scales_with_distance_and_clamps() {
        let mut placement = PlacementTransform::default();
        let mut controller = ManipulationController::new(500.0);

        controller.handle(
            PointerEvent::mouse_down(Point::new(150.0, 100.0), HitTarget::ResizeHandle, BOUNDS),
            &mut placement,
        );
        controller.handle(PointerEvent::mouse_move(Point::new(200.0, 100.0)), &mut placement);
        assert_eq!(placement.scale, 1.0);

        controller.handle(PointerEvent::mouse_move(Point::new(100_000.0, 100.0)), &mut placement);
        assert_eq!(placement.scale, MAX_SCALE);

        controller.handle(PointerEvent::mouse_move(Point::new(100.0, 100.0)), &mut placement);
        assert_eq!(placement.scale, MIN_SCALE);
    }

    #[test]
    fn resize_from_center_is_a_no_op() {
        let mut placement = PlacementTransform::default();
        let mut controller = ManipulationController::new(500.0);

        controller.handle(
            PointerEvent::mouse_down(Point::new(100.0, 100.0), HitTarget::ResizeHandle, BOUNDS),
            &mut placement,
        );
        let event = controller.handle(PointerEvent::mouse_move(Point::new(180.0, 100.0)), &mut placement);

        assert_eq!(event, InteractionEvent::Updated(InteractionKind::Resize));
        assert_eq!(placement.scale, 0.5);
        assert!(placement.scale.is_finite());
    }

    #[test]
    fn rotate_adds_angle_delta() {
        let mut placement = PlacementTransform::default();
        placement.set_rotation(10.0);
        let mut controller = ManipulationController::new(500.0);

        // Start directly above the center (-90 degrees)
        controller.handle(
            PointerEvent::mouse_down(Point::new(100.0, 50.0), HitTarget::RotateHandle, BOUNDS),
            &mut placement,
        );
        // Move to the right of the center (0 degrees)
        controller.handle(PointerEvent::mouse_move(Point::new(150.0, 100.0)), &mut placement);

        assert!((placement.rotate - 100.0).abs() < 1e-9);
    }

    #[test]
    fn gestures_are_mutually_exclusive() {
        let mut placement = PlacementTransform::default();
        let mut controller = ManipulationController::new(500.0);

        let started = controller.handle(
            PointerEvent::mouse_down(Point::new(150.0, 100.0), HitTarget::ResizeHandle, BOUNDS),
            &mut placement,
        );
        assert_eq!(started, InteractionEvent::Started(InteractionKind::Resize));

        let second = controller.handle(
            PointerEvent::mouse_down(Point::new(100.0, 100.0), HitTarget::Body, BOUNDS),
            &mut placement,
        );
        assert_eq!(second, InteractionEvent::Ignored);
        assert_eq!(controller.mode().kind(), Some(InteractionKind::Resize));
    }

    #[test]
    fn release_anywhere_returns_to_idle() {
        let mut placement = PlacementTransform::default();
        let mut controller = ManipulationController::new(500.0);

        controller.handle(PointerEvent::mouse_down(Point::new(0.0, 0.0), HitTarget::Body, BOUNDS), &mut placement);
        assert_eq!(
            controller.handle(PointerEvent::touch_end(), &mut placement),
            InteractionEvent::Ended(InteractionKind::Drag)
        );
        assert!(!controller.is_active());
        assert_eq!(controller.handle(PointerEvent::mouse_up(), &mut placement), InteractionEvent::Ignored);
    }

    #[test]
    fn idle_moves_are_ignored() {
        let mut placement = PlacementTransform::default();
        let mut controller = ManipulationController::new(500.0);
        let before = placement;

        let event = controller.handle(PointerEvent::mouse_move(Point::new(40.0, 40.0)), &mut placement);

        assert_eq!(event, InteractionEvent::Ignored);
        assert_eq!(placement, before);
    }

    #[test]
    fn touch_and_mouse_share_the_math() {
        let mut by_mouse = PlacementTransform::default();
        let mut by_touch = PlacementTransform::default();
        let mut mouse = ManipulationController::new(400.0);
        let mut touch = ManipulationController::new(400.0);

        mouse.handle(PointerEvent::mouse_down(Point::new(5.0, 5.0), HitTarget::Body, BOUNDS), &mut by_mouse);
        mouse.handle(PointerEvent::mouse_move(Point::new(45.0, -15.0)), &mut by_mouse);

        let start = PointerEvent::touch_start(&[Point::new(5.0, 5.0)], HitTarget::Body, BOUNDS).unwrap();
        touch.handle(start, &mut by_touch);
        touch.handle(PointerEvent::touch_move(&[Point::new(45.0, -15.0)]).unwrap(), &mut by_touch);

        assert_eq!(by_mouse, by_touch);
    }

    #[test]
    fn malformed_events_are_ignored() {
        let mut placement = PlacementTransform::default();
        let mut controller = ManipulationController::new(500.0);
        let event = controller.handle(
            PointerEvent::mouse_down(Point::new(f64::NAN, 0.0), HitTarget::Body, BOUNDS),
            &mut placement,
        );
        assert_eq!(event, InteractionEvent::Ignored);
        assert!(!controller.is_active());
    }
}
