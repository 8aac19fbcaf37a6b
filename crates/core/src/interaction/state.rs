//! Interaction mode machine.
//!
//! The controller is in exactly one mode at a time:
//! `Idle` -> `Dragging` | `Resizing` | `Rotating` (pointer-down) -> `Idle` (release)
//!
//! Each active mode carries the anchors recorded when it started.

use super::gesture::Point;

/// Current interaction mode with its entry anchors.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InteractionMode {
    #[default]
    Idle,
    /// Moving the print; `last` is the previous pointer position.
    Dragging { last: Point },
    /// Scaling around a fixed center.
    Resizing {
        center: Point,
        start_distance: f64,
        start_scale: f64,
    },
    /// Rotating around a fixed center.
    Rotating {
        center: Point,
        start_angle: f64,
        start_rotation: f64,
    },
}

impl InteractionMode {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn kind(&self) -> Option<InteractionKind> {
        match self {
            Self::Idle => None,
            Self::Dragging { .. } => Some(InteractionKind::Drag),
            Self::Resizing { .. } => Some(InteractionKind::Resize),
            Self::Rotating { .. } => Some(InteractionKind::Rotate),
        }
    }
}

/// The three manipulation gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    Drag,
    Resize,
    Rotate,
}

/// Result of feeding one pointer event to the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionEvent {
    /// A gesture started.
    Started(InteractionKind),
    /// The placement was updated by an active gesture.
    Updated(InteractionKind),
    /// The active gesture ended.
    Ended(InteractionKind),
    /// The event had no effect (idle move, second pointer-down, malformed).
    Ignored,
}
