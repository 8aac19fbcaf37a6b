//! Interactive manipulation of the print.
//!
//! Pointer and touch gestures are turned into updates of a
//! [`PlacementTransform`](crate::placement::PlacementTransform).
//!
//! # Architecture
//!
//! - [`gesture`]: pointer events, hit targets and the gesture math
//! - `state`: the interaction mode machine
//! - `controller`: [`ManipulationController`], which routes events
//!
//! # Usage
//!
//! ```ignore
//! use design_studio_core::interaction::{ManipulationController, PointerEvent, HitTarget};
//!
//! let mut controller = ManipulationController::new(canvas_width);
//! controller.handle(PointerEvent::mouse_down(pos, HitTarget::Body, bounds), &mut placement);
//! controller.handle(PointerEvent::mouse_move(next), &mut placement);
//! controller.handle(PointerEvent::mouse_up(), &mut placement);
//! ```

mod controller;
pub mod gesture;
mod state;

pub use controller::ManipulationController;
pub use gesture::{HitTarget, OverlayBounds, Point, PointerEvent, PointerSource};
pub use state::{InteractionEvent, InteractionKind, InteractionMode};
