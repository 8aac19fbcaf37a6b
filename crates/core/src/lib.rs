//! Design Studio Core Library
//!
//! This library provides the compositing engine behind the Design Studio
//! mockup tool: background removal for prints, interactive placement of a
//! print on a base product photo, deterministic rendering and the variation
//! pool that turns saved designs into product drafts.
//!
//! # Overview
//!
//! A designer loads a base image (a blank shirt, a mug) and one or more
//! prints. Each print is matted with a corner-seeded flood fill, then
//! dragged, scaled and rotated on the canvas. Saved designs land in a pool
//! and are later grouped into products:
//!
//! - **Image loading**: [`ImageRef`] sources and the bounded [`pixel_buffer`] loader
//! - **Matting**: corner-seeded background removal via [`matte`]
//! - **Placement**: the virtual-canvas transform in [`placement`] and the gesture [`interaction`] controller
//! - **Rendering**: the [`compositor`] and the off-thread [`preview`] worker
//! - **Products**: the variation [`pool`] and the [`product`] materializer
//!
//! # Quick Start
//!
//! The simplest way to use the library is through the [`DesignStudio`] session:
//!
//! ```no_run
//! use design_studio_core::{Config, DesignStudio, ImageRef, MaterializationMode, Settings, StudioActions};
//!
//! # fn main() -> design_studio_core::Result<()> {
//! let mut studio = DesignStudio::collecting(Config::load()?, &Settings::load());
//! studio.add_base_images([ImageRef::parse("mockups/shirt.png")]);
//! studio.add_prints([ImageRef::parse("prints/logo.png")]);
//!
//! let id = studio.save_to_pool()?;
//! studio.toggle_selection(id)?;
//! studio.create_product(MaterializationMode::Single)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Module Structure
//!
//! - [`compositor`]: export and preview rendering
//! - [`config`]: configuration loading from the environment
//! - [`error`]: error types and result aliases
//! - [`image_source`]: image references and byte resolution
//! - [`interaction`]: pointer gestures and the manipulation controller
//! - [`matte`]: background matte extraction
//! - [`pixel_buffer`]: decoding, downscaling and PNG encoding
//! - [`placement`]: the placement transform model
//! - [`pool`]: saved variations and selection
//! - [`preview`]: background preview renderer
//! - [`product`]: product drafts and materialization
//! - [`session`]: design session state
//! - [`settings`]: persisted user preferences
//! - [`studio`]: the studio session and its action contract

pub mod compositor;
pub mod config;
pub mod error;
pub mod image_source;
pub mod interaction;
pub mod matte;
pub mod pixel_buffer;
pub mod placement;
pub mod pool;
pub mod preview;
pub mod product;
pub mod session;
pub mod settings;
pub mod studio;

// Re-export primary types for convenience
pub use compositor::{Compositor, RenderMode};
pub use config::Config;
pub use error::{Result, StudioError};
pub use image_source::ImageRef;
pub use interaction::{HitTarget, InteractionEvent, ManipulationController, OverlayBounds, Point, PointerEvent};
pub use matte::{extract_matte, remove_background};
pub use pixel_buffer::PixelBufferLoader;
pub use placement::PlacementTransform;
pub use pool::{Selection, Variation, VariationId, VariationPool};
pub use preview::{PreviewFrame, PreviewRenderer};
pub use product::{
    MaterializationMode, MaterializeReport, Materializer, Pricing, ProductCollector, ProductDraft, ProductSink,
};
pub use session::{BackgroundSpec, DesignSessionState, FilterSettings};
pub use settings::Settings;
pub use studio::{DesignStudio, StudioActions};

/// Initializes the library by loading environment variables.
///
/// Call this once at application startup before using any other functions.
/// This loads `.env` files if present.
///
/// # Example
///
/// ```ignore
/// design_studio_core::init();
/// let config = design_studio_core::Config::load()?;
/// ```
pub fn init() {
    let _ = dotenvy::dotenv();
}
