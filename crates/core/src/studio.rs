//! The Design Studio session.
//!
//! [`DesignStudio`] owns the live design (base image queue, active print,
//! placement, background, filters), the gesture controller, the variation
//! pool and the product sink. External controllers such as a toolbar or a
//! voice command dispatcher drive it through [`StudioActions`].

use crate::compositor::{Compositor, RenderMode};
use crate::config::Config;
use crate::error::{Result, StudioError};
use crate::image_source::ImageRef;
use crate::interaction::{InteractionEvent, ManipulationController, PointerEvent};
use crate::matte;
use crate::placement::PlacementTransform;
use crate::pool::{Selection, Variation, VariationId, VariationPool};
use crate::preview::PreviewRenderer;
use crate::product::{MaterializationMode, MaterializeReport, Materializer, Pricing, ProductCollector, ProductSink};
use crate::session::{BackgroundSpec, DesignSessionState, FilterSettings};
use crate::settings::Settings;
use image::RgbaImage;
use std::collections::VecDeque;
use tracing::{debug, info};

/// Reference canvas width used until the UI reports its layout.
const DEFAULT_CANVAS_WIDTH: f64 = 500.0;

/// Actions an external controller may invoke on a studio session.
pub trait StudioActions {
    /// Mattes the current base image in place.
    fn remove_background(&mut self) -> Result<()>;

    /// Renders the current design with a transparent background and pools it.
    fn save_to_pool(&mut self) -> Result<VariationId>;

    /// Materializes the current selection with `mode`.
    fn create_product(&mut self, mode: MaterializationMode) -> Result<MaterializeReport>;

    fn set_background(&mut self, background: BackgroundSpec);

    fn clear_pool(&mut self);
}

/// A design session bound to a product sink.
pub struct DesignStudio<S: ProductSink = ProductCollector> {
    config: Config,
    base_images: Vec<ImageRef>,
    current_base: usize,
    overlay: Option<ImageRef>,
    print_queue: VecDeque<ImageRef>,
    background: BackgroundSpec,
    placement: PlacementTransform,
    filters: FilterSettings,
    controller: ManipulationController,
    pool: VariationPool,
    selection: Selection,
    mode: MaterializationMode,
    pricing: Pricing,
    materializer: Materializer,
    sink: S,
}

impl DesignStudio<ProductCollector> {
    /// A studio that collects drafts in memory.
    pub fn collecting(config: Config, settings: &Settings) -> Self {
        Self::new(config, settings, ProductCollector::default())
    }
}

impl<S: ProductSink> DesignStudio<S> {
    pub fn new(config: Config, settings: &Settings, sink: S) -> Self {
        let materializer = Materializer::new(&config);
        Self {
            config,
            base_images: Vec::new(),
            current_base: 0,
            overlay: None,
            print_queue: VecDeque::new(),
            background: settings.background,
            placement: PlacementTransform::default(),
            filters: FilterSettings::default(),
            controller: ManipulationController::new(DEFAULT_CANVAS_WIDTH),
            pool: VariationPool::new(),
            selection: Selection::new(),
            mode: settings.mode,
            pricing: settings.pricing(),
            materializer,
            sink,
        }
    }

    /// Replaces the product collaborator.
    pub fn set_product_sink(&mut self, sink: S) -> S {
        std::mem::replace(&mut self.sink, sink)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // Base images

    /// Appends base images to the queue. The first ever added becomes current.
    pub fn add_base_images(&mut self, images: impl IntoIterator<Item = ImageRef>) -> usize {
        let before = self.base_images.len();
        self.base_images.extend(images);
        let added = self.base_images.len() - before;
        debug!(added, queued = self.base_images.len(), "Base images added");
        added
    }

    /// Makes the base image at `index` current. Returns `false` if out of range.
    pub fn select_base_image(&mut self, index: usize) -> bool {
        if index >= self.base_images.len() {
            return false;
        }
        self.current_base = index;
        true
    }

    pub fn base_images(&self) -> &[ImageRef] {
        &self.base_images
    }

    pub fn current_base_index(&self) -> Option<usize> {
        (self.current_base < self.base_images.len()).then_some(self.current_base)
    }

    pub fn current_base(&self) -> Option<&ImageRef> {
        self.base_images.get(self.current_base)
    }

    // Prints

    /// Queues prints. When no print is active the first one is loaded now.
    pub fn add_prints(&mut self, prints: impl IntoIterator<Item = ImageRef>) {
        let mut prints = prints.into_iter();
        if self.overlay.is_none()
            && let Some(first) = prints.next()
        {
            self.load_print(&first);
        }
        self.print_queue.extend(prints);
        debug!(queued = self.print_queue.len(), "Prints queued");
    }

    /// Drops the active print and loads the next queued one, if any.
    pub fn remove_current_print(&mut self) {
        match self.print_queue.pop_front() {
            Some(next) => self.load_print(&next),
            None => {
                self.overlay = None;
                self.controller.cancel();
            }
        }
    }

    pub fn overlay(&self) -> Option<&ImageRef> {
        self.overlay.as_ref()
    }

    pub fn queued_prints(&self) -> usize {
        self.print_queue.len()
    }

    fn load_print(&mut self, print: &ImageRef) {
        self.overlay = Some(matte::remove_background(print, self.config.max_working_dimension));
        self.placement = PlacementTransform::default();
        self.controller.cancel();
    }

    // Placement

    pub fn placement(&self) -> PlacementTransform {
        self.placement
    }

    /// Replaces the placement, clamped like the individual setters.
    pub fn set_placement(&mut self, placement: PlacementTransform) {
        self.placement = placement.sanitized();
    }

    /// Feeds a pointer event to the gesture controller. Ignored without a print.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> InteractionEvent {
        if self.overlay.is_none() {
            return InteractionEvent::Ignored;
        }
        self.controller.handle(event, &mut self.placement)
    }

    /// Reports the on-screen width of the canvas.
    pub fn set_canvas_width(&mut self, width: f64) {
        self.controller.set_canvas_width(width);
    }

    pub fn controller(&self) -> &ManipulationController {
        &self.controller
    }

    // Appearance

    pub fn background(&self) -> BackgroundSpec {
        self.background
    }

    pub fn filters(&self) -> FilterSettings {
        self.filters
    }

    pub fn set_filters(&mut self, filters: FilterSettings) {
        self.filters = filters;
    }

    /// Snapshot of the live design.
    ///
    /// # Errors
    /// Returns [`StudioError::NoBaseImage`] when no base image is loaded.
    pub fn snapshot(&self) -> Result<DesignSessionState> {
        let base = self.current_base().ok_or(StudioError::NoBaseImage)?;
        Ok(DesignSessionState {
            base_image: base.clone(),
            overlay_image: self.overlay.clone(),
            background: self.background,
            placement: self.placement,
            filters: self.filters,
        })
    }

    /// Renders the filtered preview on the calling thread.
    pub fn render_preview(&self) -> Result<RgbaImage> {
        Compositor::render_preview(&self.snapshot()?)
    }

    /// Queues the current design on a preview worker.
    pub fn submit_preview(&self, renderer: &PreviewRenderer) -> Result<u64> {
        renderer.submit(self.snapshot()?)
    }

    /// Renders the design for export.
    pub fn export(&self, mode: RenderMode) -> Result<ImageRef> {
        Compositor::render_data_uri(&self.snapshot()?, mode)
    }

    // Pool and selection

    pub fn pool(&self) -> &VariationPool {
        &self.pool
    }

    /// Loads a pooled variation back into the live session.
    ///
    /// The variation stays in the pool. A base image that is not queued yet
    /// is appended to the queue.
    pub fn edit_variation(&mut self, id: VariationId) -> Result<()> {
        let state = self
            .pool
            .edit(id)
            .ok_or_else(|| StudioError::UnknownVariation(id.to_string()))?;

        if self.current_base() != Some(&state.base_image) {
            let index = match self.base_images.iter().position(|b| *b == state.base_image) {
                Some(index) => index,
                None => {
                    self.base_images.push(state.base_image.clone());
                    self.base_images.len() - 1
                }
            };
            self.current_base = index;
        }
        self.background = state.background;
        self.overlay = state.overlay_image;
        self.placement = state.placement.sanitized();
        self.filters = state.filters;
        self.controller.cancel();
        debug!(%id, "Variation loaded for editing");
        Ok(())
    }

    /// Removes one variation from the pool and from the selection.
    pub fn remove_variation(&mut self, id: VariationId) -> Option<Variation> {
        let removed = self.pool.remove(id);
        self.selection.retain_pooled(&self.pool);
        removed
    }

    pub fn mode(&self) -> MaterializationMode {
        self.mode
    }

    /// Switches the product mode used for selection caps.
    pub fn set_mode(&mut self, mode: MaterializationMode) {
        self.mode = mode;
    }

    pub fn pricing(&self) -> Pricing {
        self.pricing
    }

    pub fn set_pricing(&mut self, pricing: Pricing) {
        self.pricing = pricing;
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Selects or deselects a pooled variation under the current mode's cap.
    pub fn toggle_selection(&mut self, id: VariationId) -> Result<bool> {
        if !self.pool.contains(id) {
            return Err(StudioError::UnknownVariation(id.to_string()));
        }
        self.selection.toggle(id, self.mode)
    }

    /// Selects every pooled variation, respecting the current mode's cap.
    ///
    /// A rejected call leaves the selection as it was.
    pub fn select_all(&mut self) -> Result<()> {
        let ids: Vec<VariationId> = self.pool.iter().map(|v| v.id).collect();
        self.selection.extend(ids, self.mode)?;
        Ok(())
    }
}

impl<S: ProductSink> StudioActions for DesignStudio<S> {
    fn remove_background(&mut self) -> Result<()> {
        let base = self.current_base().ok_or(StudioError::NoBaseImage)?;
        let matted = matte::remove_background(base, self.config.max_working_dimension);
        let index = self.current_base;
        self.base_images[index] = matted;
        info!(index, "Base image background removed");
        Ok(())
    }

    fn save_to_pool(&mut self) -> Result<VariationId> {
        let state = self.snapshot()?;
        if state.overlay_image.is_none() {
            return Err(StudioError::NoOverlay);
        }

        let raster = Compositor::render_data_uri(&state, RenderMode::Transparent)?;
        let label = format!("Design {}", self.pool.len() + 1);
        let id = self.pool.add(Variation::new(raster, label, state));
        info!(%id, pooled = self.pool.len(), "Design saved to pool");

        self.remove_current_print();
        Ok(id)
    }

    fn create_product(&mut self, mode: MaterializationMode) -> Result<MaterializeReport> {
        self.selection.retain_pooled(&self.pool);
        self.selection.check(mode)?;

        let report = self.materializer.materialize(
            &mut self.pool,
            &self.selection.ids(),
            mode,
            self.pricing,
            &mut self.sink,
        )?;
        self.selection.clear();
        Ok(report)
    }

    fn set_background(&mut self, background: BackgroundSpec) {
        self.background = background;
    }

    fn clear_pool(&mut self) {
        self.pool.clear();
        self.selection.clear();
    }
}
