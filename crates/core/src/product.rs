//! Product materialization.
//!
//! Turns selected variations into [`ProductDraft`]s under one of three
//! batching policies and hands them to a [`ProductSink`]. From the pool's
//! point of view materialization is all-or-nothing: variations are consumed
//! only after every draft was accepted by the sink.

use crate::config::Config;
use crate::error::{Result, StudioError};
use crate::image_source::ImageRef;
use crate::pool::{Variation, VariationId, VariationPool};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};
use uuid::Uuid;

/// Images per product in batch mode, and the single-product cap.
pub const IMAGES_PER_PRODUCT: usize = 8;

/// How selected variations are grouped into products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MaterializationMode {
    /// One product carrying every selected image.
    #[default]
    Single,
    /// One product per selected image.
    MultiIndividual,
    /// Consecutive groups of [`IMAGES_PER_PRODUCT`] images per product.
    MultiBatch,
}

impl MaterializationMode {
    /// Selection cap the calling policy enforces for this mode.
    pub fn image_limit(&self) -> Option<usize> {
        match self {
            Self::Single => Some(IMAGES_PER_PRODUCT),
            Self::MultiIndividual | Self::MultiBatch => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::MultiIndividual => "multi-individual",
            Self::MultiBatch => "multi-batch",
        }
    }
}

impl fmt::Display for MaterializationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaterializationMode {
    type Err = String;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "multi-individual" | "individual" => Ok(Self::MultiIndividual),
            "multi-batch" | "batch" => Ok(Self::MultiBatch),
            other => Err(format!(
                "Unknown mode '{}' (expected single, multi-individual or multi-batch)",
                other
            )),
        }
    }
}

/// Per-marketplace listing flags of a new product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketplaceStatus {
    pub trendyol: bool,
    pub hepsiburada: bool,
    pub n11: bool,
}

impl Default for MarketplaceStatus {
    fn default() -> Self {
        Self {
            trendyol: true,
            hepsiburada: true,
            n11: false,
        }
    }
}

/// Price and stock applied to every draft of one materialization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    pub price: f64,
    pub stock: u32,
}

/// A product record handed to the product collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub id: String,
    pub name: String,
    pub sku: String,
    pub model_code: String,
    pub price: f64,
    pub stock: u32,
    /// Cover image: the first of `images`.
    pub image: Option<ImageRef>,
    pub images: Vec<ImageRef>,
    pub marketplace_status: MarketplaceStatus,
}

/// Receives materialized drafts (the product manager, a file writer, ...).
///
/// Emission is fire-and-forget: `Ok` means the draft was accepted, not that
/// it was persisted.
pub trait ProductSink {
    fn emit(&mut self, draft: ProductDraft) -> Result<()>;
}

impl<F> ProductSink for F
where
    F: FnMut(ProductDraft) -> Result<()>,
{
    fn emit(&mut self, draft: ProductDraft) -> Result<()> {
        self(draft)
    }
}

/// A sink that keeps every draft in memory.
#[derive(Debug, Clone, Default)]
pub struct ProductCollector {
    pub drafts: Vec<ProductDraft>,
}

impl ProductSink for ProductCollector {
    fn emit(&mut self, draft: ProductDraft) -> Result<()> {
        self.drafts.push(draft);
        Ok(())
    }
}

/// Outcome of a successful materialization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterializeReport {
    pub mode: MaterializationMode,
    /// Ids of the emitted drafts, in emission order.
    pub product_ids: Vec<String>,
    /// Variations removed from the pool.
    pub consumed: usize,
}

/// Builds drafts from variations.
pub struct Materializer {
    sku_prefix: String,
    collection_name: String,
    rng: StdRng,
}

impl Materializer {
    pub fn new(config: &Config) -> Self {
        Self {
            sku_prefix: config.sku_prefix.clone(),
            collection_name: config.collection_name.clone(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Same as [`new`](Self::new) with reproducible SKU digits.
    pub fn with_seed(config: &Config, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            ..Self::new(config)
        }
    }

    /// Groups `selected` (already in pool order) into drafts.
    ///
    /// Does not enforce any image cap.
    pub fn plan(&mut self, mode: MaterializationMode, selected: &[&Variation], pricing: Pricing) -> Vec<ProductDraft> {
        if selected.is_empty() {
            return Vec::new();
        }

        match mode {
            MaterializationMode::Single => {
                let name = self.collection_name.clone();
                let digits = self.sku_digits();
                let sku = format!("{}-{}", self.sku_prefix, digits);
                vec![self.draft(name, sku, selected, pricing)]
            }
            MaterializationMode::MultiIndividual => selected
                .iter()
                .enumerate()
                .map(|(idx, variation)| {
                    let digits = self.sku_digits();
                    let sku = format!("{}-{}-{}", self.sku_prefix, digits, idx);
                    self.draft(format!("Design {}", idx + 1), sku, &[*variation], pricing)
                })
                .collect(),
            MaterializationMode::MultiBatch => selected
                .chunks(IMAGES_PER_PRODUCT)
                .enumerate()
                .map(|(k, chunk)| {
                    let offset = k * IMAGES_PER_PRODUCT;
                    let digits = self.sku_digits();
                    let sku = format!("{}-BATCH-{}-{}", self.sku_prefix, digits, offset);
                    self.draft(format!("Batch Series {}", k + 1), sku, chunk, pricing)
                })
                .collect(),
        }
    }

    /// Plans, emits and consumes.
    ///
    /// # Errors
    ///
    /// - [`StudioError::EmptySelection`] if no pooled variation is selected.
    /// - [`StudioError::Emission`] if the sink rejects a draft; the pool is
    ///   left exactly as it was.
    pub fn materialize(
        &mut self,
        pool: &mut VariationPool,
        selection: &HashSet<VariationId>,
        mode: MaterializationMode,
        pricing: Pricing,
        sink: &mut dyn ProductSink,
    ) -> Result<MaterializeReport> {
        let selected = pool.selected(selection);
        if selected.is_empty() {
            return Err(StudioError::EmptySelection);
        }
        let consumed_ids: HashSet<VariationId> = selected.iter().map(|v| v.id).collect();
        let drafts = self.plan(mode, &selected, pricing);
        let total = drafts.len();

        let mut product_ids = Vec::with_capacity(total);
        for (emitted, draft) in drafts.into_iter().enumerate() {
            let id = draft.id.clone();
            if let Err(e) = sink.emit(draft) {
                warn!(emitted, total, error = %e, "Product emission failed, pool left untouched");
                return Err(StudioError::emission(emitted, total, e.to_string()));
            }
            product_ids.push(id);
        }

        let consumed = pool.consume(&consumed_ids);
        info!(%mode, products = total, consumed, "Variations materialized");
        Ok(MaterializeReport {
            mode,
            product_ids,
            consumed,
        })
    }

    fn draft(&mut self, name: String, sku: String, variations: &[&Variation], pricing: Pricing) -> ProductDraft {
        let images: Vec<ImageRef> = variations.iter().map(|v| v.raster.clone()).collect();
        ProductDraft {
            id: Uuid::new_v4().to_string(),
            name,
            sku,
            model_code: format!("MOD-{}", self.model_digits()),
            price: pricing.price,
            stock: pricing.stock,
            image: images.first().cloned(),
            images,
            marketplace_status: MarketplaceStatus::default(),
        }
    }

    fn sku_digits(&mut self) -> u32 {
        self.rng.gen_range(1000..10000)
    }

    fn model_digits(&mut self) -> u32 {
        self.rng.gen_range(100..1000)
    }
}
