use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use design_studio_core::{
    BackgroundSpec, Compositor, Config, DesignSessionState, DesignStudio, ImageRef, MaterializationMode,
    PixelBufferLoader, PlacementTransform, Pricing, RenderMode, Settings, StudioActions, init, matte,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless driver for the Design Studio engine", long_about = None)]
struct Args {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Remove the background of one image
    Matte {
        /// Image path, file:// URL or data URI
        #[arg(short, long)]
        input: String,

        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,

        /// Working size cap (defaults to STUDIO_MAX_WORKING_DIM)
        #[arg(long)]
        max_dim: Option<u32>,
    },

    /// Composite a print onto a base image
    Render {
        #[arg(long)]
        base: String,

        #[arg(long)]
        overlay: Option<String>,

        /// Matte the overlay before compositing
        #[arg(long, default_value_t = false)]
        matte: bool,

        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        x: f64,

        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        y: f64,

        #[arg(long, default_value_t = 0.5)]
        scale: f64,

        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        rotate: f64,

        #[arg(long, default_value_t = 1.0)]
        opacity: f64,

        /// `#rrggbb`, `#rgb` or `transparent`
        #[arg(long, default_value = "#ffffff")]
        background: BackgroundSpec,

        /// Skip the background fill (pool-style export)
        #[arg(long, default_value_t = false)]
        transparent: bool,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Save a list of designs to the pool and turn them into products
    Batch {
        /// JSON recipe: a list of designs
        #[arg(long)]
        recipe: PathBuf,

        /// single, multi-individual or multi-batch
        #[arg(long)]
        mode: Option<MaterializationMode>,

        #[arg(long)]
        price: Option<f64>,

        #[arg(long)]
        stock: Option<u32>,

        /// Directory receiving the product images
        #[arg(long)]
        output_dir: PathBuf,
    },
}

/// One design of a batch recipe.
#[derive(Deserialize, Debug)]
struct RecipeDesign {
    base: String,
    print: String,
    #[serde(default)]
    placement: Option<PlacementTransform>,
    #[serde(default)]
    background: Option<BackgroundSpec>,
}

/// Draft as printed on stdout, with images written to disk.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ProductSummary {
    id: String,
    name: String,
    sku: String,
    model_code: String,
    price: f64,
    stock: u32,
    images: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup
    init();
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = Config::load().context("Failed to load configuration")?;

    match args.command {
        Command::Matte { input, output, max_dim } => {
            let max_dim = max_dim.unwrap_or(config.max_working_dimension);
            let source = ImageRef::parse(&input);
            let matted = tokio::task::spawn_blocking(move || matte::remove_background(&source, max_dim))
                .await
                .context("Matte task panicked")?;
            write_png(&matted, &output)?;
            info!(output = %output.display(), "Matte written");
        }

        Command::Render {
            base,
            overlay,
            matte: matte_overlay,
            x,
            y,
            scale,
            rotate,
            opacity,
            background,
            transparent,
            output,
        } => {
            let mut placement = PlacementTransform::default();
            placement.translate(x, y);
            placement.set_scale(scale);
            placement.set_rotation(rotate);
            placement.set_opacity(opacity);

            let mut state = DesignSessionState::new(ImageRef::parse(&base))
                .with_background(background)
                .with_placement(placement);
            let max_dim = config.max_working_dimension;
            let mode = if transparent { RenderMode::Transparent } else { RenderMode::Opaque };

            let png = tokio::task::spawn_blocking(move || -> Result<Vec<u8>> {
                if let Some(raw) = overlay {
                    let print = ImageRef::parse(&raw);
                    let print = if matte_overlay { matte::remove_background(&print, max_dim) } else { print };
                    state = state.with_overlay(print);
                }
                let pixels = Compositor::render(&state, mode).context("Failed to render design")?;
                Ok(PixelBufferLoader::encode_png(&pixels)?)
            })
            .await
            .context("Render task panicked")??;

            fs::write(&output, png).with_context(|| format!("Failed to write {}", output.display()))?;
            info!(output = %output.display(), "Render written");
        }

        Command::Batch {
            recipe,
            mode,
            price,
            stock,
            output_dir,
        } => {
            let settings = Settings::load();
            let mode = mode.unwrap_or(settings.mode);
            let pricing = Pricing {
                price: price.unwrap_or(settings.price),
                stock: stock.unwrap_or(settings.stock),
            };

            let raw = fs::read_to_string(&recipe)
                .with_context(|| format!("Failed to read recipe {}", recipe.display()))?;
            let designs: Vec<RecipeDesign> = serde_json::from_str(&raw).context("Recipe is not a list of designs")?;
            if designs.is_empty() {
                bail!("Recipe {} contains no designs", recipe.display());
            }

            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::default_spinner()
                    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                    .template("{spinner:.green} {msg}")?,
            );
            spinner.set_message(format!("Compositing {} designs...", designs.len()));
            spinner.enable_steady_tick(Duration::from_millis(100));

            let drafts = tokio::task::spawn_blocking(move || run_batch(config, settings, designs, mode, pricing))
                .await
                .context("Batch task panicked")?;
            spinner.finish_and_clear();
            let drafts = drafts?;

            fs::create_dir_all(&output_dir)
                .with_context(|| format!("Failed to create {}", output_dir.display()))?;
            let mut summaries = Vec::with_capacity(drafts.len());
            for draft in drafts {
                let mut images = Vec::with_capacity(draft.images.len());
                for (i, image) in draft.images.iter().enumerate() {
                    let path = output_dir.join(format!("{}-{}.png", draft.sku, i + 1));
                    write_png(image, &path)?;
                    images.push(path);
                }
                summaries.push(ProductSummary {
                    id: draft.id,
                    name: draft.name,
                    sku: draft.sku,
                    model_code: draft.model_code,
                    price: draft.price,
                    stock: draft.stock,
                    images,
                });
            }

            println!("{}", serde_json::to_string_pretty(&summaries)?);
        }
    }

    Ok(())
}

/// Pools every design, selects them all and materializes with `mode`.
fn run_batch(
    config: Config,
    settings: Settings,
    designs: Vec<RecipeDesign>,
    mode: MaterializationMode,
    pricing: Pricing,
) -> Result<Vec<design_studio_core::ProductDraft>> {
    let mut studio = DesignStudio::collecting(config, &settings);
    studio.set_mode(mode);
    studio.set_pricing(pricing);

    for (i, design) in designs.into_iter().enumerate() {
        let base = ImageRef::parse(&design.base);
        let index = match studio.base_images().iter().position(|b| *b == base) {
            Some(index) => index,
            None => {
                studio.add_base_images([base]);
                studio.base_images().len() - 1
            }
        };
        studio.select_base_image(index);
        studio.add_prints([ImageRef::parse(&design.print)]);
        if let Some(placement) = design.placement {
            studio.set_placement(placement);
        }
        studio.set_background(design.background.unwrap_or(settings.background));

        let id = studio
            .save_to_pool()
            .with_context(|| format!("Failed to save design {} ({})", i + 1, design.print))?;
        debug!(%id, "Design pooled");
    }

    studio.select_all().context("Selection rejected")?;
    let report = studio.create_product(mode).context("Failed to create products")?;
    info!(products = report.product_ids.len(), consumed = report.consumed, %mode, "Batch materialized");

    Ok(std::mem::take(&mut studio.sink_mut().drafts))
}

fn write_png(image: &ImageRef, path: &Path) -> Result<()> {
    let bytes = PixelBufferLoader::to_png(image)
        .with_context(|| format!("Failed to convert image for {}", path.display()))?;
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
