use design_studio_core::{
    BackgroundSpec, Config, DesignStudio, FilterSettings, ImageRef, MaterializationMode, PixelBufferLoader,
    PreviewRenderer, ProductDraft, Result, Settings, StudioActions, StudioError,
};
use image::{Rgba, RgbaImage};
use std::time::Duration;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const RED: Rgba<u8> = Rgba([220, 20, 20, 255]);

fn encode(pixels: &RgbaImage) -> ImageRef {
    PixelBufferLoader::encode_data_uri(pixels).unwrap()
}

fn decode(image: &ImageRef) -> RgbaImage {
    PixelBufferLoader::load(image).unwrap()
}

/// White square with a colored block in the middle.
fn block_on_white(size: u32, block: u32, color: Rgba<u8>) -> RgbaImage {
    let mut pixels = RgbaImage::from_pixel(size, size, WHITE);
    let start = (size - block) / 2;
    for y in start..start + block {
        for x in start..start + block {
            pixels.put_pixel(x, y, color);
        }
    }
    pixels
}

fn shirt() -> ImageRef {
    encode(&RgbaImage::from_pixel(462, 462, Rgba([40, 90, 160, 255])))
}

fn studio_with_prints(prints: usize) -> DesignStudio {
    let mut studio = DesignStudio::collecting(Config::default(), &Settings::default());
    studio.add_base_images([shirt()]);
    studio.add_prints((0..prints).map(|_| encode(&block_on_white(100, 40, RED))));
    studio
}

fn save_all(studio: &mut DesignStudio) {
    while studio.overlay().is_some() {
        studio.save_to_pool().unwrap();
    }
}

#[test]
fn remove_background_mattes_the_current_base() {
    let mut studio = DesignStudio::collecting(Config::default(), &Settings::default());
    studio.add_base_images([encode(&block_on_white(10, 4, RED))]);

    studio.remove_background().unwrap();

    let matted = decode(studio.current_base().unwrap());
    for (x, y, pixel) in matted.enumerate_pixels() {
        let inside = (3..7).contains(&x) && (3..7).contains(&y);
        if inside {
            assert_eq!(*pixel, RED, "block pixel ({x}, {y}) changed");
        } else {
            assert_eq!(pixel[3], 0, "background pixel ({x}, {y}) kept");
        }
    }
}

#[test]
fn remove_background_keeps_undecodable_base() {
    let broken = ImageRef::parse("data:image/png;base64,AAAA");
    let mut studio = DesignStudio::collecting(Config::default(), &Settings::default());
    studio.add_base_images([broken.clone()]);

    studio.remove_background().unwrap();

    assert_eq!(studio.current_base(), Some(&broken));
}

#[test]
fn prints_are_matted_on_load() {
    let studio = studio_with_prints(1);
    let print = decode(studio.overlay().unwrap());
    assert_eq!(print.get_pixel(0, 0)[3], 0);
    assert_eq!(*print.get_pixel(50, 50), RED);
}

#[test]
fn saved_variations_render_the_print() {
    let mut studio = studio_with_prints(1);
    let id = studio.save_to_pool().unwrap();

    let variation = studio.pool().get(id).unwrap();
    let raster = decode(&variation.raster);
    assert_eq!(raster.dimensions(), (462, 462));
    // Centered print at scale 0.5: 100px source drawn 200px wide
    assert_eq!(*raster.get_pixel(231, 231), RED);
    assert_eq!(*raster.get_pixel(10, 10), Rgba([40, 90, 160, 255]));
    assert_eq!(variation.label, "Design 1");
}

#[test]
fn batch_product_preserves_pool_order() {
    let mut studio = studio_with_prints(3);
    save_all(&mut studio);
    let rasters: Vec<ImageRef> = studio.pool().iter().map(|v| v.raster.clone()).collect();

    studio.set_mode(MaterializationMode::MultiBatch);
    studio.select_all().unwrap();
    let report = studio.create_product(MaterializationMode::MultiBatch).unwrap();

    assert_eq!(report.product_ids.len(), 1);
    assert_eq!(report.consumed, 3);
    let drafts = &studio.sink().drafts;
    assert_eq!(drafts[0].images, rasters);
    assert_eq!(drafts[0].price, 599.90);
    assert_eq!(drafts[0].stock, 100);
    assert!(studio.pool().is_empty());
    assert!(studio.selection().is_empty());
}

#[test]
fn nine_variations_split_into_two_batches() {
    let mut studio = studio_with_prints(9);
    save_all(&mut studio);
    studio.set_mode(MaterializationMode::MultiBatch);
    studio.select_all().unwrap();

    studio.create_product(MaterializationMode::MultiBatch).unwrap();

    let sizes: Vec<usize> = studio.sink().drafts.iter().map(|d| d.images.len()).collect();
    assert_eq!(sizes, [8, 1]);
}

#[test]
fn single_mode_rejects_a_ninth_image() {
    let mut studio = studio_with_prints(9);
    save_all(&mut studio);
    let ids: Vec<_> = studio.pool().iter().map(|v| v.id).collect();

    for id in &ids[..8] {
        assert!(studio.toggle_selection(*id).unwrap());
    }
    let err = studio.toggle_selection(ids[8]).unwrap_err();
    assert_eq!(err.to_string(), "Selected 9 of at most 8 images (1 too many)");

    studio.create_product(MaterializationMode::Single).unwrap();
    assert_eq!(studio.sink().drafts.len(), 1);
    assert_eq!(studio.sink().drafts[0].images.len(), 8);
    assert_eq!(studio.pool().len(), 1);
}

#[test]
fn rejected_select_all_leaves_selection_unchanged() {
    let mut studio = studio_with_prints(9);
    save_all(&mut studio);

    let err = studio.select_all().unwrap_err();

    assert!(matches!(err, StudioError::SelectionLimit { limit: 8, selected: 9 }));
    assert!(studio.selection().is_empty());
}

#[test]
fn create_product_rechecks_the_cap() {
    let mut studio = studio_with_prints(9);
    save_all(&mut studio);
    studio.set_mode(MaterializationMode::MultiBatch);
    studio.select_all().unwrap();

    let err = studio.create_product(MaterializationMode::Single).unwrap_err();

    assert!(matches!(err, StudioError::SelectionLimit { limit: 8, selected: 9 }));
    assert_eq!(studio.pool().len(), 9);
}

#[test]
fn failed_emission_keeps_the_pool() {
    let mut emitted = 0;
    let sink = move |_draft: ProductDraft| -> Result<()> {
        emitted += 1;
        if emitted == 2 {
            return Err(StudioError::config("store rejected the product"));
        }
        Ok(())
    };
    let mut studio = DesignStudio::new(Config::default(), &Settings::default(), sink);
    studio.add_base_images([shirt()]);
    studio.add_prints((0..3).map(|_| encode(&block_on_white(60, 20, RED))));
    while studio.overlay().is_some() {
        studio.save_to_pool().unwrap();
    }
    let before: Vec<_> = studio.pool().iter().map(|v| v.id).collect();
    studio.set_mode(MaterializationMode::MultiIndividual);
    studio.select_all().unwrap();

    let err = studio.create_product(MaterializationMode::MultiIndividual).unwrap_err();

    assert!(matches!(err, StudioError::Emission { emitted: 1, total: 3, .. }));
    assert_eq!(studio.pool().iter().map(|v| v.id).collect::<Vec<_>>(), before);
    assert_eq!(studio.selection().len(), 3);
}

#[test]
fn edit_restores_the_saved_design() {
    let mut studio = studio_with_prints(2);
    let mut placement = studio.placement();
    placement.translate(12.0, -8.0);
    placement.rotate_by(90.0);
    studio.set_placement(placement);
    studio.set_background(BackgroundSpec::Transparent);
    studio.set_filters(FilterSettings::new(150, 80));
    let id = studio.save_to_pool().unwrap();
    let saved_print = studio.pool().get(id).unwrap().snapshot.overlay_image.clone();

    // The next print is active with a fresh placement
    studio.set_background(BackgroundSpec::WHITE);
    assert_eq!(studio.placement().x, 0.0);

    studio.edit_variation(id).unwrap();

    assert_eq!(studio.placement().x, 12.0);
    assert_eq!(studio.placement().y, -8.0);
    assert_eq!(studio.placement().rotate, 90.0);
    assert_eq!(studio.background(), BackgroundSpec::Transparent);
    assert_eq!(studio.filters(), FilterSettings::new(150, 80));
    assert_eq!(studio.overlay().cloned(), saved_print);
    assert_eq!(studio.pool().len(), 1);
}

#[test]
fn edit_brings_back_a_replaced_base() {
    let mut studio = studio_with_prints(1);
    let original = studio.current_base().cloned().unwrap();
    let id = studio.save_to_pool().unwrap();

    studio.remove_background().unwrap();
    assert_ne!(studio.current_base(), Some(&original));

    studio.edit_variation(id).unwrap();
    assert_eq!(studio.current_base(), Some(&original));
    assert_eq!(studio.base_images().len(), 2);
}

#[test]
fn clear_pool_drops_everything() {
    let mut studio = studio_with_prints(2);
    save_all(&mut studio);
    studio.select_all().unwrap();

    studio.clear_pool();

    assert!(studio.pool().is_empty());
    assert!(studio.selection().is_empty());
    assert!(matches!(
        studio.create_product(MaterializationMode::Single),
        Err(StudioError::EmptySelection)
    ));
}

#[test]
fn preview_applies_filters_but_export_does_not() {
    let mut studio = studio_with_prints(0);
    studio.set_filters(FilterSettings::new(100, 0));

    let preview = studio.render_preview().unwrap();
    assert_eq!(*preview.get_pixel(5, 5), Rgba([128, 128, 128, 255]));

    let exported = decode(&studio.export(design_studio_core::RenderMode::Opaque).unwrap());
    assert_eq!(*exported.get_pixel(5, 5), Rgba([40, 90, 160, 255]));
}

#[test]
fn preview_worker_renders_the_live_design() {
    let studio = studio_with_prints(1);
    let renderer = PreviewRenderer::spawn();

    let generation = studio.submit_preview(&renderer).unwrap();
    let frame = renderer.wait_latest(Duration::from_secs(10)).unwrap();

    assert_eq!(frame.generation, generation);
    assert_eq!(frame.result.unwrap(), studio.render_preview().unwrap());
}
