//! The staged mosaic pipeline.
//!
//! Every stage is a function of the previous stage's output; the
//! intermediate results are kept in [`MosaicOutput`] for inspection.

use crate::coloring::{colors_from_original, modify_colors, ColorAssignment};
use crate::config::MosaicOptions;
use crate::convex::make_convex;
use crate::edge_detector::{detect_edges, EdgeMap};
use crate::error::{GeometryWarning, MosaicError, Result};
use crate::frame::cut_tiles_outside_frame;
use crate::gaps::{analyze_gaps, chains_into_gaps, OccupancyField};
use crate::guides::{edge_guidelines, trace_chains, Chain, GuideField};
use crate::image_processor::{load_image, ImageData};
use crate::palette::Palettes;
use crate::postprocess::{postprocess, PostProcessOptions};
use crate::tiles::{
    fill_gaps_along_chains, place_tiles_along_chains, PlacementParams, TilePass, TileSet,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::path::Path;
use std::time::Instant;

/// One palette remapping of the final tile set.
#[derive(Debug, Clone, PartialEq)]
pub struct RecoloredVariant {
    pub name: String,
    pub colors: ColorAssignment,
}

/// Everything the pipeline produced, stage by stage.
#[derive(Debug, Clone)]
pub struct MosaicOutput {
    pub original: ImageData,
    pub edges: EdgeMap,
    /// Distance to the nearest edge pixel; only with offset guidelines
    pub edge_distances: Option<Vec<f64>>,
    /// Field the primary chains were traced from
    pub guide_field: GuideField,
    pub chains: Vec<Chain>,
    pub primary_tiles: TileSet,
    pub occupancy: OccupancyField,
    pub gap_chains: Vec<Chain>,
    /// Primary plus gap tiles
    pub filled_tiles: TileSet,
    pub clipped_tiles: TileSet,
    pub convex_tiles: Option<TileSet>,
    pub final_tiles: TileSet,
    /// Colors sampled from the source, one per final tile
    pub colors: ColorAssignment,
    pub recolored: Vec<RecoloredVariant>,
    pub warnings: Vec<GeometryWarning>,
    pub width: u32,
    pub height: u32,
    pub background_brightness: f64,
    pub estimated_tiles: usize,
}

/// Load `input_path` and run the whole pipeline on it.
pub fn generate_mosaic(
    input_path: &Path,
    options: &MosaicOptions,
    palettes: &Palettes,
) -> Result<MosaicOutput> {
    options.validate()?;
    let image = load_image(input_path)?;
    log::info!("loaded {} ({}x{})", input_path.display(), image.width, image.height);
    generate_mosaic_from_image(image, options, palettes)
}

/// Run the pipeline on an image already in memory.
///
/// Options and palette names are checked before any geometry work; a bad
/// value is a `MosaicError::Config`. Geometry problems never abort the run,
/// they end up in `warnings`.
pub fn generate_mosaic_from_image(
    image: ImageData,
    options: &MosaicOptions,
    palettes: &Palettes,
) -> Result<MosaicOutput> {
    options.validate()?;
    let selected = palettes.select(&options.color_schema)?;

    let (width, height) = (image.width, image.height);
    let half_tile = options.half_tile;
    let reference_area = options.reference_area();
    let estimated_tiles = (2.0 * width as f64 * height as f64 / reference_area).round() as usize;
    log::info!("half_tile {half_tile}, about {estimated_tiles} tiles expected");

    let mut warnings = Vec::new();
    let mut rng = StdRng::seed_from_u64(options.seed);
    let params = PlacementParams {
        half_tile,
        rand_size: options.rand_size,
        max_angle: options.max_angle,
        overlap_tolerance: options.overlap_tolerance,
    };

    let start = Instant::now();
    let edges = detect_edges(&image, options.edge_detection, options.gauss, options.with_frame);
    let guides = edge_guidelines(&edges, half_tile, options.edge_threshold, options.offset_guidelines);
    log::info!(
        "{} edge detection: {} edge pixels in {:.2?}",
        options.edge_detection,
        edges.edge_count(options.edge_threshold),
        start.elapsed()
    );

    let start = Instant::now();
    let traced = trace_chains(&guides.field, guides.threshold, half_tile);
    if traced.discarded > 0 {
        warnings.push(GeometryWarning::ShortChains { discarded: traced.discarded }.emit());
    }
    let primary_tiles =
        place_tiles_along_chains(Vec::new(), &traced.chains, &params, TilePass::Primary, &mut rng);
    if primary_tiles.is_empty() {
        warnings.push(GeometryWarning::NoEdges.emit());
    }
    log::info!(
        "primary pass: {} chains, {} tiles in {:.2?}",
        traced.chains.len(),
        primary_tiles.len(),
        start.elapsed()
    );

    let start = Instant::now();
    let occupancy = analyze_gaps(&primary_tiles, width, height, half_tile, options.gap_spacing());
    let gap_traced = chains_into_gaps(&occupancy, half_tile);
    if gap_traced.chains.is_empty() {
        warnings.push(GeometryWarning::NoGapGuidelines.emit());
    }
    if gap_traced.discarded > 0 {
        log::debug!("{} short gap chains discarded", gap_traced.discarded);
    }
    // smallest gap tile that still survives grout and the small-tile cut
    let min_half = (0.5 * half_tile)
        .max(options.grout + (options.min_area_fraction * reference_area).sqrt() / 2.0 + 0.25);
    let filled_tiles = fill_gaps_along_chains(
        primary_tiles.clone(),
        &gap_traced.chains,
        &params,
        &occupancy.clearance(min_half),
        &mut rng,
    );
    log::info!(
        "gap pass: {:.1}% covered before, {} chains, {} tiles added in {:.2?}",
        100.0 * occupancy.used_fraction(),
        gap_traced.chains.len(),
        filled_tiles.len() - primary_tiles.len(),
        start.elapsed()
    );

    let start = Instant::now();
    let (clipped_tiles, dropped) = cut_tiles_outside_frame(&filled_tiles, width, height);
    if dropped > 0 {
        warnings.push(GeometryWarning::TilesOutsideFrame { dropped }.emit());
    }
    let convex_tiles = options
        .make_convex
        .then(|| make_convex(&clipped_tiles, options.convex_tolerance));
    let (final_tiles, post_warnings) = postprocess(
        convex_tiles.as_ref().unwrap_or(&clipped_tiles),
        &PostProcessOptions::from_options(options),
    );
    warnings.extend(post_warnings);
    log::info!(
        "clip/convex/post-process: {} -> {} tiles in {:.2?}",
        filled_tiles.len(),
        final_tiles.len(),
        start.elapsed()
    );

    let start = Instant::now();
    let colors = colors_from_original(&final_tiles, &image, options.sample_method);
    let recolored = selected
        .par_iter()
        .map(|(name, palette)| {
            Ok(RecoloredVariant {
                name: name.clone(),
                colors: modify_colors(&colors, palette, options.color_metric)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    log::info!(
        "colored {} tiles, {} palette variants in {:.2?}",
        final_tiles.len(),
        recolored.len(),
        start.elapsed()
    );

    Ok(MosaicOutput {
        original: image,
        edges,
        edge_distances: guides.distances,
        guide_field: guides.field,
        chains: traced.chains,
        primary_tiles,
        occupancy,
        gap_chains: gap_traced.chains,
        filled_tiles,
        clipped_tiles,
        convex_tiles,
        final_tiles,
        colors,
        recolored,
        warnings,
        width,
        height,
        background_brightness: options.background_brightness,
        estimated_tiles,
    })
}

/// Replace a finished mosaic's colors by another palette without touching
/// the tiles.
pub fn recolor(
    output: &MosaicOutput,
    name: &str,
    palettes: &Palettes,
    options: &MosaicOptions,
) -> Result<RecoloredVariant> {
    let (name, palette) = palettes
        .select(&[name.to_string()])?
        .into_iter()
        .next()
        .ok_or_else(|| MosaicError::Config(format!("unknown palette '{name}'")))?;
    Ok(RecoloredVariant {
        colors: modify_colors(&output.colors, &palette, options.color_metric)?,
        name,
    })
}
