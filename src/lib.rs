//! img2mosaic - turn a photograph into a vector "artificial mosaic"
//!
//! Tiles are laid along guidelines that follow the image's edges, the
//! remaining gaps are filled with a second pass of tiles, and the final set
//! is clipped, cleaned up and colored from the source image.
//!
//! ## Pipeline
//!
//! - **Edge map** from a Sobel, Prewitt or Scharr gradient
//! - **Guideline tracing** into ordered chains with a local orientation
//! - **Tile placement** along chains with overlap rejection, twice: on the
//!   edge guidelines, then on guidelines derived from the uncovered gaps
//! - **Clip, convexify, shrink, repair, reduce, drop small**
//! - **Color sampling** and palette remapping
//!
//! ## Example
//!
//! ```rust,no_run
//! use img2mosaic::{convert, MosaicOptions};
//! use std::path::Path;
//!
//! let options = MosaicOptions {
//!     half_tile: 6.0,
//!     seed: 7,
//!     ..Default::default()
//! };
//!
//! let output = convert(Path::new("input.png"), Path::new("mosaic.svg"), &options)
//!     .expect("Conversion failed");
//! println!("{} tiles", output.final_tiles.len());
//! ```

pub mod coloring;
pub mod config;
pub mod convex;
pub mod distance;
pub mod edge_detector;
pub mod error;
pub mod frame;
pub mod gaps;
pub mod geometry;
pub mod guides;
pub mod image_processor;
pub mod palette;
pub mod pipeline;
pub mod postprocess;
pub mod svg_generator;
pub mod tiles;

pub use coloring::{ColorAssignment, ColorMetric, SampleMethod};
pub use config::{EdgeDetection, MosaicOptions};
pub use error::{GeometryWarning, MosaicError, Result};
pub use geometry::Point;
pub use image_processor::{load_image, ImageData};
pub use palette::Palettes;
pub use pipeline::{generate_mosaic, generate_mosaic_from_image, recolor, MosaicOutput, RecoloredVariant};
pub use svg_generator::{render_svg, save_svg};
pub use tiles::{Tile, TilePass, TileSet};

use std::path::{Path, PathBuf};

/// Convert an image file to a mosaic SVG using the built-in palettes.
///
/// # Example
///
/// ```rust,no_run
/// use img2mosaic::{convert, MosaicOptions};
/// use std::path::Path;
///
/// let options = MosaicOptions::default();
/// convert(Path::new("input.png"), Path::new("output.svg"), &options)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn convert(input_path: &Path, output_path: &Path, options: &MosaicOptions) -> Result<MosaicOutput> {
    let output = generate_mosaic(input_path, options, &Palettes::builtin())?;
    save_svg(&mosaic_to_svg(&output), output_path)?;
    Ok(output)
}

/// The mosaic in its sampled colors as an SVG document.
pub fn mosaic_to_svg(output: &MosaicOutput) -> svg::Document {
    render_svg(
        &output.final_tiles,
        &output.colors,
        output.width,
        output.height,
        output.background_brightness,
    )
}

/// Convert the mosaic straight to an SVG string.
pub fn mosaic_to_svg_string(output: &MosaicOutput) -> String {
    mosaic_to_svg(output).to_string()
}

/// Path for a recolored variant next to `output_path`: `out.svg` becomes
/// `out_<name>.svg`.
pub fn variant_path(output_path: &Path, name: &str) -> PathBuf {
    let stem = output_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mosaic".to_string());
    let ext = output_path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "svg".to_string());
    output_path.with_file_name(format!("{stem}_{name}.{ext}"))
}

/// Write one SVG per recolored variant; returns the paths written.
pub fn save_variants(output: &MosaicOutput, output_path: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(output.recolored.len());
    for variant in &output.recolored {
        let path = variant_path(output_path, &variant.name);
        let document = render_svg(
            &output.final_tiles,
            &variant.colors,
            output.width,
            output.height,
            output.background_brightness,
        );
        save_svg(&document, &path)?;
        written.push(path);
    }
    Ok(written)
}
