use anyhow::{Context, Result};
use clap::Parser;
use img2mosaic::{EdgeDetection, MosaicOptions};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "img2mosaic")]
#[command(about = "Turn a photograph into an SVG artificial mosaic")]
#[command(version)]
pub struct Cli {
    /// Input image file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output SVG file (default: input name with .svg)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// JSON file with mosaic options; flags below override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Nominal tile radius in pixels (default: 8)
    #[arg(long)]
    pub half_tile: Option<f64>,

    /// Tile size jitter as a fraction of the half tile (default: 0.15)
    #[arg(long)]
    pub rand_size: Option<f64>,

    /// Largest orientation change between neighbouring tiles in degrees (default: 30)
    #[arg(long)]
    pub max_angle: Option<f64>,

    /// Spacing of gap guidelines in pixels (default: 2 x half tile)
    #[arg(long)]
    pub gap_spacing: Option<f64>,

    /// Keep concave tiles instead of replacing them by convex ones
    #[arg(long)]
    pub no_convex: bool,

    /// Edge detector: sobel, prewitt or scharr
    #[arg(short, long)]
    pub edges: Option<String>,

    /// Skip Gaussian smoothing before edge detection
    #[arg(long)]
    pub no_gauss: bool,

    /// Do not treat the image border as an edge
    #[arg(long)]
    pub no_frame: bool,

    /// Random seed for tile size jitter
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Palette to recolor with; repeat for several (default: all)
    #[arg(short, long = "palette")]
    pub palette: Vec<String>,

    /// JSON file with extra palettes: { "name": ["#rrggbb", ...] }
    #[arg(long)]
    pub palettes: Option<PathBuf>,

    /// Also write one SVG per palette next to the output
    #[arg(short, long)]
    pub recolor: bool,

    /// Dump final tiles and colors to this JSON file
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Log every pipeline stage
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            let mut path = self.input.clone();
            path.set_extension("svg");
            path
        })
    }

    /// Options from `--config` (or defaults) with command-line overrides applied.
    pub fn mosaic_options(&self) -> Result<MosaicOptions> {
        let mut options = match &self.config {
            Some(path) => MosaicOptions::from_json_file(path)
                .with_context(|| format!("loading options from {}", path.display()))?,
            None => MosaicOptions::default(),
        };

        if let Some(v) = self.half_tile {
            options.half_tile = v;
        }
        if let Some(v) = self.rand_size {
            options.rand_size = v;
        }
        if let Some(v) = self.max_angle {
            options.max_angle = v;
        }
        if let Some(v) = self.gap_spacing {
            options.gap_chain_spacing = Some(v);
        }
        if self.no_convex {
            options.make_convex = false;
        }
        if let Some(kind) = &self.edges {
            options.edge_detection = kind.parse::<EdgeDetection>()?;
        }
        if self.no_gauss {
            options.gauss = false;
        }
        if self.no_frame {
            options.with_frame = false;
        }
        if let Some(seed) = self.seed {
            options.seed = seed;
        }
        if !self.palette.is_empty() {
            options.color_schema = self.palette.clone();
        }
        Ok(options)
    }
}
