//! Run configuration.
//!
//! Field names on the wire match the option names the mosaic pipeline has
//! always used (`half_tile`, `RAND_SIZE`, `MAX_ANGLE`, ...), so existing
//! parameter files load unchanged. Missing keys fall back to defaults.

use crate::coloring::{ColorMetric, SampleMethod};
use crate::error::{MosaicError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Gradient operator used by the edge map builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeDetection {
    Sobel,
    Prewitt,
    Scharr,
}

impl FromStr for EdgeDetection {
    type Err = MosaicError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sobel" => Ok(EdgeDetection::Sobel),
            "prewitt" => Ok(EdgeDetection::Prewitt),
            "scharr" => Ok(EdgeDetection::Scharr),
            other => Err(MosaicError::Config(format!(
                "unknown edge detection kind '{other}' (expected sobel, prewitt or scharr)"
            ))),
        }
    }
}

impl fmt::Display for EdgeDetection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EdgeDetection::Sobel => "sobel",
            EdgeDetection::Prewitt => "prewitt",
            EdgeDetection::Scharr => "scharr",
        };
        f.write_str(name)
    }
}

/// Options for photo to mosaic conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MosaicOptions {
    /// Nominal tile radius in pixels (default: 8)
    #[serde(rename = "half_tile")]
    pub half_tile: f64,
    /// Tile size jitter as a fraction of `half_tile` (default: 0.15)
    #[serde(rename = "RAND_SIZE")]
    pub rand_size: f64,
    /// Largest orientation change between neighbouring tiles, degrees (default: 30)
    #[serde(rename = "MAX_ANGLE")]
    pub max_angle: f64,
    /// Spacing of gap guidelines in pixels (default: 2 * half_tile)
    #[serde(rename = "GAP_CHAIN_SPACING")]
    pub gap_chain_spacing: Option<f64>,
    /// Replace concave tiles by convex ones (default: true)
    #[serde(rename = "MAKE_CONVEX")]
    pub make_convex: bool,
    /// Palettes to recolor with; empty means every known palette
    #[serde(rename = "COLOR_SCHEMA")]
    pub color_schema: Vec<String>,
    #[serde(rename = "EDGE_DETECTION")]
    pub edge_detection: EdgeDetection,
    /// Gaussian pre-smoothing before edge detection (default: true)
    #[serde(rename = "GAUSS")]
    pub gauss: bool,
    /// Treat the canvas border as an edge (default: true)
    #[serde(rename = "WITH_FRAME")]
    pub with_frame: bool,

    #[serde(rename = "SEED")]
    pub seed: u64,
    /// Edge strength threshold 0.0-1.0 (default: 0.2)
    #[serde(rename = "EDGE_THRESHOLD")]
    pub edge_threshold: f64,
    /// Place primary tiles on lines offset from the edges instead of on them
    #[serde(rename = "OFFSET_GUIDELINES")]
    pub offset_guidelines: bool,
    /// Tolerated overlap as a fraction of the smaller tile (default: 0.05)
    #[serde(rename = "OVERLAP_TOLERANCE")]
    pub overlap_tolerance: f64,
    /// Allowed hull area excess before a convex tile is rescaled (default: 0.15)
    #[serde(rename = "CONVEX_TOLERANCE")]
    pub convex_tolerance: f64,
    /// Grout width removed from each tile, pixels (default: 0.75)
    #[serde(rename = "GROUT")]
    pub grout: f64,
    #[serde(rename = "MAX_VERTICES")]
    pub max_vertices: usize,
    /// Tiles below this fraction of A0 are dropped (default: 0.1)
    #[serde(rename = "MIN_AREA_FRACTION")]
    pub min_area_fraction: f64,
    #[serde(rename = "SHRINK")]
    pub shrink: bool,
    #[serde(rename = "REPAIR")]
    pub repair: bool,
    #[serde(rename = "REDUCE")]
    pub reduce: bool,
    #[serde(rename = "DROP_SMALL")]
    pub drop_small: bool,
    /// Grey level of the background between tiles, 0.0-1.0 (default: 0.2)
    #[serde(rename = "BACKGROUND_BRIGHTNESS")]
    pub background_brightness: f64,
    /// How a tile's color is read from the source image (default: average)
    #[serde(rename = "SAMPLE_METHOD")]
    pub sample_method: SampleMethod,
    /// Distance used when remapping onto a palette (default: source)
    #[serde(rename = "COLOR_METRIC")]
    pub color_metric: ColorMetric,
}

impl Default for MosaicOptions {
    fn default() -> Self {
        Self {
            half_tile: 8.0,
            rand_size: 0.15,
            max_angle: 30.0,
            gap_chain_spacing: None,
            make_convex: true,
            color_schema: Vec::new(),
            edge_detection: EdgeDetection::Sobel,
            gauss: true,
            with_frame: true,
            seed: 0,
            edge_threshold: 0.2,
            offset_guidelines: true,
            overlap_tolerance: 0.05,
            convex_tolerance: 0.15,
            grout: 0.75,
            max_vertices: 6,
            min_area_fraction: 0.1,
            shrink: true,
            repair: true,
            reduce: true,
            drop_small: true,
            background_brightness: 0.2,
            sample_method: SampleMethod::Average,
            color_metric: ColorMetric::Source,
        }
    }
}

impl MosaicOptions {
    /// Load options from a JSON file. Keys that are absent keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            MosaicError::Config(format!("cannot read config {}: {e}", path.display()))
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| MosaicError::Config(e.to_string()))
    }

    /// Reference tile area A0 = (2 * half_tile)^2.
    pub fn reference_area(&self) -> f64 {
        (2.0 * self.half_tile).powi(2)
    }

    pub fn gap_spacing(&self) -> f64 {
        self.gap_chain_spacing.unwrap_or(2.0 * self.half_tile)
    }

    /// Reject out-of-range values before any geometry work starts.
    pub fn validate(&self) -> Result<()> {
        fn check(ok: bool, msg: impl Into<String>) -> Result<()> {
            if ok { Ok(()) } else { Err(MosaicError::Config(msg.into())) }
        }

        check(
            self.half_tile.is_finite() && self.half_tile >= 1.0,
            format!("half_tile must be >= 1, got {}", self.half_tile),
        )?;
        check(
            (0.0..1.0).contains(&self.rand_size),
            format!("RAND_SIZE must be in [0, 1), got {}", self.rand_size),
        )?;
        check(
            self.max_angle > 0.0 && self.max_angle <= 180.0,
            format!("MAX_ANGLE must be in (0, 180], got {}", self.max_angle),
        )?;
        if let Some(spacing) = self.gap_chain_spacing {
            check(
                spacing.is_finite() && spacing >= 1.0,
                format!("GAP_CHAIN_SPACING must be >= 1, got {spacing}"),
            )?;
        }
        check(
            (0.0..=1.0).contains(&self.edge_threshold),
            format!("EDGE_THRESHOLD must be in [0, 1], got {}", self.edge_threshold),
        )?;
        check(
            (0.0..1.0).contains(&self.overlap_tolerance),
            format!("OVERLAP_TOLERANCE must be in [0, 1), got {}", self.overlap_tolerance),
        )?;
        check(
            (0.0..1.0).contains(&self.convex_tolerance),
            format!("CONVEX_TOLERANCE must be in [0, 1), got {}", self.convex_tolerance),
        )?;
        check(
            self.grout >= 0.0 && self.grout < self.half_tile,
            format!("GROUT must be in [0, half_tile), got {}", self.grout),
        )?;
        check(
            self.max_vertices >= 3,
            format!("MAX_VERTICES must be >= 3, got {}", self.max_vertices),
        )?;
        check(
            (0.0..=1.0).contains(&self.min_area_fraction),
            format!("MIN_AREA_FRACTION must be in [0, 1], got {}", self.min_area_fraction),
        )?;
        check(
            (0.0..=1.0).contains(&self.background_brightness),
            format!(
                "BACKGROUND_BRIGHTNESS must be in [0, 1], got {}",
                self.background_brightness
            ),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mosaic_options_default() {
        let options = MosaicOptions::default();
        assert_eq!(options.half_tile, 8.0);
        assert_eq!(options.max_angle, 30.0);
        assert_eq!(options.edge_detection, EdgeDetection::Sobel);
        assert!(options.make_convex);
        assert!(options.color_schema.is_empty());
        assert_eq!(options.reference_area(), 256.0);
        assert_eq!(options.gap_spacing(), 16.0);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let options = MosaicOptions::from_json_str(
            r#"{ "half_tile": 5, "MAKE_CONVEX": false, "COLOR_SCHEMA": ["roman"] }"#,
        )
        .unwrap();
        assert_eq!(options.half_tile, 5.0);
        assert!(!options.make_convex);
        assert_eq!(options.color_schema, vec!["roman".to_string()]);
        assert_eq!(options.rand_size, 0.15);
        assert_eq!(options.gap_spacing(), 10.0);
        assert_eq!(options.color_metric, ColorMetric::Source);
    }

    #[test]
    fn test_color_options_from_json() {
        let options =
            MosaicOptions::from_json_str(r#"{ "SAMPLE_METHOD": "centroid", "COLOR_METRIC": "perceptual" }"#)
                .unwrap();
        assert_eq!(options.sample_method, SampleMethod::Centroid);
        assert_eq!(options.color_metric, ColorMetric::Perceptual);
    }

    #[test]
    fn test_unknown_edge_detection_is_config_error() {
        let err = MosaicOptions::from_json_str(r#"{ "EDGE_DETECTION": "hed" }"#).unwrap_err();
        assert!(matches!(err, MosaicError::Config(_)));

        let err = "laplace".parse::<EdgeDetection>().unwrap_err();
        assert!(matches!(err, MosaicError::Config(_)));
        assert_eq!("Scharr".parse::<EdgeDetection>().unwrap(), EdgeDetection::Scharr);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut options = MosaicOptions::default();
        options.half_tile = 0.5;
        assert!(options.validate().is_err());

        let mut options = MosaicOptions::default();
        options.rand_size = 1.0;
        assert!(options.validate().is_err());

        let mut options = MosaicOptions::default();
        options.max_angle = 0.0;
        assert!(options.validate().is_err());

        let mut options = MosaicOptions::default();
        options.gap_chain_spacing = Some(0.0);
        assert!(options.validate().is_err());

        let mut options = MosaicOptions::default();
        options.grout = 8.0;
        assert!(options.validate().is_err());
    }
}
