//! Tile colors: sampling from the source image and remapping onto palettes.

use crate::error::{MosaicError, Result};
use crate::geometry::{centroid, pixels_inside, Point};
use crate::image_processor::ImageData;
use crate::tiles::Tile;
use rayon::prelude::*;
use rgb::RGB8;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One color per tile, same order as the tile set.
pub type ColorAssignment = Vec<RGB8>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleMethod {
    /// Mean of every pixel whose centre lies inside the tile
    #[default]
    Average,
    /// Pixel under the tile centroid
    Centroid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMetric {
    /// Euclidean RGB
    #[default]
    Source,
    /// Weighted RGB, R=2 G=4 B=3
    Perceptual,
}

impl FromStr for ColorMetric {
    type Err = MosaicError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "source" => Ok(ColorMetric::Source),
            "perceptual" => Ok(ColorMetric::Perceptual),
            other => Err(MosaicError::Config(format!("unknown color metric '{other}'"))),
        }
    }
}

#[inline]
pub fn color_distance(a: &RGB8, b: &RGB8, metric: ColorMetric) -> i32 {
    let dr = a.r as i32 - b.r as i32;
    let dg = a.g as i32 - b.g as i32;
    let db = a.b as i32 - b.b as i32;
    match metric {
        ColorMetric::Source => dr * dr + dg * dg + db * db,
        ColorMetric::Perceptual => 2 * dr * dr + 4 * dg * dg + 3 * db * db,
    }
}

fn sample_polygon(image: &ImageData, polygon: &[Point], method: SampleMethod) -> RGB8 {
    let c = centroid(polygon);
    if method == SampleMethod::Centroid {
        return image.nearest_rgb(c.x, c.y);
    }
    let inside = pixels_inside(polygon, image.width, image.height);
    if inside.is_empty() {
        return image.nearest_rgb(c.x, c.y);
    }
    let (mut r, mut g, mut b) = (0u64, 0u64, 0u64);
    for &(x, y) in &inside {
        let p = image.rgb_at(x, y);
        r += p.r as u64;
        g += p.g as u64;
        b += p.b as u64;
    }
    let n = inside.len() as u64;
    RGB8::new(
        ((r + n / 2) / n) as u8,
        ((g + n / 2) / n) as u8,
        ((b + n / 2) / n) as u8,
    )
}

/// Sample one color per tile from the source image.
pub fn colors_from_original(tiles: &[Tile], image: &ImageData, method: SampleMethod) -> ColorAssignment {
    if image.width == 0 || image.height == 0 {
        return vec![RGB8::new(0, 0, 0); tiles.len()];
    }
    tiles
        .par_iter()
        .map(|tile| sample_polygon(image, &tile.polygon, method))
        .collect()
}

/// Nearest palette entry; ties go to the earlier entry.
pub fn nearest_palette_color(color: &RGB8, palette: &[RGB8], metric: ColorMetric) -> Option<RGB8> {
    let mut best: Option<(RGB8, i32)> = None;
    for entry in palette {
        let d = color_distance(color, entry, metric);
        if best.is_none_or(|(_, bd)| d < bd) {
            best = Some((*entry, d));
        }
    }
    best.map(|(c, _)| c)
}

/// Replace each color by its nearest palette entry.
///
/// Applying the same palette twice gives the same result as applying it once.
pub fn modify_colors(colors: &[RGB8], palette: &[RGB8], metric: ColorMetric) -> Result<ColorAssignment> {
    if palette.is_empty() {
        return Err(MosaicError::Config("cannot remap onto an empty palette".to_string()));
    }
    Ok(colors
        .iter()
        .map(|c| nearest_palette_color(c, palette, metric).unwrap_or(*c))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::oriented_square;
    use crate::tiles::TilePass;
    use rgb::RGBA8;

    fn two_tone_image() -> ImageData {
        // left half red, right half blue
        let mut pixels = Vec::new();
        for _y in 0..10 {
            for x in 0..20 {
                pixels.push(if x < 10 {
                    RGBA8::new(200, 0, 0, 255)
                } else {
                    RGBA8::new(0, 0, 200, 255)
                });
            }
        }
        ImageData { width: 20, height: 10, pixels }
    }

    fn square_tile(x: f64, y: f64, half: f64) -> Tile {
        Tile {
            polygon: oriented_square(Point::new(x, y), half, 0.0),
            angle: 0.0,
            chain: None,
            pass: TilePass::Primary,
        }
    }

    #[test]
    fn test_average_color_inside_tile() {
        let image = two_tone_image();
        let tiles = vec![square_tile(5.0, 5.0, 3.0), square_tile(15.0, 5.0, 3.0)];
        let colors = colors_from_original(&tiles, &image, SampleMethod::Average);
        assert_eq!(colors, vec![RGB8::new(200, 0, 0), RGB8::new(0, 0, 200)]);
    }

    #[test]
    fn test_average_mixes_straddling_tile() {
        let image = two_tone_image();
        let colors = colors_from_original(&[square_tile(10.0, 5.0, 2.0)], &image, SampleMethod::Average);
        assert_eq!(colors[0], RGB8::new(100, 0, 100));
    }

    #[test]
    fn test_tiny_tile_falls_back_to_centroid_pixel() {
        let image = two_tone_image();
        // no pixel centre lies inside this sliver
        let tiles = vec![square_tile(14.0, 4.0, 0.2)];
        let colors = colors_from_original(&tiles, &image, SampleMethod::Average);
        assert_eq!(colors[0], RGB8::new(0, 0, 200));
        let colors = colors_from_original(&tiles, &image, SampleMethod::Centroid);
        assert_eq!(colors[0], RGB8::new(0, 0, 200));
    }

    #[test]
    fn test_perceptual_distance_weights_green_most() {
        let base = RGB8::new(100, 100, 100);
        let greener = RGB8::new(100, 110, 100);
        let redder = RGB8::new(110, 100, 100);
        assert!(
            color_distance(&base, &greener, ColorMetric::Perceptual)
                > color_distance(&base, &redder, ColorMetric::Perceptual)
        );
        assert_eq!(
            color_distance(&base, &greener, ColorMetric::Source),
            color_distance(&base, &redder, ColorMetric::Source)
        );
    }

    #[test]
    fn test_remap_picks_nearest_and_is_idempotent() {
        let palette = vec![RGB8::new(0, 0, 0), RGB8::new(255, 255, 255), RGB8::new(200, 30, 30)];
        let colors = vec![RGB8::new(10, 10, 10), RGB8::new(240, 240, 230), RGB8::new(180, 40, 20)];
        let once = modify_colors(&colors, &palette, ColorMetric::Source).unwrap();
        assert_eq!(once, vec![palette[0], palette[1], palette[2]]);
        let twice = modify_colors(&once, &palette, ColorMetric::Source).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_remap_tie_goes_to_first_entry() {
        let palette = vec![RGB8::new(0, 0, 0), RGB8::new(20, 0, 0)];
        let mapped = modify_colors(&[RGB8::new(10, 0, 0)], &palette, ColorMetric::Source).unwrap();
        assert_eq!(mapped[0], palette[0]);
    }

    #[test]
    fn test_remap_empty_palette_is_config_error() {
        let err = modify_colors(&[RGB8::new(1, 2, 3)], &[], ColorMetric::Source).unwrap_err();
        assert!(matches!(err, MosaicError::Config(_)));
    }

    #[test]
    fn test_metric_from_str() {
        assert_eq!("Source".parse::<ColorMetric>().unwrap(), ColorMetric::Source);
        assert_eq!("perceptual".parse::<ColorMetric>().unwrap(), ColorMetric::Perceptual);
        assert!("lab".parse::<ColorMetric>().is_err());
    }
}
