//! Cut tiles back to the canvas.

use crate::geometry::{bounding_box, clip_to_rect, polygon_area};
use crate::tiles::{Tile, TileSet};

const MIN_CLIPPED_AREA: f64 = 1e-9;

/// Clip every tile to `[0, width] x [0, height]`.
///
/// Tiles that end up with fewer than three vertices or no area are removed;
/// the second value is how many.
pub fn cut_tiles_outside_frame(tiles: &[Tile], width: u32, height: u32) -> (TileSet, usize) {
    let (w, h) = (width as f64, height as f64);
    let mut kept = Vec::with_capacity(tiles.len());
    let mut dropped = 0;

    for tile in tiles {
        let (x0, y0, x1, y1) = bounding_box(&tile.polygon);
        if x0 >= 0.0 && y0 >= 0.0 && x1 <= w && y1 <= h {
            kept.push(tile.clone());
            continue;
        }
        let clipped = clip_to_rect(&tile.polygon, w, h);
        if clipped.len() < 3 || polygon_area(&clipped) < MIN_CLIPPED_AREA {
            dropped += 1;
            continue;
        }
        kept.push(tile.with_polygon(clipped));
    }

    if dropped > 0 {
        log::debug!("{dropped} tiles fell outside the frame");
    }
    (kept, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{oriented_square, Point};
    use crate::tiles::TilePass;

    fn square(x: f64, y: f64, half: f64, angle: f64) -> Tile {
        Tile {
            polygon: oriented_square(Point::new(x, y), half, angle),
            angle,
            chain: Some(0),
            pass: TilePass::Primary,
        }
    }

    #[test]
    fn test_inside_tiles_untouched() {
        let tiles = vec![square(10.0, 10.0, 4.0, 30.0)];
        let (kept, dropped) = cut_tiles_outside_frame(&tiles, 20, 20);
        assert_eq!(dropped, 0);
        assert_eq!(kept, tiles);
    }

    #[test]
    fn test_straddling_tile_is_clipped() {
        let tiles = vec![square(0.0, 10.0, 4.0, 0.0)];
        let (kept, dropped) = cut_tiles_outside_frame(&tiles, 20, 20);
        assert_eq!(dropped, 0);
        assert_eq!(kept.len(), 1);
        assert!((kept[0].area() - 32.0).abs() < 1e-9);
        assert!(kept[0].polygon.iter().all(|p| p.x >= 0.0 && p.x <= 20.0 && p.y >= 0.0 && p.y <= 20.0));
        assert_eq!(kept[0].chain, Some(0));
    }

    #[test]
    fn test_tile_outside_is_dropped() {
        let tiles = vec![square(-10.0, 5.0, 3.0, 15.0), square(5.0, 5.0, 3.0, 0.0)];
        let (kept, dropped) = cut_tiles_outside_frame(&tiles, 20, 20);
        assert_eq!(dropped, 1);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].polygon[0], Point::new(2.0, 2.0));
    }

    #[test]
    fn test_tile_touching_border_from_outside_is_dropped() {
        let tiles = vec![square(-3.0, 5.0, 3.0, 0.0)];
        let (kept, dropped) = cut_tiles_outside_frame(&tiles, 20, 20);
        assert!(kept.is_empty());
        assert_eq!(dropped, 1);
    }
}
