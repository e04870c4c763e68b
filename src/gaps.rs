//! Gap analysis: where the placed tiles left space, and which guidelines
//! should fill it.

use crate::distance::{
    distance_transform, frame_distance, gradient_orientation, level_line_strength, level_offset,
};
use crate::geometry::pixels_inside;
use crate::guides::{trace_chains, GuideField, TraceResult};
use crate::tiles::{Clearance, Tile};

/// Read-only occupancy data derived once from a tile set.
#[derive(Debug, Clone)]
pub struct OccupancyField {
    pub width: u32,
    pub height: u32,
    /// Pixels whose centre lies inside some tile ("used-up space")
    pub used: Vec<bool>,
    /// Distance to the nearest tile outline or the canvas border
    pub distance: Vec<f64>,
    /// Guideline field over the gaps
    pub guides: GuideField,
}

impl OccupancyField {
    pub fn used_fraction(&self) -> f64 {
        if self.used.is_empty() {
            return 0.0;
        }
        self.used.iter().filter(|&&u| u).count() as f64 / self.used.len() as f64
    }

    /// Free room around each pixel, for sizing gap tiles.
    pub fn clearance(&self, min_half: f64) -> Clearance<'_> {
        Clearance {
            distance: &self.distance,
            width: self.width,
            height: self.height,
            min_half,
        }
    }
}

/// Local maximum of the distance along its own gradient direction.
fn is_ridge(distance: &[f64], orientation: f64, x: usize, y: usize, w: usize, h: usize) -> bool {
    let (dx, dy): (isize, isize) = if !(22.5..157.5).contains(&orientation) {
        (1, 0)
    } else if orientation < 67.5 {
        (1, 1)
    } else if orientation < 112.5 {
        (0, 1)
    } else {
        (-1, 1)
    };
    let d = distance[y * w + x];
    let at = |sx: isize, sy: isize| -> f64 {
        let nx = x as isize + sx;
        let ny = y as isize + sy;
        if nx < 0 || ny < 0 || nx >= w as isize || ny >= h as isize {
            0.0
        } else {
            distance[ny as usize * w + nx as usize]
        }
    };
    d >= at(dx, dy) && d >= at(-dx, -dy)
}

/// Build the occupancy field for `tiles` on a `width` x `height` canvas.
///
/// Gap guidelines are the level lines `d = H, H + S, H + 2S, ...` of the
/// distance to occupied space (the canvas border counts as occupied), plus
/// medial-axis ridge pixels in gaps too narrow for a level line or far
/// enough from the nearest one.
pub fn analyze_gaps(
    tiles: &[Tile],
    width: u32,
    height: u32,
    half_tile: f64,
    spacing: f64,
) -> OccupancyField {
    let w = width as usize;
    let h = height as usize;

    let mut used = vec![false; w * h];
    for tile in tiles {
        for (x, y) in pixels_inside(&tile.polygon, width, height) {
            used[y as usize * w + x as usize] = true;
        }
    }

    let to_tiles = distance_transform(&used, w, h);
    let distance: Vec<f64> = to_tiles
        .iter()
        .zip(frame_distance(w, h))
        .zip(&used)
        // pixel-centre distance overshoots the tile outline by half a pixel
        .map(|((&dt, df), &u)| if u { 0.0 } else { (dt - 0.5).max(0.0).min(df) })
        .collect();

    let orientation = gradient_orientation(&distance, w, h, (w + h) as f64);

    let mut strength = vec![0.0; w * h];
    for y in 0..h {
        for x in 0..w {
            let i = y * w + x;
            let d = distance[i];
            if d <= 0.0 {
                continue;
            }
            let level = level_line_strength(d, half_tile, spacing);
            if level > 0.0 {
                strength[i] = level;
                continue;
            }
            if d >= 0.5 * half_tile && is_ridge(&distance, orientation[i], x, y, w, h) {
                let narrow = d < half_tile - 0.5;
                let clear_of_levels = level_offset(d, half_tile, spacing).abs() >= spacing / 2.0 - 0.5;
                if narrow || clear_of_levels {
                    strength[i] = 0.5;
                }
            }
        }
    }

    OccupancyField {
        width,
        height,
        used,
        distance,
        guides: GuideField {
            width,
            height,
            strength,
            orientation,
        },
    }
}

/// Gap guidelines traced into chains, ready for the gap placement pass.
pub fn chains_into_gaps(occupancy: &OccupancyField, half_tile: f64) -> TraceResult {
    trace_chains(&occupancy.guides, 0.0, half_tile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{oriented_square, Point};
    use crate::tiles::TilePass;

    fn tile_at(x: f64, y: f64, half: f64) -> Tile {
        Tile {
            polygon: oriented_square(Point::new(x, y), half, 0.0),
            angle: 0.0,
            chain: None,
            pass: TilePass::Primary,
        }
    }

    #[test]
    fn test_empty_canvas_is_one_gap_with_concentric_guidelines() {
        let occupancy = analyze_gaps(&[], 64, 64, 4.0, 8.0);
        assert_eq!(occupancy.used_fraction(), 0.0);
        // pixel column 3 has its centre 3.5 px from the left border
        assert!(occupancy.guides.strength[32 * 64 + 3] > 0.0);
        assert_eq!(occupancy.guides.strength[32 * 64 + 4], 0.0);
        assert!(occupancy.guides.strength[32 * 64 + 11] > 0.0);

        let traced = chains_into_gaps(&occupancy, 4.0);
        assert!(!traced.chains.is_empty());
        let longest = traced.chains.iter().map(|c| c.arc_length()).fold(0.0, f64::max);
        assert!(longest > 150.0);
    }

    #[test]
    fn test_tiles_mark_used_space() {
        let tiles = vec![tile_at(16.0, 16.0, 4.0)];
        let occupancy = analyze_gaps(&tiles, 32, 32, 4.0, 8.0);
        assert!(occupancy.used[16 * 32 + 16]);
        assert_eq!(occupancy.distance[16 * 32 + 16], 0.0);
        assert!(!occupancy.used[0]);
        assert!((occupancy.used_fraction() - 64.0 / 1024.0).abs() < 1e-9);
        // no guideline runs through a tile
        assert_eq!(occupancy.guides.strength[16 * 32 + 16], 0.0);
    }

    #[test]
    fn test_distance_is_measured_to_tile_outline() {
        // tile covers [12, 20] x [12, 20]
        let tiles = vec![tile_at(16.0, 16.0, 4.0)];
        let occupancy = analyze_gaps(&tiles, 32, 32, 4.0, 8.0);
        // centre 22.5 sits 2.5 px right of the outline at x = 20
        assert!((occupancy.distance[16 * 32 + 22] - 2.5).abs() < 1e-9);
        // right next to the outline
        assert!((occupancy.distance[16 * 32 + 20] - 0.5).abs() < 1e-9);
        // the border wins when closer
        assert!((occupancy.distance[16 * 32 + 31] - 0.5).abs() < 1e-9);

        let clearance = occupancy.clearance(2.0);
        assert_eq!(clearance.min_half, 2.0);
        assert_eq!(clearance.distance.len(), 32 * 32);
    }

    #[test]
    fn test_fully_covered_canvas_has_no_guidelines() {
        let tiles = vec![tile_at(8.0, 8.0, 8.0)];
        let occupancy = analyze_gaps(&tiles, 16, 16, 2.0, 4.0);
        assert_eq!(occupancy.used_fraction(), 1.0);
        assert!(occupancy.guides.strength.iter().all(|&s| s == 0.0));
        assert!(chains_into_gaps(&occupancy, 2.0).chains.is_empty());
    }

    #[test]
    fn test_narrow_gap_gets_ridge_guideline() {
        // two tile rows leave a 6 px corridor; half_tile 4 puts no level line in it
        let mut tiles = Vec::new();
        for i in 0..8 {
            let x = 4.0 + 8.0 * i as f64;
            tiles.push(tile_at(x, 4.0, 4.0));
            tiles.push(tile_at(x, 18.0, 4.0));
        }
        let occupancy = analyze_gaps(&tiles, 64, 22, 4.0, 8.0);
        let ridge_row = 10;
        let marked = (8..56).filter(|&x| occupancy.guides.strength[ridge_row * 64 + x] > 0.0).count();
        assert!(marked > 40, "marked {marked}");
    }
}
