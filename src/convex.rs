//! Replace concave tiles with convex ones of comparable area.

use crate::geometry::{centroid, convex_hull, is_convex, polygon_area, scale_about, Point};
use crate::tiles::{Tile, TileSet};

/// Convex hull of the tile, scaled about its centroid back to the tile's
/// own area when the hull is more than `tolerance` larger.
fn convexify(tile: &Tile, tolerance: f64) -> Option<Vec<Point>> {
    let target = tile.area();
    let hull = convex_hull(&tile.polygon);
    let hull_area = polygon_area(&hull);
    if hull.len() < 3 || hull_area <= 0.0 {
        return None;
    }
    if hull_area <= target * (1.0 + tolerance) {
        return Some(hull);
    }
    let factor = (target / hull_area).sqrt();
    Some(scale_about(&hull, centroid(&hull), factor))
}

/// Convex tiles pass through unchanged; concave ones are replaced.
/// Tiles without a usable hull are kept as they are for the repair pass.
pub fn make_convex(tiles: &[Tile], tolerance: f64) -> TileSet {
    let mut replaced = 0;
    let out = tiles
        .iter()
        .map(|tile| {
            if is_convex(&tile.polygon) {
                return tile.clone();
            }
            match convexify(tile, tolerance) {
                Some(polygon) => {
                    replaced += 1;
                    tile.with_polygon(polygon)
                }
                None => tile.clone(),
            }
        })
        .collect();
    log::debug!("convexified {replaced} of {} tiles", tiles.len());
    out
}
