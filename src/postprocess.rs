//! Final polygon clean-up: shrink, repair, reduce, drop small.
//!
//! The passes always run in that order and each can be switched off. Later
//! passes expect the simple, positively wound rings the repair pass produces.

use crate::config::MosaicOptions;
use crate::error::GeometryWarning;
use crate::geometry::{
    centroid, convex_hull, dedup_ring, is_simple, polygon_area, remove_collinear, scale_about,
    signed_area, Point,
};
use crate::tiles::{Tile, TileSet};

const DEDUP_TOLERANCE: f64 = 1e-6;
const MIN_RING_AREA: f64 = 1e-9;

#[derive(Debug, Clone, Copy)]
pub struct PostProcessOptions {
    pub shrink: bool,
    pub repair: bool,
    pub reduce: bool,
    pub drop_small: bool,
    /// Inward offset per tile, px
    pub grout: f64,
    pub half_tile: f64,
    pub max_vertices: usize,
    /// Absolute area threshold for the drop pass
    pub min_area: f64,
}

impl PostProcessOptions {
    pub fn from_options(options: &MosaicOptions) -> Self {
        Self {
            shrink: options.shrink,
            repair: options.repair,
            reduce: options.reduce,
            drop_small: options.drop_small,
            grout: options.grout,
            half_tile: options.half_tile,
            max_vertices: options.max_vertices,
            min_area: options.min_area_fraction * options.reference_area(),
        }
    }
}

/// Scale every tile towards its centroid so neighbours are separated by
/// roughly `grout` pixels. The factor never drops below one half.
pub fn shrink_tiles(tiles: &[Tile], grout: f64) -> TileSet {
    tiles
        .iter()
        .map(|tile| {
            let r = tile.area().sqrt() / 2.0;
            if r <= 0.0 {
                return tile.clone();
            }
            let factor = ((r - grout) / r).clamp(0.5, 1.0);
            tile.with_polygon(scale_about(&tile.polygon, centroid(&tile.polygon), factor))
        })
        .collect()
}

fn repair_ring(points: &[Point]) -> Option<Vec<Point>> {
    let mut ring = remove_collinear(&dedup_ring(points, DEDUP_TOLERANCE));
    if ring.len() < 3 {
        return None;
    }
    if !is_simple(&ring) {
        ring = convex_hull(&ring);
        if ring.len() < 3 {
            return None;
        }
    }
    if signed_area(&ring) < 0.0 {
        ring.reverse();
    }
    (polygon_area(&ring) > MIN_RING_AREA).then_some(ring)
}

/// Make every ring simple with positive winding. Tiles that collapse to a
/// line or a point are dropped with a warning naming their input index.
pub fn repair_tiles(tiles: &[Tile]) -> (TileSet, Vec<GeometryWarning>) {
    let mut repaired = Vec::with_capacity(tiles.len());
    let mut warnings = Vec::new();
    for (index, tile) in tiles.iter().enumerate() {
        match repair_ring(&tile.polygon) {
            Some(ring) => repaired.push(tile.with_polygon(ring)),
            None => warnings.push(GeometryWarning::TileUnrepairable { index }.emit()),
        }
    }
    (repaired, warnings)
}

fn triangle_area(a: &Point, b: &Point, c: &Point) -> f64 {
    ((b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y)).abs() / 2.0
}

fn effective_area(ring: &[Point], i: usize) -> f64 {
    let n = ring.len();
    triangle_area(&ring[(i + n - 1) % n], &ring[i], &ring[(i + 1) % n])
}

/// Visvalingam-Whyatt on a closed ring.
///
/// Repeatedly removes the vertex whose triangle with its neighbours is
/// smallest, while that area is below `(H/4)^2`, or the ring still has more
/// than `max_vertices` and the area is below `H^2`. Removals that would
/// make the ring self-intersect are skipped. Never goes below 3 vertices.
pub fn reduce_ring(points: &[Point], half_tile: f64, max_vertices: usize) -> Vec<Point> {
    let fine = (half_tile / 4.0).powi(2);
    let coarse = half_tile * half_tile;
    let mut ring = points.to_vec();

    while ring.len() > 3 {
        let mut order: Vec<(usize, f64)> = (0..ring.len()).map(|i| (i, effective_area(&ring, i))).collect();
        order.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

        let limit = if ring.len() > max_vertices { coarse } else { fine };
        let removal = order
            .iter()
            .take_while(|&&(_, area)| area < limit)
            .find_map(|&(i, _)| {
                let mut candidate = ring.clone();
                candidate.remove(i);
                is_simple(&candidate).then_some(candidate)
            });

        match removal {
            Some(candidate) => ring = candidate,
            None => break,
        }
    }
    ring
}

pub fn reduce_edge_count(tiles: &[Tile], half_tile: f64, max_vertices: usize) -> TileSet {
    tiles
        .iter()
        .map(|tile| tile.with_polygon(reduce_ring(&tile.polygon, half_tile, max_vertices)))
        .collect()
}

pub fn drop_small_tiles(tiles: &[Tile], min_area: f64) -> TileSet {
    tiles.iter().filter(|tile| tile.area() >= min_area).cloned().collect()
}

/// Run the enabled passes in their fixed order.
pub fn postprocess(tiles: &[Tile], options: &PostProcessOptions) -> (TileSet, Vec<GeometryWarning>) {
    let mut current: TileSet = tiles.to_vec();
    let mut warnings = Vec::new();

    if options.shrink {
        current = shrink_tiles(&current, options.grout);
    }
    if options.repair {
        let (repaired, repair_warnings) = repair_tiles(&current);
        current = repaired;
        warnings.extend(repair_warnings);
    }
    if options.reduce {
        current = reduce_edge_count(&current, options.half_tile, options.max_vertices);
    }
    if options.drop_small {
        let before = current.len();
        current = drop_small_tiles(&current, options.min_area);
        log::debug!("dropped {} small tiles", before - current.len());
    }

    (current, warnings)
}
