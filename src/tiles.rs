//! Tile placement along guideline chains.
//!
//! One placer serves both passes: the primary pass starts from an empty tile
//! set, the gap pass starts from the primary tiles and only appends.

use crate::geometry::{
    axial_difference, bounding_box, fold_angle, intersection_area, is_convex, oriented_square,
    polygon_area, Point,
};
use crate::guides::Chain;
use rand::rngs::StdRng;
use rand::Rng;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TilePass {
    Primary,
    Gap,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tile {
    pub polygon: Vec<Point>,
    /// Orientation the tile was placed with, degrees [0, 180)
    pub angle: f64,
    /// Index of the generating chain within its pass; diagnostics only
    pub chain: Option<usize>,
    pub pass: TilePass,
}

impl Tile {
    pub fn area(&self) -> f64 {
        polygon_area(&self.polygon)
    }

    /// Same metadata, new outline.
    pub fn with_polygon(&self, polygon: Vec<Point>) -> Tile {
        Tile {
            polygon,
            angle: self.angle,
            chain: self.chain,
            pass: self.pass,
        }
    }
}

/// Insertion order is paint order.
pub type TileSet = Vec<Tile>;

#[derive(Debug, Clone, Copy)]
pub struct PlacementParams {
    pub half_tile: f64,
    /// Size jitter as a fraction of `half_tile`
    pub rand_size: f64,
    /// Largest orientation change between consecutive tiles of one chain, degrees
    pub max_angle: f64,
    /// Overlap allowed as a fraction of the smaller tile's area
    pub overlap_tolerance: f64,
}

/// Free room around each canvas pixel; gap tiles are sized to fit it.
#[derive(Debug, Clone, Copy)]
pub struct Clearance<'a> {
    /// Distance to occupied space per pixel, row-major
    pub distance: &'a [f64],
    pub width: u32,
    pub height: u32,
    /// Smallest half-size worth trying; never below half a pixel
    pub min_half: f64,
}

impl Clearance<'_> {
    fn floor(&self) -> f64 {
        self.min_half.max(0.5)
    }

    fn at(&self, p: Point) -> f64 {
        if self.width == 0 || self.height == 0 {
            return 0.0;
        }
        let x = (p.x.floor().max(0.0) as usize).min(self.width as usize - 1);
        let y = (p.y.floor().max(0.0) as usize).min(self.height as usize - 1);
        self.distance.get(y * self.width as usize + x).copied().unwrap_or(0.0)
    }

    /// Half-sizes to try at `center`, largest first: the drawn size capped
    /// by the local clearance, then shrinking down to `min_half`.
    fn candidate_sizes(&self, drawn: f64, center: Point) -> Vec<f64> {
        let floor = self.floor();
        let mut half = drawn.min(self.at(center)).max(floor);
        let mut sizes = vec![half];
        loop {
            half *= 0.8;
            if half < floor {
                break;
            }
            sizes.push(half);
        }
        sizes
    }
}

/// Uniform grid over tile bounding boxes.
#[derive(Debug)]
struct TileIndex {
    cell: f64,
    buckets: HashMap<(i64, i64), Vec<usize>>,
}

impl TileIndex {
    fn new(cell: f64) -> Self {
        Self {
            cell,
            buckets: HashMap::new(),
        }
    }

    fn cells(&self, polygon: &[Point]) -> Vec<(i64, i64)> {
        let (x0, y0, x1, y1) = bounding_box(polygon);
        let (cx0, cy0) = ((x0 / self.cell).floor() as i64, (y0 / self.cell).floor() as i64);
        let (cx1, cy1) = ((x1 / self.cell).floor() as i64, (y1 / self.cell).floor() as i64);
        (cy0..=cy1)
            .flat_map(|cy| (cx0..=cx1).map(move |cx| (cx, cy)))
            .collect()
    }

    fn insert(&mut self, id: usize, polygon: &[Point]) {
        for key in self.cells(polygon) {
            self.buckets.entry(key).or_default().push(id);
        }
    }

    fn candidates(&self, polygon: &[Point]) -> Vec<usize> {
        let mut ids: Vec<usize> = self
            .cells(polygon)
            .iter()
            .filter_map(|key| self.buckets.get(key))
            .flatten()
            .copied()
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

fn overlaps_too_much(candidate: &[Point], tiles: &[Tile], index: &TileIndex, tolerance: f64) -> bool {
    let candidate_area = polygon_area(candidate);
    let candidate_convex = is_convex(candidate);
    index.candidates(candidate).into_iter().any(|id| {
        let other = &tiles[id].polygon;
        let overlap = if candidate_convex {
            intersection_area(other, candidate)
        } else {
            intersection_area(candidate, other)
        };
        overlap > tolerance * candidate_area.min(polygon_area(other))
    })
}

/// Arc-length parametrisation of a chain.
struct ChainWalk<'a> {
    chain: &'a Chain,
    cumulative: Vec<f64>,
}

impl<'a> ChainWalk<'a> {
    fn new(chain: &'a Chain) -> Self {
        let mut cumulative = Vec::with_capacity(chain.points.len());
        let mut total = 0.0;
        cumulative.push(0.0);
        for pair in chain.points.windows(2) {
            total += pair[0].distance(&pair[1]);
            cumulative.push(total);
        }
        Self { chain, cumulative }
    }

    fn length(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Point and local orientation at arc length `s`.
    fn sample(&self, s: f64) -> (Point, f64) {
        let k = self.cumulative.partition_point(|&c| c <= s).clamp(1, self.cumulative.len() - 1);
        let (s0, s1) = (self.cumulative[k - 1], self.cumulative[k]);
        let t = if s1 > s0 { ((s - s0) / (s1 - s0)).clamp(0.0, 1.0) } else { 0.0 };
        let p = self.chain.points[k - 1].lerp(&self.chain.points[k], t);
        let angle = if t < 0.5 { self.chain.angles[k - 1] } else { self.chain.angles[k] };
        (p, angle)
    }
}

fn draw_half_size(params: &PlacementParams, rng: &mut StdRng) -> f64 {
    let jitter = params.rand_size;
    if jitter > 0.0 {
        params.half_tile * (1.0 + rng.gen_range(-jitter..=jitter))
    } else {
        params.half_tile
    }
}

/// Orientation for the next tile: a square at θ is the same shape as one at
/// θ + 90°, so take the representative closest to the previous tile and clamp
/// what remains to `max_angle`.
fn smooth_orientation(local: f64, previous: Option<f64>, max_angle: f64) -> f64 {
    let Some(prev) = previous else {
        return fold_angle(local);
    };
    let mut delta = axial_difference(local, prev);
    if delta > 45.0 {
        delta -= 90.0;
    } else if delta <= -45.0 {
        delta += 90.0;
    }
    fold_angle(prev + delta.clamp(-max_angle, max_angle))
}

/// Place tiles along `chains`, appending to `existing`.
///
/// Tiles are squares with half-size drawn from
/// `[H(1-rand_size), H(1+rand_size)]`; consecutive centres sit `s_prev + s_next`
/// apart along the chain so neighbours abut. A candidate overlapping any
/// placed tile by more than the tolerance is silently skipped.
pub fn place_tiles_along_chains(
    existing: TileSet,
    chains: &[Chain],
    params: &PlacementParams,
    pass: TilePass,
    rng: &mut StdRng,
) -> TileSet {
    place(existing, chains, params, pass, None, rng)
}

/// Gap pass: like [`place_tiles_along_chains`], but each candidate is first
/// capped to the clearance at its centre and, when it still collides, retried
/// smaller. After a miss the walk advances by `min_half` only.
pub fn fill_gaps_along_chains(
    existing: TileSet,
    chains: &[Chain],
    params: &PlacementParams,
    clearance: &Clearance,
    rng: &mut StdRng,
) -> TileSet {
    place(existing, chains, params, TilePass::Gap, Some(clearance), rng)
}

fn place(
    existing: TileSet,
    chains: &[Chain],
    params: &PlacementParams,
    pass: TilePass,
    clearance: Option<&Clearance>,
    rng: &mut StdRng,
) -> TileSet {
    let mut tiles = existing;
    let mut index = TileIndex::new(4.0 * params.half_tile);
    for (id, tile) in tiles.iter().enumerate() {
        index.insert(id, &tile.polygon);
    }
    let before = tiles.len();
    let mut rejected = 0usize;

    for (chain_id, chain) in chains.iter().enumerate() {
        if chain.points.len() < 2 {
            continue;
        }
        let walk = ChainWalk::new(chain);
        let length = walk.length();
        let mut previous_angle: Option<f64> = None;
        let mut size = draw_half_size(params, rng);
        let mut s = size;

        while s <= length + 1e-9 {
            let (center, local) = walk.sample(s);
            let angle = smooth_orientation(local, previous_angle, params.max_angle);
            let sizes = clearance.map_or_else(|| vec![size], |c| c.candidate_sizes(size, center));
            let fitted = sizes
                .into_iter()
                .map(|half| (half, oriented_square(center, half, angle)))
                .find(|(_, polygon)| {
                    !overlaps_too_much(polygon, &tiles, &index, params.overlap_tolerance)
                });

            let next = draw_half_size(params, rng);
            match fitted {
                Some((half, polygon)) => {
                    index.insert(tiles.len(), &polygon);
                    tiles.push(Tile {
                        polygon,
                        angle,
                        chain: Some(chain_id),
                        pass,
                    });
                    previous_angle = Some(angle);
                    s += half + next;
                }
                None => {
                    rejected += 1;
                    s += clearance.map_or(size + next, |c| c.floor());
                }
            }
            size = next;
        }
    }

    log::debug!(
        "{:?} pass placed {} tiles on {} chains, rejected {} overlapping",
        pass,
        tiles.len() - before,
        chains.len(),
        rejected
    );
    tiles
}
