//! Guideline tracing.
//!
//! A guideline field is any scalar strength map with an orientation per
//! pixel: the raw edge map, the offset lines around the edges, or the gap
//! field built from already placed tiles. The same tracer walks all of them.

use crate::distance::{distance_transform, gradient_orientation, level_line_strength};
use crate::edge_detector::EdgeMap;
use crate::geometry::{mean_axial_angle, Point};
use serde::Serialize;

/// Neighbour order used when strength and direction both tie: E, SE, S, SW, W, NW, N, NE.
const NEIGHBORS: [(isize, isize); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

const STRENGTH_TIE: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct GuideField {
    pub width: u32,
    pub height: u32,
    pub strength: Vec<f64>,
    /// Degrees, [0, 180)
    pub orientation: Vec<f64>,
}

impl GuideField {
    pub fn from_edges(edges: &EdgeMap) -> Self {
        Self {
            width: edges.width,
            height: edges.height,
            strength: edges.strength.clone(),
            orientation: edges.orientation.clone(),
        }
    }
}

/// A traced guideline.
#[derive(Debug, Clone, Serialize)]
pub struct Chain {
    pub points: Vec<Point>,
    /// Smoothed local orientation per point, degrees [0, 180)
    pub angles: Vec<f64>,
    /// Dominant orientation of the whole chain, degrees [0, 180)
    pub angle: f64,
}

impl Chain {
    pub fn arc_length(&self) -> f64 {
        self.points.windows(2).map(|p| p[0].distance(&p[1])).sum()
    }
}

/// Chains plus the number of traced chains that were too short to keep.
#[derive(Debug, Clone, Default)]
pub struct TraceResult {
    pub chains: Vec<Chain>,
    pub discarded: usize,
}

/// Primary guidelines derived from an edge map.
#[derive(Debug, Clone)]
pub struct EdgeGuides {
    /// Distance to the nearest edge pixel, only for offset guidelines
    pub distances: Option<Vec<f64>>,
    pub field: GuideField,
    /// Tracing threshold that goes with `field`
    pub threshold: f64,
}

/// Build the primary guideline field.
///
/// With `offset` the guidelines run parallel to the edges at distances
/// `H, 3H, 5H, ...` so the first row of tiles borders the edge instead of
/// straddling it. Otherwise the edge pixels themselves are the guidelines.
pub fn edge_guidelines(edges: &EdgeMap, half_tile: f64, threshold: f64, offset: bool) -> EdgeGuides {
    if !offset {
        return EdgeGuides {
            distances: None,
            field: GuideField::from_edges(edges),
            threshold,
        };
    }

    let w = edges.width as usize;
    let h = edges.height as usize;
    let sources: Vec<bool> = edges
        .strength
        .iter()
        .map(|&s| s > 0.0 && s >= threshold)
        .collect();
    let distances = distance_transform(&sources, w, h);
    let strength: Vec<f64> = distances
        .iter()
        .map(|&d| level_line_strength(d, half_tile, 2.0 * half_tile))
        .collect();
    let orientation = gradient_orientation(&distances, w, h, (w + h) as f64);

    EdgeGuides {
        distances: Some(distances),
        field: GuideField {
            width: edges.width,
            height: edges.height,
            strength,
            orientation,
        },
        threshold: 0.0,
    }
}

fn pixel_center(i: usize, w: usize) -> Point {
    Point::new((i % w) as f64 + 0.5, (i / w) as f64 + 0.5)
}

fn direction_deviation(a: (isize, isize), b: (isize, isize)) -> f64 {
    let aa = (a.1 as f64).atan2(a.0 as f64);
    let bb = (b.1 as f64).atan2(b.0 as f64);
    let d = (aa - bb).abs() % std::f64::consts::TAU;
    d.min(std::f64::consts::TAU - d)
}

/// Greedy extension from `start`: always step to the strongest unvisited
/// neighbour above `threshold`. Equal strengths go to the neighbour closest
/// to the current direction, then to the first in `NEIGHBORS` order.
fn extend(
    field: &GuideField,
    threshold: f64,
    visited: &mut [bool],
    start: usize,
    mut direction: Option<(isize, isize)>,
) -> Vec<usize> {
    let w = field.width as isize;
    let h = field.height as isize;
    let mut path = Vec::new();
    let mut current = start;

    loop {
        let cx = (current % field.width as usize) as isize;
        let cy = (current / field.width as usize) as isize;
        let mut best: Option<(usize, (isize, isize), f64, f64)> = None;

        for &step in &NEIGHBORS {
            let nx = cx + step.0;
            let ny = cy + step.1;
            if nx < 0 || ny < 0 || nx >= w || ny >= h {
                continue;
            }
            let ni = (ny * w + nx) as usize;
            let s = field.strength[ni];
            if visited[ni] || s <= threshold {
                continue;
            }
            let deviation = direction.map_or(0.0, |d| direction_deviation(d, step));
            let better = match best {
                None => true,
                Some((_, _, bs, bd)) => {
                    s > bs + STRENGTH_TIE || ((s - bs).abs() <= STRENGTH_TIE && deviation < bd - 1e-12)
                }
            };
            if better {
                best = Some((ni, step, s, deviation));
            }
        }

        match best {
            Some((ni, step, _, _)) => {
                visited[ni] = true;
                path.push(ni);
                direction = Some(step);
                current = ni;
            }
            None => break,
        }
    }

    path
}

/// Trace every usable pixel of `field` into chains.
///
/// Seeds are taken strongest first (ties by raster order); each pixel joins
/// at most one chain. Chains shorter than one tile diameter (`2 * half_tile`)
/// are counted in `discarded` and dropped.
pub fn trace_chains(field: &GuideField, threshold: f64, half_tile: f64) -> TraceResult {
    let w = field.width as usize;
    let total = w * field.height as usize;
    let mut seeds: Vec<usize> = (0..total).filter(|&i| field.strength[i] > threshold).collect();
    seeds.sort_by(|&a, &b| field.strength[b].total_cmp(&field.strength[a]).then(a.cmp(&b)));

    let mut visited = vec![false; total];
    let mut result = TraceResult::default();
    let window = ((half_tile / 2.0).round() as usize).max(1);

    for seed in seeds {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;

        let forward = extend(field, threshold, &mut visited, seed, None);
        let back_direction = forward.first().map(|&first| {
            let dx = (first % w) as isize - (seed % w) as isize;
            let dy = (first / w) as isize - (seed / w) as isize;
            (-dx, -dy)
        });
        let backward = extend(field, threshold, &mut visited, seed, back_direction);

        let pixels: Vec<usize> = backward
            .into_iter()
            .rev()
            .chain(std::iter::once(seed))
            .chain(forward)
            .collect();
        if pixels.len() < 2 {
            result.discarded += 1;
            continue;
        }

        let points: Vec<Point> = pixels.iter().map(|&i| pixel_center(i, w)).collect();
        let raw: Vec<f64> = pixels.iter().map(|&i| field.orientation[i]).collect();
        let angle = mean_axial_angle(raw.iter().copied()).unwrap_or(raw[0]);
        let angles: Vec<f64> = (0..raw.len())
            .map(|k| {
                let lo = k.saturating_sub(window);
                let hi = (k + window + 1).min(raw.len());
                mean_axial_angle(raw[lo..hi].iter().copied()).unwrap_or(angle)
            })
            .collect();

        let chain = Chain { points, angles, angle };
        if chain.arc_length() < 2.0 * half_tile {
            result.discarded += 1;
            continue;
        }
        result.chains.push(chain);
    }

    log::debug!(
        "traced {} chains, discarded {} short ones",
        result.chains.len(),
        result.discarded
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_from(width: u32, height: u32, on: &[(u32, u32)], orientation: f64) -> GuideField {
        let n = (width * height) as usize;
        let mut strength = vec![0.0; n];
        for &(x, y) in on {
            strength[(y * width + x) as usize] = 1.0;
        }
        GuideField {
            width,
            height,
            strength,
            orientation: vec![orientation; n],
        }
    }

    #[test]
    fn test_empty_field_gives_no_chains() {
        let field = field_from(20, 20, &[], 0.0);
        let result = trace_chains(&field, 0.1, 2.0);
        assert!(result.chains.is_empty());
        assert_eq!(result.discarded, 0);
    }

    #[test]
    fn test_horizontal_line_is_one_ordered_chain() {
        let on: Vec<(u32, u32)> = (2..18).map(|x| (x, 5)).collect();
        let field = field_from(20, 10, &on, 90.0);
        let result = trace_chains(&field, 0.1, 2.0);
        assert_eq!(result.chains.len(), 1);
        let chain = &result.chains[0];
        assert_eq!(chain.points.len(), 16);
        for pair in chain.points.windows(2) {
            assert!((pair[0].distance(&pair[1]) - 1.0).abs() < 1e-9);
        }
        assert!((chain.arc_length() - 15.0).abs() < 1e-9);
        assert!((chain.angle - 90.0).abs() < 1e-9);
        assert!(chain.angles.iter().all(|a| (a - 90.0).abs() < 1e-9));
    }

    #[test]
    fn test_seed_in_middle_extends_both_ways() {
        let on: Vec<(u32, u32)> = (0..12).map(|x| (x, 3)).collect();
        let mut field = field_from(12, 6, &on, 0.0);
        // strongest pixel in the middle becomes the seed
        field.strength[3 * 12 + 6] = 2.0;
        let result = trace_chains(&field, 0.1, 2.0);
        assert_eq!(result.chains.len(), 1);
        let xs: Vec<f64> = result.chains[0].points.iter().map(|p| p.x).collect();
        assert_eq!(xs.len(), 12);
        let ascending = xs.windows(2).all(|p| p[1] > p[0]);
        let descending = xs.windows(2).all(|p| p[1] < p[0]);
        assert!(ascending || descending);
    }

    #[test]
    fn test_pixels_are_not_shared() {
        // a cross: two lines meeting in one pixel
        let mut on: Vec<(u32, u32)> = (0..15).map(|x| (x, 7)).collect();
        on.extend((0..15).filter(|&y| y != 7).map(|y| (7, y)));
        let field = field_from(15, 15, &on, 0.0);
        let result = trace_chains(&field, 0.1, 1.0);
        let total: usize = result.chains.iter().map(|c| c.points.len()).sum();
        assert_eq!(total, on.len());
        assert_eq!(result.discarded, 0);
    }

    #[test]
    fn test_short_chains_discarded() {
        let field = field_from(20, 20, &[(3, 3), (4, 3), (5, 3)], 0.0);
        let result = trace_chains(&field, 0.1, 4.0);
        assert!(result.chains.is_empty());
        assert_eq!(result.discarded, 1);
    }

    #[test]
    fn test_tie_break_prefers_straight_continuation() {
        // a line going east that forks at x=6 into east and south-east
        let mut on: Vec<(u32, u32)> = (0..12).map(|x| (x, 2)).collect();
        on.extend([(7, 3), (8, 4)]);
        let field = field_from(12, 6, &on, 0.0);
        let result = trace_chains(&field, 0.1, 1.0);
        let longest = result
            .chains
            .iter()
            .max_by_key(|c| c.points.len())
            .unwrap();
        let straight = longest.points.iter().filter(|p| p.y == 2.5).count();
        assert_eq!(straight, 12);
    }

    #[test]
    fn test_offset_guidelines_parallel_to_edge() {
        let mut edges = EdgeMap::blank(40, 40);
        for y in 0..40 {
            edges.strength[y * 40 + 20] = 1.0;
        }
        let guides = edge_guidelines(&edges, 4.0, 0.2, true);
        let distances = guides.distances.as_ref().unwrap();
        assert_eq!(distances[10 * 40 + 20], 0.0);
        // columns 16 and 24 sit 4 px away from the edge
        assert!(guides.field.strength[10 * 40 + 16] > 0.0);
        assert!(guides.field.strength[10 * 40 + 24] > 0.0);
        assert_eq!(guides.field.strength[10 * 40 + 20], 0.0);
        assert!(guides.field.orientation[10 * 40 + 16].abs() < 1e-9);

        let result = trace_chains(&guides.field, guides.threshold, 4.0);
        assert!(result.chains.len() >= 2);
        for chain in &result.chains {
            let x0 = chain.points[0].x;
            assert!(chain.points.iter().all(|p| (p.x - x0).abs() < 1e-9));
        }
    }

    #[test]
    fn test_plain_guidelines_reuse_edge_map() {
        let mut edges = EdgeMap::blank(10, 10);
        edges.strength[55] = 0.7;
        let guides = edge_guidelines(&edges, 2.0, 0.3, false);
        assert!(guides.distances.is_none());
        assert_eq!(guides.field.strength[55], 0.7);
        assert_eq!(guides.threshold, 0.3);
    }
}
