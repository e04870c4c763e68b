//! Exact Euclidean distance transform and distance-field helpers.
//!
//! Felzenszwalb & Huttenlocher's separable lower-envelope algorithm: one 1-D
//! pass over every row, then one over every column of the row result.

use crate::geometry::fold_angle;

const FAR: f64 = 1e20;

fn edt_1d(f: &[f64], d: &mut [f64], v: &mut [usize], z: &mut [f64]) {
    let n = f.len();
    if n == 0 {
        return;
    }
    let mut k = 0usize;
    v[0] = 0;
    z[0] = f64::NEG_INFINITY;
    z[1] = f64::INFINITY;

    let parabola_cross = |q: usize, p: usize| -> f64 {
        let (qf, pf) = (q as f64, p as f64);
        ((f[q] + qf * qf) - (f[p] + pf * pf)) / (2.0 * qf - 2.0 * pf)
    };

    for q in 1..n {
        let mut s = parabola_cross(q, v[k]);
        while s <= z[k] {
            k -= 1;
            s = parabola_cross(q, v[k]);
        }
        k += 1;
        v[k] = q;
        z[k] = s;
        z[k + 1] = f64::INFINITY;
    }

    k = 0;
    for (q, out) in d.iter_mut().enumerate() {
        while z[k + 1] < q as f64 {
            k += 1;
        }
        let dq = q as f64 - v[k] as f64;
        *out = dq * dq + f[v[k]];
    }
}

/// Distance from every pixel centre to the nearest `source` pixel centre.
/// Without any source pixel every distance is `f64::INFINITY`.
pub fn distance_transform(sources: &[bool], width: usize, height: usize) -> Vec<f64> {
    let total = width * height;
    if total == 0 {
        return Vec::new();
    }
    if !sources.iter().any(|&s| s) {
        return vec![f64::INFINITY; total];
    }

    let longest = width.max(height);
    let mut f = vec![0.0; longest];
    let mut d = vec![0.0; longest];
    let mut v = vec![0usize; longest];
    let mut z = vec![0.0; longest + 1];

    let mut grid: Vec<f64> = sources.iter().map(|&s| if s { 0.0 } else { FAR }).collect();

    for x in 0..width {
        for y in 0..height {
            f[y] = grid[y * width + x];
        }
        edt_1d(&f[..height], &mut d[..height], &mut v, &mut z);
        for y in 0..height {
            grid[y * width + x] = d[y];
        }
    }

    for y in 0..height {
        let row = &mut grid[y * width..(y + 1) * width];
        f[..width].copy_from_slice(row);
        edt_1d(&f[..width], &mut d[..width], &mut v, &mut z);
        row.copy_from_slice(&d[..width]);
    }

    grid.into_iter()
        .map(|sq| if sq >= FAR * 0.5 { f64::INFINITY } else { sq.sqrt() })
        .collect()
}

/// Distance from each pixel centre to the canvas border.
pub fn frame_distance(width: usize, height: usize) -> Vec<f64> {
    let (w, h) = (width as f64, height as f64);
    let mut out = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let (cx, cy) = (x as f64 + 0.5, y as f64 + 0.5);
            out.push(cx.min(w - cx).min(cy).min(h - cy));
        }
    }
    out
}

/// Orientation of the distance gradient in degrees, [0, 180).
///
/// Central differences are averaged over a 3x3 window in doubled-angle form
/// (a structure tensor), so opposite gradients on both sides of a ridge agree.
/// Infinite distances are capped at `cap` before differencing.
pub fn gradient_orientation(field: &[f64], width: usize, height: usize, cap: f64) -> Vec<f64> {
    let at = |x: isize, y: isize| -> f64 {
        let xc = x.clamp(0, width as isize - 1) as usize;
        let yc = y.clamp(0, height as isize - 1) as usize;
        field[yc * width + xc].min(cap)
    };

    let mut jxx = vec![0.0; width * height];
    let mut jyy = vec![0.0; width * height];
    let mut jxy = vec![0.0; width * height];
    for y in 0..height as isize {
        for x in 0..width as isize {
            let gx = (at(x + 1, y) - at(x - 1, y)) / 2.0;
            let gy = (at(x, y + 1) - at(x, y - 1)) / 2.0;
            let i = y as usize * width + x as usize;
            jxx[i] = gx * gx;
            jyy[i] = gy * gy;
            jxy[i] = gx * gy;
        }
    }

    let mut out = vec![0.0; width * height];
    for y in 0..height as isize {
        for x in 0..width as isize {
            let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let (nx, ny) = (x + dx, y + dy);
                    if nx < 0 || ny < 0 || nx >= width as isize || ny >= height as isize {
                        continue;
                    }
                    let j = ny as usize * width + nx as usize;
                    sxx += jxx[j];
                    syy += jyy[j];
                    sxy += jxy[j];
                }
            }
            let angle = 0.5 * (2.0 * sxy).atan2(sxx - syy);
            out[y as usize * width + x as usize] = fold_angle(angle.to_degrees());
        }
    }
    out
}

/// Strength of membership in the family of level lines
/// `d = first, first + spacing, ...`.
///
/// A pixel belongs to the nearest level when its signed offset lies in
/// `[-0.5, 0.5)`, which keeps every line one pixel wide.
pub fn level_line_strength(d: f64, first: f64, spacing: f64) -> f64 {
    if !d.is_finite() || d < first - 0.5 {
        return 0.0;
    }
    let off = level_offset(d, first, spacing);
    if (-0.5..0.5).contains(&off) { 1.0 - off.abs() } else { 0.0 }
}

/// Signed offset from the nearest level line.
pub fn level_offset(d: f64, first: f64, spacing: f64) -> f64 {
    let r = (d - first) / spacing;
    (r - r.round()) * spacing
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_transform_single_source() {
        let mut sources = vec![false; 25];
        sources[2 * 5 + 2] = true;
        let d = distance_transform(&sources, 5, 5);
        assert_eq!(d[2 * 5 + 2], 0.0);
        assert!((d[2 * 5 + 4] - 2.0).abs() < 1e-9);
        assert!((d[0] - 8f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_distance_transform_matches_brute_force() {
        let (w, h) = (9, 7);
        let mut sources = vec![false; w * h];
        for &(x, y) in &[(1usize, 1usize), (7, 2), (4, 6)] {
            sources[y * w + x] = true;
        }
        let d = distance_transform(&sources, w, h);
        for y in 0..h {
            for x in 0..w {
                let brute = [(1.0, 1.0), (7.0, 2.0), (4.0, 6.0)]
                    .iter()
                    .map(|&(sx, sy): &(f64, f64)| ((x as f64 - sx).powi(2) + (y as f64 - sy).powi(2)).sqrt())
                    .fold(f64::INFINITY, f64::min);
                assert!((d[y * w + x] - brute).abs() < 1e-9, "pixel ({x},{y})");
            }
        }
    }

    #[test]
    fn test_distance_transform_without_sources() {
        let d = distance_transform(&[false; 12], 4, 3);
        assert!(d.iter().all(|v| v.is_infinite()));
    }

    #[test]
    fn test_frame_distance() {
        let d = frame_distance(6, 4);
        assert_eq!(d[0], 0.5);
        assert_eq!(d[1 * 6 + 2], 1.5);
        assert_eq!(d[3 * 6 + 5], 0.5);
    }

    #[test]
    fn test_gradient_orientation_of_ramp() {
        let (w, h) = (8, 8);
        let field: Vec<f64> = (0..w * h).map(|i| (i % w) as f64).collect();
        let o = gradient_orientation(&field, w, h, 100.0);
        assert!(o[4 * w + 4].abs() < 1e-9);

        let field: Vec<f64> = (0..w * h).map(|i| (i / w) as f64).collect();
        let o = gradient_orientation(&field, w, h, 100.0);
        assert!((o[4 * w + 4] - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_level_line_strength() {
        // levels at 4, 12, 20 ...
        assert_eq!(level_line_strength(3.0, 4.0, 8.0), 0.0);
        assert_eq!(level_line_strength(3.5, 4.0, 8.0), 0.5);
        assert_eq!(level_line_strength(4.0, 4.0, 8.0), 1.0);
        assert_eq!(level_line_strength(4.5, 4.0, 8.0), 0.0);
        assert_eq!(level_line_strength(8.0, 4.0, 8.0), 0.0);
        assert_eq!(level_line_strength(11.5, 4.0, 8.0), 0.5);
        assert_eq!(level_line_strength(f64::INFINITY, 4.0, 8.0), 0.0);
    }
}
