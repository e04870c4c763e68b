//! Planar geometry shared by every pipeline stage.
//!
//! Polygons are plain vertex rings (`&[Point]`, implicitly closed). Canvas
//! coordinates put pixel `(x, y)` at the square `[x, x+1] x [y, y+1]`.
//! "Positive" winding means a positive shoelace area.

use serde::Serialize;

const EPS: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn lerp(&self, other: &Point, t: f64) -> Point {
        Point::new(self.x + (other.x - self.x) * t, self.y + (other.y - self.y) * t)
    }
}

#[inline]
fn cross(o: &Point, a: &Point, b: &Point) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Shoelace area, sign encodes winding.
pub fn signed_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    for i in 0..points.len() {
        let j = (i + 1) % points.len();
        area += points[i].x * points[j].y;
        area -= points[j].x * points[i].y;
    }
    area / 2.0
}

pub fn polygon_area(points: &[Point]) -> f64 {
    signed_area(points).abs()
}

/// Area centroid; falls back to the vertex mean for degenerate rings.
pub fn centroid(points: &[Point]) -> Point {
    if points.is_empty() {
        return Point::new(0.0, 0.0);
    }
    let a = signed_area(points);
    if a.abs() < EPS {
        let n = points.len() as f64;
        let sum_x: f64 = points.iter().map(|p| p.x).sum();
        let sum_y: f64 = points.iter().map(|p| p.y).sum();
        return Point::new(sum_x / n, sum_y / n);
    }
    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..points.len() {
        let p = &points[i];
        let q = &points[(i + 1) % points.len()];
        let f = p.x * q.y - q.x * p.y;
        cx += (p.x + q.x) * f;
        cy += (p.y + q.y) * f;
    }
    Point::new(cx / (6.0 * a), cy / (6.0 * a))
}

/// (min_x, min_y, max_x, max_y)
pub fn bounding_box(points: &[Point]) -> (f64, f64, f64, f64) {
    points.iter().fold(
        (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        |(x0, y0, x1, y1), p| (x0.min(p.x), y0.min(p.y), x1.max(p.x), y1.max(p.y)),
    )
}

/// Square of half-size `half` centred on `center`, rotated by `angle_deg`,
/// with positive winding.
pub fn oriented_square(center: Point, half: f64, angle_deg: f64) -> Vec<Point> {
    let (s, c) = angle_deg.to_radians().sin_cos();
    [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)]
        .iter()
        .map(|&(u, v)| {
            let dx = u * half;
            let dy = v * half;
            Point::new(center.x + dx * c - dy * s, center.y + dx * s + dy * c)
        })
        .collect()
}

pub fn scale_about(points: &[Point], center: Point, factor: f64) -> Vec<Point> {
    points
        .iter()
        .map(|p| Point::new(center.x + (p.x - center.x) * factor, center.y + (p.y - center.y) * factor))
        .collect()
}

/// True when every turn has the same sign; collinear vertices are ignored.
pub fn is_convex(points: &[Point]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut sign = 0.0;
    for i in 0..n {
        let turn = cross(&points[i], &points[(i + 1) % n], &points[(i + 2) % n]);
        if turn.abs() < EPS {
            continue;
        }
        if sign == 0.0 {
            sign = turn.signum();
        } else if turn.signum() != sign {
            return false;
        }
    }
    sign != 0.0 && is_simple(points)
}

fn on_segment(p: &Point, q: &Point, r: &Point) -> bool {
    q.x <= p.x.max(r.x) + EPS
        && q.x + EPS >= p.x.min(r.x)
        && q.y <= p.y.max(r.y) + EPS
        && q.y + EPS >= p.y.min(r.y)
}

/// Closed-segment intersection test, touching counts.
pub fn segments_intersect(p1: &Point, p2: &Point, q1: &Point, q2: &Point) -> bool {
    let d1 = cross(q1, q2, p1);
    let d2 = cross(q1, q2, p2);
    let d3 = cross(p1, p2, q1);
    let d4 = cross(p1, p2, q2);

    if ((d1 > EPS && d2 < -EPS) || (d1 < -EPS && d2 > EPS))
        && ((d3 > EPS && d4 < -EPS) || (d3 < -EPS && d4 > EPS))
    {
        return true;
    }
    (d1.abs() <= EPS && on_segment(q1, p1, q2))
        || (d2.abs() <= EPS && on_segment(q1, p2, q2))
        || (d3.abs() <= EPS && on_segment(p1, q1, p2))
        || (d4.abs() <= EPS && on_segment(p1, q2, p2))
}

/// A ring is simple when no two non-adjacent edges meet.
pub fn is_simple(points: &[Point]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    for i in 0..n {
        let a1 = &points[i];
        let a2 = &points[(i + 1) % n];
        for j in (i + 1)..n {
            // adjacent edges share a vertex by construction
            if j == i + 1 || (i == 0 && j == n - 1) {
                continue;
            }
            let b1 = &points[j];
            let b2 = &points[(j + 1) % n];
            if segments_intersect(a1, a2, b1, b2) {
                return false;
            }
        }
    }
    true
}

/// Andrew's monotone chain; positive winding, collinear points removed.
pub fn convex_hull(points: &[Point]) -> Vec<Point> {
    let mut pts: Vec<Point> = points.to_vec();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup_by(|a, b| (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS);
    if pts.len() < 3 {
        return pts;
    }

    let mut lower: Vec<Point> = Vec::with_capacity(pts.len());
    for p in &pts {
        while lower.len() >= 2 && cross(&lower[lower.len() - 2], &lower[lower.len() - 1], p) <= EPS {
            lower.pop();
        }
        lower.push(*p);
    }
    let mut upper: Vec<Point> = Vec::with_capacity(pts.len());
    for p in pts.iter().rev() {
        while upper.len() >= 2 && cross(&upper[upper.len() - 2], &upper[upper.len() - 1], p) <= EPS {
            upper.pop();
        }
        upper.push(*p);
    }
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Sutherland-Hodgman: clip `subject` (any ring) by a convex `clip` ring.
pub fn clip_polygon(subject: &[Point], clip: &[Point]) -> Vec<Point> {
    if subject.len() < 3 || clip.len() < 3 {
        return Vec::new();
    }
    let clip_ring: Vec<Point> = if signed_area(clip) < 0.0 {
        clip.iter().rev().copied().collect()
    } else {
        clip.to_vec()
    };

    let mut output = subject.to_vec();
    for i in 0..clip_ring.len() {
        let a = clip_ring[i];
        let b = clip_ring[(i + 1) % clip_ring.len()];
        output = clip_half_plane(&output, |p| cross(&a, &b, p), |p, q| {
            let dp = cross(&a, &b, p);
            let dq = cross(&a, &b, q);
            p.lerp(q, dp / (dp - dq))
        });
        if output.is_empty() {
            break;
        }
    }
    output
}

fn clip_half_plane(
    input: &[Point],
    side: impl Fn(&Point) -> f64,
    intersect: impl Fn(&Point, &Point) -> Point,
) -> Vec<Point> {
    let mut output = Vec::with_capacity(input.len() + 2);
    if input.is_empty() {
        return output;
    }
    let mut prev = input[input.len() - 1];
    for cur in input {
        let cur_in = side(cur) >= 0.0;
        let prev_in = side(&prev) >= 0.0;
        if cur_in {
            if !prev_in {
                output.push(intersect(&prev, cur));
            }
            output.push(*cur);
        } else if prev_in {
            output.push(intersect(&prev, cur));
        }
        prev = *cur;
    }
    output
}

/// Clip a ring to the rectangle `[0, width] x [0, height]`.
pub fn clip_to_rect(points: &[Point], width: f64, height: f64) -> Vec<Point> {
    let rect = [
        Point::new(0.0, 0.0),
        Point::new(width, 0.0),
        Point::new(width, height),
        Point::new(0.0, height),
    ];
    clip_polygon(points, &rect)
        .into_iter()
        .map(|p| Point::new(p.x.clamp(0.0, width), p.y.clamp(0.0, height)))
        .collect()
}

/// Overlap area of `subject` with the convex ring `convex`.
pub fn intersection_area(subject: &[Point], convex: &[Point]) -> f64 {
    polygon_area(&clip_polygon(subject, convex))
}

/// Ray-casting point-in-polygon test.
pub fn point_in_polygon(point: &Point, polygon: &[Point]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let pi = polygon[i];
        let pj = polygon[j];
        if ((pi.y > point.y) != (pj.y > point.y))
            && (point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Pixels of a `width` x `height` raster whose centres fall inside the ring.
pub fn pixels_inside(points: &[Point], width: u32, height: u32) -> Vec<(u32, u32)> {
    if points.len() < 3 || width == 0 || height == 0 {
        return Vec::new();
    }
    let (x0, y0, x1, y1) = bounding_box(points);
    let px0 = (x0 - 0.5).ceil().max(0.0) as u32;
    let py0 = (y0 - 0.5).ceil().max(0.0) as u32;
    let px1 = ((x1 - 0.5).floor().max(-1.0) as i64).min(width as i64 - 1);
    let py1 = ((y1 - 0.5).floor().max(-1.0) as i64).min(height as i64 - 1);

    let mut inside = Vec::new();
    for py in py0 as i64..=py1 {
        for px in px0 as i64..=px1 {
            let center = Point::new(px as f64 + 0.5, py as f64 + 0.5);
            if point_in_polygon(&center, points) {
                inside.push((px as u32, py as u32));
            }
        }
    }
    inside
}

/// Drop consecutive near-duplicate vertices, including across the wrap.
pub fn dedup_ring(points: &[Point], tolerance: f64) -> Vec<Point> {
    let mut ring: Vec<Point> = points.to_vec();
    ring.dedup_by(|a, b| a.distance(b) < tolerance);
    while ring.len() > 1 && ring[0].distance(&ring[ring.len() - 1]) < tolerance {
        ring.pop();
    }
    ring
}

/// Drop vertices lying on the segment between their neighbours.
pub fn remove_collinear(points: &[Point]) -> Vec<Point> {
    let mut ring = points.to_vec();
    let mut changed = true;
    while changed && ring.len() >= 3 {
        changed = false;
        let n = ring.len();
        for i in 0..n {
            let prev = ring[(i + n - 1) % n];
            let next = ring[(i + 1) % n];
            let span = prev.distance(&next).max(EPS);
            if (cross(&prev, &ring[i], &next) / span).abs() < 1e-6 {
                ring.remove(i);
                changed = true;
                break;
            }
        }
    }
    ring
}

/// Fold an angle in degrees into [0, 180).
pub fn fold_angle(deg: f64) -> f64 {
    let a = deg.rem_euclid(180.0);
    if a >= 180.0 { 0.0 } else { a }
}

/// Signed difference `a - b` between two axial angles, in (-90, 90].
pub fn axial_difference(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(180.0);
    if d > 90.0 { d - 180.0 } else { d }
}

/// Circular mean of axial angles (degrees) via the doubled-angle trick.
/// `None` when the directions cancel out.
pub fn mean_axial_angle(angles: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (mut c, mut s) = (0.0, 0.0);
    for a in angles {
        let (sin2, cos2) = (2.0 * a.to_radians()).sin_cos();
        c += cos2;
        s += sin2;
    }
    if c.hypot(s) < 1e-9 {
        return None;
    }
    Some(fold_angle(s.atan2(c).to_degrees() / 2.0))
}
