//! Gradient edge detection producing the edge-strength and orientation maps
//! that seed the primary guidelines.
//!
//! Grayscale luminance, optional Gaussian pre-smoothing, a 3x3 gradient
//! operator and non-maximum suppression so edges come out one pixel thick.

use crate::config::EdgeDetection;
use crate::geometry::fold_angle;
use crate::image_processor::{gaussian_blur, ImageData};

const GAUSS_SIGMA: f64 = 1.0;

/// Edge detection result: strength 0.0-1.0 and gradient orientation in
/// degrees [0, 180), both row-major.
#[derive(Debug, Clone)]
pub struct EdgeMap {
    pub width: u32,
    pub height: u32,
    pub strength: Vec<f64>,
    pub orientation: Vec<f64>,
}

impl EdgeMap {
    pub fn blank(width: u32, height: u32) -> Self {
        let n = (width * height) as usize;
        Self {
            width,
            height,
            strength: vec![0.0; n],
            orientation: vec![0.0; n],
        }
    }

    /// Number of pixels at or above `threshold`.
    pub fn edge_count(&self, threshold: f64) -> usize {
        self.strength.iter().filter(|&&s| s > 0.0 && s >= threshold).count()
    }
}

/// Smoothing row and its weight sum for the separable 3x3 operators.
fn kernel_weights(kind: EdgeDetection) -> ([f64; 3], f64) {
    match kind {
        EdgeDetection::Sobel => ([1.0, 2.0, 1.0], 4.0),
        EdgeDetection::Prewitt => ([1.0, 1.0, 1.0], 3.0),
        EdgeDetection::Scharr => ([3.0, 10.0, 3.0], 16.0),
    }
}

/// Detect edges on the luminance of the image.
pub fn detect_edges(image_data: &ImageData, kind: EdgeDetection, gauss: bool, frame: bool) -> EdgeMap {
    let w = image_data.width as usize;
    let h = image_data.height as usize;
    if w == 0 || h == 0 {
        return EdgeMap::blank(image_data.width, image_data.height);
    }

    let mut gray = image_data.luminance();
    if gauss {
        gray = gaussian_blur(&gray, w, h, GAUSS_SIGMA);
    }

    let (smooth, norm) = kernel_weights(kind);
    let at = |x: isize, y: isize| -> f64 {
        let xc = x.clamp(0, w as isize - 1) as usize;
        let yc = y.clamp(0, h as isize - 1) as usize;
        gray[yc * w + xc]
    };

    let mut magnitude = vec![0.0f64; w * h];
    let mut gx_buf = vec![0.0f64; w * h];
    let mut gy_buf = vec![0.0f64; w * h];

    for y in 0..h as isize {
        for x in 0..w as isize {
            let mut gx = 0.0;
            let mut gy = 0.0;
            for k in 0..3isize {
                let wk = smooth[k as usize];
                gx += wk * (at(x + 1, y + k - 1) - at(x - 1, y + k - 1));
                gy += wk * (at(x + k - 1, y + 1) - at(x + k - 1, y - 1));
            }
            let i = y as usize * w + x as usize;
            gx_buf[i] = gx;
            gy_buf[i] = gy;
            magnitude[i] = ((gx * gx + gy * gy).sqrt() / norm).min(1.0);
        }
    }

    let mut strength = vec![0.0f64; w * h];
    let mut orientation = vec![0.0f64; w * h];

    // Non-maximum suppression along the quantised gradient direction
    for y in 0..h {
        for x in 0..w {
            let i = y * w + x;
            let m = magnitude[i];
            let angle = fold_angle(gy_buf[i].atan2(gx_buf[i]).to_degrees());
            orientation[i] = angle;
            if m < 1e-6 {
                continue;
            }
            let (dx, dy): (isize, isize) = if !(22.5..157.5).contains(&angle) {
                (1, 0)
            } else if angle < 67.5 {
                (1, 1)
            } else if angle < 112.5 {
                (0, 1)
            } else {
                (-1, 1)
            };
            let neighbor = |sx: isize, sy: isize| -> f64 {
                let nx = x as isize + sx;
                let ny = y as isize + sy;
                if nx < 0 || ny < 0 || nx >= w as isize || ny >= h as isize {
                    0.0
                } else {
                    magnitude[ny as usize * w + nx as usize]
                }
            };
            // ties resolved towards the forward neighbour so plateaus stay thin
            if m > neighbor(dx, dy) && m >= neighbor(-dx, -dy) {
                strength[i] = m;
            }
        }
    }

    if frame {
        for y in 0..h {
            for x in 0..w {
                let on_side = x == 0 || x == w - 1;
                let on_cap = y == 0 || y == h - 1;
                if on_side || on_cap {
                    let i = y * w + x;
                    strength[i] = 1.0;
                    orientation[i] = if on_side { 0.0 } else { 90.0 };
                }
            }
        }
    }

    EdgeMap {
        width: image_data.width,
        height: image_data.height,
        strength,
        orientation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rgb::RGBA8;

    fn split_image(vertical: bool) -> ImageData {
        let mut pixels = Vec::new();
        for y in 0..10 {
            for x in 0..10 {
                let dark = if vertical { x < 5 } else { y < 5 };
                if dark {
                    pixels.push(RGBA8::new(0, 0, 0, 255));
                } else {
                    pixels.push(RGBA8::new(255, 255, 255, 255));
                }
            }
        }
        ImageData { width: 10, height: 10, pixels }
    }

    #[test]
    fn test_detects_vertical_edge() {
        let edges = detect_edges(&split_image(true), EdgeDetection::Sobel, false, false);
        assert_eq!(edges.width, 10);
        assert_eq!(edges.height, 10);
        let row = 5 * 10;
        let peak = edges.strength[row + 4].max(edges.strength[row + 5]);
        assert!(peak > 0.9);
        assert!(edges.strength[row + 1] == 0.0);
        let edge_x = if edges.strength[row + 4] > 0.0 { 4 } else { 5 };
        assert!(edges.orientation[row + edge_x].abs() < 1e-6);
    }

    #[test]
    fn test_edges_are_thin() {
        let edges = detect_edges(&split_image(true), EdgeDetection::Sobel, true, false);
        for y in 0..10 {
            let on: usize = (0..10).filter(|&x| edges.strength[y * 10 + x] > 0.0).count();
            assert_eq!(on, 1, "row {y}");
        }
    }

    #[test]
    fn test_horizontal_edge_orientation() {
        let edges = detect_edges(&split_image(false), EdgeDetection::Prewitt, false, false);
        let col = 5;
        let edge_y = if edges.strength[4 * 10 + col] > 0.0 { 4 } else { 5 };
        assert!(edges.strength[edge_y * 10 + col] > 0.9);
        assert!((edges.orientation[edge_y * 10 + col] - 90.0).abs() < 1e-6);
    }

    #[test]
    fn test_uniform_image_no_edges() {
        let pixels = vec![RGBA8::new(128, 128, 128, 255); 100];
        let img = ImageData { width: 10, height: 10, pixels };
        for kind in [EdgeDetection::Sobel, EdgeDetection::Prewitt, EdgeDetection::Scharr] {
            let edges = detect_edges(&img, kind, true, false);
            assert_eq!(edges.edge_count(0.0), 0);
        }
    }

    #[test]
    fn test_frame_marks_border() {
        let pixels = vec![RGBA8::new(128, 128, 128, 255); 100];
        let img = ImageData { width: 10, height: 10, pixels };
        let edges = detect_edges(&img, EdgeDetection::Sobel, false, true);
        assert_eq!(edges.edge_count(0.5), 36);
        assert_eq!(edges.strength[0], 1.0);
        assert_eq!(edges.orientation[5 * 10], 0.0);
        assert_eq!(edges.orientation[5], 90.0);
    }
}
