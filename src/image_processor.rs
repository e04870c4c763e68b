use crate::error::{MosaicError, Result};
use rgb::{RGB8, RGBA8};

#[derive(Debug, Clone)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<RGBA8>,
}

pub fn load_image(path: &std::path::Path) -> Result<ImageData> {
    let img = image::open(path).map_err(|source| MosaicError::Load {
        path: path.to_path_buf(),
        source,
    })?;
    let rgba = img.to_rgba8();

    let pixels: Vec<RGBA8> = rgba
        .pixels()
        .map(|p| RGBA8::new(p[0], p[1], p[2], p[3]))
        .collect();

    Ok(ImageData {
        width: rgba.width(),
        height: rgba.height(),
        pixels,
    })
}

impl ImageData {
    pub fn rgb_at(&self, x: u32, y: u32) -> RGB8 {
        let p = self.pixels[(y * self.width + x) as usize];
        RGB8::new(p.r, p.g, p.b)
    }

    /// Pixel nearest to a canvas point, clamped to the image.
    pub fn nearest_rgb(&self, x: f64, y: f64) -> RGB8 {
        let px = (x.floor().max(0.0) as u32).min(self.width.saturating_sub(1));
        let py = (y.floor().max(0.0) as u32).min(self.height.saturating_sub(1));
        self.rgb_at(px, py)
    }

    /// Rec. 601 luminance scaled to 0.0-1.0, row-major.
    pub fn luminance(&self) -> Vec<f64> {
        self.pixels
            .iter()
            .map(|p| (0.299 * p.r as f64 + 0.587 * p.g as f64 + 0.114 * p.b as f64) / 255.0)
            .collect()
    }
}

/// Separable Gaussian blur over a scalar field with replicated borders.
pub fn gaussian_blur(values: &[f64], width: usize, height: usize, sigma: f64) -> Vec<f64> {
    if sigma <= 0.0 || width == 0 || height == 0 {
        return values.to_vec();
    }

    let radius = (3.0 * sigma).ceil() as isize;
    let mut kernel: Vec<f64> = (-radius..=radius)
        .map(|i| (-(i * i) as f64 / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f64 = kernel.iter().sum();
    kernel.iter_mut().for_each(|k| *k /= sum);

    let clamp = |v: isize, max: usize| v.clamp(0, max as isize - 1) as usize;

    let mut horizontal = vec![0.0; values.len()];
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0;
            for (k, weight) in kernel.iter().enumerate() {
                let sx = clamp(x as isize + k as isize - radius, width);
                acc += values[y * width + sx] * weight;
            }
            horizontal[y * width + x] = acc;
        }
    }

    let mut output = vec![0.0; values.len()];
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0;
            for (k, weight) in kernel.iter().enumerate() {
                let sy = clamp(y as isize + k as isize - radius, height);
                acc += horizontal[sy * width + x] * weight;
            }
            output[y * width + x] = acc;
        }
    }

    output
}
