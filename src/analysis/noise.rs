use image::{
    DynamicImage, RgbImage,
    imageops::{self, FilterType},
};
use ndarray::Array2;

use crate::{
    NoiseResult,
    error::{ForensicsError, Result},
    image_utils::luma_plane,
};

/// Wider inputs are downscaled to this width before sampling.
pub const MAX_ANALYSIS_WIDTH: u32 = 1024;

/// Sensor-noise and texture indicators: mean absolute Laplacian of luma
/// and the share of flat horizontal transitions.
pub struct NoiseAnalyzer {
    stride: usize,
    flat_threshold: u32,
    max_width: u32,
}

impl NoiseAnalyzer {
    pub fn new() -> Self {
        Self {
            stride: 2,
            flat_threshold: 5,
            max_width: MAX_ANALYSIS_WIDTH,
        }
    }

    pub fn with_stride(mut self, stride: usize) -> Self {
        self.stride = stride.max(1);
        self
    }

    pub fn analyze(&self, image: &DynamicImage) -> Result<NoiseResult> {
        let rgb = self.downscale(image.to_rgb8());
        let (width, height) = rgb.dimensions();

        if width < 3 || height < 3 {
            return Err(ForensicsError::ImageTooSmall(3));
        }

        let luma = luma_plane(&rgb);

        Ok(NoiseResult {
            noise_score: self.laplacian_energy(&luma),
            smoothness: self.flat_transition_ratio(&rgb) * 100.0,
        })
    }

    fn downscale(&self, rgb: RgbImage) -> RgbImage {
        let (width, height) = rgb.dimensions();
        if width <= self.max_width {
            return rgb;
        }

        let new_height = ((height as u64 * self.max_width as u64) / width as u64).max(1) as u32;
        imageops::resize(&rgb, self.max_width, new_height, FilterType::Triangle)
    }

    fn laplacian_energy(&self, luma: &Array2<f64>) -> f64 {
        let (height, width) = luma.dim();
        let mut sum = 0.0;
        let mut count = 0usize;

        for y in (1..height - 1).step_by(self.stride) {
            for x in (1..width - 1).step_by(self.stride) {
                let laplacian = 4.0 * luma[[y, x]]
                    - luma[[y - 1, x]]
                    - luma[[y + 1, x]]
                    - luma[[y, x - 1]]
                    - luma[[y, x + 1]];
                sum += laplacian.abs();
                count += 1;
            }
        }

        sum / count as f64
    }

    fn flat_transition_ratio(&self, rgb: &RgbImage) -> f64 {
        let (width, height) = rgb.dimensions();
        let mut flat = 0usize;
        let mut total = 0usize;

        for y in (0..height).step_by(self.stride) {
            for x in (0..width - 1).step_by(self.stride) {
                let a = rgb.get_pixel(x, y);
                let b = rgb.get_pixel(x + 1, y);
                let diff = a
                    .0
                    .iter()
                    .zip(b.0.iter())
                    .map(|(&p, &q)| p.abs_diff(q) as u32)
                    .sum::<u32>();

                if diff < self.flat_threshold {
                    flat += 1;
                }
                total += 1;
            }
        }

        flat as f64 / total as f64
    }
}

impl Default for NoiseAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
