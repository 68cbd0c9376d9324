use image::{
    DynamicImage, GrayImage, Luma,
    imageops::{self, FilterType},
};
use ndarray::Array2;
use num_complex::Complex;
use rustfft::FftPlanner;

use crate::{
    SpectrumResult,
    error::{ForensicsError, Result},
};

pub const DEFAULT_SIZE: usize = 256;

/// 2-D magnitude spectrum of the luma plane. The anomaly score is the mean
/// log-magnitude outside `high_frequency_radius * size` of the centred DC term.
pub struct SpectrumAnalyzer {
    size: usize,
    high_frequency_radius: f64,
}

impl SpectrumAnalyzer {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            high_frequency_radius: 0.4,
        }
    }

    pub fn analyze(&self, image: &DynamicImage) -> Result<SpectrumResult> {
        let n = self.size;
        if !(2..=4096).contains(&n) {
            return Err(ForensicsError::InvalidParameter(format!(
                "spectrum size must be within 2..=4096, got {}",
                n
            )));
        }

        let gray = image.to_luma8();
        let gray = if gray.dimensions() == (n as u32, n as u32) {
            gray
        } else {
            imageops::resize(&gray, n as u32, n as u32, FilterType::Triangle)
        };

        let mut rows = gray
            .pixels()
            .map(|p| Complex::new(p[0] as f64 / 255.0, 0.0))
            .collect::<Vec<_>>();

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(n);

        fft.process(&mut rows);
        let mut columns = transpose(&rows, n);
        fft.process(&mut columns);

        // `columns` is indexed [x * n + y]; shift DC to the centre.
        let half = n / 2;
        let mut magnitude = Array2::<f64>::zeros((n, n));
        for x in 0..n {
            for y in 0..n {
                magnitude[[(y + half) % n, (x + half) % n]] = columns[x * n + y].norm().ln_1p();
            }
        }

        let anomaly_score = self.high_frequency_mean(&magnitude);

        Ok(SpectrumResult {
            anomaly_score,
            spectrum: to_gray(&magnitude),
        })
    }

    fn high_frequency_mean(&self, magnitude: &Array2<f64>) -> f64 {
        let n = self.size as f64;
        let centre = n / 2.0;
        let radius = n * self.high_frequency_radius;

        let mut sum = 0.0;
        let mut count = 0usize;

        for ((y, x), &value) in magnitude.indexed_iter() {
            let dx = x as f64 - centre;
            let dy = y as f64 - centre;
            if (dx * dx + dy * dy).sqrt() > radius {
                sum += value;
                count += 1;
            }
        }

        if count == 0 { 0.0 } else { sum / count as f64 }
    }
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_SIZE)
    }
}

fn transpose(data: &[Complex<f64>], n: usize) -> Vec<Complex<f64>> {
    let mut out = vec![Complex::new(0.0, 0.0); n * n];
    for y in 0..n {
        for x in 0..n {
            out[x * n + y] = data[y * n + x];
        }
    }
    out
}

fn to_gray(magnitude: &Array2<f64>) -> GrayImage {
    let (height, width) = magnitude.dim();
    let max = magnitude.iter().cloned().fold(0.0f64, f64::max);
    let mut image = GrayImage::new(width as u32, height as u32);

    if max > 0.0 {
        for ((y, x), &value) in magnitude.indexed_iter() {
            let scaled = (value / max * 255.0).clamp(0.0, 255.0) as u8;
            image.put_pixel(x as u32, y as u32, Luma([scaled]));
        }
    }

    image
}
