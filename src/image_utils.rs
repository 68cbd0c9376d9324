use image::{Rgb, RgbImage};
use ndarray::{Array1, Array2};

/// BT.601 luma of every pixel, indexed `[y, x]`.
pub fn luma_plane(image: &RgbImage) -> Array2<f64> {
    let (width, height) = image.dimensions();
    let mut plane = Array2::zeros((height as usize, width as usize));

    for (x, y, pixel) in image.enumerate_pixels() {
        plane[[y as usize, x as usize]] =
            0.299 * pixel[0] as f64 + 0.587 * pixel[1] as f64 + 0.114 * pixel[2] as f64;
    }

    plane
}

/// Per-channel absolute difference of two equally sized rasters.
pub fn abs_difference(a: &RgbImage, b: &RgbImage) -> RgbImage {
    let (width, height) = a.dimensions();
    let mut diff = RgbImage::new(width, height);

    for (x, y, pixel) in diff.enumerate_pixels_mut() {
        let pa = a.get_pixel(x, y);
        let pb = b.get_pixel(x, y);
        *pixel = Rgb([
            pa[0].abs_diff(pb[0]),
            pa[1].abs_diff(pb[1]),
            pa[2].abs_diff(pb[2]),
        ]);
    }

    diff
}

pub fn max_channel(image: &RgbImage) -> u8 {
    image.as_raw().iter().copied().max().unwrap_or(0)
}

/// Multiplies every channel by `255 / max`, rounding and clipping to the u8 range.
/// A `max` of zero is treated as one.
pub fn stretch_contrast(image: &RgbImage, max: u8) -> RgbImage {
    let max = max.max(1);
    let scale = 255.0 / max as f64;
    let (width, height) = image.dimensions();
    let mut stretched = RgbImage::new(width, height);

    for (x, y, pixel) in image.enumerate_pixels() {
        let scaled = pixel.0.map(|v| (v as f64 * scale).round().clamp(0.0, 255.0) as u8);
        stretched.put_pixel(x, y, Rgb(scaled));
    }

    stretched
}

fn channel_values(image: &RgbImage) -> Array1<f64> {
    image.as_raw().iter().map(|&v| v as f64).collect()
}

pub fn channel_mean(image: &RgbImage) -> f64 {
    channel_values(image).mean().unwrap_or(0.0)
}

/// Population variance over every channel of every pixel.
pub fn channel_variance(image: &RgbImage) -> f64 {
    let values = channel_values(image);
    if values.is_empty() {
        return 0.0;
    }
    values.var(0.0)
}
