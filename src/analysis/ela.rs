use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbImage, codecs::jpeg::JpegEncoder};
use log::debug;

use crate::{
    ElaResult,
    error::{ForensicsError, Result},
    image_utils::{abs_difference, channel_mean, channel_variance, max_channel, stretch_contrast},
};

pub const DEFAULT_QUALITY: u8 = 90;

/// Error Level Analysis: compares an image with a JPEG re-encode of itself.
pub struct ErrorLevelAnalyzer {
    quality: u8,
}

impl ErrorLevelAnalyzer {
    pub fn new(quality: u8) -> Self {
        Self { quality }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn analyze(&self, image: &DynamicImage) -> Result<ElaResult> {
        if !(1..=100).contains(&self.quality) {
            return Err(ForensicsError::InvalidParameter(format!(
                "JPEG quality must be within 1..=100, got {}",
                self.quality
            )));
        }

        // Palette, grayscale and alpha inputs all become 3-channel here.
        let original = image.to_rgb8();
        let resaved = self.recompress_jpeg(&original)?;

        if resaved.dimensions() != original.dimensions() {
            return Err(ForensicsError::ElaUnavailable(format!(
                "re-encoded raster is {:?}, expected {:?}",
                resaved.dimensions(),
                original.dimensions()
            )));
        }

        let difference = abs_difference(&original, &resaved);
        let max_difference = max_channel(&difference);
        let ela_image = stretch_contrast(&difference, max_difference);

        let variance = channel_variance(&ela_image);
        let mean = channel_mean(&ela_image);

        debug!(
            "ELA q{}: max difference {}, mean {:.3}, variance {:.3}",
            self.quality, max_difference, mean, variance
        );

        Ok(ElaResult {
            image: ela_image,
            variance,
            max_difference,
            mean,
        })
    }

    /// Round trip through an in-memory JPEG; the buffer does not outlive this call.
    fn recompress_jpeg(&self, image: &RgbImage) -> Result<RgbImage> {
        let mut buffer = Cursor::new(Vec::new());

        let encoder = JpegEncoder::new_with_quality(&mut buffer, self.quality);
        image
            .write_with_encoder(encoder)
            .map_err(|e| ForensicsError::ElaUnavailable(format!("re-encode failed: {}", e)))?;

        let recompressed = image::load_from_memory_with_format(buffer.get_ref(), ImageFormat::Jpeg)
            .map_err(|e| ForensicsError::ElaUnavailable(format!("re-decode failed: {}", e)))?;

        Ok(recompressed.to_rgb8())
    }
}

impl Default for ErrorLevelAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_QUALITY)
    }
}

#[cfg(test)]
mod tests {
    use image::{GrayImage, Luma, LumaA, Rgb, RgbaImage, ImageBuffer, Rgba};

    use super::*;

    fn flat_gray(size: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(size, size, Rgb([128, 128, 128])))
    }

    fn with_noise_patch(size: u32) -> DynamicImage {
        let mut image = RgbImage::from_pixel(size, size, Rgb([128, 128, 128]));
        let mut state = 0x2545_F491u32;
        for y in 32..64 {
            for x in 32..64 {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                let [r, g, b, _] = state.to_le_bytes();
                image.put_pixel(x, y, Rgb([r, g, b]));
            }
        }
        DynamicImage::ImageRgb8(image)
    }

    #[test]
    fn test_ela_analyzer_creation() {
        assert_eq!(ErrorLevelAnalyzer::new(95).quality(), 95);
        assert_eq!(ErrorLevelAnalyzer::default().quality(), DEFAULT_QUALITY);
    }

    #[test]
    fn test_rejects_out_of_range_quality() {
        let err = ErrorLevelAnalyzer::new(0).analyze(&flat_gray(8)).unwrap_err();
        assert!(matches!(err, ForensicsError::InvalidParameter(_)));
    }

    #[test]
    fn test_identical_reencode_has_zero_variance() {
        let result = ErrorLevelAnalyzer::default().analyze(&flat_gray(100)).unwrap();

        assert_eq!(result.max_difference, 0);
        assert_eq!(result.variance, 0.0);
        assert_eq!(result.image.dimensions(), (100, 100));
    }

    #[test]
    fn test_contrast_stretch_reaches_full_scale() {
        let result = ErrorLevelAnalyzer::default().analyze(&with_noise_patch(96)).unwrap();

        assert!(result.max_difference > 0);
        assert_eq!(max_channel(&result.image), 255);
        assert!(result.variance > 0.0);
    }

    #[test]
    fn test_splice_raises_variance() {
        let analyzer = ErrorLevelAnalyzer::default();
        let clean = analyzer.analyze(&flat_gray(96)).unwrap();
        let spliced = analyzer.analyze(&with_noise_patch(96)).unwrap();

        assert!(spliced.variance > clean.variance);
    }

    #[test]
    fn test_non_rgb_inputs_are_normalized() {
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(20, 12, Luma([90])));
        let gray_alpha: ImageBuffer<LumaA<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(20, 12, LumaA([90, 128]));
        let rgba = RgbaImage::from_pixel(20, 12, Rgba([10, 200, 30, 0]));

        let analyzer = ErrorLevelAnalyzer::default();
        for image in [gray, DynamicImage::ImageLumaA8(gray_alpha), DynamicImage::ImageRgba8(rgba)] {
            let result = analyzer.analyze(&image).unwrap();
            assert_eq!(result.image.dimensions(), (20, 12));
            assert!(result.variance >= 0.0);
        }
    }

    #[test]
    fn test_repeated_runs_are_identical() {
        let analyzer = ErrorLevelAnalyzer::new(75);
        let image = with_noise_patch(64);

        let first = analyzer.analyze(&image).unwrap();
        let second = analyzer.analyze(&image).unwrap();

        assert_eq!(first.image, second.image);
        assert_eq!(first.variance, second.variance);
    }
}
