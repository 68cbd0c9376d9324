use std::{collections::BTreeMap, path::Path};

use image::{GrayImage, RgbImage};
use log::warn;

use crate::{
    analysis::{
        ela::{DEFAULT_QUALITY, ErrorLevelAnalyzer},
        noise::NoiseAnalyzer,
        spectrum::{self, SpectrumAnalyzer},
    },
    decoded::DecodedImage,
    error::{ForensicsError, Result},
    metadata::exif::ExifExtractor,
};

pub mod analysis;
pub mod decoded;
pub mod error;
pub mod image_utils;
pub mod metadata;
pub mod report;

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub ela_quality: u8,
    /// Side length of the square luma plane fed to the FFT.
    pub spectrum_size: usize,
    /// Run the independent analyses on the rayon pool.
    pub parallel: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            ela_quality: DEFAULT_QUALITY,
            spectrum_size: spectrum::DEFAULT_SIZE,
            parallel: true,
        }
    }
}

pub struct ForensicsAnalyzer {
    image: DecodedImage,
    config: AnalysisConfig,
}

impl ForensicsAnalyzer {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::from_decoded(DecodedImage::open(path)?))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self::from_decoded(DecodedImage::from_bytes(bytes)?))
    }

    pub fn from_decoded(image: DecodedImage) -> Self {
        Self {
            image,
            config: AnalysisConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    pub fn image(&self) -> &DecodedImage {
        &self.image
    }

    pub fn ela(&self, quality: u8) -> Result<ElaResult> {
        let analyzer = ErrorLevelAnalyzer::new(quality);
        analyzer.analyze(self.image.image())
    }

    pub fn extract_metadata(&self) -> MetadataResult {
        ExifExtractor::extract(&self.image)
    }

    pub fn analyze_noise(&self) -> Result<NoiseResult> {
        NoiseAnalyzer::new().analyze(self.image.image())
    }

    pub fn analyze_spectrum(&self) -> Result<SpectrumResult> {
        SpectrumAnalyzer::new(self.config.spectrum_size).analyze(self.image.image())
    }

    /// Runs every analysis. Leaf failures degrade the record instead of failing it.
    pub fn full_analysis(&self) -> AnalysisRecord {
        let quality = self.config.ela_quality;

        let ((metadata, ela), (noise, spectrum)) = if self.config.parallel {
            rayon::join(
                || rayon::join(|| self.extract_metadata(), || self.ela(quality)),
                || rayon::join(|| self.analyze_noise(), || self.analyze_spectrum()),
            )
        } else {
            (
                (self.extract_metadata(), self.ela(quality)),
                (self.analyze_noise(), self.analyze_spectrum()),
            )
        };

        let mut notes = Vec::new();
        let ela = self.degrade("ELA", ela, &mut notes);
        let noise = self.degrade("Noise analysis", noise, &mut notes);
        let spectrum = self.degrade("Spectral analysis", spectrum, &mut notes);

        AnalysisRecord {
            format: self.image.format_name(),
            dimensions: self.image.dimensions(),
            gps_found: !metadata.gps.is_empty(),
            content_credentials: self.image.has_content_credentials(),
            metadata,
            ela_variance: ela.as_ref().map_or(0.0, |r| r.variance),
            ela_available: ela.is_some(),
            noise_score: noise.as_ref().map(|r| r.noise_score),
            smoothness: noise.as_ref().map(|r| r.smoothness),
            spectral_anomaly: spectrum.as_ref().map(|r| r.anomaly_score),
            notes,
        }
    }

    fn degrade<T>(&self, label: &str, result: Result<T>, notes: &mut Vec<String>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("{} unavailable for {} image: {}", label, self.image.format_name(), e);
                notes.push(match &e {
                    ForensicsError::ElaUnavailable(_) => e.to_string(),
                    other => format!("{} unavailable: {}", label, other),
                });
                None
            }
        }
    }
}

/// Decodes `bytes` and runs the full analysis. Only a decode failure is returned as an error.
pub fn analyze_bytes(bytes: &[u8]) -> Result<AnalysisRecord> {
    Ok(ForensicsAnalyzer::from_bytes(bytes)?.full_analysis())
}

#[derive(Debug, Clone)]
pub struct ElaResult {
    /// Contrast-stretched per-channel difference, same size as the input.
    pub image: RgbImage,
    pub variance: f64,
    /// Largest raw channel difference before stretching.
    pub max_difference: u8,
    pub mean: f64,
}

impl ElaResult {
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.image.save(path)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseResult {
    /// Mean absolute Laplacian of luma; camera sensors rarely sit near zero.
    pub noise_score: f64,
    /// Percentage of sampled horizontal transitions that are flat.
    pub smoothness: f64,
}

#[derive(Debug, Clone)]
pub struct SpectrumResult {
    pub anomaly_score: f64,
    /// Centred log-magnitude spectrum scaled to 0..=255.
    pub spectrum: GrayImage,
}

impl SpectrumResult {
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.spectrum.save(path)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataResult {
    pub tags: BTreeMap<String, String>,
    pub gps: BTreeMap<String, String>,
    pub gps_coordinates: Option<(f64, f64)>,
    pub indicators: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRecord {
    pub format: String,
    pub dimensions: (u32, u32),
    pub metadata: MetadataResult,
    pub ela_variance: f64,
    pub ela_available: bool,
    pub noise_score: Option<f64>,
    pub smoothness: Option<f64>,
    pub spectral_anomaly: Option<f64>,
    pub gps_found: bool,
    pub content_credentials: bool,
    pub notes: Vec<String>,
}
