use std::collections::BTreeMap;

use serde::Serialize;

use crate::AnalysisRecord;

/// Rounds to two decimal places. Applied only when a record leaves the crate.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub status: &'static str,
    pub server_analysis: ServerAnalysis,
}

#[derive(Debug, Serialize)]
pub struct ServerAnalysis {
    pub format: String,
    pub dimensions: [u32; 2],
    pub ela_variance: f64,
    pub ela_available: bool,
    pub noise_score: Option<f64>,
    pub smoothness: Option<f64>,
    pub spectral_anomaly: Option<f64>,
    pub exif_count: usize,
    pub exif_data: BTreeMap<String, String>,
    pub gps_found: bool,
    pub gps_data: BTreeMap<String, String>,
    pub gps_coordinates: Option<[f64; 2]>,
    pub content_credentials: bool,
    pub indicators: Vec<String>,
    pub notes: Vec<String>,
    pub message: String,
}

impl From<&AnalysisRecord> for ServerAnalysis {
    fn from(record: &AnalysisRecord) -> Self {
        let (width, height) = record.dimensions;

        Self {
            format: record.format.clone(),
            dimensions: [width, height],
            ela_variance: round2(record.ela_variance),
            ela_available: record.ela_available,
            noise_score: record.noise_score.map(round2),
            smoothness: record.smoothness.map(round2),
            spectral_anomaly: record.spectral_anomaly.map(round2),
            exif_count: record.metadata.tags.len(),
            exif_data: record.metadata.tags.clone(),
            gps_found: record.gps_found,
            gps_data: record.metadata.gps.clone(),
            gps_coordinates: record
                .metadata
                .gps_coordinates
                .map(|(lat, lon)| [round2(lat), round2(lon)]),
            content_credentials: record.content_credentials,
            indicators: record.metadata.indicators.clone(),
            notes: record.notes.clone(),
            message: if record.ela_available {
                "Deep analysis complete.".into()
            } else {
                "Analysis complete; ELA unavailable.".into()
            },
        }
    }
}

impl From<&AnalysisRecord> for AnalysisResponse {
    fn from(record: &AnalysisRecord) -> Self {
        Self {
            status: "success",
            server_analysis: ServerAnalysis::from(record),
        }
    }
}

impl AnalysisResponse {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Input handed to the report renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRequest {
    pub image: Vec<u8>,
    pub confidence: String,
    pub verdict: String,
}

impl ReportRequest {
    pub fn new(image: Vec<u8>, confidence: Option<&str>, verdict: Option<&str>) -> Self {
        Self {
            image,
            confidence: confidence.unwrap_or("N/A").to_string(),
            verdict: verdict.unwrap_or("Unknown").to_string(),
        }
    }
}
