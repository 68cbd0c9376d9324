//! Human-facing findings derived from embedded metadata and the raw byte stream.

use image::ImageFormat;

use crate::metadata::{
    TagTable,
    tags::{DATE_TIME, DATE_TIME_DIGITIZED, DATE_TIME_ORIGINAL, SOFTWARE},
};

/// Software names written by image generators.
pub const GENERATIVE_TOOLS: &[&str] = &[
    "Midjourney",
    "Stable Diffusion",
    "DALL-E",
    "Firefly",
    "Imagine",
    "Wonder",
    "Adobe Photoshop Generative",
];

pub const EDITING_TOOLS: &[&str] = &["Photoshop", "GIMP", "Paint"];

/// Signature of a C2PA manifest store (JUMBF box label).
const CONTENT_CREDENTIALS_SIGNATURE: &[u8] = b"c2pa";

fn mentions_any(haystack: &str, needles: &[&str]) -> bool {
    let haystack = haystack.to_lowercase();
    needles
        .iter()
        .any(|needle| haystack.contains(&needle.to_lowercase()))
}

pub fn metadata_indicators(table: Option<&TagTable>) -> Vec<String> {
    let mut indicators = Vec::new();

    let Some(table) = table.filter(|t| !t.is_empty()) else {
        indicators.push("No EXIF metadata found".into());
        return indicators;
    };

    let text = |id: u16| table.get(id).map(|v| v.to_display_string());

    if let Some(software) = text(SOFTWARE) {
        if mentions_any(&software, GENERATIVE_TOOLS) {
            indicators.push(format!("AI software detected: {}", software));
        } else if mentions_any(&software, EDITING_TOOLS) {
            indicators.push(format!("Edited with: {}", software));
        }
    }

    let original = text(DATE_TIME_ORIGINAL);
    let digitized = text(DATE_TIME_DIGITIZED);

    if original.is_none() && text(DATE_TIME).is_some() {
        indicators.push("Original datetime missing (may be stripped)".into());
    }

    if let (Some(orig), Some(digi)) = (&original, &digitized) {
        if orig != digi {
            indicators.push("Inconsistent date time values".into());
        }
    }

    indicators
}

const JPEG_APP11: u8 = 0xEB;
const JPEG_SOS: u8 = 0xDA;
const JPEG_EOI: u8 = 0xD9;
const PNG_SIGNATURE_LEN: usize = 8;

fn contains_signature(bytes: &[u8]) -> bool {
    bytes
        .windows(CONTENT_CREDENTIALS_SIGNATURE.len())
        .any(|window| window == CONTENT_CREDENTIALS_SIGNATURE)
}

/// Whether the encoded stream carries a Content Credentials (C2PA) manifest.
///
/// JPEG is searched in APP11 (JUMBF) segments only and PNG in `caBX` chunks only,
/// so entropy-coded data and free-text tags cannot trigger it. Other containers
/// fall back to scanning the whole stream, where a stray `c2pa` byte run can
/// produce a false positive. Presence only; the manifest is not parsed or verified.
pub fn has_content_credentials(bytes: &[u8], format: ImageFormat) -> bool {
    match format {
        ImageFormat::Jpeg => jpeg_app11_segments(bytes).any(contains_signature),
        ImageFormat::Png => png_chunks(bytes)
            .filter(|(kind, _)| kind == b"caBX")
            .any(|(_, data)| contains_signature(data)),
        _ => contains_signature(bytes),
    }
}

/// Payloads of APP11 segments preceding the first scan.
fn jpeg_app11_segments(bytes: &[u8]) -> impl Iterator<Item = &[u8]> {
    let mut offset = 2;

    std::iter::from_fn(move || {
        loop {
            if bytes.get(offset) != Some(&0xFF) {
                return None;
            }
            let marker = *bytes.get(offset + 1)?;

            match marker {
                0xFF => {
                    offset += 1;
                    continue;
                }
                JPEG_SOS | JPEG_EOI => return None,
                0x01 | 0xD0..=0xD7 => {
                    offset += 2;
                    continue;
                }
                _ => {}
            }

            let length = u16::from_be_bytes([*bytes.get(offset + 2)?, *bytes.get(offset + 3)?]) as usize;
            if length < 2 {
                return None;
            }
            let payload = bytes.get(offset + 4..offset + 2 + length)?;
            offset += 2 + length;

            if marker == JPEG_APP11 {
                return Some(payload);
            }
        }
    })
}

/// `(chunk type, chunk data)` pairs up to `IEND`.
fn png_chunks(bytes: &[u8]) -> impl Iterator<Item = ([u8; 4], &[u8])> {
    let mut offset = PNG_SIGNATURE_LEN;

    std::iter::from_fn(move || {
        let header = bytes.get(offset..offset + 8)?;
        let length = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let kind = [header[4], header[5], header[6], header[7]];
        if &kind == b"IEND" {
            return None;
        }

        let data = bytes.get(offset + 8..(offset + 8).checked_add(length)?)?;
        offset += 12 + length;
        Some((kind, data))
    })
}
