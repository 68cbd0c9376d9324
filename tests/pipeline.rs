use std::io::Cursor;

use exif::{Field, In, Tag, Value};
use forensic_pipeline::{
    ForensicsAnalyzer, analyze_bytes,
    report::AnalysisResponse,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, codecs::jpeg::JpegEncoder};
use rayon::prelude::*;

fn textured(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (100 + (x * 3 + y) % 40) as u8,
            (90 + (x + y * 2) % 30) as u8,
            (80 + (x * y) % 20) as u8,
        ])
    })
}

fn encode(image: &RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image.clone())
        .write_to(&mut buffer, format)
        .unwrap();
    buffer.into_inner()
}

fn ascii(tag: Tag, text: &str) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![text.as_bytes().to_vec()]),
    }
}

fn dms(tag: Tag, degrees: u32, minutes: u32, seconds_x100: u32) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Rational(vec![
            exif::Rational { num: degrees, denom: 1 },
            exif::Rational { num: minutes, denom: 1 },
            exif::Rational { num: seconds_x100, denom: 100 },
        ]),
    }
}

/// JPEG with an APP1 Exif segment inserted right after SOI.
fn jpeg_with_exif(image: &RgbImage, fields: &[Field]) -> Vec<u8> {
    let mut jpeg = Vec::new();
    image
        .write_with_encoder(JpegEncoder::new_with_quality(&mut jpeg, 85))
        .unwrap();

    let mut writer = exif::experimental::Writer::new();
    for field in fields {
        writer.push_field(field);
    }
    let mut tiff = Cursor::new(Vec::new());
    writer.write(&mut tiff, false).unwrap();
    let tiff = tiff.into_inner();

    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&((tiff.len() + 8) as u16).to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&jpeg[2..]);
    out
}

fn camera_jpeg() -> Vec<u8> {
    let fields = [
        ascii(Tag::Make, "Nikon"),
        ascii(Tag::Model, "D750"),
        ascii(Tag::Software, "Adobe Photoshop 25.0"),
        ascii(Tag::DateTime, "2024:05:01 12:00:00"),
        ascii(Tag::GPSLatitudeRef, "S"),
        dms(Tag::GPSLatitude, 33, 51, 3100),
        ascii(Tag::GPSLongitudeRef, "E"),
        dms(Tag::GPSLongitude, 151, 12, 4000),
    ];
    jpeg_with_exif(&textured(64, 48), &fields)
}

#[test]
fn solid_gray_png_has_no_metadata_and_flat_ela() {
    let png = encode(&RgbImage::from_pixel(100, 100, Rgb([128, 128, 128])), ImageFormat::Png);
    let record = analyze_bytes(&png).unwrap();

    let response = AnalysisResponse::from(&record);
    let analysis = &response.server_analysis;

    assert_eq!(analysis.format, "PNG");
    assert_eq!(analysis.dimensions, [100, 100]);
    assert_eq!(analysis.exif_count, 0);
    assert!(analysis.exif_data.is_empty());
    assert!(!analysis.gps_found);
    assert!(analysis.ela_variance < 1.0);
    assert!(analysis.indicators.contains(&"No EXIF metadata found".to_string()));
}

#[test]
fn jpeg_with_gps_resolves_sub_tag_names() {
    let record = analyze_bytes(&camera_jpeg()).unwrap();
    let metadata = &record.metadata;

    assert_eq!(record.format, "JPEG");
    assert_eq!(record.dimensions, (64, 48));
    assert!(record.gps_found);
    assert!(metadata.gps.contains_key("GPSLatitude"));
    assert!(metadata.gps.contains_key("GPSLongitude"));
    assert!(metadata.gps.keys().all(|k| !k.chars().all(|c| c.is_ascii_digit())));
    assert!(metadata.tags.keys().all(|k| !k.starts_with("GPS")));
    assert_eq!(metadata.tags.get("Make").map(String::as_str), Some("Nikon"));

    let (lat, lon) = metadata.gps_coordinates.unwrap();
    assert!(lat < -33.8 && lat > -33.9);
    assert!(lon > 151.2 && lon < 151.3);

    assert!(
        metadata
            .indicators
            .iter()
            .any(|i| i == "Edited with: Adobe Photoshop 25.0")
    );
}

#[test]
fn exif_count_excludes_gps_sub_tags() {
    let record = analyze_bytes(&camera_jpeg()).unwrap();
    let response = AnalysisResponse::from(&record);

    assert_eq!(response.server_analysis.exif_count, record.metadata.tags.len());
    assert_eq!(response.server_analysis.gps_data.len(), 4);
}

#[test]
fn repeated_analysis_is_identical() {
    let bytes = camera_jpeg();

    let first = analyze_bytes(&bytes).unwrap();
    let second = analyze_bytes(&bytes).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        AnalysisResponse::from(&first).to_json().unwrap(),
        AnalysisResponse::from(&second).to_json().unwrap()
    );
}

#[test]
fn spliced_region_raises_ela_variance() {
    let base = RgbImage::from_pixel(128, 128, Rgb([128, 128, 128]));
    let mut spliced = base.clone();
    let foreign = textured(48, 48);
    for (x, y, pixel) in foreign.enumerate_pixels() {
        let stripe = if (x / 2 + y / 3) % 2 == 0 { 90 } else { 0 };
        let [r, g, b] = pixel.0;
        spliced.put_pixel(40 + x, 40 + y, Rgb([r.saturating_add(stripe), g, b.saturating_sub(stripe)]));
    }

    let clean = analyze_bytes(&encode(&base, ImageFormat::Png)).unwrap();
    let tampered = analyze_bytes(&encode(&spliced, ImageFormat::Png)).unwrap();

    assert!(tampered.ela_variance > clean.ela_variance);
}

#[test]
fn concurrent_analyses_do_not_interfere() {
    let inputs: Vec<Vec<u8>> = (0..8u8)
        .map(|i| {
            let image = if i % 2 == 0 {
                RgbImage::from_pixel(32 + i as u32, 24, Rgb([i * 20, 128, 200 - i * 10]))
            } else {
                textured(32 + i as u32, 24)
            };
            encode(&image, ImageFormat::Png)
        })
        .collect();

    let sequential: Vec<_> = inputs.iter().map(|b| analyze_bytes(b).unwrap()).collect();
    let concurrent: Vec<_> = inputs
        .par_iter()
        .map(|b| {
            ForensicsAnalyzer::from_bytes(b)
                .unwrap()
                .full_analysis()
        })
        .collect();

    assert_eq!(sequential, concurrent);
    for (i, record) in concurrent.iter().enumerate() {
        assert_eq!(record.dimensions, (32 + i as u32, 24));
    }
}

#[test]
fn undecodable_input_is_the_only_failure() {
    assert!(analyze_bytes(b"").is_err());
    assert!(analyze_bytes(b"GIF89a-but-not-really").is_err());
}
