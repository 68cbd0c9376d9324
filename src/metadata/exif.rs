use std::{collections::BTreeMap, io::Cursor};

use exif::{Context, In, Tag, Value};
use log::debug;

use crate::{
    MetadataResult,
    decoded::DecodedImage,
    error::{ForensicsError, Result},
    metadata::{
        Ratio, TagTable, TagValue, indicators,
        tags::{
            GPS_INFO, GPS_LATITUDE, GPS_LATITUDE_REF, GPS_LONGITUDE, GPS_LONGITUDE_REF,
            resolve_gps_tag, resolve_tag,
        },
    },
};

pub struct ExifExtractor;

impl ExifExtractor {
    /// Reads the embedded tag table from an encoded image.
    ///
    /// Containers without a tag table yield `MetadataUnavailable`.
    pub fn read_tag_table(bytes: &[u8]) -> Result<TagTable> {
        let mut cursor = Cursor::new(bytes);

        let exif_data = exif::Reader::new()
            .read_from_container(&mut cursor)
            .map_err(|e| ForensicsError::MetadataUnavailable(e.to_string()))?;

        Ok(Self::tag_table(&exif_data))
    }

    /// Flattens the primary IFD into a table, nesting GPS fields under `GPSInfo`.
    pub fn tag_table(exif_data: &exif::Exif) -> TagTable {
        let mut table = TagTable::new();
        let mut gps = TagTable::new();

        for field in exif_data.fields().filter(|f| f.ifd_num == In::PRIMARY) {
            if Self::is_ifd_pointer(field.tag) {
                continue;
            }

            let value = Self::convert_value(&field.value);
            let stored = match field.tag.context() {
                Context::Gps => gps.insert(field.tag.number(), value),
                _ => table.insert(field.tag.number(), value),
            };

            if !stored {
                debug!("Duplicate tag {} ignored", field.tag);
            }
        }

        if !gps.is_empty() {
            table.insert(GPS_INFO, TagValue::Table(gps));
        }

        table
    }

    fn is_ifd_pointer(tag: Tag) -> bool {
        tag == Tag::ExifIFDPointer || tag == Tag::GPSInfoIFDPointer || tag == Tag::InteropIFDPointer
    }

    fn convert_value(value: &Value) -> TagValue {
        match value {
            Value::Byte(bytes) | Value::Undefined(bytes, _) => TagValue::Bytes(bytes.clone()),
            Value::Ascii(strings) => {
                let joined = strings.join(&b", "[..]);
                match String::from_utf8(joined) {
                    Ok(text) => TagValue::Text(text.trim_end_matches('\0').to_string()),
                    Err(e) => TagValue::Bytes(e.into_bytes()),
                }
            }
            Value::Short(v) => TagValue::Number(v.iter().map(|&n| i64::from(n)).collect()),
            Value::Long(v) => TagValue::Number(v.iter().map(|&n| i64::from(n)).collect()),
            Value::SByte(v) => TagValue::Number(v.iter().map(|&n| i64::from(n)).collect()),
            Value::SShort(v) => TagValue::Number(v.iter().map(|&n| i64::from(n)).collect()),
            Value::SLong(v) => TagValue::Number(v.iter().map(|&n| i64::from(n)).collect()),
            Value::Rational(v) => TagValue::Rational(
                v.iter()
                    .map(|r| Ratio::new(r.num.into(), r.denom.into()))
                    .collect(),
            ),
            Value::SRational(v) => TagValue::Rational(
                v.iter()
                    .map(|r| Ratio::new(r.num.into(), r.denom.into()))
                    .collect(),
            ),
            Value::Float(v) => TagValue::Float(v.iter().map(|&n| f64::from(n)).collect()),
            Value::Double(v) => TagValue::Float(v.clone()),
            Value::Unknown(typ, count, offset) => TagValue::Text(format!(
                "unknown type {} ({} values at offset {})",
                typ, count, offset
            )),
            #[allow(unreachable_patterns)]
            other => TagValue::Text(format!("{:?}", other)),
        }
    }

    /// Expands a table into the main mapping and the GPS mapping, both keyed by tag name.
    pub fn expand(table: &TagTable) -> (BTreeMap<String, String>, BTreeMap<String, String>) {
        let mut tags = BTreeMap::new();
        let mut gps = BTreeMap::new();

        for (id, value) in table.iter() {
            if id == GPS_INFO {
                match value {
                    TagValue::Table(sub_table) => {
                        for (sub_id, sub_value) in sub_table.iter() {
                            gps.insert(resolve_gps_tag(sub_id), sub_value.to_display_string());
                        }
                    }
                    other => debug!("GPSInfo holds a scalar ({}), skipped", other),
                }
                continue;
            }

            tags.insert(resolve_tag(id), value.to_display_string());
        }

        (tags, gps)
    }

    pub fn extract(image: &DecodedImage) -> MetadataResult {
        let Some(table) = image.tags() else {
            debug!("No embedded tag table in {} image", image.format_name());
            return MetadataResult {
                indicators: indicators::metadata_indicators(None),
                ..MetadataResult::default()
            };
        };

        let (tags, gps) = Self::expand(table);

        MetadataResult {
            tags,
            gps,
            gps_coordinates: Self::gps_coordinates(table),
            indicators: indicators::metadata_indicators(Some(table)),
        }
    }

    /// Signed decimal (latitude, longitude) when both coordinates are present.
    pub fn gps_coordinates(table: &TagTable) -> Option<(f64, f64)> {
        let Some(TagValue::Table(gps)) = table.get(GPS_INFO) else {
            return None;
        };

        let lat = Self::dms_to_degrees(gps.get(GPS_LATITUDE)?)?;
        let lon = Self::dms_to_degrees(gps.get(GPS_LONGITUDE)?)?;

        let lat_sign = Self::hemisphere_sign(gps.get(GPS_LATITUDE_REF), 'S');
        let lon_sign = Self::hemisphere_sign(gps.get(GPS_LONGITUDE_REF), 'W');

        Some((lat * lat_sign, lon * lon_sign))
    }

    fn dms_to_degrees(value: &TagValue) -> Option<f64> {
        let parts = match value {
            TagValue::Rational(parts) => parts
                .iter()
                .map(|r| r.to_f64())
                .collect::<Option<Vec<_>>>()?,
            TagValue::Float(parts) => parts.clone(),
            _ => return None,
        };

        let degrees = *parts.first()?;
        let minutes = parts.get(1).copied().unwrap_or(0.0);
        let seconds = parts.get(2).copied().unwrap_or(0.0);

        Some(degrees + minutes / 60.0 + seconds / 3600.0)
    }

    fn hemisphere_sign(reference: Option<&TagValue>, negative: char) -> f64 {
        match reference {
            Some(value) if value.to_display_string().trim().starts_with(negative) => -1.0,
            _ => 1.0,
        }
    }
}
