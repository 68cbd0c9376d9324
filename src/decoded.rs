use std::path::Path;

use image::{ColorType, DynamicImage, GenericImageView, ImageFormat};
use log::debug;

use crate::{
    error::Result,
    metadata::{TagTable, exif::ExifExtractor, indicators::has_content_credentials},
};

/// A decoded raster together with what was learned from its container.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    image: DynamicImage,
    format: ImageFormat,
    tags: Option<TagTable>,
    content_credentials: bool,
}

impl DecodedImage {
    pub fn new(image: DynamicImage, format: ImageFormat) -> Self {
        Self {
            image,
            format,
            tags: None,
            content_credentials: false,
        }
    }

    pub fn with_tags(mut self, tags: TagTable) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Decodes an encoded image. Failure here is the only fatal error of an analysis.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let format = image::guess_format(bytes)?;
        let image = image::load_from_memory_with_format(bytes, format)?;

        let tags = match ExifExtractor::read_tag_table(bytes) {
            Ok(table) => Some(table),
            Err(e) => {
                debug!("No tag table in {:?} input: {}", format, e);
                None
            }
        };

        Ok(Self {
            image,
            format,
            tags,
            content_credentials: has_content_credentials(bytes, format),
        })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn format_name(&self) -> String {
        match self.format {
            ImageFormat::Jpeg => "JPEG".into(),
            ImageFormat::Png => "PNG".into(),
            ImageFormat::Gif => "GIF".into(),
            ImageFormat::WebP => "WEBP".into(),
            ImageFormat::Tiff => "TIFF".into(),
            ImageFormat::Bmp => "BMP".into(),
            other => format!("{:?}", other).to_uppercase(),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn color_type(&self) -> ColorType {
        self.image.color()
    }

    pub fn tags(&self) -> Option<&TagTable> {
        self.tags.as_ref()
    }

    pub fn has_content_credentials(&self) -> bool {
        self.content_credentials
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{GrayImage, Luma};

    use super::*;
    use crate::error::ForensicsError;

    #[test]
    fn test_decodes_png_without_tags() {
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(5, 3, Luma([40])));
        let mut png = Cursor::new(Vec::new());
        gray.write_to(&mut png, ImageFormat::Png).unwrap();

        let decoded = DecodedImage::from_bytes(png.get_ref()).unwrap();

        assert_eq!(decoded.format_name(), "PNG");
        assert_eq!(decoded.dimensions(), (5, 3));
        assert_eq!(decoded.color_type(), ColorType::L8);
        assert!(decoded.tags().is_none());
        assert!(!decoded.has_content_credentials());
    }

    #[test]
    fn test_garbage_is_a_decode_error() {
        let err = DecodedImage::from_bytes(b"definitely not pixels").unwrap_err();
        assert!(matches!(err, ForensicsError::Decode(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_truncated_jpeg_is_a_decode_error() {
        let err = DecodedImage::from_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]).unwrap_err();
        assert!(err.is_fatal());
    }
}
