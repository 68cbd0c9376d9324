use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForensicsError {
    #[error("Image decoding error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Metadata unavailable: {0}")]
    MetadataUnavailable(String),

    #[error("ELA unavailable: {0}")]
    ElaUnavailable(String),

    #[error("Image too small for analysis (minimum: {0}x{0})")]
    ImageTooSmall(u32),
}

impl ForensicsError {
    /// Only decode or read failures abort a whole analysis.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ForensicsError::Decode(_) | ForensicsError::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, ForensicsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_decode_and_read_failures_are_fatal() {
        let read = ForensicsError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(read.is_fatal());

        for degraded in [
            ForensicsError::InvalidParameter("quality".into()),
            ForensicsError::MetadataUnavailable("no exif".into()),
            ForensicsError::ElaUnavailable("re-encode failed".into()),
            ForensicsError::ImageTooSmall(3),
        ] {
            assert!(!degraded.is_fatal(), "{} should degrade", degraded);
        }
    }
}
