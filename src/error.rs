//! Error types for the mask-inpaint crate.

/// Errors that can occur while preparing masks and composites.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The source image or mask could not be decoded.
    #[error("invalid image: {0}")]
    InvalidImage(image::ImageError),

    /// Two buffers that must align have different dimensions.
    #[error(
        "dimension mismatch: expected {}x{}, got {}x{}",
        expected.0, expected.1, actual.0, actual.1
    )]
    DimensionMismatch {
        /// Dimensions of the reference buffer `(width, height)`.
        expected: (u32, u32),
        /// Dimensions of the offending buffer `(width, height)`.
        actual: (u32, u32),
    },

    /// The sample count does not equal `width * height * channels`.
    #[error("invalid buffer layout: {len} samples for {width}x{height}x{channels}")]
    InvalidBufferLayout {
        /// Declared width in pixels.
        width: u32,
        /// Declared height in pixels.
        height: u32,
        /// Declared samples per pixel.
        channels: u8,
        /// Actual number of samples supplied.
        len: usize,
    },

    /// A buffer has a channel count the operation does not accept.
    #[error("unsupported channel count {actual} (expected {expected})")]
    UnsupportedChannels {
        /// Human-readable description of the accepted channel counts.
        expected: &'static str,
        /// Channel count that was supplied.
        actual: u8,
    },

    /// Width or height is zero.
    #[error("invalid dimensions {width}x{height}: both must be positive")]
    InvalidDimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An error occurred while encoding or saving an image.
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// The generation service reported a failure.
    #[error("generation service error: {0}")]
    Service(String),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let io_err = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(io_err.to_string().contains("gone"));

        let unsupported = Error::UnsupportedFormat("tiff".to_string());
        assert!(unsupported.to_string().contains("tiff"));

        let mismatch = Error::DimensionMismatch {
            expected: (10, 20),
            actual: (30, 40),
        };
        let msg = mismatch.to_string();
        assert!(msg.contains("10x20"));
        assert!(msg.contains("30x40"));

        let layout = Error::InvalidBufferLayout {
            width: 2,
            height: 2,
            channels: 4,
            len: 15,
        };
        assert!(layout.to_string().contains("15 samples for 2x2x4"));
    }
}
