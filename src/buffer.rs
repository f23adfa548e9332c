//! Typed raw pixel buffers and their decode/encode boundary.
//!
//! A [`PixelBuffer`] is a row-major run of 8-bit samples with no row padding.
//! It carries its own `width`, `height` and `channels` so that every stage of
//! the pipeline can check layouts instead of trusting index arithmetic.
//! Supported channel counts are 1 (intensity), 3 (RGB) and 4 (RGBA).

use std::io::Cursor;
use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage, RgbaImage};

use crate::error::{Error, Result};

/// Formats [`PixelBuffer::save`] can write.
pub const SAVE_FORMATS: [ImageFormat; 4] = [
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::WebP,
    ImageFormat::Bmp,
];

/// An owned, immutable-by-convention pixel buffer with a validated layout.
///
/// Invariant: `as_raw().len() == width * height * channels`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw samples after checking them against the declared layout.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidDimensions`] if `width` or `height` is zero.
    /// - [`Error::UnsupportedChannels`] if `channels` is not 1, 3 or 4.
    /// - [`Error::InvalidBufferLayout`] if `data.len()` does not match.
    pub fn new(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Result<Self> {
        check_dimensions(width, height)?;
        if !matches!(channels, 1 | 3 | 4) {
            return Err(Error::UnsupportedChannels {
                expected: "1, 3 or 4",
                actual: channels,
            });
        }
        if data.len() != sample_count(width, height, channels) {
            return Err(Error::InvalidBufferLayout {
                width,
                height,
                channels,
                len: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Create a buffer where every pixel equals `pixel`.
    ///
    /// The channel count is taken from `pixel.len()`.
    ///
    /// # Errors
    ///
    /// Same as [`PixelBuffer::new`].
    pub fn filled(width: u32, height: u32, pixel: &[u8]) -> Result<Self> {
        let channels = u8::try_from(pixel.len()).unwrap_or(u8::MAX);
        check_dimensions(width, height)?;
        let data = pixel.repeat(width as usize * height as usize);
        Self::new(width, height, channels, data)
    }

    /// Create a buffer by calling `f(x, y, pixel)` for every pixel in row-major order.
    ///
    /// `pixel` starts zeroed and has exactly `channels` samples.
    ///
    /// # Errors
    ///
    /// Same as [`PixelBuffer::new`].
    pub fn from_fn<F>(width: u32, height: u32, channels: u8, mut f: F) -> Result<Self>
    where
        F: FnMut(u32, u32, &mut [u8]),
    {
        check_dimensions(width, height)?;
        let mut data = vec![0u8; sample_count(width, height, channels)];
        if channels > 0 {
            for (i, px) in data.chunks_exact_mut(usize::from(channels)).enumerate() {
                #[allow(clippy::cast_possible_truncation)]
                let (x, y) = ((i % width as usize) as u32, (i / width as usize) as u32);
                f(x, y, px);
            }
        }
        Self::new(width, height, channels, data)
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Samples per pixel.
    #[must_use]
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Number of pixels (`width * height`).
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// The raw samples, row-major.
    #[must_use]
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    /// Consume the buffer and return its samples.
    #[must_use]
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Iterate over pixels as `channels`-long slices.
    pub fn pixels(&self) -> std::slice::ChunksExact<'_, u8> {
        self.data.chunks_exact(usize::from(self.channels))
    }

    /// The samples of pixel `(x, y)`, or `None` when out of bounds.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let c = usize::from(self.channels);
        let start = (y as usize * self.width as usize + x as usize) * c;
        self.data.get(start..start + c)
    }

    /// Sample `channel` of pixel `(x, y)`, or `None` when out of bounds.
    #[must_use]
    pub fn sample(&self, x: u32, y: u32, channel: u8) -> Option<u8> {
        self.pixel(x, y)
            .and_then(|px| px.get(usize::from(channel)).copied())
    }

    /// Fail with [`Error::UnsupportedChannels`] unless `channels` is one of `accepted`.
    pub(crate) fn require_channels(&self, accepted: &[u8], expected: &'static str) -> Result<()> {
        if accepted.contains(&self.channels) {
            Ok(())
        } else {
            Err(Error::UnsupportedChannels {
                expected,
                actual: self.channels,
            })
        }
    }

    /// Fail with [`Error::DimensionMismatch`] unless `other` has the same size.
    pub(crate) fn require_same_dimensions(&self, other: &Self) -> Result<()> {
        if self.dimensions() == other.dimensions() {
            Ok(())
        } else {
            Err(Error::DimensionMismatch {
                expected: self.dimensions(),
                actual: other.dimensions(),
            })
        }
    }

    /// Convert a decoded image, keeping 1-, 3- and 4-channel 8-bit layouts as-is.
    ///
    /// 16-bit and float images are reduced to 8 bits; luma+alpha and other
    /// layouts become RGBA.
    #[must_use]
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        match image {
            DynamicImage::ImageLuma8(gray) => Self::from_gray(gray),
            DynamicImage::ImageLuma16(_) => Self::from_gray(&image.to_luma8()),
            DynamicImage::ImageRgb8(rgb) => Self::from_rgb(rgb),
            DynamicImage::ImageRgb16(_) | DynamicImage::ImageRgb32F(_) => {
                Self::from_rgb(&image.to_rgb8())
            }
            DynamicImage::ImageRgba8(rgba) => Self::from_rgba(rgba),
            _ => Self::from_rgba(&image.to_rgba8()),
        }
    }

    /// Convert any decoded image to a 3-channel RGB buffer.
    #[must_use]
    pub fn rgb_from_dynamic(image: &DynamicImage) -> Self {
        Self::from_rgb(&image.to_rgb8())
    }

    /// Convert any decoded image to a 4-channel RGBA buffer.
    #[must_use]
    pub fn rgba_from_dynamic(image: &DynamicImage) -> Self {
        Self::from_rgba(&image.to_rgba8())
    }

    fn from_gray(img: &GrayImage) -> Self {
        Self::from_parts(img.width(), img.height(), 1, img.as_raw().clone())
    }

    fn from_rgb(img: &RgbImage) -> Self {
        Self::from_parts(img.width(), img.height(), 3, img.as_raw().clone())
    }

    fn from_rgba(img: &RgbaImage) -> Self {
        Self::from_parts(img.width(), img.height(), 4, img.as_raw().clone())
    }

    /// Layout already guaranteed by an `image::ImageBuffer`.
    fn from_parts(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), sample_count(width, height, channels));
        Self {
            width,
            height,
            channels,
            data,
        }
    }

    /// Decode an encoded image (any format the `image` crate understands).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidImage`] if the bytes cannot be decoded, and
    /// [`Error::InvalidDimensions`] for a zero-sized image.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes).map_err(Error::InvalidImage)?;
        check_dimensions(image.width(), image.height())?;
        Ok(Self::from_dynamic(&image))
    }

    /// Decode an encoded image and resample it to `width x height`.
    ///
    /// # Errors
    ///
    /// Same as [`PixelBuffer::decode`], plus [`Error::InvalidDimensions`]
    /// for a zero target size.
    pub fn decode_with_size(
        bytes: &[u8],
        width: u32,
        height: u32,
        filter: FilterType,
    ) -> Result<Self> {
        check_dimensions(width, height)?;
        let image = image::load_from_memory(bytes).map_err(Error::InvalidImage)?;
        check_dimensions(image.width(), image.height())?;
        let image = if image.width() == width && image.height() == height {
            image
        } else {
            image.resize_exact(width, height, filter)
        };
        Ok(Self::from_dynamic(&image))
    }

    /// Open and decode an image file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidImage`] if the file cannot be read or decoded.
    pub fn open(path: &Path) -> Result<Self> {
        let image = image::open(path).map_err(Error::InvalidImage)?;
        check_dimensions(image.width(), image.height())?;
        Ok(Self::from_dynamic(&image))
    }

    /// Convert back into an `image` crate value for encoding.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBufferLayout`] if the samples no longer fit the
    /// declared layout (cannot happen for buffers built through this API).
    pub fn to_dynamic(&self) -> Result<DynamicImage> {
        let (w, h) = self.dimensions();
        let data = self.data.clone();
        let image = match self.channels {
            1 => GrayImage::from_raw(w, h, data).map(DynamicImage::ImageLuma8),
            3 => RgbImage::from_raw(w, h, data).map(DynamicImage::ImageRgb8),
            4 => RgbaImage::from_raw(w, h, data).map(DynamicImage::ImageRgba8),
            _ => None,
        };
        image.ok_or(Error::InvalidBufferLayout {
            width: w,
            height: h,
            channels: self.channels,
            len: self.data.len(),
        })
    }

    /// Encode into an in-memory image container.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Image`] if the encoder rejects the buffer.
    pub fn encode(&self, format: ImageFormat) -> Result<Vec<u8>> {
        let image = self.prepare_for(format)?;
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, format)?;
        Ok(out.into_inner())
    }

    /// Encode as PNG, the lossless format used for every mask artifact.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Image`] if encoding fails.
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        self.encode(ImageFormat::Png)
    }

    /// Save to `path`, picking the format from its extension.
    ///
    /// JPEG output drops the alpha channel and is written at quality 100.
    ///
    /// # Errors
    ///
    /// Returns an error if the format is unsupported or writing fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        let format =
            ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;
        if !SAVE_FORMATS.contains(&format) {
            return Err(Error::UnsupportedFormat(format!("{format:?}")));
        }

        let image = self.prepare_for(format)?;
        if format == ImageFormat::Jpeg {
            let file = std::fs::File::create(path)?;
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(file, 100);
            image.write_with_encoder(encoder)?;
        } else {
            image.save(path)?;
        }

        Ok(())
    }

    /// JPEG has no alpha channel; everything else takes the buffer as-is.
    fn prepare_for(&self, format: ImageFormat) -> Result<DynamicImage> {
        let image = self.to_dynamic()?;
        if format == ImageFormat::Jpeg && self.channels == 4 {
            Ok(DynamicImage::ImageRgb8(image.to_rgb8()))
        } else {
            Ok(image)
        }
    }
}

pub(crate) fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        Err(Error::InvalidDimensions { width, height })
    } else {
        Ok(())
    }
}

fn sample_count(width: u32, height: u32, channels: u8) -> usize {
    width as usize * height as usize * usize::from(channels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_length_mismatch() {
        let err = PixelBuffer::new(2, 2, 3, vec![0; 11]).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidBufferLayout {
                width: 2,
                height: 2,
                channels: 3,
                len: 11
            }
        ));
    }

    #[test]
    fn new_rejects_zero_dimensions_and_odd_channels() {
        assert!(matches!(
            PixelBuffer::new(0, 4, 1, vec![]),
            Err(Error::InvalidDimensions { .. })
        ));
        assert!(matches!(
            PixelBuffer::new(1, 1, 2, vec![0, 0]),
            Err(Error::UnsupportedChannels { actual: 2, .. })
        ));
    }

    #[test]
    fn pixel_accessors_are_bounds_checked() {
        let buf = PixelBuffer::from_fn(3, 2, 3, |x, y, px| {
            px[0] = u8::try_from(x).unwrap();
            px[1] = u8::try_from(y).unwrap();
            px[2] = 7;
        })
        .unwrap();

        assert_eq!(buf.pixel(2, 1), Some(&[2, 1, 7][..]));
        assert_eq!(buf.sample(1, 0, 0), Some(1));
        assert_eq!(buf.pixel(3, 0), None);
        assert_eq!(buf.pixel(0, 2), None);
        assert_eq!(buf.sample(0, 0, 3), None);
    }

    #[test]
    fn filled_repeats_pixel() {
        let buf = PixelBuffer::filled(2, 3, &[1, 2, 3, 4]).unwrap();
        assert_eq!(buf.channels(), 4);
        assert_eq!(buf.as_raw().len(), 24);
        assert!(buf.pixels().all(|px| px == [1, 2, 3, 4]));
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = PixelBuffer::decode(&[0xFF, 0xFE, 0x00, 0x01]).unwrap_err();
        assert!(matches!(err, Error::InvalidImage(_)));
    }

    #[test]
    fn png_encode_preserves_layout() {
        for channels in [1u8, 3, 4] {
            let buf = PixelBuffer::from_fn(5, 4, channels, |x, y, px| {
                for (c, s) in px.iter_mut().enumerate() {
                    *s = u8::try_from((x * 40 + y * 10) as usize + c).unwrap();
                }
            })
            .unwrap();
            let decoded = PixelBuffer::decode(&buf.encode_png().unwrap()).unwrap();
            assert_eq!(decoded, buf, "channels = {channels}");
        }
    }

    #[test]
    fn decode_with_size_resamples() {
        let buf = PixelBuffer::filled(8, 8, &[10, 20, 30]).unwrap();
        let png = buf.encode_png().unwrap();
        let resized = PixelBuffer::decode_with_size(&png, 4, 2, FilterType::Triangle).unwrap();
        assert_eq!(resized.dimensions(), (4, 2));
        assert!(resized.pixels().all(|px| px == [10, 20, 30]));
    }

    #[test]
    fn save_jpeg_drops_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jpg");
        PixelBuffer::filled(4, 4, &[200, 100, 50, 255])
            .unwrap()
            .save(&path)
            .unwrap();
        let back = PixelBuffer::open(&path).unwrap();
        assert_eq!(back.channels(), 3);
        assert_eq!(back.dimensions(), (4, 4));
    }

    #[test]
    fn save_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let buf = PixelBuffer::filled(1, 1, &[0]).unwrap();
        assert!(matches!(
            buf.save(&dir.path().join("mask.xyz")),
            Err(Error::UnsupportedFormat(_))
        ));
    }
}
