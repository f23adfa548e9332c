//! Mask normalization, alpha-mask conversion and simple shape generators.
//!
//! Mask convention everywhere in this crate: one 8-bit intensity channel,
//! `255` marks the region to edit and `0` the region to keep. Intermediate
//! values are partial edits.

use std::path::Path;

use image::imageops::FilterType;
use image::DynamicImage;
use log::debug;

use crate::buffer::{check_dimensions, PixelBuffer};
use crate::error::{Error, Result};

/// Mask value for "edit this pixel".
pub const MASK_EDIT: u8 = 255;
/// Mask value for "keep this pixel".
pub const MASK_KEEP: u8 = 0;

/// Axis-aligned rectangle covering `[x, x + width) x [y, y + height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: u32,
    /// Top edge (inclusive).
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Rect {
    /// Whether `(px, py)` lies inside the half-open rectangle.
    #[must_use]
    pub fn contains(&self, px: u32, py: u32) -> bool {
        let (x, y) = (u64::from(self.x), u64::from(self.y));
        (x..x + u64::from(self.width)).contains(&u64::from(px))
            && (y..y + u64::from(self.height)).contains(&u64::from(py))
    }
}

/// Disc of pixels whose distance to `(cx, cy)` is at most `radius`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Circle {
    /// Center column.
    pub cx: u32,
    /// Center row.
    pub cy: u32,
    /// Radius in pixels (boundary inclusive).
    pub radius: u32,
}

impl Circle {
    /// Whether `(px, py)` lies inside or on the circle.
    ///
    /// Compares squared distances in integers, which is exact for whole-pixel radii.
    #[must_use]
    pub fn contains(&self, px: u32, py: u32) -> bool {
        let dx = i64::from(px) - i64::from(self.cx);
        let dy = i64::from(py) - i64::from(self.cy);
        let r = i64::from(self.radius);
        dx * dx + dy * dy <= r * r
    }
}

/// Resample a mask image to `width x height` and reduce it to one intensity channel.
///
/// Color masks are reduced with the `image` crate's luma conversion before
/// resampling; single-channel masks pass through untouched. Resampling uses
/// `filter` (the pipeline default is [`FilterType::Triangle`], i.e. bilinear)
/// and is skipped when the mask already has the target size.
///
/// # Errors
///
/// Returns [`Error::InvalidDimensions`] if the source mask or the target size
/// has a zero side.
pub fn normalize(
    mask: &DynamicImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<PixelBuffer> {
    check_dimensions(mask.width(), mask.height())?;
    check_dimensions(width, height)?;
    let gray = mask.to_luma8();
    let gray = if gray.dimensions() == (width, height) {
        gray
    } else {
        debug!(
            "resampling mask {}x{} -> {width}x{height} ({filter:?})",
            gray.width(),
            gray.height()
        );
        image::imageops::resize(&gray, width, height, filter)
    };
    PixelBuffer::new(width, height, 1, gray.into_raw())
}

/// Decode an encoded mask and normalize it to `width x height`.
///
/// # Errors
///
/// Returns [`Error::InvalidImage`] if the bytes cannot be decoded.
pub fn decode_mask(
    bytes: &[u8],
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<PixelBuffer> {
    let image = image::load_from_memory(bytes).map_err(Error::InvalidImage)?;
    normalize(&image, width, height, filter)
}

/// Open a mask file and normalize it to `width x height`.
///
/// # Errors
///
/// Returns [`Error::InvalidImage`] if the file cannot be read or decoded.
pub fn load_mask(
    path: &Path,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<PixelBuffer> {
    let image = image::open(path).map_err(Error::InvalidImage)?;
    normalize(&image, width, height, filter)
}

/// Write a mask as a single-channel 8-bit image.
///
/// # Errors
///
/// Returns [`Error::UnsupportedChannels`] for a non-mask buffer, or any
/// error from [`PixelBuffer::save`].
pub fn save_mask(mask: &PixelBuffer, path: &Path) -> Result<()> {
    mask.require_channels(&[1], "1 (mask)")?;
    mask.save(path)
}

/// Convert a mask into the RGBA matte expected by edit endpoints.
///
/// Each output pixel is `[0, 0, 0, 255 - mask]`: fully transparent where the
/// mask says edit, fully opaque where it says keep, partial in between.
///
/// # Errors
///
/// Returns [`Error::UnsupportedChannels`] unless `mask` has one channel.
pub fn to_alpha_mask(mask: &PixelBuffer) -> Result<PixelBuffer> {
    mask.require_channels(&[1], "1 (mask)")?;
    let mut data = Vec::with_capacity(mask.pixel_count() * 4);
    for &m in mask.as_raw() {
        data.extend_from_slice(&[0, 0, 0, 255 - m]);
    }
    PixelBuffer::new(mask.width(), mask.height(), 4, data)
}

/// Mask with `rect` set to [`MASK_EDIT`] and everything else [`MASK_KEEP`].
///
/// Parts of `rect` outside the image are ignored.
///
/// # Errors
///
/// Returns [`Error::InvalidDimensions`] if `width` or `height` is zero.
pub fn rect_mask(width: u32, height: u32, rect: Rect) -> Result<PixelBuffer> {
    shape_mask(width, height, |x, y| rect.contains(x, y))
}

/// Mask with `circle` (boundary included) set to [`MASK_EDIT`].
///
/// # Errors
///
/// Returns [`Error::InvalidDimensions`] if `width` or `height` is zero.
pub fn circle_mask(width: u32, height: u32, circle: Circle) -> Result<PixelBuffer> {
    shape_mask(width, height, |x, y| circle.contains(x, y))
}

fn shape_mask(width: u32, height: u32, inside: impl Fn(u32, u32) -> bool) -> Result<PixelBuffer> {
    PixelBuffer::from_fn(width, height, 1, |x, y, px| {
        px[0] = if inside(x, y) { MASK_EDIT } else { MASK_KEEP };
    })
}
