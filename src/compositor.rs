//! Mask-weighted blending between an original and a derived image.
//!
//! For every pixel with mask value `m` the compositor computes
//! `out = original * (1 - m/255) + derived * (m/255)`
//! and forces alpha to 255. An optional edge overlay paints marked pixels a
//! fixed color on top. The plain grayscale-zone composite and the bordered
//! composite are this one function with and without the overlay.

use crate::buffer::PixelBuffer;
use crate::error::{Error, Result};

/// Default overlay color: pure red.
pub const DEFAULT_EDGE_COLOR: [u8; 3] = [255, 0, 0];

/// Pixels to paint over the blend, and the color to paint them.
#[derive(Debug, Clone, Copy)]
pub struct EdgeOverlay<'a> {
    /// Single-channel buffer; any nonzero sample is painted.
    pub edges: &'a PixelBuffer,
    /// RGB color written to marked pixels.
    pub color: [u8; 3],
}

impl<'a> EdgeOverlay<'a> {
    /// Overlay `edges` in [`DEFAULT_EDGE_COLOR`].
    #[must_use]
    pub fn new(edges: &'a PixelBuffer) -> Self {
        Self {
            edges,
            color: DEFAULT_EDGE_COLOR,
        }
    }

    /// Use `color` instead of the default.
    #[must_use]
    pub fn with_color(mut self, color: [u8; 3]) -> Self {
        self.color = color;
        self
    }
}

/// Linear interpolation of one 8-bit sample, rounded half up.
///
/// Evaluates `(o*(255-m) + d*m) / 255` exactly in integers, so equal inputs
/// always produce equal bytes, `m == 0` yields `o` and `m == 255` yields `d`.
#[inline]
#[must_use]
pub fn blend_channel(original: u8, derived: u8, mask: u8) -> u8 {
    let m = u32::from(mask);
    let num = u32::from(original) * (255 - m) + u32::from(derived) * m;
    #[allow(clippy::cast_possible_truncation)]
    {
        ((2 * num + 255) / 510) as u8
    }
}

/// Blend `original` toward `derived` by `mask`, optionally painting an edge overlay.
///
/// The result always has four channels with alpha 255.
///
/// # Errors
///
/// - [`Error::UnsupportedChannels`] if `original` is not RGB/RGBA, `derived`
///   has a different channel count, or `mask`/overlay are not single-channel.
/// - [`Error::DimensionMismatch`] if any input differs in size from `original`.
pub fn composite(
    original: &PixelBuffer,
    derived: &PixelBuffer,
    mask: &PixelBuffer,
    overlay: Option<EdgeOverlay<'_>>,
) -> Result<PixelBuffer> {
    original.require_channels(&[3, 4], "3 or 4 (RGB/RGBA)")?;
    if derived.channels() != original.channels() {
        return Err(Error::UnsupportedChannels {
            expected: "the original image's channel count",
            actual: derived.channels(),
        });
    }
    mask.require_channels(&[1], "1 (mask)")?;
    original.require_same_dimensions(derived)?;
    original.require_same_dimensions(mask)?;
    if let Some(overlay) = &overlay {
        overlay.edges.require_channels(&[1], "1 (edge map)")?;
        original.require_same_dimensions(overlay.edges)?;
    }

    let mut data = Vec::with_capacity(original.pixel_count() * 4);
    for (i, ((o, d), &m)) in original
        .pixels()
        .zip(derived.pixels())
        .zip(mask.as_raw())
        .enumerate()
    {
        match overlay {
            Some(EdgeOverlay { edges, color }) if edges.as_raw()[i] != 0 => {
                data.extend_from_slice(&color);
            }
            _ => {
                let blended = o[..3].iter().zip(&d[..3]).map(|(&o, &d)| blend_channel(o, d, m));
                data.extend(blended);
            }
        }
        data.push(255);
    }

    PixelBuffer::new(original.width(), original.height(), 4, data)
}
