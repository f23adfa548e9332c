//! Luminance reduction that keeps the channel layout.

use crate::buffer::PixelBuffer;
use crate::error::Result;

/// BT.601 luma of an RGB triple: `0.299*R + 0.587*G + 0.114*B`, rounded half up.
///
/// Weights are scaled to thousandths so the result is exact and a gray input
/// (`R == G == B`) maps to itself.
#[must_use]
#[inline]
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    let sum = 299 * u32::from(r) + 587 * u32::from(g) + 114 * u32::from(b);
    #[allow(clippy::cast_possible_truncation)]
    {
        ((sum + 500) / 1000) as u8
    }
}

/// Replace R, G and B of every pixel with its luminance; alpha passes through.
///
/// # Errors
///
/// Returns [`crate::Error::UnsupportedChannels`] unless the buffer has 3 or 4 channels.
pub fn to_grayscale(buffer: &PixelBuffer) -> Result<PixelBuffer> {
    buffer.require_channels(&[3, 4], "3 or 4 (RGB/RGBA)")?;
    let mut data = buffer.as_raw().to_vec();
    for px in data.chunks_exact_mut(usize::from(buffer.channels())) {
        let l = luminance(px[0], px[1], px[2]);
        px[..3].fill(l);
    }
    PixelBuffer::new(buffer.width(), buffer.height(), buffer.channels(), data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn luminance_weights() {
        assert_eq!(luminance(0, 0, 0), 0);
        assert_eq!(luminance(255, 255, 255), 255);
        assert_eq!(luminance(255, 0, 0), 76);
        assert_eq!(luminance(0, 255, 0), 150);
        assert_eq!(luminance(0, 0, 255), 29);
    }

    #[test]
    fn grayscale_keeps_alpha() {
        let buf = PixelBuffer::new(2, 1, 4, vec![255, 0, 0, 10, 0, 0, 255, 200]).unwrap();
        let gray = to_grayscale(&buf).unwrap();
        assert_eq!(gray.as_raw(), &[76, 76, 76, 10, 29, 29, 29, 200]);
    }

    #[test]
    fn grayscale_is_idempotent() {
        let buf = PixelBuffer::from_fn(16, 16, 3, |x, y, px| {
            px[0] = u8::try_from(x * 16).unwrap();
            px[1] = u8::try_from(y * 16).unwrap();
            px[2] = u8::try_from((x * y) % 256).unwrap();
        })
        .unwrap();
        let once = to_grayscale(&buf).unwrap();
        let twice = to_grayscale(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn grayscale_rejects_single_channel() {
        let mask = PixelBuffer::filled(2, 2, &[9]).unwrap();
        assert!(matches!(
            to_grayscale(&mask),
            Err(Error::UnsupportedChannels { actual: 1, .. })
        ));
    }
}
