//! Mask boundary detection with a 3x3 Laplacian.
//!
//! - Kernel: center `+8`, the eight neighbours `-1`.
//! - Border policy: edge replication. Out-of-image neighbours take the value
//!   of the nearest in-image pixel, so the image perimeter never reports an
//!   edge caused by the frame itself. A mask region that touches the image
//!   border therefore has no ring drawn along that border.
//! - The signed response is clamped to `0..=255` before thresholding. Only the
//!   bright (edit) side of a boundary responds positively, which keeps the ring
//!   on or inside the edit region.
//!
//! The output is a decorative overlay, not a matte.

use log::debug;

use crate::buffer::PixelBuffer;
use crate::error::Result;

/// Default cutoff on the clamped response.
pub const DEFAULT_EDGE_THRESHOLD: u8 = 50;

type Kernel3 = [[i32; 3]; 3];

const LAPLACIAN_KERNEL: Kernel3 = [[-1, -1, -1], [-1, 8, -1], [-1, -1, -1]];

/// Raw Laplacian response at `(x, y)`, clamped to `0..=255`.
fn response(data: &[u8], w: usize, h: usize, x: usize, y: usize) -> u8 {
    let ys = [y.saturating_sub(1), y, (y + 1).min(h - 1)];
    let xs = [x.saturating_sub(1), x, (x + 1).min(w - 1)];

    let mut sum = 0i32;
    for (ky, &yy) in ys.iter().enumerate() {
        let row = &data[yy * w..(yy + 1) * w];
        for (kx, &xx) in xs.iter().enumerate() {
            sum += LAPLACIAN_KERNEL[ky][kx] * i32::from(row[xx]);
        }
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        sum.clamp(0, 255) as u8
    }
}

/// Mark pixels whose Laplacian response exceeds `threshold` as `255`, all others `0`.
///
/// # Errors
///
/// Returns [`crate::Error::UnsupportedChannels`] unless `mask` has one channel.
pub fn detect_edges(mask: &PixelBuffer, threshold: u8) -> Result<PixelBuffer> {
    mask.require_channels(&[1], "1 (mask)")?;
    let w = mask.width() as usize;
    let h = mask.height() as usize;
    let data = mask.as_raw();

    let mut out = vec![0u8; w * h];
    for y in 0..h {
        let out_row = &mut out[y * w..(y + 1) * w];
        for (x, o) in out_row.iter_mut().enumerate() {
            if response(data, w, h, x, y) > threshold {
                *o = 255;
            }
        }
    }

    debug!(
        "edge detection on {w}x{h} mask: {} edge pixels (threshold {threshold})",
        out.iter().filter(|&&v| v != 0).count()
    );
    PixelBuffer::new(mask.width(), mask.height(), 1, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::{rect_mask, Rect};

    #[test]
    fn uniform_masks_have_no_edges() {
        for value in [0u8, 128, 255] {
            let mask = PixelBuffer::filled(7, 5, &[value]).unwrap();
            let edges = detect_edges(&mask, DEFAULT_EDGE_THRESHOLD).unwrap();
            assert!(edges.as_raw().iter().all(|&v| v == 0), "value {value}");
        }
    }

    #[test]
    fn rectangle_yields_ring_on_its_perimeter() {
        let rect = Rect {
            x: 4,
            y: 3,
            width: 6,
            height: 5,
        };
        let mask = rect_mask(16, 12, rect).unwrap();
        let edges = detect_edges(&mask, DEFAULT_EDGE_THRESHOLD).unwrap();

        for y in 0..12 {
            for x in 0..16 {
                let on_perimeter = rect.contains(x, y)
                    && (x == 4 || x == 9 || y == 3 || y == 7);
                let expected = if on_perimeter { 255 } else { 0 };
                assert_eq!(edges.sample(x, y, 0), Some(expected), "({x},{y})");
            }
        }
    }

    #[test]
    fn region_touching_border_has_no_ring_on_the_frame() {
        let rect = Rect {
            x: 0,
            y: 0,
            width: 3,
            height: 8,
        };
        let mask = rect_mask(8, 8, rect).unwrap();
        let edges = detect_edges(&mask, DEFAULT_EDGE_THRESHOLD).unwrap();
        for y in 0..8 {
            assert_eq!(edges.sample(0, y, 0), Some(0));
            assert_eq!(edges.sample(2, y, 0), Some(255));
        }
    }

    #[test]
    fn threshold_filters_weak_responses() {
        // A step of 10 gives 8*10 - 5*10 = 30 on the bright side.
        let mask = PixelBuffer::from_fn(6, 6, 1, |x, _, px| {
            px[0] = if x >= 3 { 10 } else { 0 };
        })
        .unwrap();
        let edges = detect_edges(&mask, DEFAULT_EDGE_THRESHOLD).unwrap();
        assert!(edges.as_raw().iter().all(|&v| v == 0));

        let edges = detect_edges(&mask, 20).unwrap();
        assert_eq!(edges.sample(3, 2, 0), Some(255));
        assert_eq!(edges.sample(2, 2, 0), Some(0));
    }

    #[test]
    fn rejects_color_input() {
        let rgb = PixelBuffer::filled(3, 3, &[0, 0, 0]).unwrap();
        assert!(detect_edges(&rgb, DEFAULT_EDGE_THRESHOLD).is_err());
    }
}
