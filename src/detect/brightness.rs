//! Brightness highlighter: near-white detection with a luminance gate.
//!
//! A pixel is flagged when its weighted luminance and each of its three
//! channels are strictly above [`BRIGHT_THRESHOLD`]. Flagged pixels are
//! replaced by the highlight color; everything else is copied as-is.
//!
//! ## Channel Order
//!
//! Images are stored BGR. Luminance uses the BT.601 weights applied to
//! stored indices 2, 1, 0:
//!
//! `Y = 0.299 * c[2] + 0.587 * c[1] + 0.114 * c[0]`
//!
//! The per-channel gates already imply `Y > 200`; luminance is still
//! evaluated as a fourth gate.

use ndarray::{Array2, Array3, ArrayView3, Zip};

use super::core::{channel_mask, channel_view, ensure_bgr, mask_count, overlay_mask, Channel};
use crate::error::Result;

/// ITU-R BT.601 luma weights
const LUMA_R: f64 = 0.299;
const LUMA_G: f64 = 0.587;
const LUMA_B: f64 = 0.114;

/// Strict lower bound for luminance and every channel.
pub const BRIGHT_THRESHOLD: u8 = 200;

/// Brightness highlight result with metadata.
#[derive(Debug, Clone)]
pub struct Highlight {
    /// Output image (same shape as input)
    pub image: Array3<u8>,
    /// Pixels that passed all four gates
    pub mask: Array2<bool>,
    /// Number of highlighted pixels
    pub pixel_count: usize,
}

impl Highlight {
    /// True when at least one pixel was highlighted.
    pub fn detected(&self) -> bool {
        self.pixel_count > 0
    }
}

/// Per-pixel luminance of a BGR image.
pub fn luminance(image: &ArrayView3<u8>) -> Array2<f64> {
    let r = channel_view(image, Channel::Red);
    let g = channel_view(image, Channel::Green);
    let b = channel_view(image, Channel::Blue);

    Zip::from(&r)
        .and(&g)
        .and(&b)
        .map_collect(|&r, &g, &b| LUMA_R * r as f64 + LUMA_G * g as f64 + LUMA_B * b as f64)
}

/// Mask of pixels where luminance and all channels exceed the threshold.
pub fn bright_mask(image: &ArrayView3<u8>) -> Result<Array2<bool>> {
    ensure_bgr(image)?;

    let threshold = BRIGHT_THRESHOLD as f64;
    let above = |v: u8| v > BRIGHT_THRESHOLD;

    let mask = luminance(image).mapv(|y| y > threshold)
        & &channel_mask(image, Channel::Red, above)
        & &channel_mask(image, Channel::Green, above)
        & &channel_mask(image, Channel::Blue, above);

    Ok(mask)
}

/// Highlight near-white pixels.
///
/// # Arguments
/// * `image` - BGR image (height, width, 3)
/// * `color` - Highlight color in stored (BGR) order
///
/// # Returns
/// Copy of the image with qualifying pixels set to `color`
///
/// # Errors
/// `InvalidImageFormat` if the image does not have exactly 3 channels
pub fn highlight_bright(image: ArrayView3<u8>, color: [u8; 3]) -> Result<Array3<u8>> {
    Ok(highlight_bright_detailed(image, color)?.image)
}

/// Highlight near-white pixels and report the mask.
pub fn highlight_bright_detailed(image: ArrayView3<u8>, color: [u8; 3]) -> Result<Highlight> {
    let mask = bright_mask(&image)?;
    let pixel_count = mask_count(&mask);
    let image = overlay_mask(image, &mask, color);

    Ok(Highlight {
        image,
        mask,
        pixel_count,
    })
}
