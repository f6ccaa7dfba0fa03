//! Core utilities shared by the detectors.
//!
//! This module provides:
//! - Stored channel layout (BGR) and channel lookup
//! - Format validation for 3-channel u8 images
//! - Mask helpers: per-channel predicates, counting, and color overlay

use std::fmt;

use ndarray::{aview1, Array2, Array3, ArrayView2, ArrayView3, Axis, Zip};

use crate::error::{Error, Result};

/// Number of channels every detector expects.
pub const STORED_CHANNELS: usize = 3;

/// Default highlight color, red in stored (BGR) order.
pub const HIGHLIGHT_RED: [u8; 3] = [0, 0, 255];

/// A color channel, addressed by its position in stored (BGR) order.
///
/// Decoded images keep the channel-reversed layout, so blue sits at index 0
/// and red at index 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Blue,
    Green,
    Red,
}

impl Channel {
    /// Index of this channel along the last image axis.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Channel::Blue => 0,
            Channel::Green => 1,
            Channel::Red => 2,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::Blue => "blue",
            Channel::Green => "green",
            Channel::Red => "red",
        };
        f.write_str(name)
    }
}

/// Reject anything that is not a (height, width, 3) image.
pub fn ensure_bgr(image: &ArrayView3<u8>) -> Result<()> {
    let (_, _, channels) = image.dim();
    if channels != STORED_CHANNELS {
        return Err(Error::InvalidImageFormat(channels));
    }
    Ok(())
}

/// View of a single stored channel as a 2D grid.
#[inline]
pub fn channel_view<'a>(image: &'a ArrayView3<'_, u8>, channel: Channel) -> ArrayView2<'a, u8> {
    image.index_axis(Axis(2), channel.index())
}

/// Boolean grid of `predicate` evaluated on one channel.
pub fn channel_mask<F>(image: &ArrayView3<u8>, channel: Channel, predicate: F) -> Array2<bool>
where
    F: Fn(u8) -> bool,
{
    channel_view(image, channel).mapv(predicate)
}

/// Number of set cells in a mask.
pub fn mask_count(mask: &Array2<bool>) -> usize {
    mask.iter().filter(|&&hit| hit).count()
}

/// Copy `image` and paint every masked pixel with `color`.
///
/// # Arguments
/// * `image` - Image of shape (height, width, 3)
/// * `mask` - Boolean grid of shape (height, width)
/// * `color` - Replacement value in stored channel order
///
/// # Returns
/// New image; unmasked pixels are copied exactly
pub fn overlay_mask(image: ArrayView3<u8>, mask: &Array2<bool>, color: [u8; 3]) -> Array3<u8> {
    let mut output = image.to_owned();
    let color = aview1(&color);

    Zip::from(output.lanes_mut(Axis(2)))
        .and(mask)
        .for_each(|mut pixel, &hit| {
            if hit {
                pixel.assign(&color);
            }
        });

    output
}
