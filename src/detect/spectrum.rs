//! Spectrum matching: inclusive per-channel color ranges.
//!
//! A [`Spectrum`] is three closed intervals, one per color channel. A pixel
//! matches when every channel lies inside its interval. The combined mask
//! is the AND of three per-channel boolean grids.

use std::fmt;
use std::str::FromStr;

use ndarray::{Array2, Array3, ArrayView3};

use super::core::{channel_mask, ensure_bgr, mask_count, overlay_mask, Channel, HIGHLIGHT_RED};
use crate::error::{Error, Result};

/// Closed interval `[min, max]` over one 8-bit channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelRange {
    min: u8,
    max: u8,
}

impl ChannelRange {
    /// The whole 0-255 range.
    pub const FULL: ChannelRange = ChannelRange { min: 0, max: 255 };

    /// Create a range, rejecting `min > max`.
    pub fn new(channel: Channel, min: u8, max: u8) -> Result<Self> {
        if min > max {
            return Err(Error::InvalidRange { channel, min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> u8 {
        self.min
    }

    pub fn max(&self) -> u8 {
        self.max
    }

    #[inline]
    pub fn contains(&self, value: u8) -> bool {
        self.min <= value && value <= self.max
    }
}

impl fmt::Display for ChannelRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

/// Named set of red, green, and blue ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spectrum {
    pub name: String,
    pub red: ChannelRange,
    pub green: ChannelRange,
    pub blue: ChannelRange,
}

impl Spectrum {
    /// Build a spectrum from `(min, max)` pairs given in display order (R, G, B).
    pub fn new(
        name: impl Into<String>,
        red: (u8, u8),
        green: (u8, u8),
        blue: (u8, u8),
    ) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            red: ChannelRange::new(Channel::Red, red.0, red.1)?,
            green: ChannelRange::new(Channel::Green, green.0, green.1)?,
            blue: ChannelRange::new(Channel::Blue, blue.0, blue.1)?,
        })
    }

    /// Range for a given channel.
    pub fn range(&self, channel: Channel) -> ChannelRange {
        match channel {
            Channel::Red => self.red,
            Channel::Green => self.green,
            Channel::Blue => self.blue,
        }
    }

    /// Whether a single pixel given in stored (BGR) order matches.
    pub fn matches_bgr(&self, pixel: [u8; 3]) -> bool {
        self.blue.contains(pixel[0]) && self.green.contains(pixel[1]) && self.red.contains(pixel[2])
    }

    /// The three built-in options, strictest first.
    ///
    /// | Option | R | G | B |
    /// |--------|---|---|---|
    /// | strict | 150-255 | 200-255 | 0-80 |
    /// | moderate | 120-255 | 150-255 | 0-100 |
    /// | broad | 100-255 | 100-255 | 0-120 |
    pub fn default_options() -> Vec<Spectrum> {
        vec![
            Spectrum::preset("strict", (150, 255), (200, 255), (0, 80)),
            Spectrum::preset("moderate", (120, 255), (150, 255), (0, 100)),
            Spectrum::preset("broad", (100, 255), (100, 255), (0, 120)),
        ]
    }

    // Presets are known-valid, so ranges are built directly.
    fn preset(name: &str, red: (u8, u8), green: (u8, u8), blue: (u8, u8)) -> Spectrum {
        let range = |(min, max): (u8, u8)| ChannelRange { min, max };
        Spectrum {
            name: name.to_string(),
            red: range(red),
            green: range(green),
            blue: range(blue),
        }
    }
}

impl fmt::Display for Spectrum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (R {}, G {}, B {})",
            self.name, self.red, self.green, self.blue
        )
    }
}

/// Parses `r=150-255,g=200-255,b=0-80[,name=strict]`.
///
/// All three channels are required. Without a `name`, the spectrum is named
/// after its ranges.
impl FromStr for Spectrum {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut name = None;
        let mut ranges: [Option<(u8, u8)>; 3] = [None, None, None];

        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| format!("expected key=value, got '{part}'"))?;

            let slot = match key.trim().to_ascii_lowercase().as_str() {
                "name" => {
                    name = Some(value.trim().to_string());
                    continue;
                }
                "r" | "red" => 0,
                "g" | "green" => 1,
                "b" | "blue" => 2,
                other => return Err(format!("unknown spectrum key '{other}'")),
            };
            ranges[slot] = Some(parse_bounds(value)?);
        }

        let [red, green, blue] = ranges;
        let red = red.ok_or("missing r=min-max")?;
        let green = green.ok_or("missing g=min-max")?;
        let blue = blue.ok_or("missing b=min-max")?;

        let name = name.unwrap_or_else(|| {
            format!(
                "R{}-{} G{}-{} B{}-{}",
                red.0, red.1, green.0, green.1, blue.0, blue.1
            )
        });

        Spectrum::new(name, red, green, blue).map_err(|e| e.to_string())
    }
}

fn parse_bounds(value: &str) -> std::result::Result<(u8, u8), String> {
    let (min, max) = value
        .trim()
        .split_once('-')
        .ok_or_else(|| format!("expected min-max, got '{value}'"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<u8>()
            .map_err(|e| format!("invalid bound '{v}': {e}"))
    };
    Ok((parse(min)?, parse(max)?))
}

/// Mask of pixels whose three channels all fall inside `spectrum`.
pub fn spectrum_mask(image: &ArrayView3<u8>, spectrum: &Spectrum) -> Result<Array2<bool>> {
    ensure_bgr(image)?;

    let in_range = |channel: Channel| {
        let range = spectrum.range(channel);
        channel_mask(image, channel, move |v| range.contains(v))
    };

    Ok(in_range(Channel::Red) & &in_range(Channel::Green) & &in_range(Channel::Blue))
}

/// Apply a spectrum with the default red highlight.
///
/// # Returns
/// `(image, matched)`: the image has masked pixels painted red when
/// `matched` is true, and is an unmodified copy otherwise
pub fn apply_spectrum(image: ArrayView3<u8>, spectrum: &Spectrum) -> Result<(Array3<u8>, bool)> {
    apply_spectrum_colored(image, spectrum, HIGHLIGHT_RED)
}

/// Apply a spectrum with an explicit highlight color (stored order).
pub fn apply_spectrum_colored(
    image: ArrayView3<u8>,
    spectrum: &Spectrum,
    color: [u8; 3],
) -> Result<(Array3<u8>, bool)> {
    let (output, pixel_count) = apply_spectrum_counted(image, spectrum, color)?;
    Ok((output, pixel_count > 0))
}

/// Same as [`apply_spectrum_colored`], reporting the matched pixel count.
pub(crate) fn apply_spectrum_counted(
    image: ArrayView3<u8>,
    spectrum: &Spectrum,
    color: [u8; 3],
) -> Result<(Array3<u8>, usize)> {
    let mask = spectrum_mask(&image, spectrum)?;
    let pixel_count = mask_count(&mask);

    let output = if pixel_count > 0 {
        overlay_mask(image, &mask, color)
    } else {
        image.to_owned()
    };
    Ok((output, pixel_count))
}
