//! Priority fallback across an ordered list of spectra.
//!
//! Spectra are tried strictest first. The first one that matches at least
//! one pixel wins and later spectra are never evaluated. When the list is
//! exhausted the image passes through unchanged.

use ndarray::{Array3, ArrayView3};

use super::core::{ensure_bgr, HIGHLIGHT_RED};
use super::spectrum::{apply_spectrum_counted, Spectrum};
use crate::error::Result;

/// Search position while walking the spectrum list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    /// Evaluating spectrum `i`
    Trying(usize),
    /// Spectrum `i` matched (terminal)
    Matched(usize),
    /// No spectrum matched (terminal)
    Exhausted,
}

impl SearchState {
    /// Initial state for a list of `len` spectra.
    pub fn start(len: usize) -> Self {
        if len == 0 {
            SearchState::Exhausted
        } else {
            SearchState::Trying(0)
        }
    }

    /// Advance after evaluating the current spectrum.
    ///
    /// Terminal states are returned unchanged.
    pub fn next(self, matched: bool, len: usize) -> Self {
        match self {
            SearchState::Trying(i) if matched => SearchState::Matched(i),
            SearchState::Trying(i) if i + 1 < len => SearchState::Trying(i + 1),
            SearchState::Trying(_) => SearchState::Exhausted,
            terminal => terminal,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, SearchState::Trying(_))
    }
}

/// Result of a priority search.
#[derive(Debug, Clone)]
pub struct PriorityMatch {
    /// Output image: the winning spectrum's overlay, or an unmodified copy
    pub image: Array3<u8>,
    /// Index of the winning spectrum, `None` if the list was exhausted
    pub matched_index: Option<usize>,
    /// Pixels painted by the winning spectrum
    pub pixel_count: usize,
}

impl PriorityMatch {
    pub fn detected(&self) -> bool {
        self.matched_index.is_some()
    }
}

/// Try `spectra` in order with the default red highlight.
pub fn apply_with_priority(image: ArrayView3<u8>, spectra: &[Spectrum]) -> Result<PriorityMatch> {
    apply_with_priority_colored(image, spectra, HIGHLIGHT_RED)
}

/// Try `spectra` in order, highlighting the first match with `color`.
///
/// # Arguments
/// * `image` - BGR image (height, width, 3)
/// * `spectra` - Spectra in priority order (index 0 first)
/// * `color` - Highlight color in stored (BGR) order
///
/// # Errors
/// `InvalidImageFormat` if the image does not have exactly 3 channels,
/// even when `spectra` is empty
pub fn apply_with_priority_colored(
    image: ArrayView3<u8>,
    spectra: &[Spectrum],
    color: [u8; 3],
) -> Result<PriorityMatch> {
    ensure_bgr(&image)?;

    let mut state = SearchState::start(spectra.len());

    while let SearchState::Trying(i) = state {
        let (output, pixel_count) = apply_spectrum_counted(image.view(), &spectra[i], color)?;
        state = state.next(pixel_count > 0, spectra.len());

        if let SearchState::Matched(index) = state {
            return Ok(PriorityMatch {
                image: output,
                matched_index: Some(index),
                pixel_count,
            });
        }
    }

    Ok(PriorityMatch {
        image: image.to_owned(),
        matched_index: None,
        pixel_count: 0,
    })
}
