//! WebAssembly exports for the detectors.
//!
//! These functions are exposed to JavaScript via wasm-bindgen.
//!
//! All functions take a flat BGR byte buffer (length = width * height * 3).
//! Canvas RGBA data has to be repacked by the caller.

use ndarray::{Array3, ArrayView3};
use wasm_bindgen::prelude::*;

use crate::detect::core::STORED_CHANNELS;
use crate::detect::{self, Spectrum};
use crate::error::Error;

fn to_js(err: Error) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn view(data: &[u8], width: usize, height: usize) -> Result<ArrayView3<'_, u8>, JsValue> {
    ArrayView3::from_shape((height, width, STORED_CHANNELS), data).map_err(|e| to_js(e.into()))
}

fn into_flat(image: Array3<u8>) -> Vec<u8> {
    image.into_raw_vec_and_offset().0
}

// ============================================================================
// Brightness Highlighter
// ============================================================================

/// Highlight near-white pixels.
///
/// # Arguments
/// * `data` - Flat BGR bytes
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `b`, `g`, `r` - Highlight color
#[wasm_bindgen]
pub fn highlight_bright_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    b: u8,
    g: u8,
    r: u8,
) -> Result<Vec<u8>, JsValue> {
    let input = view(data, width, height)?;
    let result = detect::highlight_bright(input, [b, g, r]).map_err(to_js)?;
    Ok(into_flat(result))
}

// ============================================================================
// Priority Spectrum Matcher
// ============================================================================

/// Output of [`apply_with_priority_wasm`].
#[wasm_bindgen]
pub struct PriorityOutput {
    data: Vec<u8>,
    matched_index: Option<u32>,
}

#[wasm_bindgen]
impl PriorityOutput {
    /// Flat BGR bytes of the result image
    #[wasm_bindgen(getter)]
    pub fn data(&self) -> Vec<u8> {
        self.data.clone()
    }

    /// 0-based index of the winning spectrum, `undefined` if none matched
    #[wasm_bindgen(getter)]
    pub fn matched_index(&self) -> Option<u32> {
        self.matched_index
    }
}

/// Try spectra in priority order.
///
/// # Arguments
/// * `data` - Flat BGR bytes
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `ranges` - Six bytes per spectrum: r_min, r_max, g_min, g_max, b_min, b_max.
///   Empty selects the built-in options.
#[wasm_bindgen]
pub fn apply_with_priority_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    ranges: &[u8],
) -> Result<PriorityOutput, JsValue> {
    if ranges.len() % 6 != 0 {
        return Err(JsValue::from_str("ranges must hold 6 values per spectrum"));
    }

    let spectra = if ranges.is_empty() {
        Spectrum::default_options()
    } else {
        ranges
            .chunks_exact(6)
            .enumerate()
            .map(|(i, c)| {
                Spectrum::new(format!("option {}", i + 1), (c[0], c[1]), (c[2], c[3]), (c[4], c[5]))
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(to_js)?
    };

    let input = view(data, width, height)?;
    let found = detect::apply_with_priority(input, &spectra).map_err(to_js)?;

    Ok(PriorityOutput {
        data: into_flat(found.image),
        matched_index: found.matched_index.map(|i| i as u32),
    })
}
