//! spectrastag
//!
//! Brightness and spectrum highlighting for folders of raster images,
//! with Python bindings via PyO3 and WASM bindings for JavaScript.
//!
//! ## Image Format
//! Detectors work on 8-bit, 3-channel images stored BGR:
//! - **Shape**: (height, width, 3)
//! - **Order**: index 0 = blue, 1 = green, 2 = red
//!
//! This is the layout OpenCV hands to Python, so numpy arrays pass through
//! the bindings unchanged. The batch layer converts decoded files to it.
//!
//! ## Detectors
//! - **Brightness highlighter**: flags near-white pixels (luminance and every
//!   channel above 200)
//! - **Priority spectrum matcher**: tries ordered channel ranges and applies
//!   the first one that matches any pixel
//!
//! Both return a new image plus whether anything was detected; inputs are
//! never modified.

pub mod batch;
pub mod config;
pub mod detect;
pub mod error;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use config::{BatchConfig, Mode};
pub use error::{Error, Result};

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
mod python {
    use numpy::{IntoPyArray, PyArray3, PyReadonlyArray3};
    use pyo3::exceptions::PyValueError;
    use pyo3::prelude::*;

    use crate::batch;
    use crate::config::{BatchConfig, Mode};
    use crate::detect::{self, Spectrum};
    use crate::error::Error;

    type RangeTriple = ((u8, u8), (u8, u8), (u8, u8));

    fn to_py_err(err: Error) -> PyErr {
        PyValueError::new_err(err.to_string())
    }

    fn to_spectra(ranges: Option<Vec<RangeTriple>>) -> PyResult<Vec<Spectrum>> {
        match ranges {
            None => Ok(Spectrum::default_options()),
            Some(ranges) => ranges
                .into_iter()
                .enumerate()
                .map(|(i, (r, g, b))| {
                    Spectrum::new(format!("option {}", i + 1), r, g, b).map_err(to_py_err)
                })
                .collect(),
        }
    }

    // ========================================================================
    // Brightness Highlighter
    // ========================================================================

    /// Highlight near-white pixels of a BGR u8 image.
    ///
    /// # Arguments
    /// * `image` - (height, width, 3) BGR array
    /// * `color` - Highlight color as (B, G, R) (default: red)
    #[pyfunction]
    #[pyo3(signature = (image, color=(0, 0, 255)))]
    pub fn highlight_bright<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        color: (u8, u8, u8),
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let result = detect::highlight_bright(image.as_array(), [color.0, color.1, color.2])
            .map_err(to_py_err)?;
        Ok(result.into_pyarray(py))
    }

    // ========================================================================
    // Spectrum Matching
    // ========================================================================

    /// Apply one spectrum given as inclusive (min, max) ranges.
    ///
    /// Returns `(image, matched)`.
    #[pyfunction]
    #[pyo3(signature = (image, r_range, g_range, b_range, color=(0, 0, 255)))]
    pub fn apply_spectrum<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        r_range: (u8, u8),
        g_range: (u8, u8),
        b_range: (u8, u8),
        color: (u8, u8, u8),
    ) -> PyResult<(Bound<'py, PyArray3<u8>>, bool)> {
        let spectrum = Spectrum::new("custom", r_range, g_range, b_range).map_err(to_py_err)?;
        let (result, matched) =
            detect::apply_spectrum_colored(image.as_array(), &spectrum, [color.0, color.1, color.2])
                .map_err(to_py_err)?;
        Ok((result.into_pyarray(py), matched))
    }

    /// Try spectra in order; the first that matches wins.
    ///
    /// `spectra` is a list of `((r_min, r_max), (g_min, g_max), (b_min, b_max))`.
    /// Without it the built-in strict, moderate, and broad options are used.
    /// Returns `(image, matched_index)` with `None` when nothing matched.
    #[pyfunction]
    #[pyo3(signature = (image, spectra=None, color=(0, 0, 255)))]
    pub fn apply_with_priority<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        spectra: Option<Vec<RangeTriple>>,
        color: (u8, u8, u8),
    ) -> PyResult<(Bound<'py, PyArray3<u8>>, Option<usize>)> {
        let spectra = to_spectra(spectra)?;
        let found = detect::apply_with_priority_colored(
            image.as_array(),
            &spectra,
            [color.0, color.1, color.2],
        )
        .map_err(to_py_err)?;
        Ok((found.image.into_pyarray(py), found.matched_index))
    }

    // ========================================================================
    // Batch
    // ========================================================================

    /// Process a folder. `mode` is `"highlight"` or `"spectrum"`.
    ///
    /// Returns `(written, skipped)`.
    #[pyfunction]
    #[pyo3(signature = (input_dir, output_dir, mode="spectrum", spectra=None, color=(0, 0, 255), parallel=false))]
    pub fn process_folder(
        input_dir: String,
        output_dir: String,
        mode: &str,
        spectra: Option<Vec<RangeTriple>>,
        color: (u8, u8, u8),
        parallel: bool,
    ) -> PyResult<(usize, usize)> {
        let mode = match mode {
            "highlight" => Mode::Highlight,
            "spectrum" => Mode::Spectrum,
            other => {
                return Err(PyValueError::new_err(format!("unknown mode '{other}'")));
            }
        };
        let config = BatchConfig::new(input_dir, output_dir, mode)
            .with_color([color.0, color.1, color.2])
            .with_spectra(to_spectra(spectra)?)
            .with_parallel(parallel);

        let summary = batch::run(&config).map_err(to_py_err)?;
        Ok((summary.written(), summary.skipped()))
    }

    /// spectrastag extension module
    #[pymodule]
    pub fn spectrastag(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(highlight_bright, m)?)?;
        m.add_function(wrap_pyfunction!(apply_spectrum, m)?)?;
        m.add_function(wrap_pyfunction!(apply_with_priority, m)?)?;
        m.add_function(wrap_pyfunction!(process_folder, m)?)?;
        Ok(())
    }
}

#[cfg(feature = "python")]
pub use python::spectrastag;
