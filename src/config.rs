//! Batch configuration.
//!
//! Everything a run needs is carried explicitly in [`BatchConfig`]; there
//! are no module-level paths or color constants to patch.

use std::fmt;
use std::path::PathBuf;

use crate::detect::{Spectrum, HIGHLIGHT_RED};

/// Which detector a batch runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Near-white detection, outputs `highlighted_<name>`
    Highlight,
    /// Priority spectrum matching, outputs `processed_<name>`
    Spectrum,
}

impl Mode {
    /// Filename prefix for written images.
    pub fn output_prefix(self) -> &'static str {
        match self {
            Mode::Highlight => "highlighted_",
            Mode::Spectrum => "processed_",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Highlight => f.write_str("highlight"),
            Mode::Spectrum => f.write_str("spectrum"),
        }
    }
}

/// Options for one batch run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Folder scanned for `.png`, `.jpg`, `.jpeg`
    pub input_dir: PathBuf,
    /// Destination folder, created if missing
    pub output_dir: PathBuf,
    pub mode: Mode,
    /// Highlight color in stored (BGR) order
    pub highlight_color: [u8; 3],
    /// Spectra in priority order; unused in `Mode::Highlight`
    pub spectra: Vec<Spectrum>,
    /// Process images on the rayon pool
    pub parallel: bool,
}

impl BatchConfig {
    /// Config with the default red highlight and the built-in spectrum options.
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>, mode: Mode) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            mode,
            highlight_color: HIGHLIGHT_RED,
            spectra: Spectrum::default_options(),
            parallel: false,
        }
    }

    pub fn with_color(mut self, color: [u8; 3]) -> Self {
        self.highlight_color = color;
        self
    }

    pub fn with_spectra(mut self, spectra: Vec<Spectrum>) -> Self {
        self.spectra = spectra;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Parse a `B,G,R` triple, e.g. `0,0,255` for red.
pub fn parse_color(s: &str) -> Result<[u8; 3], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected B,G,R with 3 values, got '{s}'"));
    }

    let mut color = [0u8; 3];
    for (slot, part) in color.iter_mut().zip(&parts) {
        *slot = part
            .parse::<u8>()
            .map_err(|e| format!("invalid channel value '{part}': {e}"))?;
    }
    Ok(color)
}
