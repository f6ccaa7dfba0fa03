//! Batch runner: decode, detect, and encode every image in a folder.
//!
//! A file that cannot be decoded, detected, or written is reported as
//! skipped and the batch moves on. Only setup (listing the input folder,
//! creating the output folder) can fail the run as a whole.

use std::fs;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use ndarray::{Array3, ArrayView3};
use rayon::prelude::*;

use super::io;
use crate::config::{BatchConfig, Mode};
use crate::detect::{apply_with_priority_colored, highlight_bright_detailed};
use crate::error::{Error, Result};

/// What happened to one input file.
#[derive(Debug)]
pub enum Outcome {
    /// Brightness mode: image written, `pixel_count` pixels highlighted
    Highlighted { pixel_count: usize },
    /// Spectrum mode: spectrum `index` (0-based) matched
    Matched {
        index: usize,
        name: String,
        pixel_count: usize,
    },
    /// Spectrum mode: no spectrum matched, original written
    NoMatch,
    /// Nothing written
    Skipped(Error),
}

/// Per-file report.
#[derive(Debug)]
pub struct FileReport {
    pub input: PathBuf,
    /// Written file, `None` when skipped
    pub output: Option<PathBuf>,
    pub outcome: Outcome,
}

impl FileReport {
    fn skipped(input: &Path, error: Error) -> Self {
        Self {
            input: input.to_path_buf(),
            output: None,
            outcome: Outcome::Skipped(error),
        }
    }

    pub fn is_written(&self) -> bool {
        self.output.is_some()
    }

    /// True when the detector flagged at least one pixel.
    pub fn is_detected(&self) -> bool {
        match self.outcome {
            Outcome::Highlighted { pixel_count } => pixel_count > 0,
            Outcome::Matched { .. } => true,
            Outcome::NoMatch | Outcome::Skipped(_) => false,
        }
    }

    fn log(&self) {
        let name = io::display_name(&self.input);
        match &self.outcome {
            Outcome::Highlighted { pixel_count } => {
                debug!("{name}: highlighted {pixel_count} pixel(s)");
            }
            Outcome::Matched {
                index,
                name: spectrum,
                pixel_count,
            } => {
                info!(
                    "{name}: detected regions using spectrum option {} ({spectrum}, {pixel_count} pixel(s))",
                    index + 1
                );
            }
            Outcome::NoMatch => {
                info!("{name}: no regions detected with any spectrum option");
            }
            Outcome::Skipped(err) => {
                warn!("unable to process {name}, skipping: {err}");
            }
        }
    }
}

/// Result of a whole batch.
#[derive(Debug)]
pub struct BatchSummary {
    pub output_dir: PathBuf,
    /// One report per input file, in sorted input order
    pub reports: Vec<FileReport>,
}

impl BatchSummary {
    pub fn written(&self) -> usize {
        self.reports.iter().filter(|r| r.is_written()).count()
    }

    pub fn skipped(&self) -> usize {
        self.reports.len() - self.written()
    }

    pub fn detected(&self) -> usize {
        self.reports.iter().filter(|r| r.is_detected()).count()
    }
}

/// Process every supported image in `config.input_dir`.
///
/// # Errors
/// Only when the input folder cannot be listed or the output folder cannot
/// be created. Per-file failures are reported in the summary instead.
pub fn run(config: &BatchConfig) -> Result<BatchSummary> {
    let files = io::list_images(&config.input_dir)?;
    fs::create_dir_all(&config.output_dir)?;

    info!(
        "processing {} image(s) from {} in {} mode",
        files.len(),
        config.input_dir.display(),
        config.mode
    );

    let progress = ProgressBar::new(files.len() as u64);
    if let Ok(style) = ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len}") {
        progress.set_style(style.progress_chars("=> "));
    }
    progress.set_message("Processing images");

    let process = |path: &PathBuf| {
        let report = process_file(config, path);
        progress.suspend(|| report.log());
        progress.inc(1);
        report
    };

    let reports: Vec<FileReport> = if config.parallel {
        files.par_iter().map(&process).collect()
    } else {
        files.iter().map(&process).collect()
    };
    progress.finish_and_clear();

    let summary = BatchSummary {
        output_dir: config.output_dir.clone(),
        reports,
    };

    info!(
        "processing complete: {} written, {} skipped, {} with detections; output saved to {}",
        summary.written(),
        summary.skipped(),
        summary.detected(),
        summary.output_dir.display()
    );

    Ok(summary)
}

/// Decode, detect, and write a single file.
pub fn process_file(config: &BatchConfig, path: &Path) -> FileReport {
    let image = match io::decode_bgr(path) {
        Ok(image) => image,
        Err(err) => return FileReport::skipped(path, err),
    };

    let (output_image, outcome) = match detect(config, image.view()) {
        Ok(result) => result,
        Err(err) => return FileReport::skipped(path, err),
    };

    let output = io::output_path(&config.output_dir, config.mode.output_prefix(), path);
    if let Err(err) = io::encode_bgr(output_image.view(), &output) {
        return FileReport::skipped(path, err);
    }

    FileReport {
        input: path.to_path_buf(),
        output: Some(output),
        outcome,
    }
}

fn detect(config: &BatchConfig, image: ArrayView3<u8>) -> Result<(Array3<u8>, Outcome)> {
    match config.mode {
        Mode::Highlight => {
            let highlight = highlight_bright_detailed(image, config.highlight_color)?;
            let outcome = Outcome::Highlighted {
                pixel_count: highlight.pixel_count,
            };
            Ok((highlight.image, outcome))
        }
        Mode::Spectrum => {
            let found = apply_with_priority_colored(image, &config.spectra, config.highlight_color)?;
            let outcome = match found.matched_index {
                Some(index) => Outcome::Matched {
                    index,
                    name: config.spectra[index].name.clone(),
                    pixel_count: found.pixel_count,
                },
                None => Outcome::NoMatch,
            };
            Ok((found.image, outcome))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn write_png(dir: &Path, name: &str, pixels: &[(u32, u32, [u8; 3])]) {
        let mut img = RgbImage::from_pixel(3, 3, Rgb([30, 30, 200]));
        for &(x, y, rgb) in pixels {
            img.put_pixel(x, y, Rgb(rgb));
        }
        img.save(dir.join(name)).unwrap();
    }

    fn dirs() -> (TempDir, PathBuf, PathBuf) {
        let root = TempDir::new().unwrap();
        let input = root.path().join("input");
        let output = root.path().join("output");
        fs::create_dir(&input).unwrap();
        (root, input, output)
    }

    fn output_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_corrupt_file_is_skipped() {
        let (_root, input, output) = dirs();
        write_png(&input, "good.png", &[(0, 0, [255, 255, 255])]);
        fs::write(input.join("broken.png"), b"definitely not a png").unwrap();

        let config = BatchConfig::new(&input, &output, Mode::Highlight);
        let summary = run(&config).unwrap();

        assert_eq!(summary.reports.len(), 2);
        assert_eq!(summary.written(), 1);
        assert_eq!(summary.skipped(), 1);
        assert!(matches!(
            summary.reports[0].outcome,
            Outcome::Skipped(Error::Decode { .. })
        ));
        assert_eq!(output_names(&output), vec!["highlighted_good.png"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_link_is_skipped() {
        let (_root, input, output) = dirs();
        write_png(&input, "good.png", &[(0, 0, [255, 255, 255])]);
        std::os::unix::fs::symlink(input.join("gone.png"), input.join("link.png")).unwrap();

        let summary = run(&BatchConfig::new(&input, &output, Mode::Highlight)).unwrap();

        assert_eq!(summary.written(), 1);
        assert_eq!(summary.skipped(), 1);
        assert!(matches!(
            summary.reports[1].outcome,
            Outcome::Skipped(Error::Decode { .. })
        ));
        assert_eq!(output_names(&output), vec!["highlighted_good.png"]);
    }

    #[test]
    fn test_png_with_jpg_extension_is_processed() {
        let (_root, input, output) = dirs();
        let mut img = RgbImage::from_pixel(3, 3, Rgb([30, 30, 200]));
        img.put_pixel(1, 1, Rgb([200, 220, 10]));
        img.save_with_format(input.join("scan.jpg"), image::ImageFormat::Png)
            .unwrap();

        let summary = run(&BatchConfig::new(&input, &output, Mode::Spectrum)).unwrap();

        assert_eq!(summary.written(), 1);
        assert!(matches!(
            summary.reports[0].outcome,
            Outcome::Matched { index: 0, .. }
        ));
        assert_eq!(output_names(&output), vec!["processed_scan.jpg"]);
    }

    #[test]
    fn test_highlight_output_pixels() {
        let (_root, input, output) = dirs();
        write_png(&input, "a.png", &[(1, 1, [255, 255, 255])]);

        let config = BatchConfig::new(&input, &output, Mode::Highlight);
        let summary = run(&config).unwrap();
        assert_eq!(summary.detected(), 1);

        let written = image::open(output.join("highlighted_a.png")).unwrap().to_rgb8();
        assert_eq!(written.get_pixel(1, 1), &Rgb([255, 0, 0]));
        assert_eq!(written.get_pixel(0, 0), &Rgb([30, 30, 200]));
    }

    #[test]
    fn test_spectrum_mode_reports_option() {
        let (_root, input, output) = dirs();
        write_png(&input, "strict.png", &[(2, 0, [200, 220, 10])]);
        write_png(&input, "broad.png", &[(2, 0, [110, 110, 110])]);
        write_png(&input, "none.png", &[]);

        let config = BatchConfig::new(&input, &output, Mode::Spectrum);
        let summary = run(&config).unwrap();

        let indices: Vec<Option<usize>> = summary
            .reports
            .iter()
            .map(|r| match r.outcome {
                Outcome::Matched { index, .. } => Some(index),
                _ => None,
            })
            .collect();
        // sorted: broad, none, strict
        assert_eq!(indices, vec![Some(2), None, Some(0)]);
        assert_eq!(summary.written(), 3);
        assert_eq!(
            output_names(&output),
            vec!["processed_broad.png", "processed_none.png", "processed_strict.png"]
        );

        let untouched = image::open(output.join("processed_none.png")).unwrap().to_rgb8();
        let original = image::open(input.join("none.png")).unwrap().to_rgb8();
        assert_eq!(untouched, original);
    }

    #[test]
    fn test_empty_directory() {
        let (_root, input, output) = dirs();

        let summary = run(&BatchConfig::new(&input, &output, Mode::Spectrum)).unwrap();

        assert!(summary.reports.is_empty());
        assert_eq!(summary.written(), 0);
        assert!(output.is_dir());
    }

    #[test]
    fn test_missing_input_dir_fails() {
        let (_root, input, output) = dirs();
        let config = BatchConfig::new(input.join("nope"), output, Mode::Highlight);
        assert!(run(&config).is_err());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let (_root, input, output) = dirs();
        for i in 0..6 {
            let rgb = [100 + i as u8 * 20, 220, 10];
            write_png(&input, &format!("img{i}.png"), &[(i % 3, 1, rgb)]);
        }
        let par_output = output.with_file_name("output_par");

        let seq = run(&BatchConfig::new(&input, &output, Mode::Spectrum)).unwrap();
        let par = run(&BatchConfig::new(&input, &par_output, Mode::Spectrum).with_parallel(true)).unwrap();

        assert_eq!(seq.written(), par.written());
        for name in output_names(&output) {
            let a = fs::read(output.join(&name)).unwrap();
            let b = fs::read(par_output.join(&name)).unwrap();
            assert_eq!(a, b, "{name} differs");
        }
        let seq_inputs: Vec<&PathBuf> = seq.reports.iter().map(|r| &r.input).collect();
        let par_inputs: Vec<&PathBuf> = par.reports.iter().map(|r| &r.input).collect();
        assert_eq!(seq_inputs, par_inputs);
    }
}
