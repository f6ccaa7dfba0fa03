//! Image file I/O for the batch layer.
//!
//! Decoded images are converted to the stored BGR layout the detectors
//! expect, and converted back to RGB when written. Alpha is dropped and
//! grayscale is expanded to three channels on the way in.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::error::{ParameterError, ParameterErrorKind};
use image::{ImageError, ImageReader, RgbImage};
use log::warn;
use ndarray::{Array3, ArrayView3, Axis};
use walkdir::WalkDir;

use crate::detect::core::{ensure_bgr, STORED_CHANNELS};
use crate::error::{Error, Result};

/// Extensions picked up from the input folder (compared case-insensitively).
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Quality used when writing `.jpg`/`.jpeg` output.
pub const JPEG_QUALITY: u8 = 95;

/// True if the path has a supported image extension.
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// List supported image files directly inside `dir`, sorted by path.
///
/// Only a failure to read `dir` itself is an error. An entry that cannot be
/// inspected (e.g. a dangling symlink) is still listed when its name has a
/// supported extension, so decoding reports it as skipped; other broken
/// entries are logged and ignored.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => return Err(err.into()),
            Err(err) => {
                match err.path() {
                    Some(path) if is_supported(path) => files.push(path.to_path_buf()),
                    _ => warn!("ignoring unreadable entry in {}: {err}", dir.display()),
                }
                continue;
            }
        };
        if entry.file_type().is_file() && is_supported(entry.path()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// Destination path: `<output_dir>/<prefix><file name>`.
pub fn output_path(output_dir: &Path, prefix: &str, input: &Path) -> PathBuf {
    output_dir.join(format!("{prefix}{}", display_name(input)))
}

/// File name for log lines, falling back to the full path.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Decode an image file into a (height, width, 3) BGR array.
///
/// The format is sniffed from the file contents, so a PNG saved as `.jpg`
/// still decodes.
pub fn decode_bgr(path: &Path) -> Result<Array3<u8>> {
    let decode_error = |source: ImageError| Error::Decode {
        path: path.to_path_buf(),
        source,
    };

    let decoded = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| decode_error(ImageError::IoError(e)))?
        .decode()
        .map_err(decode_error)?;

    let rgb = decoded.to_rgb8();
    let (width, height) = rgb.dimensions();
    let mut array = Array3::from_shape_vec(
        (height as usize, width as usize, STORED_CHANNELS),
        rgb.into_raw(),
    )?;

    // RGB -> BGR
    array.invert_axis(Axis(2));
    let bgr = array.as_standard_layout().into_owned();
    Ok(bgr)
}

/// Encode a BGR array to `path`; the format follows the extension.
///
/// JPEG output is written at [`JPEG_QUALITY`].
pub fn encode_bgr(image: ArrayView3<u8>, path: &Path) -> Result<()> {
    ensure_bgr(&image)?;
    let (height, width, _) = image.dim();

    let mut rgb = image;
    rgb.invert_axis(Axis(2));
    let raw: Vec<u8> = rgb.iter().copied().collect();

    let encode_error = |source: ImageError| Error::Encode {
        path: path.to_path_buf(),
        source,
    };

    let buffer = RgbImage::from_raw(width as u32, height as u32, raw).ok_or_else(|| {
        encode_error(ImageError::Parameter(ParameterError::from_kind(
            ParameterErrorKind::DimensionMismatch,
        )))
    })?;

    if has_jpeg_extension(path) {
        let file = File::create(path).map_err(|e| encode_error(ImageError::IoError(e)))?;
        let encoder = JpegEncoder::new_with_quality(BufWriter::new(file), JPEG_QUALITY);
        buffer.write_with_encoder(encoder).map_err(encode_error)
    } else {
        buffer.save(path).map_err(encode_error)
    }
}

fn has_jpeg_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, ImageFormat, Rgb};
    use tempfile::TempDir;

    #[test]
    fn test_is_supported_case_insensitive() {
        assert!(is_supported(Path::new("a.png")));
        assert!(is_supported(Path::new("a.JPG")));
        assert!(is_supported(Path::new("dir/a.JpEg")));
        assert!(!is_supported(Path::new("a.gif")));
        assert!(!is_supported(Path::new("png")));
    }

    #[test]
    fn test_list_images_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        for name in ["b.png", "A.JPG", "c.jpeg", "notes.txt", "d.bmp"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.png")).unwrap();
        std::fs::write(dir.path().join("nested.png").join("e.png"), b"x").unwrap();

        let files = list_images(dir.path()).unwrap();
        let names: Vec<String> = files.iter().map(|p| display_name(p)).collect();

        assert_eq!(names, vec!["A.JPG", "b.png", "c.jpeg"]);
    }

    #[test]
    fn test_list_images_missing_dir() {
        let dir = TempDir::new().unwrap();
        assert!(list_images(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_decode_swaps_to_bgr() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("px.png");
        RgbImage::from_pixel(2, 1, Rgb([10, 20, 30])).save(&path).unwrap();

        let array = decode_bgr(&path).unwrap();

        assert_eq!(array.dim(), (1, 2, 3));
        assert_eq!(array[[0, 1, 0]], 30);
        assert_eq!(array[[0, 1, 1]], 20);
        assert_eq!(array[[0, 1, 2]], 10);
    }

    #[test]
    fn test_encode_writes_rgb() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.png");
        let mut array = Array3::<u8>::zeros((1, 1, 3));
        array[[0, 0, 2]] = 255; // red in BGR

        encode_bgr(array.view(), &path).unwrap();

        let written = image::open(&path).unwrap().to_rgb8();
        assert_eq!(written.get_pixel(0, 0), &Rgb([255, 0, 0]));
    }

    #[test]
    fn test_decode_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not an image").unwrap();

        assert!(matches!(decode_bgr(&path), Err(Error::Decode { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_list_images_keeps_dangling_link() {
        let dir = TempDir::new().unwrap();
        RgbImage::new(1, 1).save(dir.path().join("good.png")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("missing.png"), dir.path().join("link.png"))
            .unwrap();
        std::os::unix::fs::symlink(dir.path().join("missing.txt"), dir.path().join("other.txt"))
            .unwrap();

        let files = list_images(dir.path()).unwrap();
        let names: Vec<String> = files.iter().map(|p| display_name(p)).collect();

        assert_eq!(names, vec!["good.png", "link.png"]);
        assert!(matches!(decode_bgr(&files[1]), Err(Error::Decode { .. })));
    }

    #[test]
    fn test_decode_sniffs_mislabeled_png() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scan.jpg");
        RgbImage::from_pixel(2, 2, Rgb([10, 20, 30]))
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();

        let array = decode_bgr(&path).unwrap();

        assert_eq!(array.dim(), (2, 2, 3));
        assert_eq!(array[[1, 1, 0]], 30);
        assert_eq!(array[[1, 1, 2]], 10);
    }

    #[test]
    fn test_jpeg_written_at_high_quality() {
        let dir = TempDir::new().unwrap();
        let mut array = Array3::<u8>::zeros((32, 32, 3));
        for ((y, x, c), v) in array.indexed_iter_mut() {
            *v = ((x * 37 + y * 91 + c * 53) % 256) as u8;
        }

        let high = dir.path().join("high.JPG");
        encode_bgr(array.view(), &high).unwrap();

        // Same pixels through the library default (quality 75)
        let mut rgb = array.view();
        rgb.invert_axis(Axis(2));
        let raw: Vec<u8> = rgb.iter().copied().collect();
        let default = dir.path().join("default.jpg");
        RgbImage::from_raw(32, 32, raw).unwrap().save(&default).unwrap();

        let high_len = std::fs::metadata(&high).unwrap().len();
        let default_len = std::fs::metadata(&default).unwrap().len();
        assert!(high_len > default_len, "{high_len} <= {default_len}");
        assert_eq!(image::open(&high).unwrap().dimensions(), (32, 32));
    }

    #[test]
    fn test_output_path_prefix() {
        let out = output_path(Path::new("out"), "processed_", Path::new("in/cat.jpg"));
        assert_eq!(out, Path::new("out").join("processed_cat.jpg"));
    }
}
