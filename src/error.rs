//! Error types shared by the detectors and the batch layer.

use std::path::PathBuf;

use thiserror::Error;

use crate::detect::core::Channel;

/// Errors produced by spectrastag.
#[derive(Debug, Error)]
pub enum Error {
    /// The image does not have exactly three channels.
    #[error("invalid image format: expected 3 channels, got {0}")]
    InvalidImageFormat(usize),

    #[error("invalid {channel} range: min {min} > max {max}")]
    InvalidRange { channel: Channel, min: u8, max: u8 },

    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to encode {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
