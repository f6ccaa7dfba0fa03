//! Folder processing around the detectors.
//!
//! - **io**: listing, decoding to BGR, encoding back to the source format
//! - **runner**: per-file processing, progress, and the batch summary

pub mod io;
pub mod runner;

pub use runner::{process_file, run, BatchSummary, FileReport, Outcome};
