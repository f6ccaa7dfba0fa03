//! Detectors that flag pixels and paint them with a highlight color.
//!
//! ## Supported Format
//!
//! | Format | Shape | Type | Description |
//! |--------|-------|------|-------------|
//! | BGR8 | (H, W, 3) | u8 | Blue, green, red as stored by the decoder, 0-255 |
//!
//! Anything else is rejected with `InvalidImageFormat`. Channel order is
//! never converted here; the batch layer hands in BGR.
//!
//! ## Architecture
//!
//! - **Whole-array masks** - predicates produce `Array2<bool>` grids combined with `&`
//! - **Copy out** - input views are never modified; every call returns a new array
//! - **Stateless** - nothing carries over between images
//!
//! ## Detectors
//!
//! - **Brightness**: luminance plus per-channel gates above 200
//! - **Spectrum**: inclusive per-channel ranges
//! - **Priority**: first matching spectrum from an ordered list

pub mod core;
pub mod brightness;
pub mod spectrum;
pub mod priority;

pub use self::brightness::{highlight_bright, highlight_bright_detailed, Highlight};
pub use self::core::{Channel, HIGHLIGHT_RED};
pub use self::priority::{apply_with_priority, apply_with_priority_colored, PriorityMatch, SearchState};
pub use self::spectrum::{apply_spectrum, apply_spectrum_colored, ChannelRange, Spectrum};
