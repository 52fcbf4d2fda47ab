#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]

//! # VisuBee Image Processing Library
//!
//! Edge extraction and hue-keyed background removal for in-memory RGBA
//! images. One call produces two results from a single input:
//!
//! - an **edge map**: a Canny edge detector run on the luminance of the
//!   (optionally downscaled) input, returned as opaque black and white
//! - a **transparent image**: the input with every pixel whose hue matches
//!   the background made fully transparent, fitted into one of five output
//!   sizes
//!
//! ## Quick Start
//!
//! ```rust
//! use visubee::{process, Image, ProcessingConfig, SizeSpec};
//!
//! # fn main() -> visubee::Result<()> {
//! let image = Image::filled(640, 480, [0, 200, 0, 255]);
//! let config = ProcessingConfig::builder()
//!     .thresholds(50.0, 150.0)
//!     .tolerance(30)
//!     .selected_size(SizeSpec::S)
//!     .build()?;
//!
//! let result = process(Some(&image), &config)?;
//! let (edges, transparent) = result.into_pair();
//! // Adaptive input scaling shrinks the input by 3 before edge detection
//! assert_eq!(edges.unwrap().dimensions(), (213, 160));
//! assert_eq!(transparent.unwrap().dimensions(), (150, 113));
//! # Ok(())
//! # }
//! ```
//!
//! ## Components
//!
//! The stages are public and can be used on their own:
//!
//! - [`codec`]: packed-pixel [`Image`] to channel [`codec::Matrix`] and back
//! - [`utils::preprocessing`]: aspect-preserving and adaptive resizing
//! - [`edges`]: Canny edge detection
//! - [`background`]: HSV background removal
//!
//! ### Feature Flags
//!
//! - `cli` (default): the `visubee` command-line tool
//! - `webp-support` (default): WebP decoding for CLI inputs
//! - `tracing-json`: JSON log output for the CLI

pub mod background;
#[cfg(feature = "cli")]
pub mod cli;
pub mod codec;
pub mod config;
pub mod edges;
pub mod error;
pub mod processor;
pub mod settings;
#[cfg(feature = "cli")]
pub mod tracing_config;
pub mod types;
pub mod utils;

use std::path::Path;

// Public API exports
pub use background::{remove_background, remove_background_with, BackgroundRemover, ReferenceSource};
pub use codec::{decode, encode, Matrix};
pub use config::{BackgroundReference, InputScaling, ProcessingConfig, ProcessingConfigBuilder};
pub use edges::{detect_edges, detect_edges_image, CannyDetector};
pub use error::{PipelineError, Result};
pub use processor::Pipeline;
pub use settings::AppSettings;
pub use types::{Image, ProcessingResult, ProcessingTimings, Region, SizeSpec};
pub use utils::preprocessing::{adaptive_resize, resize};
pub use utils::{ColorConverter, ConfigValidator, ImageResizer, NumericValidator};

#[cfg(feature = "cli")]
pub use tracing_config::{events, init_cli_tracing, spans, TracingConfig, TracingFormat};

/// Run the full pipeline on one image
///
/// `None` input yields a result with both images absent.
///
/// # Errors
/// Configuration errors from [`ProcessingConfig::validate`] and stage errors
/// from [`Pipeline::process`].
pub fn process(input: Option<&Image>, config: &ProcessingConfig) -> Result<ProcessingResult> {
    Pipeline::new(config.clone())?.process(input)
}

/// Run [`process`] on the tokio blocking pool
///
/// # Examples
/// ```rust
/// use visubee::{process_async, Image, ProcessingConfig};
///
/// # #[tokio::main]
/// # async fn main() -> visubee::Result<()> {
/// let image = Image::filled(32, 32, [255, 0, 0, 255]);
/// let result = process_async(Some(image), ProcessingConfig::default()).await?;
/// assert!(result.edge_image.is_some());
/// # Ok(())
/// # }
/// ```
///
/// # Errors
/// As [`process`]; a panicked or cancelled worker maps to `Internal`.
pub async fn process_async(
    input: Option<Image>,
    config: ProcessingConfig,
) -> Result<ProcessingResult> {
    let input_info = input
        .as_ref()
        .map(|image| format!("{}x{}", image.width(), image.height()));

    tokio::task::spawn_blocking(move || process(input.as_ref(), &config))
        .await
        .map_err(|e| {
            PipelineError::processing_stage_error(
                "process_async",
                &e.to_string(),
                input_info.as_deref(),
            )
        })?
}

/// Decode an encoded image (PNG, JPEG, TIFF, WebP) from memory
///
/// # Errors
/// `DecodeFailure` when the bytes are not a supported image.
pub fn load_image_from_bytes(bytes: &[u8]) -> Result<Image> {
    let decoded = image::load_from_memory(bytes)?;
    Ok(Image::from_dynamic(&decoded))
}

/// Decode an image file
///
/// # Errors
/// `DecodeFailure` for unreadable or unsupported files.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<Image> {
    let decoded = image::open(path)?;
    Ok(Image::from_dynamic(&decoded))
}
