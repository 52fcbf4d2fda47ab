//! Utility modules for common operations
//!
//! Color conversion, resizing and parameter validation shared by the
//! pipeline stages and the CLI.

pub mod color;
pub mod preprocessing;
pub mod validation;

// Re-export commonly used items for convenience
pub use color::ColorConverter;
pub use preprocessing::{ImageResizer, DEFAULT_MAX_FACTOR};
pub use validation::{ConfigValidator, NumericValidator};
