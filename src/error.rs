//! Error types for the image processing pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Error taxonomy for pipeline operations
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A matrix carried a channel count the codec cannot pack (only 1, 3 and 4 are valid)
    #[error("Unsupported channel count: {channels} (supported: 1, 3, 4)")]
    UnsupportedChannelCount { channels: usize },

    /// Zero-sized or inconsistent image dimensions
    #[error("Invalid image dimensions: {0}")]
    InvalidImageDimensions(String),

    /// Negative tolerance, empty reference image or empty reference region
    #[error("Invalid background reference: {0}")]
    InvalidBackgroundReference(String),

    /// Failure reported by the upstream image decoder
    #[error("Decode failure: {0}")]
    DecodeFailure(#[from] image::ImageError),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Settings file I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file parse or serialization errors
    #[error("Settings error: {0}")]
    Settings(String),

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for PipelineError {
    fn from(error: serde_json::Error) -> Self {
        Self::Settings(error.to_string())
    }
}

impl PipelineError {
    /// Create a new unsupported channel count error
    #[must_use]
    pub fn unsupported_channels(channels: usize) -> Self {
        Self::UnsupportedChannelCount { channels }
    }

    /// Create a new invalid dimensions error
    pub fn invalid_dimensions<S: Into<String>>(msg: S) -> Self {
        Self::InvalidImageDimensions(msg.into())
    }

    /// Create a new invalid background reference error
    pub fn invalid_reference<S: Into<String>>(msg: S) -> Self {
        Self::InvalidBackgroundReference(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new settings error
    pub fn settings<S: Into<String>>(msg: S) -> Self {
        Self::Settings(msg.into())
    }

    /// Create a dimensions error that names the offending size
    #[must_use]
    pub fn empty_image(operation: &str, width: u32, height: u32) -> Self {
        Self::InvalidImageDimensions(format!(
            "cannot {} a {}x{} image (width and height must be at least 1)",
            operation, width, height
        ))
    }

    /// Create configuration error with valid ranges
    pub fn config_value_error<T: std::fmt::Display>(
        parameter: &str,
        value: T,
        valid_range: &str,
        recommended: Option<T>,
    ) -> Self {
        let recommendation = match recommended {
            Some(rec) => format!(" Recommended: {}", rec),
            None => String::new(),
        };

        Self::InvalidConfig(format!(
            "Invalid {}: {} (valid range: {}).{}",
            parameter, value, valid_range, recommendation
        ))
    }

    /// Create an internal error naming the pipeline stage that failed
    pub fn processing_stage_error(stage: &str, details: &str, input_info: Option<&str>) -> Self {
        let input_context = match input_info {
            Some(info) => format!(" (input: {})", info),
            None => String::new(),
        };

        Self::Internal(format!(
            "Processing failed at stage '{}'{}: {}",
            stage, input_context, details
        ))
    }

    /// Create settings error with file context
    pub fn settings_file_error<P: AsRef<std::path::Path>>(
        operation: &str,
        path: P,
        details: &str,
    ) -> Self {
        Self::Settings(format!(
            "Failed to {} settings '{}': {}",
            operation,
            path.as_ref().display(),
            details
        ))
    }
}
