//! Configuration validation utilities
//!
//! Shared validation logic for processing parameters used by the
//! configuration builder, the component entry points and the CLI.

use super::NumericValidator;
use crate::{
    error::{PipelineError, Result},
    types::Image,
};

/// Utility for validating configuration parameters
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the two edge detector thresholds
    ///
    /// Both must be finite and non-negative; their order is not checked.
    ///
    /// # Examples
    /// ```rust
    /// use visubee::utils::ConfigValidator;
    ///
    /// assert!(ConfigValidator::validate_thresholds(50.0, 150.0).is_ok());
    /// assert!(ConfigValidator::validate_thresholds(-1.0, 150.0).is_err());
    /// ```
    pub fn validate_thresholds(threshold1: f32, threshold2: f32) -> Result<()> {
        NumericValidator::validate_non_negative(threshold1, "threshold1")?;
        NumericValidator::validate_non_negative(threshold2, "threshold2")?;
        Ok(())
    }

    /// Validate the hue tolerance of the background remover
    ///
    /// # Examples
    /// ```rust
    /// use visubee::utils::ConfigValidator;
    ///
    /// assert!(ConfigValidator::validate_tolerance(30).is_ok());
    /// assert!(ConfigValidator::validate_tolerance(-1).is_err());
    /// ```
    pub fn validate_tolerance(tolerance: i32) -> Result<()> {
        if tolerance < 0 {
            return Err(PipelineError::invalid_reference(format!(
                "tolerance must not be negative, got {}",
                tolerance
            )));
        }
        Ok(())
    }

    /// Validate the adaptive downscale cap
    pub fn validate_max_factor(max_factor: u32) -> Result<()> {
        NumericValidator::validate_at_least(max_factor, 1, "max_factor")?;
        Ok(())
    }

    /// Validate an explicit background reference image
    pub fn validate_reference_image(reference: &Image) -> Result<()> {
        if reference.is_empty() {
            return Err(PipelineError::invalid_reference(format!(
                "reference image is {}x{}",
                reference.width(),
                reference.height()
            )));
        }
        Ok(())
    }
}
