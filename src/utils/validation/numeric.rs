//! Numeric validation utilities
//!
//! Range checks for floating point and integer parameters.

use crate::error::{PipelineError, Result};

/// Validator for numeric parameters
pub struct NumericValidator;

impl NumericValidator {
    /// Validate that a value is finite and not negative
    pub fn validate_non_negative(value: f32, name: &str) -> Result<f32> {
        if !value.is_finite() {
            return Err(PipelineError::invalid_config(format!(
                "{} must be finite, got {}",
                name, value
            )));
        }

        if value < 0.0 {
            return Err(PipelineError::invalid_config(format!(
                "{} must not be negative, got {}",
                name, value
            )));
        }

        Ok(value)
    }

    /// Validate that a value is at least `min`
    pub fn validate_at_least<T>(value: T, min: T, name: &str) -> Result<T>
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        if value < min {
            return Err(PipelineError::invalid_config(format!(
                "{} must be at least {}, got {}",
                name, min, value
            )));
        }
        Ok(value)
    }

    /// Clamp a value to a range
    pub fn clamp_to_range<T>(value: T, min: T, max: T) -> T
    where
        T: PartialOrd + Copy,
    {
        if value < min {
            min
        } else if value > max {
            max
        } else {
            value
        }
    }
}
