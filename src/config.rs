//! Configuration types for the processing pipeline

use crate::{
    error::{PipelineError, Result},
    types::{Image, Region, SizeSpec},
    utils::{ConfigValidator, DEFAULT_MAX_FACTOR},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the input is scaled before edge detection and background removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum InputScaling {
    /// Integer box-filter downscale, capped at `max_factor`
    Adaptive { max_factor: u32 },
    /// Fit the input to the selected size before analysis
    Exact,
    /// Analyse the input at its original size
    Original,
}

impl Default for InputScaling {
    fn default() -> Self {
        Self::Adaptive {
            max_factor: DEFAULT_MAX_FACTOR,
        }
    }
}

impl fmt::Display for InputScaling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Adaptive { max_factor } => write!(f, "adaptive (max factor {})", max_factor),
            Self::Exact => write!(f, "exact"),
            Self::Original => write!(f, "original"),
        }
    }
}

impl FromStr for InputScaling {
    type Err = PipelineError;

    /// Parse `adaptive`, `exact` or `original`; adaptive uses the default cap
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "adaptive" => Ok(Self::default()),
            "exact" => Ok(Self::Exact),
            "original" => Ok(Self::Original),
            other => Err(PipelineError::invalid_config(format!(
                "unknown input scaling '{}' (expected adaptive, exact or original)",
                other
            ))),
        }
    }
}

/// Where the background color is sampled from
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundReference {
    /// Top-left 10% x 10% of the (scaled) input
    #[default]
    TopLeftCorner,
    /// A separate image showing only the background
    #[serde(skip)]
    Image(Image),
    /// A rectangle of the original input, in input pixel coordinates
    Region(Region),
}

impl BackgroundReference {
    /// Short name for logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TopLeftCorner => "top-left-corner",
            Self::Image(_) => "image",
            Self::Region(_) => "region",
        }
    }
}

/// Configuration for one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// First Canny threshold
    pub threshold1: f32,

    /// Second Canny threshold; the larger of the two seeds edges
    pub threshold2: f32,

    /// Half-width of the background hue window on the 0-179 scale
    pub tolerance: i32,

    /// Carried through for callers; no stage reads it
    pub brightness: i32,

    /// Output bounding box
    pub selected_size: SizeSpec,

    /// Background color source
    pub background_reference: BackgroundReference,

    /// Pre-analysis scaling of the input
    pub input_scaling: InputScaling,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            threshold1: 50.0,
            threshold2: 150.0,
            tolerance: 30,
            brightness: 0,
            selected_size: SizeSpec::default(),
            background_reference: BackgroundReference::default(),
            input_scaling: InputScaling::default(),
        }
    }
}

impl ProcessingConfig {
    /// Create a new configuration builder
    ///
    /// # Examples
    /// ```rust
    /// use visubee::{ProcessingConfig, SizeSpec};
    ///
    /// let config = ProcessingConfig::builder()
    ///     .thresholds(30.0, 90.0)
    ///     .tolerance(12)
    ///     .selected_size(SizeSpec::L)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.selected_size, SizeSpec::L);
    /// ```
    #[must_use]
    pub fn builder() -> ProcessingConfigBuilder {
        ProcessingConfigBuilder::default()
    }

    /// Validate all configuration parameters
    ///
    /// # Errors
    /// - `InvalidConfig` for negative or non-finite thresholds, or an
    ///   adaptive `max_factor` of 0
    /// - `InvalidBackgroundReference` for a negative tolerance or an empty
    ///   reference image or region
    pub fn validate(&self) -> Result<()> {
        if !self.threshold1.is_finite() || self.threshold1 < 0.0 {
            return Err(PipelineError::config_value_error(
                "threshold1",
                self.threshold1,
                ">= 0",
                Some(50.0),
            ));
        }
        if !self.threshold2.is_finite() || self.threshold2 < 0.0 {
            return Err(PipelineError::config_value_error(
                "threshold2",
                self.threshold2,
                ">= 0",
                Some(150.0),
            ));
        }
        ConfigValidator::validate_tolerance(self.tolerance)?;

        if let InputScaling::Adaptive { max_factor } = self.input_scaling {
            ConfigValidator::validate_max_factor(max_factor)?;
        }

        match &self.background_reference {
            BackgroundReference::TopLeftCorner => {},
            BackgroundReference::Image(image) => ConfigValidator::validate_reference_image(image)?,
            BackgroundReference::Region(region) => {
                if region.area() == 0 {
                    return Err(PipelineError::invalid_reference(format!(
                        "reference region {} is empty",
                        region
                    )));
                }
            },
        }

        Ok(())
    }
}

/// Builder for `ProcessingConfig`
#[derive(Debug, Default)]
pub struct ProcessingConfigBuilder {
    config: ProcessingConfig,
}

impl ProcessingConfigBuilder {
    /// Set both Canny thresholds
    #[must_use]
    pub fn thresholds(mut self, threshold1: f32, threshold2: f32) -> Self {
        self.config.threshold1 = threshold1;
        self.config.threshold2 = threshold2;
        self
    }

    #[must_use]
    pub fn threshold1(mut self, threshold: f32) -> Self {
        self.config.threshold1 = threshold;
        self
    }

    #[must_use]
    pub fn threshold2(mut self, threshold: f32) -> Self {
        self.config.threshold2 = threshold;
        self
    }

    /// Set the background hue tolerance
    #[must_use]
    pub fn tolerance(mut self, tolerance: i32) -> Self {
        self.config.tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn brightness(mut self, brightness: i32) -> Self {
        self.config.brightness = brightness;
        self
    }

    /// Set the output size
    #[must_use]
    pub fn selected_size(mut self, size: SizeSpec) -> Self {
        self.config.selected_size = size;
        self
    }

    /// Set the background color source
    #[must_use]
    pub fn background_reference(mut self, reference: BackgroundReference) -> Self {
        self.config.background_reference = reference;
        self
    }

    /// Sample the background from a separate image
    #[must_use]
    pub fn reference_image(self, image: Image) -> Self {
        self.background_reference(BackgroundReference::Image(image))
    }

    /// Sample the background from a rectangle of the input
    #[must_use]
    pub fn reference_region(self, region: Region) -> Self {
        self.background_reference(BackgroundReference::Region(region))
    }

    /// Set the input scaling mode
    #[must_use]
    pub fn input_scaling(mut self, scaling: InputScaling) -> Self {
        self.config.input_scaling = scaling;
        self
    }

    /// Use adaptive scaling with the given cap
    #[must_use]
    pub fn max_factor(self, max_factor: u32) -> Self {
        self.input_scaling(InputScaling::Adaptive { max_factor })
    }

    /// Build and validate the configuration
    ///
    /// # Errors
    /// See [`ProcessingConfig::validate`].
    pub fn build(self) -> Result<ProcessingConfig> {
        let config = self.config;
        config.validate()?;
        Ok(config)
    }
}
