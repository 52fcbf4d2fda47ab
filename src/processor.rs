//! Pipeline orchestrator
//!
//! [`Pipeline`] owns a validated [`ProcessingConfig`] and runs the stages in
//! order: input scaling, edge detection, background removal and the final
//! resize of the transparent image. Every stage is timed and traced.

use crate::{
    background::{BackgroundRemover, ReferenceSource},
    codec,
    config::{BackgroundReference, InputScaling, ProcessingConfig},
    edges::CannyDetector,
    error::{PipelineError, Result},
    types::{Image, ProcessingResult, ProcessingTimings},
    utils::ImageResizer,
};
use instant::Instant;
use log::debug;
use std::borrow::Cow;
use tracing::{debug as trace_debug, info as trace_info, instrument, span, Level};

/// Reusable, validated processing pipeline
///
/// A pipeline holds no per-run state; one instance can process any number of
/// images, from any thread.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: ProcessingConfig,
    detector: CannyDetector,
    remover: BackgroundRemover,
}

impl Pipeline {
    /// Validate `config` and prepare the stage components
    ///
    /// # Errors
    /// See [`ProcessingConfig::validate`].
    pub fn new(config: ProcessingConfig) -> Result<Self> {
        config.validate()?;
        let detector = CannyDetector::new(config.threshold1, config.threshold2)?;
        let remover = BackgroundRemover::new(config.tolerance)?;
        debug!(
            "Pipeline ready: size {}, scaling {}, reference {}",
            config.selected_size,
            config.input_scaling,
            config.background_reference.kind()
        );
        Ok(Self {
            config,
            detector,
            remover,
        })
    }

    #[must_use]
    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    /// Run the pipeline on one image
    ///
    /// `None` input produces an empty result rather than an error.
    ///
    /// # Errors
    /// - `InvalidImageDimensions` for a zero-sized input
    /// - `InvalidBackgroundReference` when the reference region lies outside the input
    #[instrument(
        skip(self, input),
        fields(
            size = %self.config.selected_size,
            dimensions = ?input.map(Image::dimensions)
        )
    )]
    pub fn process(&self, input: Option<&Image>) -> Result<ProcessingResult> {
        let Some(image) = input else {
            trace_debug!("No input image, returning empty result");
            return Ok(ProcessingResult::empty());
        };
        if image.is_empty() {
            return Err(PipelineError::empty_image(
                "process",
                image.width(),
                image.height(),
            ));
        }

        let mut timings = ProcessingTimings::new();
        let total_start = Instant::now();

        trace_info!(
            width = image.width(),
            height = image.height(),
            reference = self.config.background_reference.kind(),
            "Starting image processing"
        );
        trace_debug!(
            brightness = self.config.brightness,
            "Brightness carried through without adjustment"
        );

        // Regions are given in original input coordinates
        let region_sample = match &self.config.background_reference {
            BackgroundReference::Region(region) => Some(image.crop(region)?),
            _ => None,
        };
        let source = match (&self.config.background_reference, &region_sample) {
            (_, Some(sample)) => ReferenceSource::Image(sample),
            (BackgroundReference::Image(reference), None) => ReferenceSource::Image(reference),
            _ => ReferenceSource::TopLeftCorner,
        };

        let scaled = {
            let _span = span!(Level::DEBUG, "input_scaling", mode = %self.config.input_scaling)
                .entered();
            let start = Instant::now();
            let scaled = self.scale_input(image)?;
            timings.input_scaling_ms = start.elapsed().as_millis() as u64;
            scaled
        };

        let edge_image = {
            let _span = span!(
                Level::DEBUG,
                "edge_detection",
                low = self.detector.low_threshold(),
                high = self.detector.high_threshold()
            )
            .entered();
            let start = Instant::now();
            let edges = self.detector.detect(&codec::decode(&scaled))?;
            let edge_image = codec::encode(&edges)?;
            timings.edge_detection_ms = start.elapsed().as_millis() as u64;
            edge_image
        };

        let background = {
            let _span = span!(
                Level::DEBUG,
                "background_removal",
                tolerance = self.remover.tolerance()
            )
            .entered();
            let start = Instant::now();
            let background = self.remover.remove(&scaled, source)?;
            timings.background_removal_ms = start.elapsed().as_millis() as u64;
            background
        };

        let transparent_image = {
            let _span = span!(Level::DEBUG, "output_resize", size = %self.config.selected_size)
                .entered();
            let start = Instant::now();
            let resized = ImageResizer::resize(&background, self.config.selected_size)?;
            timings.output_resize_ms = start.elapsed().as_millis() as u64;
            resized
        };

        timings.total_ms = total_start.elapsed().as_millis() as u64;
        trace_info!(
            edge = ?edge_image.dimensions(),
            transparent = ?transparent_image.dimensions(),
            total_ms = timings.total_ms,
            "Image processing complete"
        );

        Ok(ProcessingResult {
            edge_image: Some(edge_image),
            transparent_image: Some(transparent_image),
            timings,
        })
    }

    fn scale_input<'a>(&self, image: &'a Image) -> Result<Cow<'a, Image>> {
        let size = self.config.selected_size;
        match self.config.input_scaling {
            InputScaling::Adaptive { max_factor } => {
                ImageResizer::adaptive_resize(image, size, max_factor).map(Cow::Owned)
            },
            InputScaling::Exact => ImageResizer::resize(image, size).map(Cow::Owned),
            InputScaling::Original => Ok(Cow::Borrowed(image)),
        }
    }
}
