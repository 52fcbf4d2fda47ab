//! Hue-keyed background removal
//!
//! The background color is estimated as the mean HSV of a reference area,
//! either an explicit reference image or the top-left corner of the input.
//! Every input pixel whose hue lies within `tolerance` of the reference hue
//! and which is saturated and bright enough (S and V of at least 50) is made
//! fully transparent; all other pixels are made fully opaque.

use crate::{
    codec,
    error::{PipelineError, Result},
    types::{pack_argb, unpack_argb, Image, Region},
    utils::{color::MAX_HUE, ColorConverter, ConfigValidator, NumericValidator},
};
use tracing::{debug, instrument};

/// Minimum saturation for a pixel to count as background
pub const SATURATION_MIN: u8 = 50;

/// Minimum value (brightness) for a pixel to count as background
pub const VALUE_MIN: u8 = 50;

/// Fraction of each side sampled by [`ReferenceSource::TopLeftCorner`]
pub const CORNER_FRACTION: f64 = 0.1;

/// Where the background color is sampled from
#[derive(Debug, Clone, Copy)]
pub enum ReferenceSource<'a> {
    /// Mean color of a separate reference image
    Image(&'a Image),
    /// Mean color of the top-left 10% x 10% of the input itself
    TopLeftCorner,
}

impl<'a> From<Option<&'a Image>> for ReferenceSource<'a> {
    fn from(reference: Option<&'a Image>) -> Self {
        reference.map_or(Self::TopLeftCorner, Self::Image)
    }
}

/// Mean HSV of a sampled area, hue on the 0-179 scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HsvMean {
    pub hue: f64,
    pub saturation: f64,
    pub value: f64,
}

/// Inclusive hue interval treated as background
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HueRange {
    pub lower: u8,
    pub upper: u8,
}

impl HueRange {
    /// `[ref - tolerance, ref + tolerance]` clamped to `[0, 179]`, each bound rounded
    /// half to even
    ///
    /// # Examples
    /// ```rust
    /// use visubee::background::HueRange;
    ///
    /// assert_eq!(HueRange::around(60.0, 30), HueRange { lower: 30, upper: 90 });
    /// assert_eq!(HueRange::around(10.0, 30), HueRange { lower: 0, upper: 40 });
    /// ```
    #[must_use]
    pub fn around(reference_hue: f64, tolerance: i32) -> Self {
        let tolerance = f64::from(tolerance);
        let lower = NumericValidator::clamp_to_range(
            reference_hue - tolerance,
            0.0,
            f64::from(MAX_HUE),
        );
        let upper = NumericValidator::clamp_to_range(
            reference_hue + tolerance,
            0.0,
            f64::from(MAX_HUE),
        );
        Self {
            lower: lower.round_ties_even() as u8,
            upper: upper.round_ties_even() as u8,
        }
    }

    #[must_use]
    pub fn contains(&self, hue: u8) -> bool {
        (self.lower..=self.upper).contains(&hue)
    }
}

/// Background remover for a fixed hue tolerance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackgroundRemover {
    tolerance: i32,
}

impl BackgroundRemover {
    /// # Errors
    /// `InvalidBackgroundReference` for a negative tolerance.
    pub fn new(tolerance: i32) -> Result<Self> {
        ConfigValidator::validate_tolerance(tolerance)?;
        Ok(Self { tolerance })
    }

    #[must_use]
    pub fn tolerance(&self) -> i32 {
        self.tolerance
    }

    /// Top-left sampling area of a `width`x`height` image, at least 1x1
    #[must_use]
    pub fn corner_region(width: u32, height: u32) -> Region {
        let w = (f64::from(width) * CORNER_FRACTION).floor() as u32;
        let h = (f64::from(height) * CORNER_FRACTION).floor() as u32;
        Region::new(0, 0, w.max(1), h.max(1))
    }

    /// Mean HSV of the reference area
    ///
    /// # Errors
    /// `InvalidBackgroundReference` when the reference area is empty.
    pub fn reference_color(image: &Image, source: ReferenceSource<'_>) -> Result<HsvMean> {
        let sample = match source {
            ReferenceSource::Image(reference) => {
                ConfigValidator::validate_reference_image(reference)?;
                reference.clone()
            },
            ReferenceSource::TopLeftCorner => {
                image.crop(&Self::corner_region(image.width(), image.height()))?
            },
        };

        let hsv = ColorConverter::to_hsv(&codec::decode(&sample))?;
        match ColorConverter::channel_means(&hsv).as_deref() {
            Some(&[hue, saturation, value]) => Ok(HsvMean {
                hue,
                saturation,
                value,
            }),
            _ => Err(PipelineError::invalid_reference(format!(
                "cannot sample a {}x{} reference",
                sample.width(),
                sample.height()
            ))),
        }
    }

    /// Copy of `image` with background pixels transparent and the rest opaque
    ///
    /// # Errors
    /// `InvalidImageDimensions` for an empty input, `InvalidBackgroundReference`
    /// for an empty reference.
    #[instrument(
        level = "debug",
        skip(self, image, source),
        fields(width = image.width(), height = image.height(), tolerance = self.tolerance)
    )]
    pub fn remove(&self, image: &Image, source: ReferenceSource<'_>) -> Result<Image> {
        if image.is_empty() {
            return Err(PipelineError::empty_image(
                "remove the background of",
                image.width(),
                image.height(),
            ));
        }

        let reference = Self::reference_color(image, source)?;
        let range = HueRange::around(reference.hue, self.tolerance);
        debug!(
            reference_hue = reference.hue,
            reference_saturation = reference.saturation,
            reference_value = reference.value,
            lower = range.lower,
            upper = range.upper,
            "Background hue range"
        );

        let mut removed = 0usize;
        let pixels = image
            .pixels()
            .iter()
            .map(|&px| {
                let [r, g, b, _] = unpack_argb(px);
                let alpha = if Self::is_background(ColorConverter::rgb_to_hsv(r, g, b), range) {
                    removed += 1;
                    0
                } else {
                    255
                };
                pack_argb([r, g, b, alpha])
            })
            .collect();
        debug!(removed, total = image.pixel_count(), "Background pixels keyed out");

        Image::from_argb(image.width(), image.height(), pixels)
    }

    #[inline]
    fn is_background([h, s, v]: [u8; 3], range: HueRange) -> bool {
        range.contains(h) && s >= SATURATION_MIN && v >= VALUE_MIN
    }
}

/// Key out the background of `image`
///
/// With `reference` the background color is that image's mean hue, otherwise
/// the mean hue of the input's top-left corner.
///
/// # Errors
/// `InvalidBackgroundReference` for a negative tolerance or empty reference,
/// `InvalidImageDimensions` for an empty input.
pub fn remove_background(image: &Image, reference: Option<&Image>, tolerance: i32) -> Result<Image> {
    remove_background_with(image, reference.into(), tolerance)
}

/// [`remove_background`] with an explicit reference source
///
/// # Errors
/// As [`remove_background`].
pub fn remove_background_with(
    image: &Image,
    source: ReferenceSource<'_>,
    tolerance: i32,
) -> Result<Image> {
    BackgroundRemover::new(tolerance)?.remove(image, source)
}
