//! Image resizing shared by the pipeline stages
//!
//! Two operations cover every sizing need of the pipeline:
//! - [`ImageResizer::resize`] fits an image into a [`SizeSpec`] bound while
//!   preserving aspect ratio (bilinear interpolation).
//! - [`ImageResizer::adaptive_resize`] shrinks large inputs by an integer
//!   factor before analysis so the per-pixel stages stay cheap.

use crate::{
    error::{PipelineError, Result},
    types::{pack_argb, unpack_argb, Image, SizeSpec},
};
use image::imageops::{self, FilterType};
use tracing::{debug, instrument};

/// Default upper bound for the adaptive downscale factor
pub const DEFAULT_MAX_FACTOR: u32 = 10;

/// Shared image resizing utilities
pub struct ImageResizer;

impl ImageResizer {
    /// Output dimensions for fitting `width`x`height` into `size`
    ///
    /// Landscape inputs take the bound's width, everything else takes the
    /// bound's height; the other side follows the aspect ratio, rounded and
    /// never below 1.
    ///
    /// # Examples
    /// ```rust
    /// use visubee::{utils::ImageResizer, SizeSpec};
    ///
    /// assert_eq!(ImageResizer::target_dimensions(400, 200, SizeSpec::M).unwrap(), (300, 150));
    /// assert_eq!(ImageResizer::target_dimensions(200, 400, SizeSpec::M).unwrap(), (150, 300));
    /// ```
    ///
    /// # Errors
    /// `InvalidImageDimensions` when either side is zero.
    pub fn target_dimensions(width: u32, height: u32, size: SizeSpec) -> Result<(u32, u32)> {
        if width == 0 || height == 0 {
            return Err(PipelineError::empty_image("resize", width, height));
        }

        let (bound_w, bound_h) = size.dimensions();
        let aspect = f64::from(width) / f64::from(height);

        let dims = if aspect > 1.0 {
            let h = (f64::from(bound_w) / aspect).round() as u32;
            (bound_w, h.max(1))
        } else {
            let w = (f64::from(bound_h) * aspect).round() as u32;
            (w.max(1), bound_h)
        };
        Ok(dims)
    }

    /// Fit an image into a size bound, preserving aspect ratio
    ///
    /// # Errors
    /// `InvalidImageDimensions` for a zero-sized image.
    #[instrument(level = "debug", skip(image), fields(input = ?image.dimensions(), size = %size))]
    pub fn resize(image: &Image, size: SizeSpec) -> Result<Image> {
        let (width, height) = Self::target_dimensions(image.width(), image.height(), size)?;
        Self::resize_exact(image, width, height)
    }

    /// Resample to exactly `width`x`height` with bilinear filtering
    ///
    /// # Errors
    /// `InvalidImageDimensions` when the source or target has a zero side.
    pub fn resize_exact(image: &Image, width: u32, height: u32) -> Result<Image> {
        if image.is_empty() {
            return Err(PipelineError::empty_image(
                "resize",
                image.width(),
                image.height(),
            ));
        }
        if width == 0 || height == 0 {
            return Err(PipelineError::invalid_dimensions(format!(
                "resize target {}x{} has a zero side",
                width, height
            )));
        }
        if image.dimensions() == (width, height) {
            return Ok(image.clone());
        }

        let resized = imageops::resize(&image.to_rgba_image(), width, height, FilterType::Triangle);
        debug!(
            from = ?image.dimensions(),
            to = ?(width, height),
            "Resized image"
        );
        Ok(Image::from_rgba_image(&resized))
    }

    /// Integer downscale factor used by [`Self::adaptive_resize`]
    ///
    /// `min(max_factor, w / tw, h / th)` with integer division; a result of
    /// 1 or less means no downscale.
    #[must_use]
    pub fn adaptive_scale_factor(width: u32, height: u32, size: SizeSpec, max_factor: u32) -> u32 {
        let (target_w, target_h) = size.dimensions();
        max_factor.min(width / target_w).min(height / target_h)
    }

    /// Shrink a large input by an integer factor with a box filter
    ///
    /// Inputs already close to the bound are returned unchanged.
    ///
    /// # Errors
    /// `InvalidImageDimensions` for a zero-sized image.
    #[instrument(level = "debug", skip(image), fields(input = ?image.dimensions(), size = %size))]
    pub fn adaptive_resize(image: &Image, size: SizeSpec, max_factor: u32) -> Result<Image> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(PipelineError::empty_image("adaptively resize", width, height));
        }

        let scale = Self::adaptive_scale_factor(width, height, size, max_factor);
        if scale <= 1 {
            debug!(scale, "Adaptive resize skipped");
            return Ok(image.clone());
        }

        let result = Self::box_downscale(image, scale)?;
        debug!(scale, output = ?result.dimensions(), "Adaptive resize applied");
        Ok(result)
    }

    /// Average `scale`x`scale` blocks; trailing partial blocks are dropped
    fn box_downscale(image: &Image, scale: u32) -> Result<Image> {
        let (width, height) = image.dimensions();
        let out_w = width / scale;
        let out_h = height / scale;
        let src = image.pixels();
        let stride = width as usize;
        let block = scale as usize;
        let count = u32::try_from(block * block)
            .map_err(|_| PipelineError::invalid_config(format!("scale {} too large", scale)))?;

        let mut pixels = Vec::with_capacity(out_w as usize * out_h as usize);
        for oy in 0..out_h as usize {
            for ox in 0..out_w as usize {
                let mut sums = [0u32; 4];
                for y in oy * block..(oy + 1) * block {
                    let start = y * stride + ox * block;
                    for &px in src.get(start..start + block).unwrap_or(&[]) {
                        for (sum, value) in sums.iter_mut().zip(unpack_argb(px)) {
                            *sum += u32::from(value);
                        }
                    }
                }
                let avg = sums.map(|s| ((s + count / 2) / count) as u8);
                pixels.push(pack_argb(avg));
            }
        }

        Image::from_argb(out_w, out_h, pixels)
    }
}

/// Fit an image into a size bound (see [`ImageResizer::resize`])
///
/// # Errors
/// `InvalidImageDimensions` for a zero-sized image.
pub fn resize(image: &Image, size: SizeSpec) -> Result<Image> {
    ImageResizer::resize(image, size)
}

/// Integer-factor pre-downscale (see [`ImageResizer::adaptive_resize`])
///
/// # Errors
/// `InvalidImageDimensions` for a zero-sized image.
pub fn adaptive_resize(image: &Image, size: SizeSpec, max_factor: u32) -> Result<Image> {
    ImageResizer::adaptive_resize(image, size, max_factor)
}
