//! Core types shared by the pipeline stages

use crate::error::{PipelineError, Result};
use image::{DynamicImage, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pack interleaved R,G,B,A bytes into a 32-bit ARGB word
#[inline]
#[must_use]
pub const fn pack_argb(rgba: [u8; 4]) -> u32 {
    ((rgba[3] as u32) << 24) | ((rgba[0] as u32) << 16) | ((rgba[1] as u32) << 8) | rgba[2] as u32
}

/// Unpack a 32-bit ARGB word into R,G,B,A bytes
#[inline]
#[must_use]
pub const fn unpack_argb(pixel: u32) -> [u8; 4] {
    [
        ((pixel >> 16) & 0xFF) as u8,
        ((pixel >> 8) & 0xFF) as u8,
        (pixel & 0xFF) as u8,
        ((pixel >> 24) & 0xFF) as u8,
    ]
}

/// An in-memory RGBA image with packed ARGB pixels
///
/// Each pixel holds four 8-bit channels packed into one `u32`
/// (alpha in bits 24–31, red 16–23, green 8–15, blue 0–7), stored
/// row-major from the top-left corner without padding. The byte size of
/// the pixel buffer is therefore always `width * height * 4`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl Image {
    /// Create an image from packed ARGB words
    ///
    /// # Errors
    /// `InvalidImageDimensions` when `pixels.len() != width * height`.
    pub fn from_argb(width: u32, height: u32, pixels: Vec<u32>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(PipelineError::invalid_dimensions(format!(
                "{}x{} image needs {} pixels, got {}",
                width,
                height,
                expected,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Create an image from interleaved RGBA bytes
    ///
    /// # Errors
    /// `InvalidImageDimensions` when `bytes.len() != width * height * 4`.
    pub fn from_rgba_bytes(width: u32, height: u32, bytes: &[u8]) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if bytes.len() != expected {
            return Err(PipelineError::invalid_dimensions(format!(
                "{}x{} image needs {} bytes, got {}",
                width,
                height,
                expected,
                bytes.len()
            )));
        }
        let pixels = bytes
            .chunks_exact(4)
            .map(|px| pack_argb([px[0], px[1], px[2], px[3]]))
            .collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Create an image where every pixel has the same RGBA color
    #[must_use]
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self {
            width,
            height,
            pixels: vec![pack_argb(rgba); width as usize * height as usize],
        }
    }

    /// Convert an RGBA buffer from the `image` crate
    #[must_use]
    pub fn from_rgba_image(image: &RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        let pixels = image.pixels().map(|p| pack_argb(p.0)).collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Convert an already-decoded image of any color type
    #[must_use]
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        Self::from_rgba_image(&image.to_rgba8())
    }

    /// Convert into an RGBA buffer of the `image` crate
    #[must_use]
    pub fn to_rgba_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            Rgba(unpack_argb(self.pixels[self.index(x, y)]))
        })
    }

    /// Export the pixels as interleaved RGBA bytes
    #[must_use]
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|&p| unpack_argb(p)).collect()
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of pixels (`width * height`)
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    /// True when either dimension is zero
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Packed ARGB pixels in row-major order
    #[must_use]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// RGBA channels of the pixel at `(x, y)`, or `None` outside the image
    #[must_use]
    pub fn rgba_at(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(self.index(x, y)).map(|&p| unpack_argb(p))
    }

    /// Copy out a rectangular region
    ///
    /// The region is clamped to the image the same way an on-screen
    /// selection is: origin into `[0, width] x [0, height]`, extent into
    /// `[1, width - x] x [1, height - y]`.
    ///
    /// # Errors
    /// `InvalidBackgroundReference` when nothing of the region lies inside the image.
    pub fn crop(&self, region: &Region) -> Result<Self> {
        let clamped = region.clamp_to(self.width, self.height).ok_or_else(|| {
            PipelineError::invalid_reference(format!(
                "region {} lies outside the {}x{} image",
                region, self.width, self.height
            ))
        })?;

        let mut pixels = Vec::with_capacity(clamped.width as usize * clamped.height as usize);
        for y in clamped.y..clamped.y + clamped.height {
            let start = self.index(clamped.x, y);
            let end = start + clamped.width as usize;
            pixels.extend_from_slice(&self.pixels[start..end]);
        }

        Ok(Self {
            width: clamped.width,
            height: clamped.height,
            pixels,
        })
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// Rectangular area of an image in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    #[must_use]
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Map a drag gesture on a scaled view back to image coordinates
    ///
    /// `start` and `end` are view coordinates, `view_size` is the on-screen
    /// size of the displayed image. Returns `None` when the drag has no
    /// extent on either axis or the view has no size.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn from_drag(
        start: (f32, f32),
        end: (f32, f32),
        view_size: (f32, f32),
        image_size: (u32, u32),
    ) -> Option<Self> {
        if start.0 == end.0 || start.1 == end.1 {
            return None;
        }
        if view_size.0 <= 0.0 || view_size.1 <= 0.0 {
            return None;
        }

        let (image_w, image_h) = (i64::from(image_size.0), i64::from(image_size.1));
        let scale_x = image_size.0 as f32 / view_size.0;
        let scale_y = image_size.1 as f32 / view_size.1;

        let x = ((start.0 * scale_x) as i64).clamp(0, image_w);
        let y = ((start.1 * scale_y) as i64).clamp(0, image_h);
        if image_w - x < 1 || image_h - y < 1 {
            return None;
        }
        let width = (((end.0 - start.0) * scale_x) as i64).clamp(1, image_w - x);
        let height = (((end.1 - start.1) * scale_y) as i64).clamp(1, image_h - y);

        Some(Self::new(x as u32, y as u32, width as u32, height as u32))
    }

    /// Clamp into a `width x height` image, `None` if nothing remains
    #[must_use]
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Self> {
        let x = self.x.min(width);
        let y = self.y.min(height);
        let max_w = width - x;
        let max_h = height - y;
        if max_w == 0 || max_h == 0 {
            return None;
        }
        Some(Self::new(
            x,
            y,
            self.width.clamp(1, max_w),
            self.height.clamp(1, max_h),
        ))
    }

    #[must_use]
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

impl FromStr for Region {
    type Err = PipelineError;

    /// Parse `x,y,width,height`
    fn from_str(s: &str) -> Result<Self> {
        let values = s
            .split(',')
            .map(|part| part.trim().parse::<u32>())
            .collect::<std::result::Result<Vec<u32>, _>>()
            .map_err(|e| {
                PipelineError::invalid_config(format!("invalid region '{}': {}", s, e))
            })?;
        match values.as_slice() {
            &[x, y, width, height] => Ok(Self::new(x, y, width, height)),
            _ => Err(PipelineError::invalid_config(format!(
                "region must be 'x,y,width,height', got '{}'",
                s
            ))),
        }
    }
}

/// Named output bounding box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SizeSpec {
    /// 75 x 75
    XS,
    /// 150 x 150
    S,
    /// 300 x 300
    #[default]
    M,
    /// 600 x 600
    L,
    /// 1200 x 1200
    XL,
}

impl SizeSpec {
    /// Every size, smallest first
    pub const ALL: [SizeSpec; 5] = [Self::XS, Self::S, Self::M, Self::L, Self::XL];

    /// Bounding box as `(width, height)`
    #[must_use]
    pub const fn dimensions(self) -> (u32, u32) {
        match self {
            Self::XS => (75, 75),
            Self::S => (150, 150),
            Self::M => (300, 300),
            Self::L => (600, 600),
            Self::XL => (1200, 1200),
        }
    }

    #[must_use]
    pub const fn width(self) -> u32 {
        self.dimensions().0
    }

    #[must_use]
    pub const fn height(self) -> u32 {
        self.dimensions().1
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::XS => "XS",
            Self::S => "S",
            Self::M => "M",
            Self::L => "L",
            Self::XL => "XL",
        }
    }
}

impl fmt::Display for SizeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SizeSpec {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|size| size.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                PipelineError::invalid_config(format!(
                    "Unknown size '{}'. Valid sizes: XS, S, M, L, XL",
                    s
                ))
            })
    }
}

/// Output of one pipeline run
#[derive(Debug, Clone, Default)]
pub struct ProcessingResult {
    /// Opaque grayscale edge map (`None` when there was no input)
    pub edge_image: Option<Image>,

    /// Input with background pixels made transparent, sized to the selected `SizeSpec`
    pub transparent_image: Option<Image>,

    /// Per-stage timing breakdown
    pub timings: ProcessingTimings,
}

impl ProcessingResult {
    /// The result for an absent input
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edge_image.is_none() && self.transparent_image.is_none()
    }

    /// Split into `(edge_image, transparent_image)`
    #[must_use]
    pub fn into_pair(self) -> (Option<Image>, Option<Image>) {
        (self.edge_image, self.transparent_image)
    }
}

/// Detailed timing breakdown for one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingTimings {
    /// Input pre-scaling (adaptive or exact)
    pub input_scaling_ms: u64,

    /// Grayscale conversion and Canny edge detection
    pub edge_detection_ms: u64,

    /// HSV conversion, masking and alpha application
    pub background_removal_ms: u64,

    /// Final resize to the selected size
    pub output_resize_ms: u64,

    /// Total end-to-end processing time
    pub total_ms: u64,
}

impl ProcessingTimings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn measured_ms(&self) -> u64 {
        self.input_scaling_ms
            + self.edge_detection_ms
            + self.background_removal_ms
            + self.output_resize_ms
    }

    /// Get the "other" overhead time (unaccounted time)
    #[must_use]
    pub fn other_overhead_ms(&self) -> u64 {
        self.total_ms.saturating_sub(self.measured_ms())
    }

    /// Get breakdown percentages
    #[must_use]
    pub fn breakdown_percentages(&self) -> TimingBreakdown {
        if self.total_ms == 0 {
            return TimingBreakdown::default();
        }

        let total = self.total_ms as f64;
        TimingBreakdown {
            input_scaling_pct: (self.input_scaling_ms as f64 / total) * 100.0,
            edge_detection_pct: (self.edge_detection_ms as f64 / total) * 100.0,
            background_removal_pct: (self.background_removal_ms as f64 / total) * 100.0,
            output_resize_pct: (self.output_resize_ms as f64 / total) * 100.0,
            other_pct: (self.other_overhead_ms() as f64 / total) * 100.0,
        }
    }

    /// Get timing summary for display
    #[must_use]
    pub fn timing_summary(&self) -> String {
        let breakdown = self.breakdown_percentages();
        let mut summary = format!(
            "Total: {}ms | Scale: {}ms ({:.1}%) | Edges: {}ms ({:.1}%) | Background: {}ms ({:.1}%) | Resize: {}ms ({:.1}%)",
            self.total_ms,
            self.input_scaling_ms,
            breakdown.input_scaling_pct,
            self.edge_detection_ms,
            breakdown.edge_detection_pct,
            self.background_removal_ms,
            breakdown.background_removal_pct,
            self.output_resize_ms,
            breakdown.output_resize_pct
        );

        let other_ms = self.other_overhead_ms();
        if other_ms > 5 || breakdown.other_pct > 1.0 {
            summary.push_str(&format!(
                " | Other: {}ms ({:.1}%)",
                other_ms, breakdown.other_pct
            ));
        }

        summary
    }
}

/// Percentage breakdown of timing phases
#[derive(Debug, Clone, Default)]
pub struct TimingBreakdown {
    pub input_scaling_pct: f64,
    pub edge_detection_pct: f64,
    pub background_removal_pct: f64,
    pub output_resize_pct: f64,
    pub other_pct: f64,
}
