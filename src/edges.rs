//! Canny edge detection
//!
//! The detector runs in four passes over a single-channel luminance plane:
//!
//! 1. 3x3 Sobel gradients with replicated borders.
//! 2. L1 gradient magnitude `|gx| + |gy|`.
//! 3. Non-maximum suppression along the gradient direction quantized to
//!    0°, 45°, 90° and 135°. A pixel survives when it is strictly greater
//!    than the neighbour behind it and at least the neighbour ahead of it
//!    (both strict on diagonals); neighbours outside the image count as 0.
//! 4. Hysteresis: magnitudes above the high threshold seed edges, which grow
//!    through 8-connected survivors above the low threshold.
//!
//! Output is a 1-channel matrix holding 0 or 255.

use crate::{
    codec::{self, Matrix},
    error::Result,
    types::Image,
    utils::{ColorConverter, ConfigValidator},
};
use tracing::{debug, instrument};

/// tan(22.5°) in Q15 fixed point
const TG22: i64 = 13573;
const TG_SHIFT: u32 = 15;

const EDGE: u8 = 255;

/// Sobel responses and L1 magnitude for every pixel of a plane
struct Gradients {
    gx: Vec<i32>,
    gy: Vec<i32>,
    magnitude: Vec<i32>,
    width: usize,
    height: usize,
}

impl Gradients {
    fn sobel(gray: &[u8], width: usize, height: usize) -> Self {
        let len = width * height;
        let mut gx = Vec::with_capacity(len);
        let mut gy = Vec::with_capacity(len);
        let mut magnitude = Vec::with_capacity(len);

        let last_x = width as isize - 1;
        let last_y = height as isize - 1;
        let px = |x: isize, y: isize| -> i32 {
            let cx = x.clamp(0, last_x) as usize;
            let cy = y.clamp(0, last_y) as usize;
            i32::from(gray[cy * width + cx])
        };

        for y in 0..height as isize {
            for x in 0..width as isize {
                let dx = (px(x + 1, y - 1) + 2 * px(x + 1, y) + px(x + 1, y + 1))
                    - (px(x - 1, y - 1) + 2 * px(x - 1, y) + px(x - 1, y + 1));
                let dy = (px(x - 1, y + 1) + 2 * px(x, y + 1) + px(x + 1, y + 1))
                    - (px(x - 1, y - 1) + 2 * px(x, y - 1) + px(x + 1, y - 1));
                gx.push(dx);
                gy.push(dy);
                magnitude.push(dx.abs() + dy.abs());
            }
        }

        Self {
            gx,
            gy,
            magnitude,
            width,
            height,
        }
    }

    /// Magnitude at `(x, y)`, 0 outside the plane
    #[inline]
    fn magnitude_at(&self, x: isize, y: isize) -> i32 {
        if x < 0 || y < 0 || x >= self.width as isize || y >= self.height as isize {
            return 0;
        }
        self.magnitude[y as usize * self.width + x as usize]
    }

    /// Whether the pixel at `(x, y)` is a ridge along its gradient direction
    fn is_local_maximum(&self, x: isize, y: isize) -> bool {
        let idx = y as usize * self.width + x as usize;
        let m = self.magnitude[idx];
        match GradientAxis::quantize(self.gx[idx], self.gy[idx]) {
            GradientAxis::Horizontal => {
                m > self.magnitude_at(x - 1, y) && m >= self.magnitude_at(x + 1, y)
            },
            GradientAxis::Vertical => {
                m > self.magnitude_at(x, y - 1) && m >= self.magnitude_at(x, y + 1)
            },
            GradientAxis::Diagonal(s) => {
                m > self.magnitude_at(x - s, y - 1) && m > self.magnitude_at(x + s, y + 1)
            },
        }
    }
}

/// Quantized gradient direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GradientAxis {
    /// Within 22.5° of the x axis
    Horizontal,
    /// Within 22.5° of the y axis
    Vertical,
    /// 45° or 135°; +1 when gx and gy share a sign, -1 otherwise
    Diagonal(isize),
}

impl GradientAxis {
    fn quantize(gx: i32, gy: i32) -> Self {
        let ax = i64::from(gx.unsigned_abs());
        let ay = i64::from(gy.unsigned_abs()) << TG_SHIFT;
        let tg22x = ax * TG22;
        if ay < tg22x {
            return Self::Horizontal;
        }
        // tan(67.5°) = tan(22.5°) + 2
        let tg67x = tg22x + (ax << (TG_SHIFT + 1));
        if ay > tg67x {
            Self::Vertical
        } else {
            Self::Diagonal(if (gx ^ gy) < 0 { -1 } else { 1 })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    Suppressed,
    Candidate,
    Edge,
}

/// Canny edge detector with validated hysteresis thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CannyDetector {
    low: f32,
    high: f32,
}

impl CannyDetector {
    /// Create a detector from two thresholds in either order
    ///
    /// The smaller value becomes the low (continuation) threshold and the
    /// larger one the high (seed) threshold.
    ///
    /// # Errors
    /// `InvalidConfig` if either threshold is negative or not finite.
    pub fn new(threshold1: f32, threshold2: f32) -> Result<Self> {
        ConfigValidator::validate_thresholds(threshold1, threshold2)?;
        let (low, high) = if threshold1 > threshold2 {
            debug!(threshold1, threshold2, "Swapping inverted Canny thresholds");
            (threshold2, threshold1)
        } else {
            (threshold1, threshold2)
        };
        Ok(Self { low, high })
    }

    #[must_use]
    pub fn low_threshold(&self) -> f32 {
        self.low
    }

    #[must_use]
    pub fn high_threshold(&self) -> f32 {
        self.high
    }

    /// Detect edges in a 1-, 3- or 4-channel matrix
    ///
    /// # Errors
    /// `UnsupportedChannelCount` for 2-channel or wider-than-4 input.
    #[instrument(
        level = "debug",
        skip(self, matrix),
        fields(width = matrix.width(), height = matrix.height(), low = self.low, high = self.high)
    )]
    pub fn detect(&self, matrix: &Matrix) -> Result<Matrix> {
        let gray = ColorConverter::to_grayscale(matrix)?;
        let width = gray.width() as usize;
        let height = gray.height() as usize;
        if width == 0 || height == 0 {
            return Ok(Matrix::zeros(gray.width(), gray.height(), 1));
        }

        let gradients = Gradients::sobel(gray.as_slice(), width, height);
        let mut labels = vec![Label::Suppressed; width * height];
        let mut stack = Vec::new();

        // Integer magnitudes against float thresholds: m > t iff m > floor(t)
        let low = self.low.floor() as i32;
        let high = self.high.floor() as i32;

        for y in 0..height {
            for x in 0..width {
                let idx = y * width + x;
                let m = gradients.magnitude[idx];
                if m <= low || !gradients.is_local_maximum(x as isize, y as isize) {
                    continue;
                }
                if m > high {
                    labels[idx] = Label::Edge;
                    stack.push(idx);
                } else {
                    labels[idx] = Label::Candidate;
                }
            }
        }

        let seeds = stack.len();
        while let Some(idx) = stack.pop() {
            let (x, y) = ((idx % width) as isize, (idx / width) as isize);
            for ny in y - 1..=y + 1 {
                for nx in x - 1..=x + 1 {
                    if nx < 0 || ny < 0 || nx >= width as isize || ny >= height as isize {
                        continue;
                    }
                    let n = ny as usize * width + nx as usize;
                    if labels[n] == Label::Candidate {
                        labels[n] = Label::Edge;
                        stack.push(n);
                    }
                }
            }
        }

        let edges: Vec<u8> = labels
            .iter()
            .map(|&label| if label == Label::Edge { EDGE } else { 0 })
            .collect();
        debug!(
            seeds,
            edge_pixels = edges.iter().filter(|&&v| v == EDGE).count(),
            "Canny hysteresis complete"
        );

        Matrix::from_vec(gray.width(), gray.height(), 1, edges)
    }
}

/// Detect edges in a matrix (see [`CannyDetector`])
///
/// # Errors
/// `InvalidConfig` for negative or non-finite thresholds,
/// `UnsupportedChannelCount` for unsupported input.
pub fn detect_edges(matrix: &Matrix, threshold1: f32, threshold2: f32) -> Result<Matrix> {
    CannyDetector::new(threshold1, threshold2)?.detect(matrix)
}

/// Decode, detect edges and encode the map as opaque grayscale
///
/// # Errors
/// `InvalidConfig` for negative or non-finite thresholds.
pub fn detect_edges_image(image: &Image, threshold1: f32, threshold2: f32) -> Result<Image> {
    let edges = detect_edges(&codec::decode(image), threshold1, threshold2)?;
    codec::encode(&edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;

    /// Grayscale matrix from a per-pixel function
    fn gray(width: u32, height: u32, f: impl Fn(u32, u32) -> u8) -> Matrix {
        let bytes = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| f(x, y))
            .collect();
        Matrix::from_vec(width, height, 1, bytes).unwrap()
    }

    fn edge_pixels(edges: &Matrix) -> Vec<(u32, u32)> {
        let mut out = Vec::new();
        for y in 0..edges.height() {
            for x in 0..edges.width() {
                if edges.get(x, y, 0) == Some(255) {
                    out.push((x, y));
                }
            }
        }
        out
    }

    #[test]
    fn test_flat_image_has_no_edges() {
        for value in [0u8, 77, 255] {
            let flat = gray(16, 12, |_, _| value);
            for (t1, t2) in [(0.0, 0.0), (50.0, 150.0), (1000.0, 2000.0)] {
                let edges = detect_edges(&flat, t1, t2).unwrap();
                assert_eq!(edges.channels(), 1);
                assert!(edges.as_slice().iter().all(|&v| v == 0));
            }
        }
    }

    #[test]
    fn test_vertical_boundary_single_column() {
        let image = gray(20, 10, |x, _| if x < 10 { 0 } else { 255 });
        let edges = detect_edges(&image, 50.0, 150.0).unwrap();
        let expected: Vec<(u32, u32)> = (0..10).map(|y| (9, y)).collect();
        assert_eq!(edge_pixels(&edges), expected);
    }

    #[test]
    fn test_horizontal_boundary_single_row() {
        let image = gray(10, 20, |_, y| if y < 10 { 0 } else { 255 });
        let edges = detect_edges(&image, 50.0, 150.0).unwrap();
        let expected: Vec<(u32, u32)> = (0..10).map(|x| (x, 9)).collect();
        assert_eq!(edge_pixels(&edges), expected);
    }

    #[test]
    fn test_output_is_binary() {
        let image = gray(24, 24, |x, y| ((x * 37 + y * 91) % 256) as u8);
        let edges = detect_edges(&image, 20.0, 80.0).unwrap();
        assert!(edges.as_slice().iter().all(|&v| v == 0 || v == 255));
    }

    #[test]
    fn test_weak_boundary_needs_strong_seed() {
        // Contrast 20 gives magnitude 80: above 50, below 150
        let weak = gray(20, 10, |x, _| if x < 10 { 0 } else { 20 });
        assert!(edge_pixels(&detect_edges(&weak, 50.0, 150.0).unwrap()).is_empty());
        assert_eq!(edge_pixels(&detect_edges(&weak, 50.0, 70.0).unwrap()).len(), 10);
        assert!(edge_pixels(&detect_edges(&weak, 80.0, 150.0).unwrap()).is_empty());
    }

    #[test]
    fn test_weak_boundary_grows_from_strong_part() {
        // Strong contrast in rows 0..5 continues as weak contrast in rows 5..10
        let image = gray(20, 10, |x, y| match (x < 10, y < 5) {
            (true, _) => 0,
            (false, true) => 255,
            (false, false) => 20,
        });
        let edges = detect_edges(&image, 50.0, 150.0).unwrap();
        assert_eq!(edges.get(9, 9, 0), Some(255));
        assert_eq!(edges.get(9, 7, 0), Some(255));
    }

    #[test]
    fn test_thresholds_are_swapped_when_inverted() {
        let detector = CannyDetector::new(150.0, 50.0).unwrap();
        assert_eq!(detector.low_threshold(), 50.0);
        assert_eq!(detector.high_threshold(), 150.0);

        let image = gray(20, 10, |x, _| if x < 10 { 0 } else { 40 });
        assert_eq!(
            detect_edges(&image, 150.0, 50.0).unwrap(),
            detect_edges(&image, 50.0, 150.0).unwrap()
        );
    }

    #[test]
    fn test_invalid_thresholds() {
        for (t1, t2) in [(-1.0, 150.0), (50.0, -0.5), (f32::NAN, 1.0), (1.0, f32::INFINITY)] {
            assert!(matches!(
                CannyDetector::new(t1, t2),
                Err(PipelineError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_color_input_uses_luminance() {
        let bytes: Vec<u8> = (0..10)
            .flat_map(|_| (0..20).flat_map(|x| if x < 10 { [0, 0, 0, 255] } else { [255, 255, 255, 255] }))
            .collect();
        let rgba = Matrix::from_vec(20, 10, 4, bytes).unwrap();
        let edges = detect_edges(&rgba, 50.0, 150.0).unwrap();
        assert_eq!(edges.channels(), 1);
        assert_eq!(edge_pixels(&edges).len(), 10);
        assert!(edge_pixels(&edges).iter().all(|&(x, _)| x == 9));
    }

    #[test]
    fn test_two_channel_input_rejected() {
        assert!(matches!(
            detect_edges(&Matrix::zeros(4, 4, 2), 50.0, 150.0),
            Err(PipelineError::UnsupportedChannelCount { channels: 2 })
        ));
    }

    #[test]
    fn test_detect_edges_image_is_opaque_grayscale() {
        let image = Image::from_rgba_bytes(
            20,
            10,
            &(0..200)
                .flat_map(|i| if i % 20 < 10 { [0, 0, 0, 255] } else { [255, 255, 255, 255] })
                .collect::<Vec<u8>>(),
        )
        .unwrap();
        let edges = detect_edges_image(&image, 50.0, 150.0).unwrap();
        assert_eq!(edges.dimensions(), (20, 10));
        assert_eq!(edges.rgba_at(9, 3), Some([255, 255, 255, 255]));
        assert_eq!(edges.rgba_at(10, 3), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_gradient_axis_quantization() {
        assert_eq!(GradientAxis::quantize(100, 0), GradientAxis::Horizontal);
        assert_eq!(GradientAxis::quantize(100, 41), GradientAxis::Horizontal);
        assert_eq!(GradientAxis::quantize(0, -100), GradientAxis::Vertical);
        assert_eq!(GradientAxis::quantize(41, 100), GradientAxis::Vertical);
        assert_eq!(GradientAxis::quantize(100, 100), GradientAxis::Diagonal(1));
        assert_eq!(GradientAxis::quantize(-100, 100), GradientAxis::Diagonal(-1));
    }
}
