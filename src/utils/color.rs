//! Color space conversions on 8-bit matrices
//!
//! Both conversions use exact integer arithmetic so results are
//! reproducible bit for bit across platforms:
//!
//! - Luminance: BT.601 weights in Q14 fixed point,
//!   `(4899 R + 9617 G + 1868 B + 8192) >> 14`.
//! - HSV: 8-bit hue convention, H in `[0, 179]` (degrees / 2), S and V in
//!   `[0, 255]`, every quotient rounded half up.

use crate::{
    codec::Matrix,
    error::{PipelineError, Result},
};

const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;
const LUMA_SHIFT: u32 = 14;

/// Largest hue value on the 8-bit scale
pub const MAX_HUE: u8 = 179;

/// Utility for color conversions used by the edge detector and background remover
pub struct ColorConverter;

impl ColorConverter {
    /// BT.601 luminance of one RGB triple
    #[inline]
    #[must_use]
    pub fn luma(r: u8, g: u8, b: u8) -> u8 {
        let weighted = LUMA_R * u32::from(r) + LUMA_G * u32::from(g) + LUMA_B * u32::from(b);
        ((weighted + (1 << (LUMA_SHIFT - 1))) >> LUMA_SHIFT) as u8
    }

    /// Convert one RGB triple to `[H, S, V]` on the 8-bit hue scale
    ///
    /// # Examples
    /// ```rust
    /// use visubee::utils::ColorConverter;
    ///
    /// assert_eq!(ColorConverter::rgb_to_hsv(0, 255, 0), [60, 255, 255]);
    /// assert_eq!(ColorConverter::rgb_to_hsv(0, 0, 255), [120, 255, 255]);
    /// ```
    #[must_use]
    pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> [u8; 3] {
        let (r, g, b) = (i32::from(r), i32::from(g), i32::from(b));
        let v = r.max(g).max(b);
        let diff = v - r.min(g).min(b);

        let s = if v == 0 {
            0
        } else {
            (510 * diff + v) / (2 * v)
        };

        let h = if diff == 0 {
            0
        } else {
            let sextant = if v == r {
                g - b
            } else if v == g {
                b - r + 2 * diff
            } else {
                r - g + 4 * diff
            };
            // round(30 * sextant / diff), floor division so negatives round half up too
            let h = (60 * sextant + diff).div_euclid(2 * diff);
            if h < 0 {
                h + 180
            } else {
                h
            }
        };

        [h as u8, s as u8, v as u8]
    }

    /// Single-channel luminance matrix
    ///
    /// 1-channel input is returned as-is; 3- and 4-channel input is read as
    /// R,G,B(,A) with alpha ignored.
    ///
    /// # Errors
    /// `UnsupportedChannelCount` for any other channel count.
    pub fn to_grayscale(matrix: &Matrix) -> Result<Matrix> {
        let channels = matrix.channels();
        match channels {
            1 => Ok(matrix.clone()),
            3 | 4 => {
                let gray = matrix
                    .as_slice()
                    .chunks_exact(channels)
                    .map(|px| Self::luma(px[0], px[1], px[2]))
                    .collect();
                Matrix::from_vec(matrix.width(), matrix.height(), 1, gray)
            },
            other => Err(PipelineError::unsupported_channels(other)),
        }
    }

    /// 3-channel `H, S, V` matrix from an RGB or RGBA matrix
    ///
    /// # Errors
    /// `UnsupportedChannelCount` unless the input has 3 or 4 channels.
    pub fn to_hsv(matrix: &Matrix) -> Result<Matrix> {
        let channels = matrix.channels();
        if channels != 3 && channels != 4 {
            return Err(PipelineError::unsupported_channels(channels));
        }

        let hsv = matrix
            .as_slice()
            .chunks_exact(channels)
            .flat_map(|px| Self::rgb_to_hsv(px[0], px[1], px[2]))
            .collect();
        Matrix::from_vec(matrix.width(), matrix.height(), 3, hsv)
    }

    /// Arithmetic mean of every channel, `None` for an empty matrix
    #[must_use]
    pub fn channel_means(matrix: &Matrix) -> Option<Vec<f64>> {
        let channels = matrix.channels();
        let count = matrix.width() as usize * matrix.height() as usize;
        if count == 0 || channels == 0 {
            return None;
        }

        let mut sums = vec![0u64; channels];
        for px in matrix.as_slice().chunks_exact(channels) {
            for (sum, &value) in sums.iter_mut().zip(px) {
                *sum += u64::from(value);
            }
        }
        Some(sums.into_iter().map(|s| s as f64 / count as f64).collect())
    }
}
