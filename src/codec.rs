//! Conversion between packed-pixel images and channel matrices
//!
//! The algorithms work on [`Matrix`], an `ndarray` buffer of shape
//! `(height, width, channels)` in standard (row-major, interleaved) layout.
//! [`decode`] unpacks an [`Image`] into a 4-channel R,G,B,A matrix;
//! [`encode`] packs 1-, 3- or 4-channel matrices back into an [`Image`].

use crate::{
    error::{PipelineError, Result},
    types::{pack_argb, unpack_argb, Image},
};
use ndarray::{Array3, ArrayView3};

/// Row-major, interleaved 8-bit matrix with 1, 3 or 4 channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    data: Array3<u8>,
}

impl Matrix {
    /// Zero-filled matrix
    #[must_use]
    pub fn zeros(width: u32, height: u32, channels: usize) -> Self {
        Self {
            data: Array3::zeros((height as usize, width as usize, channels)),
        }
    }

    /// Wrap an `(height, width, channels)` array
    #[must_use]
    pub fn from_array(data: Array3<u8>) -> Self {
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().to_owned()
        };
        Self { data }
    }

    /// Build from interleaved row-major bytes
    ///
    /// # Errors
    /// `InvalidImageDimensions` when the byte count does not match the shape.
    pub fn from_vec(width: u32, height: u32, channels: usize, bytes: Vec<u8>) -> Result<Self> {
        let data = Array3::from_shape_vec((height as usize, width as usize, channels), bytes)
            .map_err(|e| {
                PipelineError::invalid_dimensions(format!(
                    "{}x{}x{} matrix: {}",
                    width, height, channels, e
                ))
            })?;
        Ok(Self { data })
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.data.dim().1 as u32
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.data.dim().0 as u32
    }

    #[must_use]
    pub fn channels(&self) -> usize {
        self.data.dim().2
    }

    /// Element at column `x`, row `y`, channel `c`
    #[must_use]
    pub fn get(&self, x: u32, y: u32, c: usize) -> Option<u8> {
        self.data.get((y as usize, x as usize, c)).copied()
    }

    /// Interleaved row-major bytes
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        self.data.as_slice().unwrap_or(&[])
    }

    #[must_use]
    pub fn view(&self) -> ArrayView3<'_, u8> {
        self.data.view()
    }

    #[must_use]
    pub fn into_array(self) -> Array3<u8> {
        self.data
    }
}

/// Unpack an image into a 4-channel R,G,B,A matrix
#[must_use]
pub fn decode(image: &Image) -> Matrix {
    let (width, height) = image.dimensions();
    let pixels = image.pixels();
    let data = Array3::from_shape_fn(
        (height as usize, width as usize, 4),
        |(y, x, c)| unpack_argb(pixels[y * width as usize + x])[c],
    );
    Matrix { data }
}

/// Pack a matrix back into an image
///
/// 1-channel matrices are expanded to opaque gray, 3-channel matrices get
/// alpha = 255, 4-channel matrices are taken as R,G,B,A.
///
/// # Errors
/// `UnsupportedChannelCount` for any other channel count.
pub fn encode(matrix: &Matrix) -> Result<Image> {
    let channels = matrix.channels();
    let bytes = matrix.as_slice();

    let pixels: Vec<u32> = match channels {
        1 => bytes.iter().map(|&v| pack_argb([v, v, v, 255])).collect(),
        3 => bytes
            .chunks_exact(3)
            .map(|px| pack_argb([px[0], px[1], px[2], 255]))
            .collect(),
        4 => bytes
            .chunks_exact(4)
            .map(|px| pack_argb([px[0], px[1], px[2], px[3]]))
            .collect(),
        other => return Err(PipelineError::unsupported_channels(other)),
    };

    Image::from_argb(matrix.width(), matrix.height(), pixels)
}
