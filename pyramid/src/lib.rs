//! Haar wavelet pyramid.
//!
//! A multiresolution decomposition of a 2D signal into quadrant-tiled
//! coefficient planes, its exact inverse, and coefficient shrinkage built on
//! top of the two for denoising. Denoising quality is measured with the peak
//! signal-to-noise ratio.
//!
//! The main entry points are [`decompose`], [`reconstruct`], [`denoise`] and
//! [`psnr`]. Planes can be read from and written to PGM files through the
//! [`pgm`] module.

use std::error;
use std::fmt;

pub mod haar;
pub mod pgm;
pub mod plane;
pub mod psnr;
pub mod shrink;

pub use haar::{decompose, reconstruct, BorderStyle, HaarPyramid, PyramidLayout, SubBandType};
pub use plane::{Plane, Region};
pub use psnr::{mse, psnr, PEAK_VALUE};
pub use shrink::{denoise, Denoiser, Shrinkage};

/// Error values that may be returned from the pyramid operations.
///
/// Every variant is a violation of the caller's contract and is detected
/// before any output is written.
#[derive(Debug, Clone, PartialEq)]
pub enum PyramidError {
    /// Dimension mismatch.
    ///
    /// The input and output planes (or the reference and test planes of a
    /// metric) must have identical dimensions.
    DimensionMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// Indivisible dimensions.
    ///
    /// Decomposing to `levels` levels halves both dimensions `levels` times,
    /// so width and height must be divisible by `2^levels`.
    IndivisibleDimensions {
        width: usize,
        height: usize,
        levels: usize,
    },

    /// The number of levels must be at least one.
    InvalidLevels(usize),

    /// A plane with zero width or height.
    EmptyPlane,

    /// Shrinkage thresholds must be finite and non-negative.
    InvalidThreshold(f64),
}

impl error::Error for PyramidError {}
impl fmt::Display for PyramidError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::DimensionMismatch { expected, found } => {
                write!(
                    f,
                    "dimension mismatch: expected {}x{}, found {}x{}",
                    expected.0, expected.1, found.0, found.1
                )
            }
            Self::IndivisibleDimensions {
                width,
                height,
                levels,
            } => {
                write!(
                    f,
                    "dimensions {}x{} are not divisible by 2^{} ({})",
                    width,
                    height,
                    levels,
                    1usize.checked_shl(*levels as u32).unwrap_or(0)
                )
            }
            Self::InvalidLevels(levels) => {
                write!(f, "invalid number of levels {}, at least 1 required", levels)
            }
            Self::EmptyPlane => write!(f, "plane has no samples"),
            Self::InvalidThreshold(threshold) => {
                write!(
                    f,
                    "invalid threshold {}, must be finite and non-negative",
                    threshold
                )
            }
        }
    }
}

/// Checks that two planes have the same dimensions.
pub(crate) fn check_same_dimensions(
    expected: &Plane,
    found: &Plane,
) -> Result<(), PyramidError> {
    if expected.dimensions() != found.dimensions() {
        return Err(PyramidError::DimensionMismatch {
            expected: expected.dimensions(),
            found: found.dimensions(),
        });
    }
    Ok(())
}
