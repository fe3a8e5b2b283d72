//! Wavelet shrinkage denoising.
//!
//! The signal is decomposed with [`HaarPyramid`], every detail coefficient is
//! passed through a shrinkage rule, and the result is reconstructed. The
//! coarsest approximation band is never modified.

use log::{debug, info};

use crate::haar::{HaarPyramid, PyramidLayout};
use crate::plane::Plane;
use crate::{check_same_dimensions, PyramidError};

/// Shrinkage rule applied to detail coefficients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shrinkage {
    /// Zero coefficients with a magnitude below the threshold, keep the rest
    Hard,
    /// Zero coefficients up to the threshold, move the rest towards zero by it
    Soft,
}

impl Shrinkage {
    /// Apply the rule to a single coefficient.
    pub fn apply(self, coefficient: f64, threshold: f64) -> f64 {
        match self {
            Shrinkage::Hard => {
                if coefficient.abs() < threshold {
                    0.0
                } else {
                    coefficient
                }
            }
            Shrinkage::Soft => {
                let magnitude = (coefficient.abs() - threshold).max(0.0);
                if magnitude == 0.0 {
                    0.0
                } else {
                    coefficient.signum() * magnitude
                }
            }
        }
    }
}

/// Wavelet shrinkage denoiser
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Denoiser {
    threshold: f64,
    mode: Shrinkage,
    pyramid: HaarPyramid,
}

impl Default for Denoiser {
    fn default() -> Self {
        Self {
            threshold: 30.0,
            mode: Shrinkage::Soft,
            pyramid: HaarPyramid::default(),
        }
    }
}

impl Denoiser {
    /// Create a denoiser, the threshold must be finite and non-negative.
    pub fn new(threshold: f64, mode: Shrinkage, levels: usize) -> Result<Self, PyramidError> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(PyramidError::InvalidThreshold(threshold));
        }
        Ok(Self {
            threshold,
            mode,
            pyramid: HaarPyramid::new(levels),
        })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn mode(&self) -> Shrinkage {
        self.mode
    }

    pub fn levels(&self) -> usize {
        self.pyramid.levels()
    }

    /// Shrink every detail coefficient of a decomposed plane in place.
    ///
    /// Returns the number of coefficients that were set to zero.
    pub fn shrink_coefficients(&self, coefficients: &mut Plane, layout: &PyramidLayout) -> usize {
        let approximation = layout.approximation();
        let mut zeroed = 0;
        for y in 0..coefficients.height() {
            for x in 0..coefficients.width() {
                if approximation.contains(x, y) {
                    continue;
                }
                let shrunk = self.mode.apply(coefficients[(x, y)], self.threshold);
                if shrunk == 0.0 {
                    zeroed += 1;
                }
                coefficients[(x, y)] = shrunk;
            }
        }
        zeroed
    }

    /// Denoise `input` into `output`.
    ///
    /// Both planes must have the same dimensions, divisible by `2^levels`.
    /// On error `output` is left untouched.
    pub fn denoise(&self, input: &Plane, output: &mut Plane) -> Result<(), PyramidError> {
        check_same_dimensions(input, output)?;
        let layout = self.pyramid.layout(input)?;

        let mut coefficients = input.clone();
        self.pyramid.decompose_in_place(&mut coefficients)?;

        let zeroed = self.shrink_coefficients(&mut coefficients, &layout);
        debug!(
            "{:?} shrinkage zeroed {} of {} coefficients",
            self.mode,
            zeroed,
            coefficients.data().len()
        );

        self.pyramid.reconstruct_in_place(&mut coefficients)?;
        *output = coefficients;

        info!(
            "{:?} shrinkage with threshold {} over {} levels",
            self.mode,
            self.threshold,
            self.levels()
        );
        Ok(())
    }
}

/// Denoise `input` into `output` with the given threshold, rule and levels
pub fn denoise(
    input: &Plane,
    output: &mut Plane,
    threshold: f64,
    mode: Shrinkage,
    levels: usize,
) -> Result<(), PyramidError> {
    Denoiser::new(threshold, mode, levels)?.denoise(input, output)
}
