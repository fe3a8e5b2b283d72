//! Peak signal-to-noise ratio between two planes.

use log::debug;

use crate::plane::Plane;
use crate::{check_same_dimensions, PyramidError};

/// Peak sample value of 8 bit intensities
pub const PEAK_VALUE: f64 = 255.0;

/// Mean squared error between two planes of identical dimensions.
pub fn mse(reference: &Plane, test: &Plane) -> Result<f64, PyramidError> {
    check_same_dimensions(reference, test)?;
    if reference.is_empty() {
        return Err(PyramidError::EmptyPlane);
    }

    let sum: f64 = reference
        .data()
        .iter()
        .zip(test.data())
        .map(|(r, t)| (r - t) * (r - t))
        .sum();
    Ok(sum / reference.data().len() as f64)
}

/// Peak signal-to-noise ratio of `test` against `reference`, in decibels.
///
/// Identical planes have no noise; `f64::INFINITY` is returned for them.
pub fn psnr(reference: &Plane, test: &Plane) -> Result<f64, PyramidError> {
    let mse = mse(reference, test)?;
    if mse == 0.0 {
        debug!("planes are identical, PSNR is infinite");
        return Ok(f64::INFINITY);
    }
    Ok(20.0 * PEAK_VALUE.log10() - 10.0 * mse.log10())
}
