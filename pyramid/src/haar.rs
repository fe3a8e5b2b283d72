//! Haar Wavelet Pyramid
//!
//! This module implements the forward and inverse 2D Haar wavelet transforms
//! over a quadrant-tiled coefficient plane.
//!
//! Each level splits the active block of the plane into four sub-bands of half
//! the width and height, using the four samples of every 2x2 block:
//!
//! ```text
//!   a b      LL = (a + b + c + d) / 4
//!   c d      HL = (a - b + c - d) / 4
//!            LH = (a + b - c - d) / 4
//!            HH = (a - b - c + d) / 4
//! ```
//!
//! The sub-bands are tiled LL (top left), HL (top right), LH (bottom left)
//! and HH (bottom right). The next level is computed from the LL quadrant
//! only, so after `n` levels the coarsest approximation occupies the top left
//! `W/2^n x H/2^n` block and every other coefficient belongs to a detail band.
//!
//! All levels are computed in place in one plane; a single scratch buffer is
//! shared between levels.

use log::{debug, info};

use crate::plane::{Plane, Region};
use crate::{check_same_dimensions, PyramidError};

/// Sub-band types in the wavelet decomposition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubBandType {
    /// Approximation, local averages
    LL,
    /// Horizontal detail, left column minus right column
    HL,
    /// Vertical detail, top row minus bottom row
    LH,
    /// Diagonal detail
    HH,
}

impl SubBandType {
    /// The three detail bands of a level, in tiling order
    pub const DETAILS: [SubBandType; 3] = [SubBandType::HL, SubBandType::LH, SubBandType::HH];
}

/// Positions of every level and sub-band inside a coefficient plane.
///
/// Level 1 is the finest level and covers the whole plane, level `n` is the
/// coarsest and covers the top left `W/2^(n-1) x H/2^(n-1)` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PyramidLayout {
    width: usize,
    height: usize,
    levels: usize,
}

impl PyramidLayout {
    /// Create a layout, validating that both dimensions halve `levels` times.
    pub fn new(width: usize, height: usize, levels: usize) -> Result<Self, PyramidError> {
        if levels == 0 {
            return Err(PyramidError::InvalidLevels(levels));
        }
        if width == 0 || height == 0 {
            return Err(PyramidError::EmptyPlane);
        }
        let divisible = match 1usize.checked_shl(levels as u32) {
            Some(divisor) if levels < usize::BITS as usize => {
                width % divisor == 0 && height % divisor == 0
            }
            _ => false,
        };
        if !divisible {
            return Err(PyramidError::IndivisibleDimensions {
                width,
                height,
                levels,
            });
        }
        Ok(Self {
            width,
            height,
            levels,
        })
    }

    /// Layout for decomposing `plane` to `levels` levels
    pub fn for_plane(plane: &Plane, levels: usize) -> Result<Self, PyramidError> {
        Self::new(plane.width(), plane.height(), levels)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn levels(&self) -> usize {
        self.levels
    }

    /// Size of the block a level is computed from.
    ///
    /// # Panics
    ///
    /// Panics if `level` is not in `1..=self.levels()`.
    pub fn level_extent(&self, level: usize) -> (usize, usize) {
        assert!(
            level >= 1 && level <= self.levels,
            "level {} outside of 1..={}",
            level,
            self.levels
        );
        (self.width >> (level - 1), self.height >> (level - 1))
    }

    /// Region of a sub-band at the given level.
    ///
    /// # Panics
    ///
    /// Panics if `level` is not in `1..=self.levels()`.
    pub fn band(&self, level: usize, band: SubBandType) -> Region {
        let (width, height) = self.level_extent(level);
        let (half_width, half_height) = (width / 2, height / 2);
        let (x, y) = match band {
            SubBandType::LL => (0, 0),
            SubBandType::HL => (half_width, 0),
            SubBandType::LH => (0, half_height),
            SubBandType::HH => (half_width, half_height),
        };
        Region::new(x, y, half_width, half_height)
    }

    /// Region of the coarsest approximation band.
    pub fn approximation(&self) -> Region {
        self.band(self.levels, SubBandType::LL)
    }

    /// Whether the coefficient at `(x, y)` belongs to a detail band.
    pub fn is_detail(&self, x: usize, y: usize) -> bool {
        !self.approximation().contains(x, y)
    }

    /// Every band that survives in a fully decomposed plane, finest first.
    pub fn bands(&self) -> Vec<(usize, SubBandType, Region)> {
        let mut bands = Vec::with_capacity(3 * self.levels + 1);
        for level in 1..=self.levels {
            for band in SubBandType::DETAILS {
                bands.push((level, band, self.band(level, band)));
            }
        }
        bands.push((self.levels, SubBandType::LL, self.approximation()));
        bands
    }
}

/// Border drawn around every band by [`HaarPyramid::decompose_for_display`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderStyle {
    /// Width of the border in samples
    pub strength: usize,
    pub color: f64,
}

impl Default for BorderStyle {
    fn default() -> Self {
        Self {
            strength: 2,
            color: 0.0,
        }
    }
}

/// The main Haar pyramid processor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HaarPyramid {
    levels: usize,
}

impl Default for HaarPyramid {
    fn default() -> Self {
        Self { levels: 3 }
    }
}

impl HaarPyramid {
    /// Create a new processor decomposing to `levels` levels
    pub fn new(levels: usize) -> Self {
        Self { levels }
    }

    pub fn levels(&self) -> usize {
        self.levels
    }

    /// Layout of a plane decomposed by this processor
    pub fn layout(&self, plane: &Plane) -> Result<PyramidLayout, PyramidError> {
        PyramidLayout::for_plane(plane, self.levels)
    }

    // ========================================================================
    // Single level analysis / synthesis
    // ========================================================================

    /// Split the `width x height` top left block of `plane` into its four
    /// sub-bands.
    fn analyze_level(plane: &mut Plane, width: usize, height: usize, scratch: &mut Vec<f64>) {
        let half_width = width / 2;
        let half_height = height / 2;
        scratch.clear();
        scratch.resize(width * height, 0.0);

        for y in 0..half_height {
            for x in 0..half_width {
                let a = plane[(2 * x, 2 * y)];
                let b = plane[(2 * x + 1, 2 * y)];
                let c = plane[(2 * x, 2 * y + 1)];
                let d = plane[(2 * x + 1, 2 * y + 1)];

                scratch[y * width + x] = (a + b + c + d) / 4.0;
                scratch[y * width + x + half_width] = (a - b + c - d) / 4.0;
                scratch[(y + half_height) * width + x] = (a + b - c - d) / 4.0;
                scratch[(y + half_height) * width + x + half_width] = (a - b - c + d) / 4.0;
            }
        }

        Self::store_block(plane, width, height, scratch);
    }

    /// Merge the four sub-bands of the `width x height` top left block of
    /// `plane` back into samples.
    fn synthesize_level(plane: &mut Plane, width: usize, height: usize, scratch: &mut Vec<f64>) {
        let half_width = width / 2;
        let half_height = height / 2;
        scratch.clear();
        scratch.resize(width * height, 0.0);

        for y in 0..half_height {
            for x in 0..half_width {
                let ll = plane[(x, y)];
                let hl = plane[(x + half_width, y)];
                let lh = plane[(x, y + half_height)];
                let hh = plane[(x + half_width, y + half_height)];

                scratch[2 * y * width + 2 * x] = ll + hl + lh + hh;
                scratch[2 * y * width + 2 * x + 1] = ll - hl + lh - hh;
                scratch[(2 * y + 1) * width + 2 * x] = ll + hl - lh - hh;
                scratch[(2 * y + 1) * width + 2 * x + 1] = ll - hl - lh + hh;
            }
        }

        Self::store_block(plane, width, height, scratch);
    }

    /// Copy a row-major `width x height` block into the top left of `plane`.
    fn store_block(plane: &mut Plane, width: usize, height: usize, block: &[f64]) {
        let stride = plane.width();
        let data = plane.data_mut();
        for (y, row) in block.chunks_exact(width).take(height).enumerate() {
            data[y * stride..y * stride + width].copy_from_slice(row);
        }
    }

    // ========================================================================
    // Full pyramid
    // ========================================================================

    /// Decompose `plane` in place into a tiled coefficient plane.
    pub fn decompose_in_place(&self, plane: &mut Plane) -> Result<(), PyramidError> {
        let layout = self.layout(plane)?;
        let mut scratch = Vec::with_capacity(plane.width() * plane.height());

        for level in 1..=layout.levels() {
            let (width, height) = layout.level_extent(level);
            debug!("decompose level {} on {}x{} block", level, width, height);
            Self::analyze_level(plane, width, height, &mut scratch);
        }

        Ok(())
    }

    /// Reconstruct in place the samples of a tiled coefficient plane.
    ///
    /// The coarsest level is merged first; its samples become the
    /// approximation band of the next finer level.
    pub fn reconstruct_in_place(&self, plane: &mut Plane) -> Result<(), PyramidError> {
        let layout = self.layout(plane)?;
        let mut scratch = Vec::with_capacity(plane.width() * plane.height());

        for level in (1..=layout.levels()).rev() {
            let (width, height) = layout.level_extent(level);
            debug!("reconstruct level {} on {}x{} block", level, width, height);
            Self::synthesize_level(plane, width, height, &mut scratch);
        }

        Ok(())
    }

    /// Decompose `input` into the coefficient plane `output`.
    ///
    /// Both planes must have the same dimensions, divisible by `2^levels`.
    /// On error `output` is left untouched.
    pub fn decompose(&self, input: &Plane, output: &mut Plane) -> Result<(), PyramidError> {
        check_same_dimensions(input, output)?;
        self.layout(input)?;

        info!(
            "Haar decomposition of {}x{} plane to {} levels",
            input.width(),
            input.height(),
            self.levels
        );
        output.data_mut().copy_from_slice(input.data());
        self.decompose_in_place(output)
    }

    /// Reconstruct the samples of the coefficient plane `input` into `output`.
    ///
    /// `input` must have been produced with the same number of levels.
    /// On error `output` is left untouched.
    pub fn reconstruct(&self, input: &Plane, output: &mut Plane) -> Result<(), PyramidError> {
        check_same_dimensions(input, output)?;
        self.layout(input)?;

        info!(
            "Haar reconstruction of {}x{} plane from {} levels",
            input.width(),
            input.height(),
            self.levels
        );
        output.data_mut().copy_from_slice(input.data());
        self.reconstruct_in_place(output)
    }

    /// Decompose for viewing, framing every band with a border.
    ///
    /// The borders overwrite coefficients, so the result can not be
    /// reconstructed.
    pub fn decompose_for_display(
        &self,
        input: &Plane,
        output: &mut Plane,
        border: BorderStyle,
    ) -> Result<(), PyramidError> {
        self.decompose(input, output)?;
        let layout = self.layout(output)?;
        for (_, _, region) in layout.bands() {
            output.draw_rect_border(region, border.strength, border.color);
        }
        Ok(())
    }

    /// Perform a complete forward then inverse transform (for testing round-trip)
    pub fn round_trip(&self, input: &Plane) -> Result<Plane, PyramidError> {
        let mut plane = input.clone();
        self.decompose_in_place(&mut plane)?;
        self.reconstruct_in_place(&mut plane)?;
        Ok(plane)
    }
}

// ============================================================================
// Convenience Functions
// ============================================================================

/// Decompose `input` into `output` with `levels` Haar levels
pub fn decompose(input: &Plane, output: &mut Plane, levels: usize) -> Result<(), PyramidError> {
    HaarPyramid::new(levels).decompose(input, output)
}

/// Reconstruct `output` from the `levels` level coefficient plane `input`
pub fn reconstruct(input: &Plane, output: &mut Plane, levels: usize) -> Result<(), PyramidError> {
    HaarPyramid::new(levels).reconstruct(input, output)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-10;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    fn planes_approx_eq(a: &Plane, b: &Plane, eps: f64) -> bool {
        if a.dimensions() != b.dimensions() {
            return false;
        }
        for y in 0..a.height() {
            for x in 0..a.width() {
                if !approx_eq(a[(x, y)], b[(x, y)], eps) {
                    return false;
                }
            }
        }
        true
    }

    fn ramp(width: usize, height: usize) -> Plane {
        let data: Vec<f64> = (0..width * height).map(|v| v as f64).collect();
        Plane::from_data(data, width, height)
    }

    /// Deterministic, non-smooth test signal
    fn texture(width: usize, height: usize) -> Plane {
        let data: Vec<f64> = (0..width * height)
            .map(|i| ((i * 37 + 11) % 256) as f64)
            .collect();
        Plane::from_data(data, width, height)
    }

    #[test]
    fn test_layout_validation() {
        assert_eq!(
            PyramidLayout::new(8, 8, 0),
            Err(PyramidError::InvalidLevels(0))
        );
        assert_eq!(PyramidLayout::new(0, 8, 1), Err(PyramidError::EmptyPlane));
        assert_eq!(
            PyramidLayout::new(12, 16, 3),
            Err(PyramidError::IndivisibleDimensions {
                width: 12,
                height: 16,
                levels: 3
            })
        );
        assert_eq!(
            PyramidLayout::new(16, 8, 4),
            Err(PyramidError::IndivisibleDimensions {
                width: 16,
                height: 8,
                levels: 4
            })
        );
        assert!(PyramidLayout::new(16, 8, 3).is_ok());
        assert!(PyramidLayout::new(16, 16, 200).is_err());
    }

    #[test]
    fn test_layout_bands() {
        let layout = PyramidLayout::new(16, 8, 2).unwrap();
        assert_eq!(layout.level_extent(1), (16, 8));
        assert_eq!(layout.level_extent(2), (8, 4));

        assert_eq!(layout.band(1, SubBandType::LL), Region::new(0, 0, 8, 4));
        assert_eq!(layout.band(1, SubBandType::HL), Region::new(8, 0, 8, 4));
        assert_eq!(layout.band(1, SubBandType::LH), Region::new(0, 4, 8, 4));
        assert_eq!(layout.band(1, SubBandType::HH), Region::new(8, 4, 8, 4));
        assert_eq!(layout.band(2, SubBandType::HL), Region::new(4, 0, 4, 2));
        assert_eq!(layout.band(2, SubBandType::HH), Region::new(4, 2, 4, 2));
        assert_eq!(layout.approximation(), Region::new(0, 0, 4, 2));

        assert!(!layout.is_detail(3, 1));
        assert!(layout.is_detail(4, 1));
        assert!(layout.is_detail(0, 2));
        assert!(layout.is_detail(15, 7));

        // bands tile the plane without overlap
        let bands = layout.bands();
        assert_eq!(bands.len(), 7);
        let area: usize = bands.iter().map(|(_, _, r)| r.width * r.height).sum();
        assert_eq!(area, 16 * 8);
    }

    #[test]
    #[should_panic(expected = "level 3 outside of 1..=2")]
    fn test_level_extent_out_of_range() {
        let layout = PyramidLayout::new(16, 8, 2).unwrap();
        layout.level_extent(3);
    }

    #[test]
    #[should_panic(expected = "level 0 outside of 1..=2")]
    fn test_band_level_zero() {
        let layout = PyramidLayout::new(16, 8, 2).unwrap();
        layout.band(0, SubBandType::HH);
    }

    #[test]
    fn test_single_block_coefficients() {
        let input = Plane::from_data(vec![1.0, 2.0, 3.0, 4.0], 2, 2);
        let mut output = Plane::new(2, 2);
        decompose(&input, &mut output, 1).unwrap();

        assert_eq!(output[(0, 0)], 2.5);
        assert_eq!(output[(1, 0)], -0.5);
        assert_eq!(output[(0, 1)], -1.0);
        assert_eq!(output[(1, 1)], 0.0);
    }

    #[test]
    fn test_edge_sensitivity() {
        // vertical edge: only the horizontal detail band responds
        let mut vertical = Plane::new(4, 4);
        for y in 0..4 {
            for x in 0..4 {
                vertical[(x, y)] = if x % 2 == 0 { 0.0 } else { 4.0 };
            }
        }
        let mut output = Plane::new(4, 4);
        decompose(&vertical, &mut output, 1).unwrap();
        assert!(output.cut(2, 0, 4, 2).data().iter().all(|&v| v == -2.0));
        assert!(output.cut(0, 2, 4, 4).data().iter().all(|&v| v == 0.0));

        // horizontal edge: only the vertical detail band responds
        let mut horizontal = Plane::new(4, 4);
        for y in 0..4 {
            for x in 0..4 {
                horizontal[(x, y)] = if y % 2 == 0 { 4.0 } else { 0.0 };
            }
        }
        decompose(&horizontal, &mut output, 1).unwrap();
        assert!(output.cut(2, 0, 4, 2).data().iter().all(|&v| v == 0.0));
        assert!(output.cut(0, 2, 2, 4).data().iter().all(|&v| v == 2.0));
        assert!(output.cut(2, 2, 4, 4).data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_dc_signal() {
        let input = Plane::filled(8, 8, 100.0);
        let mut output = Plane::new(8, 8);
        decompose(&input, &mut output, 3).unwrap();

        assert_eq!(output[(0, 0)], 100.0);
        for y in 0..8 {
            for x in 0..8 {
                if (x, y) != (0, 0) {
                    assert_eq!(output[(x, y)], 0.0, "detail at ({}, {})", x, y);
                }
            }
        }
    }

    #[test]
    fn test_two_level_tiling() {
        let input = ramp(4, 4);
        let mut one = Plane::new(4, 4);
        let mut two = Plane::new(4, 4);
        decompose(&input, &mut one, 1).unwrap();
        decompose(&input, &mut two, 2).unwrap();

        // level 1 details are not revisited by level 2
        for y in 0..4 {
            for x in 0..4 {
                if x >= 2 || y >= 2 {
                    assert_eq!(one[(x, y)], two[(x, y)]);
                }
            }
        }

        // level 2 decomposes the level 1 approximation
        let mut expected = Plane::new(2, 2);
        decompose(&one.cut(0, 0, 2, 2), &mut expected, 1).unwrap();
        assert_eq!(two.cut(0, 0, 2, 2), expected);
        assert!(approx_eq(two[(0, 0)], 7.5, EPSILON));
    }

    #[test]
    fn test_energy_one_level() {
        let input = texture(16, 16);
        let mut output = Plane::new(16, 16);
        decompose(&input, &mut output, 1).unwrap();

        let expected = input.sum_of_squares() / 4.0;
        assert!(approx_eq(output.sum_of_squares(), expected, 1e-6));
    }

    #[test]
    fn test_roundtrip_all_levels() {
        let input = texture(16, 16);
        for levels in 1..=4 {
            let mut coefficients = Plane::new(16, 16);
            let mut reconstructed = Plane::new(16, 16);
            decompose(&input, &mut coefficients, levels).unwrap();
            reconstruct(&coefficients, &mut reconstructed, levels).unwrap();
            assert!(
                planes_approx_eq(&input, &reconstructed, EPSILON),
                "round trip failed for {} levels",
                levels
            );
        }
    }

    #[test]
    fn test_roundtrip_non_square() {
        let input = texture(32, 8);
        for levels in 1..=3 {
            let processor = HaarPyramid::new(levels);
            let result = processor.round_trip(&input).unwrap();
            assert!(planes_approx_eq(&input, &result, EPSILON));
        }

        let input = texture(8, 24);
        let result = HaarPyramid::new(3).round_trip(&input).unwrap();
        assert!(planes_approx_eq(&input, &result, EPSILON));
    }

    #[test]
    fn test_in_place_matches_copy() {
        let input = texture(8, 8);
        let processor = HaarPyramid::new(2);

        let mut copied = Plane::new(8, 8);
        processor.decompose(&input, &mut copied).unwrap();

        let mut in_place = input.clone();
        processor.decompose_in_place(&mut in_place).unwrap();
        assert_eq!(copied, in_place);
    }

    #[test]
    fn test_dimension_mismatch_leaves_output() {
        let input = ramp(8, 8);
        let mut output = Plane::filled(8, 4, 255.0);
        let err = decompose(&input, &mut output, 1).unwrap_err();
        assert_eq!(
            err,
            PyramidError::DimensionMismatch {
                expected: (8, 8),
                found: (8, 4)
            }
        );
        assert_eq!(output, Plane::filled(8, 4, 255.0));

        let mut output = Plane::filled(8, 4, 255.0);
        assert!(reconstruct(&input, &mut output, 1).is_err());
        assert_eq!(output, Plane::filled(8, 4, 255.0));
    }

    #[test]
    fn test_indivisible_leaves_output() {
        let input = ramp(12, 12);
        let mut output = Plane::filled(12, 12, 1.0);
        let err = decompose(&input, &mut output, 3).unwrap_err();
        assert!(matches!(
            err,
            PyramidError::IndivisibleDimensions { levels: 3, .. }
        ));
        assert_eq!(output, Plane::filled(12, 12, 1.0));

        // two levels do fit
        assert!(decompose(&input, &mut output, 2).is_ok());
    }

    #[test]
    fn test_decompose_for_display() {
        let input = texture(16, 16);
        let processor = HaarPyramid::new(2);
        let mut plain = Plane::new(16, 16);
        let mut framed = Plane::new(16, 16);
        processor.decompose(&input, &mut plain).unwrap();
        processor
            .decompose_for_display(
                &input,
                &mut framed,
                BorderStyle {
                    strength: 1,
                    color: 255.0,
                },
            )
            .unwrap();

        // band edges are painted
        assert_eq!(framed[(8, 0)], 255.0);
        assert_eq!(framed[(7, 3)], 255.0);
        assert_eq!(framed[(15, 15)], 255.0);
        assert_eq!(framed[(0, 0)], 255.0);
        // band interiors keep the coefficients
        assert_eq!(framed[(10, 10)], plain[(10, 10)]);
        assert_eq!(framed[(5, 1)], plain[(5, 1)]);
    }

    #[test]
    fn test_default_processor() {
        assert_eq!(HaarPyramid::default().levels(), 3);
        assert_eq!(BorderStyle::default().strength, 2);
    }
}
