//! A 2D plane of real valued samples.
//!
//! Planes are stored row-major with the origin at the top left, `x` growing
//! to the right and `y` growing downwards.

use std::ops::{Index, IndexMut};

/// A rectangle inside a plane, in sample coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Region {
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive upper bound of the x coordinate
    pub fn x1(&self) -> usize {
        self.x + self.width
    }

    /// Exclusive upper bound of the y coordinate
    pub fn y1(&self) -> usize {
        self.y + self.height
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x && x < self.x1() && y >= self.y && y < self.y1()
    }
}

/// A 2D array of samples
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    data: Vec<f64>,
    width: usize,
    height: usize,
}

impl Plane {
    /// Create a new zero filled plane with given dimensions
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, 0.0)
    }

    /// Create a new plane with every sample set to `value`
    pub fn filled(width: usize, height: usize, value: f64) -> Self {
        Self {
            data: vec![value; width * height],
            width,
            height,
        }
    }

    /// Create from existing row-major data
    pub fn from_data(data: Vec<f64>, width: usize, height: usize) -> Self {
        assert_eq!(data.len(), width * height);
        Self {
            data,
            width,
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.data[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, value: f64) {
        self.data[y * self.width + x] = value;
    }

    /// Get a row as a slice
    pub fn row(&self, y: usize) -> &[f64] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    fn row_mut(&mut self, y: usize) -> &mut [f64] {
        &mut self.data[y * self.width..(y + 1) * self.width]
    }

    /// Extract the half-open region `[x0, x1) x [y0, y1)` into a new plane.
    pub fn cut(&self, x0: usize, y0: usize, x1: usize, y1: usize) -> Plane {
        assert!(
            x0 <= x1 && y0 <= y1 && x1 <= self.width && y1 <= self.height,
            "region ({}, {})..({}, {}) outside of {}x{} plane",
            x0,
            y0,
            x1,
            y1,
            self.width,
            self.height
        );
        let width = x1 - x0;
        let height = y1 - y0;
        let mut data = Vec::with_capacity(width * height);
        for y in y0..y1 {
            data.extend_from_slice(&self.row(y)[x0..x1]);
        }
        Plane::from_data(data, width, height)
    }

    /// Extract a region into a new plane.
    pub fn cut_region(&self, region: Region) -> Plane {
        self.cut(region.x, region.y, region.x1(), region.y1())
    }

    /// Insert `src` with its top left corner at `(x, y)`.
    ///
    /// Samples of `src` falling outside of this plane are dropped.
    pub fn paste(&mut self, src: &Plane, x: usize, y: usize) {
        if x >= self.width || y >= self.height {
            return;
        }
        let copy_width = src.width.min(self.width - x);
        let copy_height = src.height.min(self.height - y);
        for row in 0..copy_height {
            self.row_mut(y + row)[x..x + copy_width].copy_from_slice(&src.row(row)[..copy_width]);
        }
    }

    /// Change the dimensions of the plane.
    ///
    /// The overlapping top left content is kept and new samples are zero.
    pub fn resize(&mut self, width: usize, height: usize) {
        if (width, height) == self.dimensions() {
            return;
        }
        let mut resized = Plane::new(width, height);
        resized.paste(self, 0, 0);
        *self = resized;
    }

    /// Smallest and largest sample, `None` for an empty plane.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        let mut iter = self.data.iter().copied();
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    /// Linearly map the current sample range onto `[min, max]`.
    ///
    /// A constant plane maps to `min`.
    pub fn normalize(&mut self, min: f64, max: f64) {
        let (lo, hi) = match self.min_max() {
            Some(range) => range,
            None => return,
        };
        let span = hi - lo;
        if span == 0.0 {
            self.data.iter_mut().for_each(|v| *v = min);
            return;
        }
        let scale = (max - min) / span;
        for v in self.data.iter_mut() {
            *v = min + (*v - lo) * scale;
        }
    }

    pub fn sum_of_squares(&self) -> f64 {
        self.data.iter().map(|v| v * v).sum()
    }

    /// Paint a frame `strength` samples wide along the edges of the plane.
    pub fn draw_border(&mut self, strength: usize, color: f64) {
        let region = Region::new(0, 0, self.width, self.height);
        self.draw_rect_border(region, strength, color);
    }

    /// Paint a frame `strength` samples wide along the inner edges of `region`.
    pub fn draw_rect_border(&mut self, region: Region, strength: usize, color: f64) {
        if region.width == 0 || region.height == 0 {
            return;
        }
        let strength_x = strength.min(region.width);
        let strength_y = strength.min(region.height);
        for i in 0..strength_y {
            for x in region.x..region.x1() {
                self.set(x, region.y + i, color);
                self.set(x, region.y1() - 1 - i, color);
            }
        }
        for i in 0..strength_x {
            for y in region.y..region.y1() {
                self.set(region.x + i, y, color);
                self.set(region.x1() - 1 - i, y, color);
            }
        }
    }
}

impl Index<(usize, usize)> for Plane {
    type Output = f64;

    fn index(&self, (x, y): (usize, usize)) -> &Self::Output {
        &self.data[y * self.width + x]
    }
}

impl IndexMut<(usize, usize)> for Plane {
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut Self::Output {
        &mut self.data[y * self.width + x]
    }
}
