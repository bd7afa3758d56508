//! Frame geometry, the raw row-major sample sequence, and its 2D view.
//!
//! ```text
//!   RawFrame  [s0 s1 s2 ... s(total-1)]        index i
//!                  │
//!                  ▼  i ↦ (i / cols, i % cols)
//!   Grid2D    row 0: s0      .. s(cols-1)
//!             row 1: s(cols) .. s(2*cols-1)
//!             ...
//! ```
//!
//! All coordinate checks use half-open ranges `[0, rows) × [0, cols)`.

use crate::error::ConfigError;

/// Sensor array dimensions. Fixed for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    rows: usize,
    cols: usize,
}

impl Geometry {
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    pub const fn rows(&self) -> usize {
        self.rows
    }

    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Number of samples in one frame.
    pub const fn total(&self) -> usize {
        self.rows * self.cols
    }

    /// Row-major coordinate of sample `index`.
    pub const fn coords(&self, index: usize) -> (usize, usize) {
        (index / self.cols, index % self.cols)
    }

    /// Flat index of `(row, col)`, or `None` outside the grid.
    ///
    /// Total over all integer coordinates.
    pub fn index_of(&self, row: isize, col: isize) -> Option<usize> {
        if row < 0 || col < 0 {
            return None;
        }
        let (row, col) = (row as usize, col as usize);
        if row < self.rows && col < self.cols {
            Some(row * self.cols + col)
        } else {
            None
        }
    }
}

/// One complete frame of temperature samples (°C), row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    geometry: Geometry,
    samples: Vec<f32>,
}

impl RawFrame {
    /// An all-zero frame, served until the first successful refresh.
    pub fn zeroed(geometry: Geometry) -> Self {
        Self {
            geometry,
            samples: vec![0.0; geometry.total()],
        }
    }

    /// Wrap `samples`, which must hold exactly `geometry.total()` values.
    pub fn from_samples(geometry: Geometry, samples: Vec<f32>) -> Result<Self, ConfigError> {
        if samples.len() != geometry.total() || samples.is_empty() {
            return Err(ConfigError::GeometryMismatch {
                expected: geometry.total(),
                actual: samples.len(),
            });
        }
        Ok(Self { geometry, samples })
    }

    /// A frame with every sample set to `value`.
    pub fn filled(geometry: Geometry, value: f32) -> Self {
        Self {
            geometry,
            samples: vec![value; geometry.total()],
        }
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub(crate) fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    /// Set the sample at `(row, col)`. Out-of-grid writes are ignored.
    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        if let Some(i) = self.geometry.index_of(row as isize, col as isize) {
            self.samples[i] = value;
        }
    }

    /// The 2D view of this frame.
    pub fn grid(&self) -> Grid2D<'_> {
        Grid2D { frame: self }
    }
}

/// Read-only `rows × cols` view over a [`RawFrame`] snapshot.
#[derive(Debug, Clone, Copy)]
pub struct Grid2D<'a> {
    frame: &'a RawFrame,
}

impl<'a> Grid2D<'a> {
    pub fn geometry(&self) -> Geometry {
        self.frame.geometry
    }

    /// Sample at `(row, col)`; `None` ("absent") outside the grid.
    pub fn get(&self, row: isize, col: isize) -> Option<f32> {
        self.frame
            .geometry
            .index_of(row, col)
            .map(|i| self.frame.samples[i])
    }

    /// One full row, or `None` past the last row.
    pub fn row(&self, row: usize) -> Option<&'a [f32]> {
        let cols = self.frame.geometry.cols;
        if row < self.frame.geometry.rows {
            Some(&self.frame.samples[row * cols..(row + 1) * cols])
        } else {
            None
        }
    }

    /// Iterate `(row, col, value)` in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, f32)> + 'a {
        let geometry = self.frame.geometry;
        self.frame.samples.iter().enumerate().map(move |(i, &v)| {
            let (r, c) = geometry.coords(i);
            (r, c, v)
        })
    }
}

impl core::ops::Index<(usize, usize)> for Grid2D<'_> {
    type Output = f32;

    fn index(&self, (row, col): (usize, usize)) -> &f32 {
        assert!(
            row < self.frame.geometry.rows && col < self.frame.geometry.cols,
            "grid index ({row}, {col}) out of range"
        );
        &self.frame.samples[row * self.frame.geometry.cols + col]
    }
}
