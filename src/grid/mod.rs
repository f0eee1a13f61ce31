//! Owned 2D grids of `f32` values.
//!
//! A `Grid` is a heap-owned row-major buffer with runtime dimensions. Fields,
//! templates and correlation outputs all use this type; the row length is the
//! stride, there is no padding.

use crate::util::{TileCorrError, TileCorrResult};

#[cfg(feature = "image-io")]
pub mod io;
pub mod random;

/// Heap-owned row-major 2D buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    data: Vec<f32>,
    rows: usize,
    cols: usize,
}

impl Grid {
    /// Allocates a grid with every element set to zero.
    pub fn zeros(rows: usize, cols: usize) -> TileCorrResult<Self> {
        Self::filled(rows, cols, 0.0)
    }

    /// Allocates a grid with every element set to `value`.
    ///
    /// Allocation failure is reported as `AllocationFailed` instead of aborting.
    pub fn filled(rows: usize, cols: usize, value: f32) -> TileCorrResult<Self> {
        let len = element_count(rows, cols)?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| TileCorrError::AllocationFailed { elements: len })?;
        data.resize(len, value);
        Ok(Self { data, rows, cols })
    }

    /// Wraps a contiguous row-major buffer.
    pub fn from_vec(data: Vec<f32>, rows: usize, cols: usize) -> TileCorrResult<Self> {
        let needed = element_count(rows, cols)?;
        if data.len() < needed {
            return Err(TileCorrError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        let mut data = data;
        data.truncate(needed);
        Ok(Self { data, rows, cols })
    }

    /// Returns the number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns the total number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false: zero-sized grids are rejected at construction.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the element at `(row, col)` if it is within bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.data.get(row * self.cols + col).copied()
    }

    /// Returns row `row` as a slice of length `cols`.
    pub fn row(&self, row: usize) -> Option<&[f32]> {
        if row >= self.rows {
            return None;
        }
        let start = row * self.cols;
        self.data.get(start..start + self.cols)
    }

    /// Returns the backing buffer in row-major order.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Returns the backing buffer mutably in row-major order.
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Sums all elements in `f64`.
    ///
    /// Each row is summed privately (in parallel with the `rayon` feature) and
    /// the row partials are folded in row order, so the result does not depend
    /// on how rows were scheduled.
    pub fn sum(&self) -> f64 {
        #[cfg(feature = "rayon")]
        let partials: Vec<f64> = {
            use rayon::prelude::*;
            self.data.par_chunks(self.cols).map(row_sum).collect()
        };
        #[cfg(not(feature = "rayon"))]
        let partials: Vec<f64> = self.data.chunks(self.cols).map(row_sum).collect();

        partials.iter().sum()
    }

    pub(crate) fn ensure_shape(&self, rows: usize, cols: usize) -> TileCorrResult<()> {
        if self.rows != rows || self.cols != cols {
            return Err(TileCorrError::ShapeMismatch {
                expected_rows: rows,
                expected_cols: cols,
                got_rows: self.rows,
                got_cols: self.cols,
            });
        }
        Ok(())
    }
}

fn row_sum(row: &[f32]) -> f64 {
    row.iter().map(|&v| v as f64).sum()
}

fn element_count(rows: usize, cols: usize) -> TileCorrResult<usize> {
    if rows == 0 || cols == 0 {
        return Err(TileCorrError::InvalidDimensions { rows, cols });
    }
    rows.checked_mul(cols)
        .ok_or(TileCorrError::InvalidDimensions { rows, cols })
}

/// A validated correlation problem: field, template and output extent.
///
/// The field must cover the output extent plus the template halo in both
/// directions; any extra margin is ignored.
#[derive(Clone, Debug)]
pub struct Problem {
    field: Grid,
    template: Grid,
    n: usize,
}

impl Problem {
    /// Checks the halo and bundles the inputs.
    pub fn new(field: Grid, template: Grid, n: usize) -> TileCorrResult<Self> {
        if n == 0 {
            return Err(TileCorrError::InvalidInput("output extent must be positive"));
        }
        let needed_rows = halo_extent(n, template.rows())?;
        let needed_cols = halo_extent(n, template.cols())?;
        if field.rows() < needed_rows || field.cols() < needed_cols {
            return Err(TileCorrError::HaloTooSmall {
                field_rows: field.rows(),
                field_cols: field.cols(),
                needed_rows,
                needed_cols,
            });
        }
        Ok(Self { field, template, n })
    }

    /// Returns the field.
    pub fn field(&self) -> &Grid {
        &self.field
    }

    /// Returns the template.
    pub fn template(&self) -> &Grid {
        &self.template
    }

    /// Returns the output extent `N`; outputs are `N x N`.
    pub fn n(&self) -> usize {
        self.n
    }
}

/// Field extent needed for `n` outputs with a window of `w`: `n + w - 1`.
pub fn halo_extent(n: usize, w: usize) -> TileCorrResult<usize> {
    n.checked_add(w)
        .and_then(|v| v.checked_sub(1))
        .ok_or(TileCorrError::InvalidDimensions { rows: n, cols: w })
}
