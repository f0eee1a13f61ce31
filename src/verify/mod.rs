//! Correctness oracle comparing an optimized output against the baseline.

use crate::grid::Grid;
use crate::trace::{trace_event, trace_span};
use crate::util::{TileCorrError, TileCorrResult};
use std::fmt;

/// Absolute per-cell tolerance between baseline and optimized outputs.
pub const DEFAULT_TOLERANCE: f32 = 0.5;

/// First cell, in row-major order, where the outputs disagree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mismatch {
    /// Output row.
    pub row: usize,
    /// Output column.
    pub col: usize,
    /// Baseline value.
    pub expected: f32,
    /// Optimized value.
    pub actual: f32,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TEST FAILING at C[{}][{}] = {:.6}, {:.6}",
            self.row, self.col, self.expected, self.actual
        )
    }
}

/// Outcome of a comparison.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Verdict {
    /// Every cell is within tolerance.
    Pass,
    /// At least one cell is out of tolerance; carries the first one.
    Fail(Mismatch),
}

impl Verdict {
    /// True for `Pass`.
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }

    /// The first mismatch, if any.
    pub fn mismatch(&self) -> Option<Mismatch> {
        match self {
            Verdict::Pass => None,
            Verdict::Fail(mismatch) => Some(*mismatch),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass => f.write_str("TEST PASSED"),
            Verdict::Fail(_) => f.write_str("TEST FAILED"),
        }
    }
}

/// Compares two outputs cell by cell.
///
/// Scans rows outer and columns inner and stops at the first cell where
/// `|baseline - optimized|` exceeds `tolerance`. A NaN difference counts as
/// a mismatch. Neither grid is modified.
pub fn compare(baseline: &Grid, optimized: &Grid, tolerance: f32) -> TileCorrResult<Verdict> {
    if tolerance.is_nan() || tolerance < 0.0 {
        return Err(TileCorrError::InvalidInput("tolerance must be non-negative"));
    }
    optimized.ensure_shape(baseline.rows(), baseline.cols())?;
    let _span = trace_span!("oracle_compare", rows = baseline.rows(), cols = baseline.cols())
        .entered();

    let cols = baseline.cols();
    let hit = baseline
        .as_slice()
        .iter()
        .zip(optimized.as_slice())
        .position(|(&expected, &actual)| exceeds(expected - actual, tolerance));

    let verdict = match hit {
        None => Verdict::Pass,
        Some(idx) => Verdict::Fail(Mismatch {
            row: idx / cols,
            col: idx % cols,
            expected: baseline.as_slice()[idx],
            actual: optimized.as_slice()[idx],
        }),
    };
    trace_event!("oracle_verdict", passed = verdict.is_pass());
    Ok(verdict)
}

fn exceeds(diff: f32, tolerance: f32) -> bool {
    diff.is_nan() || diff.abs() > tolerance
}

#[cfg(test)]
mod tests {
    use super::{compare, Mismatch, Verdict, DEFAULT_TOLERANCE};
    use crate::grid::Grid;
    use crate::util::TileCorrError;

    #[test]
    fn single_off_cell_is_reported() {
        let baseline = Grid::zeros(5, 5).unwrap();
        let mut optimized = Grid::zeros(5, 5).unwrap();
        optimized.as_mut_slice()[2 * 5 + 3] = 1.0;
        let verdict = compare(&baseline, &optimized, DEFAULT_TOLERANCE).unwrap();
        assert_eq!(
            verdict,
            Verdict::Fail(Mismatch {
                row: 2,
                col: 3,
                expected: 0.0,
                actual: 1.0,
            })
        );
        assert_eq!(
            verdict.mismatch().unwrap().to_string(),
            "TEST FAILING at C[2][3] = 0.000000, 1.000000"
        );
        assert_eq!(verdict.to_string(), "TEST FAILED");
    }

    #[test]
    fn first_mismatch_is_row_major() {
        let baseline = Grid::zeros(4, 4).unwrap();
        let mut optimized = Grid::zeros(4, 4).unwrap();
        optimized.as_mut_slice()[3] = 2.0; // (0, 3)
        optimized.as_mut_slice()[4] = 2.0; // (1, 0)
        optimized.as_mut_slice()[2 * 4 + 1] = 9.0;
        let mismatch = compare(&baseline, &optimized, 0.5).unwrap().mismatch().unwrap();
        assert_eq!((mismatch.row, mismatch.col), (0, 3));
    }

    #[test]
    fn differences_at_tolerance_pass() {
        let baseline = Grid::filled(3, 3, 1.0).unwrap();
        let optimized = Grid::filled(3, 3, 1.5).unwrap();
        assert!(compare(&baseline, &optimized, 0.5).unwrap().is_pass());
        assert!(!compare(&baseline, &optimized, 0.25).unwrap().is_pass());
    }

    #[test]
    fn nan_is_a_mismatch() {
        let baseline = Grid::zeros(2, 2).unwrap();
        let mut optimized = Grid::zeros(2, 2).unwrap();
        optimized.as_mut_slice()[1] = f32::NAN;
        let mismatch = compare(&baseline, &optimized, 0.5).unwrap().mismatch().unwrap();
        assert_eq!((mismatch.row, mismatch.col), (0, 1));
    }

    #[test]
    fn shape_mismatch_is_an_error() {
        let baseline = Grid::zeros(3, 3).unwrap();
        let optimized = Grid::zeros(3, 2).unwrap();
        let err = compare(&baseline, &optimized, 0.5).unwrap_err();
        assert_eq!(
            err,
            TileCorrError::ShapeMismatch {
                expected_rows: 3,
                expected_cols: 3,
                got_rows: 3,
                got_cols: 2,
            }
        );
    }
}
