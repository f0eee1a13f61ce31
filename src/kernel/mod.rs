//! Correlation kernel implementations.
//!
//! Every kernel computes the same valid-mode correlation
//! `out[k][l] = sum_i sum_j field[k + i][l + j] * template[i][j]` over an
//! `N x N` output. `Baseline` is the sequential reference; `TiledEvaluator`
//! dispatches output tiles to a worker pool.

use crate::grid::{Grid, Problem};
use crate::util::TileCorrResult;

/// Kernel trait for full-output correlation passes.
pub trait Kernel {
    /// Computes the `N x N` correlation output for `problem`.
    fn evaluate(&self, problem: &Problem) -> TileCorrResult<Grid>;
}

pub mod scalar;

#[cfg(feature = "simd")]
pub mod simd;

pub mod tiled;

pub use scalar::Baseline;
pub use tiled::{TiledConfig, TiledEvaluator};
