//! TileCorr is a CPU correlation kernel with a built-in correctness oracle.
//!
//! This crate computes valid-mode 2D correlation of a small template over a
//! field, once with a sequential baseline and once with a tiled kernel that
//! dispatches output tiles to a worker pool (`rayon` feature, on by default),
//! then checks the two outputs against each other within a fixed tolerance.
//! SIMD window accumulation is available behind the `simd` feature.

pub mod grid;
pub mod harness;
pub mod kernel;
pub mod tile;
mod trace;
pub mod util;
pub mod verify;

pub use grid::random::{generate_problem, FillConfig};
pub use grid::{Grid, Problem};
pub use harness::{run, run_problem, time_tiled, RunConfig, RunReport, Timing};
pub use kernel::{Baseline, Kernel, TiledConfig, TiledEvaluator};
pub use tile::{Tile, TileGrid, TileShape};
pub use util::{TileCorrError, TileCorrResult};
pub use verify::{compare, Mismatch, Verdict, DEFAULT_TOLERANCE};

#[cfg(feature = "image-io")]
pub use grid::io;
