//! Tiled parallel kernel (rayon-backed when the `rayon` feature is enabled).
//!
//! The output is cut into rectangular tiles by `TileGrid`; each tile is one
//! unit of work and is filled sequentially, row-major, by whichever worker
//! claims it. Tiles own disjoint row segments of the output, so the only
//! synchronization is the join at the end of the pass.

use crate::grid::{Grid, Problem};
use crate::kernel::Kernel;
use crate::tile::{TileGrid, TileMut, TileShape};
use crate::trace::{trace_event, trace_span};
use crate::util::{TileCorrError, TileCorrResult};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

// Window accumulation - use SIMD when available
#[cfg(not(feature = "simd"))]
use crate::kernel::scalar::accumulate_window;
#[cfg(feature = "simd")]
use crate::kernel::simd::accumulate_window;

/// Tile shape and worker count for the tiled kernel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TiledConfig {
    /// Output tile extent.
    pub tile: TileShape,
    /// Worker threads; `None` uses the available hardware parallelism.
    ///
    /// Without the `rayon` feature tiles run on the calling thread and any
    /// positive count is accepted but has no effect.
    pub workers: Option<usize>,
}

impl TiledConfig {
    /// Replaces the tile shape with a `size x size` square.
    pub fn with_square(mut self, size: usize) -> Self {
        self.tile = TileShape::square(size);
        self
    }

    /// Rejects tile shapes that do not fit `n` and a zero worker count.
    pub fn validate(&self, n: usize) -> TileCorrResult<()> {
        self.tile.validate(n)?;
        validate_workers(self.workers)
    }
}

fn validate_workers(workers: Option<usize>) -> TileCorrResult<()> {
    if workers == Some(0) {
        return Err(TileCorrError::InvalidInput("worker count must be positive"));
    }
    Ok(())
}

/// Tiled correlation kernel with its own worker pool.
pub struct TiledEvaluator {
    config: TiledConfig,
    #[cfg(feature = "rayon")]
    pool: rayon::ThreadPool,
}

impl TiledEvaluator {
    /// Builds the evaluator and its worker pool.
    pub fn new(config: TiledConfig) -> TileCorrResult<Self> {
        validate_workers(config.workers)?;

        #[cfg(feature = "rayon")]
        let pool = {
            let mut builder = rayon::ThreadPoolBuilder::new();
            if let Some(workers) = config.workers {
                builder = builder.num_threads(workers);
            }
            builder.build().map_err(|err| TileCorrError::ThreadPool {
                reason: err.to_string(),
            })?
        };
        #[cfg(not(feature = "rayon"))]
        if let Some(workers) = config.workers {
            trace_event!("workers_ignored", requested = workers);
        }

        Ok(Self {
            config,
            #[cfg(feature = "rayon")]
            pool,
        })
    }

    /// Returns the configuration the evaluator was built with.
    pub fn config(&self) -> TiledConfig {
        self.config
    }

    /// Number of workers tiles are dispatched to.
    pub fn workers(&self) -> usize {
        #[cfg(feature = "rayon")]
        {
            self.pool.current_num_threads()
        }
        #[cfg(not(feature = "rayon"))]
        {
            1
        }
    }

    /// Fills an existing `N x N` output, overwriting every cell.
    pub fn evaluate_into(&self, problem: &Problem, out: &mut Grid) -> TileCorrResult<()> {
        let plan = TileGrid::new(problem.n(), self.config.tile)?;
        let _span = trace_span!(
            "tiled_eval",
            n = problem.n(),
            tiles = plan.len(),
            workers = self.workers()
        )
        .entered();

        let tiles = plan.split_mut(out)?;
        let field = problem.field();
        let template = problem.template();
        let fill_tile = |mut view: TileMut<'_>| {
            view.for_each_cell(|k, l, cell| accumulate_window(field, template, k, l, cell));
        };

        #[cfg(feature = "rayon")]
        self.pool
            .install(|| tiles.into_par_iter().for_each(fill_tile));
        #[cfg(not(feature = "rayon"))]
        tiles.into_iter().for_each(fill_tile);

        trace_event!("tiles_dispatched", count = plan.len());
        Ok(())
    }
}

impl Kernel for TiledEvaluator {
    fn evaluate(&self, problem: &Problem) -> TileCorrResult<Grid> {
        self.config.validate(problem.n())?;
        let mut out = Grid::zeros(problem.n(), problem.n())?;
        self.evaluate_into(problem, &mut out)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::{TiledConfig, TiledEvaluator};
    use crate::grid::{Grid, Problem};
    use crate::kernel::{Baseline, Kernel};
    use crate::tile::TileShape;
    use crate::util::TileCorrError;

    fn ramp_problem(n: usize, w: usize) -> Problem {
        let m = n + w - 1;
        let field = Grid::from_vec(
            (0..m * m).map(|v| ((v * 7) % 13) as f32 * 0.5).collect(),
            m,
            m,
        )
        .unwrap();
        let template =
            Grid::from_vec((0..w * w).map(|v| ((v * 3) % 5) as f32).collect(), w, w).unwrap();
        Problem::new(field, template, n).unwrap()
    }

    #[test]
    fn tiled_matches_baseline_on_partial_tiles() {
        let problem = ramp_problem(11, 3);
        let baseline = Baseline.evaluate(&problem).unwrap();
        let tiled = TiledEvaluator::new(TiledConfig {
            tile: TileShape { rows: 4, cols: 3 },
            workers: Some(2),
        })
        .unwrap()
        .evaluate(&problem)
        .unwrap();
        for (a, b) in baseline.as_slice().iter().zip(tiled.as_slice()) {
            assert!((a - b).abs() <= 1e-3);
        }
    }

    #[test]
    fn evaluate_into_overwrites_dirty_output() {
        let problem = ramp_problem(6, 2);
        let evaluator = TiledEvaluator::new(TiledConfig::default().with_square(4)).unwrap();
        let clean = evaluator.evaluate(&problem).unwrap();
        let mut dirty = Grid::filled(6, 6, 1.0e6).unwrap();
        evaluator.evaluate_into(&problem, &mut dirty).unwrap();
        assert_eq!(clean, dirty);
    }

    #[test]
    fn oversized_tile_is_rejected_before_work() {
        let problem = ramp_problem(4, 2);
        let evaluator = TiledEvaluator::new(TiledConfig::default()).unwrap();
        let err = evaluator.evaluate(&problem).unwrap_err();
        assert_eq!(
            err,
            TileCorrError::InvalidTileShape {
                rows: 8,
                cols: 8,
                extent: 4,
            }
        );
    }

    #[cfg(not(feature = "rayon"))]
    #[test]
    fn worker_count_has_no_effect_without_pool() {
        let problem = ramp_problem(9, 2);
        let evaluator = TiledEvaluator::new(TiledConfig {
            workers: Some(4),
            ..TiledConfig::default()
        })
        .unwrap();
        assert_eq!(evaluator.workers(), 1);
        let baseline = Baseline.evaluate(&problem).unwrap();
        assert_eq!(evaluator.evaluate(&problem).unwrap(), baseline);
    }

    #[test]
    fn zero_workers_is_rejected() {
        let err = TiledEvaluator::new(TiledConfig {
            workers: Some(0),
            ..TiledConfig::default()
        })
        .err()
        .unwrap();
        assert_eq!(
            err,
            TileCorrError::InvalidInput("worker count must be positive")
        );
    }
}
