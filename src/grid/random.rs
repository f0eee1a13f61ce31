//! Seeded random fill for fields and templates.

use crate::grid::{halo_extent, Grid, Problem};
use crate::trace::{trace_event, trace_span};
use crate::util::{TileCorrError, TileCorrResult};
use rand::distr::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Upper bound of the default fill range.
pub const DEFAULT_VALUE_MAX: f32 = 12.0;

/// Seed and value range for random grids.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FillConfig {
    /// Seed for the pseudo-random stream.
    pub seed: u64,
    /// Inclusive lower bound of generated values.
    pub low: f32,
    /// Exclusive upper bound of generated values.
    pub high: f32,
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED_C0DE,
            low: 0.0,
            high: DEFAULT_VALUE_MAX,
        }
    }
}

impl FillConfig {
    /// Builds the uniform distribution, rejecting empty or non-finite ranges.
    pub fn distribution(&self) -> TileCorrResult<Uniform<f32>> {
        if !self.low.is_finite() || !self.high.is_finite() {
            return Err(TileCorrError::InvalidValueRange {
                reason: format!("bounds must be finite, got [{}, {})", self.low, self.high),
            });
        }
        Uniform::new(self.low, self.high).map_err(|err| TileCorrError::InvalidValueRange {
            reason: format!("[{}, {}): {err}", self.low, self.high),
        })
    }
}

impl Grid {
    /// Allocates a grid and fills it row-major from `dist`.
    pub fn random<R: Rng + ?Sized>(
        rows: usize,
        cols: usize,
        rng: &mut R,
        dist: &Uniform<f32>,
    ) -> TileCorrResult<Self> {
        let mut grid = Grid::zeros(rows, cols)?;
        for value in grid.as_mut_slice() {
            *value = dist.sample(rng);
        }
        Ok(grid)
    }
}

/// Generates an `(n + w - 1)` square field and a `w` square template.
///
/// The field is drawn first, then the template, from one stream seeded by
/// `fill.seed`, so equal configs produce equal problems.
pub fn generate_problem(
    n: usize,
    template_size: usize,
    fill: &FillConfig,
) -> TileCorrResult<Problem> {
    if n == 0 || template_size == 0 {
        return Err(TileCorrError::InvalidDimensions {
            rows: n,
            cols: template_size,
        });
    }
    let _span = trace_span!("generate_problem", n = n, w = template_size).entered();

    let dist = fill.distribution()?;
    let m = halo_extent(n, template_size)?;
    let mut rng = StdRng::seed_from_u64(fill.seed);
    let field = Grid::random(m, m, &mut rng, &dist)?;
    let template = Grid::random(template_size, template_size, &mut rng, &dist)?;

    trace_event!("problem_generated", field_extent = m, seed = fill.seed);
    Problem::new(field, template, n)
}
