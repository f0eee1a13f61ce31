//! End-to-end run: generate, evaluate both ways, time, verify.
//!
//! Only the tiled kernel is timed. Generation, the baseline pass and the
//! oracle are outside the measured interval.

use crate::grid::random::{generate_problem, FillConfig};
use crate::grid::{halo_extent, Grid, Problem};
use crate::kernel::{Baseline, Kernel, TiledConfig, TiledEvaluator};
use crate::trace::{trace_event, trace_span};
use crate::util::{TileCorrError, TileCorrResult};
use crate::verify::{compare, Verdict, DEFAULT_TOLERANCE};
use std::time::{Duration, Instant};

/// Default output extent.
pub const DEFAULT_N: usize = 4096;
/// Default template extent.
pub const DEFAULT_TEMPLATE_SIZE: usize = 32;

/// Full configuration of one verification run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunConfig {
    /// Output extent `N`.
    pub n: usize,
    /// Template extent `W`; the field is `N + W - 1` square.
    pub template_size: usize,
    /// Tile shape and worker count.
    pub tiled: TiledConfig,
    /// Seed and value range of the generated inputs.
    pub fill: FillConfig,
    /// Timed repetitions of the tiled kernel.
    pub iterations: usize,
    /// Oracle tolerance.
    pub tolerance: f32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            n: DEFAULT_N,
            template_size: DEFAULT_TEMPLATE_SIZE,
            tiled: TiledConfig::default(),
            fill: FillConfig::default(),
            iterations: 1,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl RunConfig {
    /// Rejects every configuration error before anything is allocated.
    pub fn validate(&self) -> TileCorrResult<()> {
        if self.n == 0 || self.template_size == 0 {
            return Err(TileCorrError::InvalidDimensions {
                rows: self.n,
                cols: self.template_size,
            });
        }
        halo_extent(self.n, self.template_size)?;
        self.tiled.validate(self.n)?;
        if self.iterations == 0 {
            return Err(TileCorrError::InvalidInput("iterations must be positive"));
        }
        if self.tolerance.is_nan() || self.tolerance < 0.0 {
            return Err(TileCorrError::InvalidInput("tolerance must be non-negative"));
        }
        self.fill.distribution()?;
        Ok(())
    }
}

/// Wall-clock measurements of repeated kernel passes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timing {
    /// Sum over all passes.
    pub total: Duration,
    /// Number of passes.
    pub iterations: usize,
}

impl Timing {
    /// Average duration of one pass.
    pub fn mean(&self) -> Duration {
        if self.iterations == 0 {
            return Duration::ZERO;
        }
        match u32::try_from(self.iterations) {
            Ok(count) => self.total / count,
            Err(_) => self.total.div_f64(self.iterations as f64),
        }
    }
}

/// Result of a verification run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunReport {
    /// Tiled kernel timing.
    pub timing: Timing,
    /// Workers the tiles were dispatched to.
    pub workers: usize,
    /// Oracle outcome.
    pub verdict: Verdict,
    /// Sum of all optimized output cells.
    pub checksum: f64,
}

impl RunReport {
    /// True when the oracle passed.
    pub fn passed(&self) -> bool {
        self.verdict.is_pass()
    }

    /// Console summary: elapsed time, the first mismatch if any, verdict.
    pub fn console_lines(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "Execution time={:.6} s",
            self.timing.mean().as_secs_f64()
        )];
        if let Some(mismatch) = self.verdict.mismatch() {
            lines.push(mismatch.to_string());
        }
        lines.push(self.verdict.to_string());
        lines
    }
}

/// Times `iterations` tiled passes into one preallocated output.
///
/// Every pass overwrites the whole output, so the returned grid is the
/// result of the last pass. The measured interval covers the whole
/// `evaluate_into` call, including building the per-tile output views (one
/// small row-segment list per tile); only the output allocation is outside it.
pub fn time_tiled(
    evaluator: &TiledEvaluator,
    problem: &Problem,
    iterations: usize,
) -> TileCorrResult<(Grid, Timing)> {
    if iterations == 0 {
        return Err(TileCorrError::InvalidInput("iterations must be positive"));
    }
    evaluator.config().validate(problem.n())?;
    let mut out = Grid::zeros(problem.n(), problem.n())?;

    let mut total = Duration::ZERO;
    for _ in 0..iterations {
        let start = Instant::now();
        evaluator.evaluate_into(problem, &mut out)?;
        total += start.elapsed();
    }
    Ok((out, Timing { total, iterations }))
}

/// Verifies and times the tiled kernel on an existing problem.
///
/// `config.n` and `config.template_size` are ignored; the problem's own
/// extents are used.
pub fn run_problem(problem: &Problem, config: &RunConfig) -> TileCorrResult<(RunReport, Grid)> {
    config.tiled.validate(problem.n())?;
    let evaluator = TiledEvaluator::new(config.tiled)?;
    let _span = trace_span!("run", n = problem.n(), workers = evaluator.workers()).entered();

    let baseline = Baseline.evaluate(problem)?;
    let (optimized, timing) = time_tiled(&evaluator, problem, config.iterations)?;
    let verdict = compare(&baseline, &optimized, config.tolerance)?;
    let checksum = optimized.sum();

    trace_event!(
        "run_done",
        mean_us = timing.mean().as_micros() as u64,
        passed = verdict.is_pass(),
        checksum = checksum
    );
    let report = RunReport {
        timing,
        workers: evaluator.workers(),
        verdict,
        checksum,
    };
    Ok((report, optimized))
}

/// Generates inputs from `config`, then verifies and times the tiled kernel.
pub fn run(config: &RunConfig) -> TileCorrResult<(RunReport, Grid)> {
    config.validate()?;

    let start = Instant::now();
    let problem = generate_problem(config.n, config.template_size, &config.fill)?;
    trace_event!(
        "input_generated",
        elapsed_us = start.elapsed().as_micros() as u64
    );

    run_problem(&problem, config)
}

#[cfg(test)]
mod tests {
    use super::{run, RunConfig, Timing};
    use crate::kernel::TiledConfig;
    use crate::tile::TileShape;
    use crate::util::TileCorrError;
    use std::time::Duration;

    fn small_config() -> RunConfig {
        RunConfig {
            n: 20,
            template_size: 5,
            tiled: TiledConfig {
                tile: TileShape::square(8),
                workers: Some(2),
            },
            iterations: 2,
            ..RunConfig::default()
        }
    }

    #[test]
    fn small_run_passes() {
        let (report, output) = run(&small_config()).unwrap();
        assert!(report.passed());
        assert_eq!(report.timing.iterations, 2);
        assert_eq!(output.rows(), 20);
        assert!((report.checksum - output.sum()).abs() < 1e-6);
        let lines = report.console_lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Execution time="));
        assert_eq!(lines[1], "TEST PASSED");
    }

    #[test]
    fn zero_iterations_is_rejected() {
        let config = RunConfig {
            iterations: 0,
            ..small_config()
        };
        assert_eq!(
            config.validate().unwrap_err(),
            TileCorrError::InvalidInput("iterations must be positive")
        );
    }

    #[test]
    fn mean_divides_total() {
        let timing = Timing {
            total: Duration::from_millis(30),
            iterations: 3,
        };
        assert_eq!(timing.mean(), Duration::from_millis(10));
    }
}
