//! Scalar reference kernels for correlation evaluation.

use crate::grid::{Grid, Problem};
use crate::kernel::Kernel;
use crate::trace::{trace_event, trace_span};
use crate::util::TileCorrResult;

/// Sequential ground-truth kernel.
///
/// Cells are visited column by column (`l` outer, `k` inner) and each window
/// is summed template column first (`j` outer, `i` inner). This order is
/// fixed; the baseline exists only to check the optimized kernels.
#[derive(Clone, Copy, Debug, Default)]
pub struct Baseline;

impl Kernel for Baseline {
    fn evaluate(&self, problem: &Problem) -> TileCorrResult<Grid> {
        let n = problem.n();
        let _span = trace_span!("baseline_eval", n = n).entered();

        let field = problem.field();
        let template = problem.template();
        let f = field.as_slice();
        let t = template.as_slice();
        let f_cols = field.cols();
        let t_rows = template.rows();
        let t_cols = template.cols();

        let mut out = Grid::zeros(n, n)?;
        let c = out.as_mut_slice();
        for l in 0..n {
            for k in 0..n {
                let cell = &mut c[k * n + l];
                *cell = 0.0;
                for j in 0..t_cols {
                    for i in 0..t_rows {
                        *cell += f[(k + i) * f_cols + l + j] * t[i * t_cols + j];
                    }
                }
            }
        }

        trace_event!("baseline_done", cells = n * n);
        Ok(out)
    }
}

/// Zeroes `cell` and accumulates the window anchored at `(k, l)`.
///
/// Template rows are the outer loop and columns the inner one, so each step
/// reads one contiguous field row segment.
#[cfg_attr(feature = "simd", allow(dead_code))]
#[inline]
pub(crate) fn accumulate_window(field: &Grid, template: &Grid, k: usize, l: usize, cell: &mut f32) {
    let f = field.as_slice();
    let t = template.as_slice();
    let f_cols = field.cols();
    let t_cols = template.cols();

    *cell = 0.0;
    for i in 0..template.rows() {
        let f_start = (k + i) * f_cols + l;
        let f_row = &f[f_start..f_start + t_cols];
        let t_row = &t[i * t_cols..(i + 1) * t_cols];
        for (a, b) in f_row.iter().zip(t_row) {
            *cell += a * b;
        }
    }
}
