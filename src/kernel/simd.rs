//! SIMD window accumulation using the `wide` crate.
//!
//! Each template row is multiplied against its field row segment eight lanes
//! at a time; the tail is finished with scalar code. The lane-wise partial
//! sums reorder the additions, which stays well inside the oracle tolerance.

use crate::grid::Grid;
use wide::f32x8;

const LANES: usize = 8;

/// Load 8 f32 values into f32x8.
#[inline]
fn load_f32x8(slice: &[f32]) -> f32x8 {
    f32x8::from([
        slice[0], slice[1], slice[2], slice[3], slice[4], slice[5], slice[6], slice[7],
    ])
}

/// Horizontal sum of f32x8.
#[inline]
fn hsum(v: f32x8) -> f32 {
    let arr = v.to_array();
    arr[0] + arr[1] + arr[2] + arr[3] + arr[4] + arr[5] + arr[6] + arr[7]
}

/// Zeroes `cell` and accumulates the window anchored at `(k, l)`.
#[inline]
pub(crate) fn accumulate_window(field: &Grid, template: &Grid, k: usize, l: usize, cell: &mut f32) {
    let f = field.as_slice();
    let t = template.as_slice();
    let f_cols = field.cols();
    let t_cols = template.cols();
    let simd_end = t_cols / LANES * LANES;

    *cell = 0.0;
    let mut acc = f32x8::ZERO;
    for i in 0..template.rows() {
        let f_start = (k + i) * f_cols + l;
        let f_row = &f[f_start..f_start + t_cols];
        let t_row = &t[i * t_cols..(i + 1) * t_cols];

        let mut j = 0;
        while j < simd_end {
            acc = acc + load_f32x8(&f_row[j..]) * load_f32x8(&t_row[j..]);
            j += LANES;
        }
        for (a, b) in f_row[simd_end..].iter().zip(&t_row[simd_end..]) {
            *cell += a * b;
        }
    }
    *cell += hsum(acc);
}
