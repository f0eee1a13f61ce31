//! Grid export via the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::grid::Grid;
use crate::util::{TileCorrError, TileCorrResult};
use std::path::Path;

/// Converts a grid to 8-bit grayscale, mapping `[min, max]` onto `[0, 255]`.
///
/// A constant grid maps to all zeros.
pub fn to_gray_image(grid: &Grid) -> TileCorrResult<image::GrayImage> {
    let (min, max) = grid
        .as_slice()
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let span = max - min;
    let scale = if span > 0.0 { 255.0 / span } else { 0.0 };
    let pixels = grid
        .as_slice()
        .iter()
        .map(|&v| ((v - min) * scale).round().clamp(0.0, 255.0) as u8)
        .collect();

    let width = u32::try_from(grid.cols()).map_err(|_| TileCorrError::InvalidDimensions {
        rows: grid.rows(),
        cols: grid.cols(),
    })?;
    let height = u32::try_from(grid.rows()).map_err(|_| TileCorrError::InvalidDimensions {
        rows: grid.rows(),
        cols: grid.cols(),
    })?;
    image::GrayImage::from_raw(width, height, pixels).ok_or(TileCorrError::BufferTooSmall {
        needed: grid.len(),
        got: grid.len(),
    })
}

/// Writes a normalized grayscale rendering of `grid` to `path`.
pub fn save_gray_image<P: AsRef<Path>>(grid: &Grid, path: P) -> TileCorrResult<()> {
    let img = to_gray_image(grid)?;
    img.save(path).map_err(|err| TileCorrError::ImageIo {
        reason: err.to_string(),
    })
}
