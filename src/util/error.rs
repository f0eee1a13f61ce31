//! Error types for tilecorr.

use thiserror::Error;

/// Result alias for tilecorr operations.
pub type TileCorrResult<T> = std::result::Result<T, TileCorrError>;

/// Errors that can occur when configuring or running correlation kernels.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TileCorrError {
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Grid dimensions are zero or overflow.
    #[error("invalid dimensions: {rows}x{cols}")]
    InvalidDimensions { rows: usize, cols: usize },
    /// The backing buffer does not hold `rows * cols` elements.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// Two grids that must share a shape do not.
    #[error("shape mismatch: expected {expected_rows}x{expected_cols}, got {got_rows}x{got_cols}")]
    ShapeMismatch {
        expected_rows: usize,
        expected_cols: usize,
        got_rows: usize,
        got_cols: usize,
    },
    /// Tile extent is zero or larger than the output extent.
    #[error("invalid tile shape {rows}x{cols} for output extent {extent}")]
    InvalidTileShape {
        rows: usize,
        cols: usize,
        extent: usize,
    },
    /// The field does not extend far enough past the output to hold every window.
    #[error(
        "field {field_rows}x{field_cols} too small for halo, needs at least {needed_rows}x{needed_cols}"
    )]
    HaloTooSmall {
        field_rows: usize,
        field_cols: usize,
        needed_rows: usize,
        needed_cols: usize,
    },
    /// The random fill range is empty or not finite.
    #[error("invalid value range: {reason}")]
    InvalidValueRange { reason: String },
    /// The worker pool could not be created.
    #[error("thread pool error: {reason}")]
    ThreadPool { reason: String },
    /// A grid buffer could not be allocated.
    #[error("allocation of {elements} elements failed")]
    AllocationFailed { elements: usize },
    /// Image encoding or writing failed.
    #[cfg(feature = "image-io")]
    #[error("image io: {reason}")]
    ImageIo { reason: String },
}
