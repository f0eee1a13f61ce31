//! Output tiling: partition plans and disjoint mutable tile views.
//!
//! A `TileGrid` cuts the `N x N` output index space into rectangles of at
//! most `rows x cols` cells. Interior tiles are full-sized; the trailing tile
//! in each direction is clamped so its last index is `min(start + size - 1,
//! N - 1)`. Tiles never overlap and together cover every cell exactly once.

use crate::grid::Grid;
use crate::util::{TileCorrError, TileCorrResult};
use std::ops::Range;

/// Default tile extent in both directions.
pub const DEFAULT_TILE_EXTENT: usize = 8;

/// Requested tile extent along output rows and columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileShape {
    /// Number of output rows per tile.
    pub rows: usize,
    /// Number of output columns per tile.
    pub cols: usize,
}

impl Default for TileShape {
    fn default() -> Self {
        Self::square(DEFAULT_TILE_EXTENT)
    }
}

impl TileShape {
    /// A `size x size` tile.
    pub fn square(size: usize) -> Self {
        Self {
            rows: size,
            cols: size,
        }
    }

    /// Rejects zero extents and extents larger than the output.
    pub fn validate(&self, n: usize) -> TileCorrResult<()> {
        if self.rows == 0 || self.cols == 0 || self.rows > n || self.cols > n {
            return Err(TileCorrError::InvalidTileShape {
                rows: self.rows,
                cols: self.cols,
                extent: n,
            });
        }
        Ok(())
    }
}

/// One rectangular block of the output index space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tile {
    /// First output row.
    pub row0: usize,
    /// First output column.
    pub col0: usize,
    /// Rows covered, already clamped at the output edge.
    pub rows: usize,
    /// Columns covered, already clamped at the output edge.
    pub cols: usize,
}

impl Tile {
    /// Output rows covered by this tile.
    pub fn row_range(&self) -> Range<usize> {
        self.row0..self.row0 + self.rows
    }

    /// Output columns covered by this tile.
    pub fn col_range(&self) -> Range<usize> {
        self.col0..self.col0 + self.cols
    }

    /// Number of cells in the tile.
    pub fn area(&self) -> usize {
        self.rows * self.cols
    }
}

/// Validated tiling of an `N x N` output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileGrid {
    n: usize,
    shape: TileShape,
}

impl TileGrid {
    /// Creates a tiling plan, rejecting invalid shapes before any work.
    pub fn new(n: usize, shape: TileShape) -> TileCorrResult<Self> {
        shape.validate(n)?;
        Ok(Self { n, shape })
    }

    /// Output extent.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Tiles along the row direction.
    pub fn row_tiles(&self) -> usize {
        self.n.div_ceil(self.shape.rows)
    }

    /// Tiles along the column direction.
    pub fn col_tiles(&self) -> usize {
        self.n.div_ceil(self.shape.cols)
    }

    /// Total number of tiles.
    pub fn len(&self) -> usize {
        self.row_tiles() * self.col_tiles()
    }

    /// Always false: a valid plan has at least one tile.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the tile at `(tile_row, tile_col)` in tile coordinates.
    pub fn tile(&self, tile_row: usize, tile_col: usize) -> Option<Tile> {
        if tile_row >= self.row_tiles() || tile_col >= self.col_tiles() {
            return None;
        }
        let row0 = tile_row * self.shape.rows;
        let col0 = tile_col * self.shape.cols;
        let last_row = (row0 + self.shape.rows - 1).min(self.n - 1);
        let last_col = (col0 + self.shape.cols - 1).min(self.n - 1);
        Some(Tile {
            row0,
            col0,
            rows: last_row - row0 + 1,
            cols: last_col - col0 + 1,
        })
    }

    /// Iterates tiles in row-major tile order.
    pub fn tiles(&self) -> impl Iterator<Item = Tile> + '_ {
        let col_tiles = self.col_tiles();
        (0..self.len()).filter_map(move |idx| self.tile(idx / col_tiles, idx % col_tiles))
    }

    /// Splits an `N x N` output into one mutable view per tile.
    ///
    /// The views borrow disjoint row segments, so tiles can be filled
    /// concurrently without synchronization. The order matches `tiles()`.
    pub fn split_mut<'a>(&self, out: &'a mut Grid) -> TileCorrResult<Vec<TileMut<'a>>> {
        out.ensure_shape(self.n, self.n)?;
        let n = self.n;
        let band_rows = self.shape.rows;
        let col_tiles = self.col_tiles();

        let mut views = Vec::with_capacity(self.len());
        for (band_idx, band) in out.as_mut_slice().chunks_mut(band_rows * n).enumerate() {
            let mut segments: Vec<Vec<&'a mut [f32]>> = (0..col_tiles)
                .map(|_| Vec::with_capacity(band_rows))
                .collect();
            for row in band.chunks_mut(n) {
                for (segment, dst) in row.chunks_mut(self.shape.cols).zip(segments.iter_mut()) {
                    dst.push(segment);
                }
            }
            for (tile_col, rows) in segments.into_iter().enumerate() {
                let tile = self
                    .tile(band_idx, tile_col)
                    .ok_or(TileCorrError::InvalidInput("tile view outside plan"))?;
                views.push(TileMut { tile, rows });
            }
        }
        Ok(views)
    }
}

/// Mutable view of one tile: one slice per covered output row.
pub struct TileMut<'a> {
    tile: Tile,
    rows: Vec<&'a mut [f32]>,
}

impl TileMut<'_> {
    /// Geometry of the view.
    pub fn tile(&self) -> Tile {
        self.tile
    }

    /// Visits every cell in row-major order with its output coordinates.
    pub fn for_each_cell<F>(&mut self, mut f: F)
    where
        F: FnMut(usize, usize, &mut f32),
    {
        let Tile { row0, col0, .. } = self.tile;
        for (dr, row) in self.rows.iter_mut().enumerate() {
            for (dc, cell) in row.iter_mut().enumerate() {
                f(row0 + dr, col0 + dc, cell);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Tile, TileGrid, TileShape};
    use crate::grid::Grid;
    use crate::util::TileCorrError;

    fn coverage(n: usize, shape: TileShape) -> Vec<u32> {
        let plan = TileGrid::new(n, shape).unwrap();
        let mut hits = vec![0u32; n * n];
        for tile in plan.tiles() {
            for r in tile.row_range() {
                for c in tile.col_range() {
                    hits[r * n + c] += 1;
                }
            }
        }
        hits
    }

    #[test]
    fn tiles_cover_each_cell_once() {
        for n in [1usize, 5, 8, 13, 16] {
            for (rows, cols) in [(1, 1), (3, 5), (4, 4), (8, 8), (n, n), (n, 1)] {
                if rows > n || cols > n {
                    continue;
                }
                let hits = coverage(n, TileShape { rows, cols });
                assert!(hits.iter().all(|&h| h == 1), "n={n} tile={rows}x{cols}");
            }
        }
    }

    #[test]
    fn trailing_tiles_are_clamped() {
        let plan = TileGrid::new(10, TileShape::square(4)).unwrap();
        assert_eq!(plan.row_tiles(), 3);
        assert_eq!(plan.col_tiles(), 3);
        let last = plan.tile(2, 2).unwrap();
        assert_eq!(
            last,
            Tile {
                row0: 8,
                col0: 8,
                rows: 2,
                cols: 2,
            }
        );
        assert_eq!(last.row_range().end, 10);
        assert_eq!(last.col_range().end, 10);
        assert!(plan.tile(3, 0).is_none());
    }

    #[test]
    fn invalid_shapes_are_rejected() {
        for shape in [
            TileShape { rows: 0, cols: 4 },
            TileShape { rows: 4, cols: 0 },
            TileShape { rows: 9, cols: 4 },
        ] {
            let err = TileGrid::new(8, shape).unwrap_err();
            assert_eq!(
                err,
                TileCorrError::InvalidTileShape {
                    rows: shape.rows,
                    cols: shape.cols,
                    extent: 8,
                }
            );
        }
    }

    #[test]
    fn split_mut_views_match_plan() {
        let plan = TileGrid::new(7, TileShape { rows: 3, cols: 2 }).unwrap();
        let mut out = Grid::zeros(7, 7).unwrap();
        let expected: Vec<Tile> = plan.tiles().collect();
        {
            let mut views = plan.split_mut(&mut out).unwrap();
            assert_eq!(views.len(), expected.len());
            for (idx, view) in views.iter_mut().enumerate() {
                assert_eq!(view.tile(), expected[idx]);
                view.for_each_cell(|_, _, cell| *cell += (idx + 1) as f32);
            }
        }
        for (idx, tile) in expected.iter().enumerate() {
            for r in tile.row_range() {
                for c in tile.col_range() {
                    assert_eq!(out.get(r, c), Some((idx + 1) as f32));
                }
            }
        }
    }

    #[test]
    fn split_mut_rejects_wrong_output_shape() {
        let plan = TileGrid::new(4, TileShape::square(2)).unwrap();
        let mut out = Grid::zeros(4, 5).unwrap();
        assert!(matches!(
            plan.split_mut(&mut out),
            Err(TileCorrError::ShapeMismatch { .. })
        ));
    }
}
