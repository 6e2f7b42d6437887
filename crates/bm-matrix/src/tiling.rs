//! Tile boundaries along one axis and tile grids over a whole matrix.

use std::num::NonZeroUsize;
use std::ops::Range;

use crate::shape::Shape;

/// How an axis is split into tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileSize {
    /// No splitting: the whole axis is a single tile.
    Whole,
    /// Tiles of this edge length; the last tile may be shorter.
    Edge(NonZeroUsize),
}

impl TileSize {
    /// Tiles of `edge` elements, or [`TileSize::Whole`] when `edge` is zero.
    pub fn new(edge: usize) -> Self {
        NonZeroUsize::new(edge).map_or(TileSize::Whole, TileSize::Edge)
    }

    /// Interpret a signed split value. Non-positive values disable splitting.
    pub fn from_split(split: i64) -> Self {
        match usize::try_from(split).ok().and_then(NonZeroUsize::new) {
            Some(edge) => TileSize::Edge(edge),
            None => TileSize::Whole,
        }
    }

    /// Edge length used for an axis of `dim_size` elements.
    pub fn edge_for(&self, dim_size: usize) -> usize {
        match self {
            TileSize::Whole => dim_size.max(1),
            TileSize::Edge(edge) => edge.get(),
        }
    }

    /// Tile boundaries along an axis of `dim_size` elements.
    pub fn spans(&self, dim_size: usize) -> Vec<(usize, usize)> {
        compute_tiles(dim_size, self.edge_for(dim_size))
    }
}

impl From<usize> for TileSize {
    fn from(edge: usize) -> Self {
        TileSize::new(edge)
    }
}

/// Number of tiles of length `tile_edge` needed to cover `dim_size` elements.
pub fn tile_count(dim_size: usize, tile_edge: usize) -> usize {
    assert!(tile_edge >= 1, "tile edge must be at least 1");
    dim_size.div_ceil(tile_edge)
}

/// Split `[0, dim_size)` into consecutive half-open `(start, end)` spans of
/// `tile_edge` elements. The last span is shorter when `tile_edge` does not
/// divide `dim_size`.
///
/// # Panics
/// Panics if `tile_edge == 0`. Use [`TileSize::Whole`] to disable splitting.
pub fn compute_tiles(dim_size: usize, tile_edge: usize) -> Vec<(usize, usize)> {
    let n = tile_count(dim_size, tile_edge);
    (0..n)
        .map(|i| {
            let start = i * tile_edge;
            (start, (start + tile_edge).min(dim_size))
        })
        .collect()
}

/// Half-open index ranges of one tile inside its parent matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileBounds {
    pub row_start: usize,
    pub row_end: usize,
    pub col_start: usize,
    pub col_end: usize,
}

impl TileBounds {
    pub fn rows(&self) -> Range<usize> {
        self.row_start..self.row_end
    }

    pub fn cols(&self) -> Range<usize> {
        self.col_start..self.col_end
    }

    pub fn height(&self) -> usize {
        self.row_end - self.row_start
    }

    pub fn width(&self) -> usize {
        self.col_end - self.col_start
    }
}

/// Row-major grid of tiles covering one matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    row_spans: Vec<(usize, usize)>,
    col_spans: Vec<(usize, usize)>,
    tiles: Vec<TileBounds>,
}

impl TileGrid {
    /// Build the grid formed by every pairing of a row span with a column span.
    pub fn from_spans(row_spans: Vec<(usize, usize)>, col_spans: Vec<(usize, usize)>) -> Self {
        let mut tiles = Vec::with_capacity(row_spans.len() * col_spans.len());
        for &(row_start, row_end) in &row_spans {
            for &(col_start, col_end) in &col_spans {
                tiles.push(TileBounds {
                    row_start,
                    row_end,
                    col_start,
                    col_end,
                });
            }
        }
        TileGrid {
            row_spans,
            col_spans,
            tiles,
        }
    }

    /// Tile a matrix of `shape` with independent row and column tile sizes.
    pub fn for_shape(shape: Shape, row_tile: TileSize, col_tile: TileSize) -> Self {
        TileGrid::from_spans(row_tile.spans(shape.rows), col_tile.spans(shape.cols))
    }

    /// Number of tile rows.
    pub fn rows(&self) -> usize {
        self.row_spans.len()
    }

    /// Number of tile columns.
    pub fn cols(&self) -> usize {
        self.col_spans.len()
    }

    pub fn row_spans(&self) -> &[(usize, usize)] {
        &self.row_spans
    }

    pub fn col_spans(&self) -> &[(usize, usize)] {
        &self.col_spans
    }

    /// The tile at `(tile_row, tile_col)`.
    ///
    /// # Panics
    /// Panics if either index is outside the grid.
    pub fn tile(&self, tile_row: usize, tile_col: usize) -> &TileBounds {
        assert!(
            tile_row < self.rows() && tile_col < self.cols(),
            "tile ({}, {}) out of bounds for {}x{} grid",
            tile_row,
            tile_col,
            self.rows(),
            self.cols()
        );
        &self.tiles[tile_row * self.cols() + tile_col]
    }

    /// All tiles in row-major order.
    pub fn tiles(&self) -> &[TileBounds] {
        &self.tiles
    }
}
