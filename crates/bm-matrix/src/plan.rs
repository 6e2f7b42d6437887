//! Pairing of operand tile grids for a block multiplication.

use tracing::{debug, instrument};

use crate::error::{MatmulError, Result};
use crate::matrix::Matrix;
use crate::shape::Shape;
use crate::tiling::{TileGrid, TileSize};

/// Tile grids for `left @ right` where the inner dimension is tiled
/// identically on both sides.
///
/// `left` is `[left_rows x shared]`, `right` is `[shared x right_cols]`.
/// Tile `c` of the left operand's columns and tile `c` of the right
/// operand's rows always cover the same index range.
pub fn operand_grids(
    left_rows: usize,
    shared: usize,
    right_cols: usize,
    left_row_tile: TileSize,
    shared_tile: TileSize,
    right_col_tile: TileSize,
) -> (TileGrid, TileGrid) {
    let shared_spans = shared_tile.spans(shared);
    let left = TileGrid::from_spans(left_row_tile.spans(left_rows), shared_spans.clone());
    let right = TileGrid::from_spans(shared_spans, right_col_tile.spans(right_cols));
    (left, right)
}

/// The shape-level half of a plan: operand shapes and their tile grids.
///
/// Owns nothing but indices, so it can outlive the matrices it was built for
/// and be bound again to other matrices of the same shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilePlan {
    left: Shape,
    right: Shape,
    result: Shape,
    left_tiles: TileGrid,
    right_tiles: TileGrid,
}

impl TilePlan {
    /// Validate the shapes and derive both tile grids.
    ///
    /// The left operand is tiled with `row_tile` along its rows and
    /// `col_tile` along its columns; the right operand reuses the left
    /// operand's column boundaries for its rows and tiles its own columns
    /// with `row_tile`.
    pub fn new(
        left: Shape,
        right: Shape,
        result: Shape,
        row_tile: TileSize,
        col_tile: TileSize,
    ) -> Result<Self> {
        Shape::check_product(&left, &right, &result)?;

        let (left_tiles, right_tiles) =
            operand_grids(left.rows, left.cols, right.cols, row_tile, col_tile, row_tile);
        debug!(
            left = %left,
            right = %right,
            left_grid = ?(left_tiles.rows(), left_tiles.cols()),
            right_grid = ?(right_tiles.rows(), right_tiles.cols()),
            "derived tile grids"
        );

        Ok(TilePlan {
            left,
            right,
            result,
            left_tiles,
            right_tiles,
        })
    }

    /// Attach the plan to concrete matrices.
    ///
    /// Fails if any matrix shape differs from the planned one.
    pub fn bind<'a>(
        self,
        left: &'a Matrix,
        right: &'a Matrix,
        result: &'a mut Matrix,
    ) -> Result<MultiplicationPlan<'a>> {
        if left.shape() != self.left || right.shape() != self.right || result.shape() != self.result {
            return Err(MatmulError::DimensionMismatch {
                left: left.shape(),
                right: right.shape(),
                result: result.shape(),
            });
        }
        Ok(MultiplicationPlan {
            left,
            right,
            result,
            tiles: self,
        })
    }

    pub fn left_shape(&self) -> Shape {
        self.left
    }

    pub fn right_shape(&self) -> Shape {
        self.right
    }

    pub fn result_shape(&self) -> Shape {
        self.result
    }

    pub fn left_tiles(&self) -> &TileGrid {
        &self.left_tiles
    }

    pub fn right_tiles(&self) -> &TileGrid {
        &self.right_tiles
    }
}

/// A tile plan bound to its three matrices.
///
/// The operands are borrowed shared and the result exclusively, so none of
/// them can be resized while the plan exists.
#[derive(Debug)]
pub struct MultiplicationPlan<'a> {
    pub(crate) left: &'a Matrix,
    pub(crate) right: &'a Matrix,
    pub(crate) result: &'a mut Matrix,
    pub(crate) tiles: TilePlan,
}

impl<'a> MultiplicationPlan<'a> {
    pub fn left(&self) -> &Matrix {
        self.left
    }

    pub fn right(&self) -> &Matrix {
        self.right
    }

    pub fn result(&self) -> &Matrix {
        &*self.result
    }

    pub fn left_tiles(&self) -> &TileGrid {
        &self.tiles.left_tiles
    }

    pub fn right_tiles(&self) -> &TileGrid {
        &self.tiles.right_tiles
    }

    /// Zero the result so the plan can be multiplied again.
    pub fn clear_result(&mut self) {
        self.result.fill_zero();
    }

    /// Detach the plan from its matrices, keeping the tile grids for reuse.
    pub fn release(self) -> TilePlan {
        self.tiles
    }
}

/// Validate `left @ right -> result` and bind a tiled plan to the three
/// matrices. See [`TilePlan::new`] for how the tile sizes are applied.
///
/// # Panics
/// Panics if any matrix has been released.
#[instrument(skip_all, fields(left = %left.shape(), right = %right.shape(), row_tile = ?row_tile, col_tile = ?col_tile))]
pub fn build_plan<'a>(
    left: &'a Matrix,
    right: &'a Matrix,
    result: &'a mut Matrix,
    row_tile: TileSize,
    col_tile: TileSize,
) -> Result<MultiplicationPlan<'a>> {
    assert!(
        !left.is_released() && !right.is_released() && !result.is_released(),
        "cannot plan a multiplication over a released matrix"
    );
    let tiles = TilePlan::new(left.shape(), right.shape(), result.shape(), row_tile, col_tile)?;
    tiles.bind(left, right, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiling::TileBounds;

    #[test]
    fn test_shared_axis_aligned() {
        let a = Matrix::zeros(4, 3);
        let b = Matrix::zeros(3, 4);
        let mut c = Matrix::zeros(4, 4);
        let plan = build_plan(&a, &b, &mut c, TileSize::new(2), TileSize::new(2)).unwrap();

        let lt = plan.left_tiles();
        let rt = plan.right_tiles();
        assert_eq!(lt.cols(), rt.rows());
        assert_eq!(lt.col_spans(), rt.row_spans());
        assert_eq!(lt.col_spans(), &[(0, 2), (2, 3)]);
    }

    #[test]
    fn test_tile_sizes_applied_asymmetrically() {
        let a = Matrix::zeros(6, 10);
        let b = Matrix::zeros(10, 9);
        let mut c = Matrix::zeros(6, 9);
        let plan = build_plan(&a, &b, &mut c, TileSize::new(4), TileSize::new(3)).unwrap();

        // left rows and right cols use row_tile; the shared axis uses col_tile.
        assert_eq!(plan.left_tiles().row_spans(), &[(0, 4), (4, 6)]);
        assert_eq!(plan.left_tiles().col_spans(), &[(0, 3), (3, 6), (6, 9), (9, 10)]);
        assert_eq!(plan.right_tiles().row_spans(), plan.left_tiles().col_spans());
        assert_eq!(plan.right_tiles().col_spans(), &[(0, 4), (4, 8), (8, 9)]);
        assert_eq!(
            *plan.right_tiles().tile(3, 2),
            TileBounds {
                row_start: 9,
                row_end: 10,
                col_start: 8,
                col_end: 9,
            }
        );
    }

    #[test]
    fn test_inner_dimension_mismatch() {
        let a = Matrix::zeros(4, 3);
        let b = Matrix::zeros(2, 4);
        let mut c = Matrix::zeros(4, 4);
        for (row_tile, col_tile) in [(1usize, 1usize), (2, 3), (0, 0), (100, 7)] {
            let err = build_plan(&a, &b, &mut c, TileSize::new(row_tile), TileSize::new(col_tile))
                .unwrap_err();
            assert!(matches!(err, MatmulError::DimensionMismatch { .. }));
        }
    }

    #[test]
    fn test_result_shape_mismatch() {
        let a = Matrix::zeros(4, 3);
        let b = Matrix::zeros(3, 5);
        let mut wrong_rows = Matrix::zeros(3, 5);
        assert!(build_plan(&a, &b, &mut wrong_rows, TileSize::new(2), TileSize::new(2)).is_err());
        let mut wrong_cols = Matrix::zeros(4, 4);
        assert!(build_plan(&a, &b, &mut wrong_cols, TileSize::new(2), TileSize::new(2)).is_err());
    }

    #[test]
    fn test_release_and_rebind() {
        let a = Matrix::zeros(4, 3);
        let b = Matrix::zeros(3, 4);
        let mut c = Matrix::zeros(4, 4);
        let tiles = build_plan(&a, &b, &mut c, TileSize::new(2), TileSize::new(2))
            .unwrap()
            .release();

        let a2 = Matrix::from_fn(4, 3, |r, c| (r + c) as f32);
        let b2 = Matrix::from_fn(3, 4, |r, c| (r * c) as f32);
        let mut c2 = Matrix::zeros(4, 4);
        let mut rebound = tiles.clone().bind(&a2, &b2, &mut c2).unwrap();
        assert_eq!(rebound.left().shape(), Shape::new(4, 3));
        rebound.clear_result();
        assert_eq!(rebound.result().as_slice(), &[0.0; 16]);

        let mut other = Matrix::zeros(4, 5);
        let b3 = Matrix::zeros(3, 5);
        assert!(tiles.bind(&a2, &b3, &mut other).is_err());
    }

    #[test]
    #[should_panic(expected = "released matrix")]
    fn test_plan_over_released_matrix_panics() {
        let mut a = Matrix::zeros(2, 2);
        a.release();
        let b = Matrix::zeros(2, 2);
        let mut c = Matrix::zeros(2, 2);
        let _ = build_plan(&a, &b, &mut c, TileSize::Whole, TileSize::Whole);
    }
}
