use crate::error::{MatmulError, Result};
use std::fmt;

/// The dimensions of a two-dimensional, row-major matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    pub rows: usize,
    pub cols: usize,
}

impl Shape {
    pub fn new(rows: usize, cols: usize) -> Self {
        Shape { rows, cols }
    }

    /// Total number of elements.
    ///
    /// # Panics
    /// Panics if the count does not fit in `usize`.
    pub fn numel(&self) -> usize {
        self.checked_numel()
            .unwrap_or_else(|| panic!("matrix of {}x{} elements is too large", self.rows, self.cols))
    }

    /// Total number of elements, or `None` on overflow.
    pub fn checked_numel(&self) -> Option<usize> {
        self.rows.checked_mul(self.cols)
    }

    /// Returns true if either axis has length zero.
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// Flat offset of `(row, col)` in a row-major buffer of this shape.
    ///
    /// # Panics
    /// Panics if `row >= rows` or `col >= cols`.
    #[inline]
    pub fn offset(&self, row: usize, col: usize) -> usize {
        assert!(
            row < self.rows && col < self.cols,
            "index ({}, {}) out of bounds for matrix {}",
            row,
            col,
            self
        );
        row * self.cols + col
    }

    /// Shape of `left @ right`.
    ///
    /// Fails when the inner dimensions differ. The reported result shape is
    /// the one a caller would have to supply, `[left.rows x right.cols]`.
    pub fn product(left: &Shape, right: &Shape) -> Result<Shape> {
        let result = Shape::new(left.rows, right.cols);
        if left.cols != right.rows {
            return Err(MatmulError::DimensionMismatch {
                left: *left,
                right: *right,
                result,
            });
        }
        Ok(result)
    }

    /// Check that `result` can hold `left @ right`.
    pub fn check_product(left: &Shape, right: &Shape, result: &Shape) -> Result<()> {
        let expected = Shape::product(left, right).map_err(|_| MatmulError::DimensionMismatch {
            left: *left,
            right: *right,
            result: *result,
        })?;
        if expected != *result {
            return Err(MatmulError::DimensionMismatch {
                left: *left,
                right: *right,
                result: *result,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}x{}]", self.rows, self.cols)
    }
}

impl From<(usize, usize)> for Shape {
    fn from((rows, cols): (usize, usize)) -> Self {
        Shape::new(rows, cols)
    }
}
