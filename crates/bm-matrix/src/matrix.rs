use std::ops::{Index, IndexMut};

use rand::Rng;

use crate::shape::Shape;

/// A dense, row-major `f32` matrix that owns its buffer.
///
/// The buffer lives until [`Matrix::release`] is called or the matrix is
/// dropped. Any access after an explicit release is a contract violation and
/// panics.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    shape: Shape,
    data: Option<Vec<f32>>,
}

impl Matrix {
    /// Create a matrix from row-major data.
    ///
    /// # Panics
    /// Panics if `data.len() != rows * cols`.
    pub fn new(rows: usize, cols: usize, data: Vec<f32>) -> Self {
        let shape = Shape::new(rows, cols);
        assert_eq!(
            data.len(),
            shape.numel(),
            "data length {} does not match shape {} (numel={})",
            data.len(),
            shape,
            shape.numel()
        );
        Matrix {
            shape,
            data: Some(data),
        }
    }

    /// Create a zero-filled matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        let len = Shape::new(rows, cols).numel();
        Matrix::new(rows, cols, vec![0.0; len])
    }

    /// Create a matrix whose element `(r, c)` is `f(r, c)`.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let mut data = Vec::with_capacity(Shape::new(rows, cols).numel());
        for r in 0..rows {
            for c in 0..cols {
                data.push(f(r, c));
            }
        }
        Matrix::new(rows, cols, data)
    }

    /// Create a matrix filled with values drawn uniformly from `[0, max_value)`.
    pub fn random<R: Rng + ?Sized>(rows: usize, cols: usize, max_value: f32, rng: &mut R) -> Self {
        let mut m = Matrix::zeros(rows, cols);
        m.fill_random(max_value, rng);
        m
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn rows(&self) -> usize {
        self.shape.rows
    }

    pub fn cols(&self) -> usize {
        self.shape.cols
    }

    /// Row-major view of the whole buffer.
    pub fn as_slice(&self) -> &[f32] {
        self.data.as_deref().expect("matrix used after release")
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        self.data.as_deref_mut().expect("matrix used after release")
    }

    /// The elements of row `r`.
    ///
    /// # Panics
    /// Panics if `r >= rows`.
    pub fn row(&self, r: usize) -> &[f32] {
        assert!(r < self.shape.rows, "row {} out of bounds for {}", r, self.shape);
        let cols = self.shape.cols;
        &self.as_slice()[r * cols..(r + 1) * cols]
    }

    pub fn get(&self, row: usize, col: usize) -> f32 {
        self[(row, col)]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        self[(row, col)] = value;
    }

    /// Overwrite every element with zero.
    pub fn fill_zero(&mut self) {
        self.as_mut_slice().fill(0.0);
    }

    /// Overwrite every element with a value from `[0, max_value)`.
    pub fn fill_random<R: Rng + ?Sized>(&mut self, max_value: f32, rng: &mut R) {
        for v in self.as_mut_slice() {
            *v = rng.gen::<f32>() * max_value;
        }
    }

    /// Largest absolute element-wise difference to `other`, or NaN if any
    /// pair of elements differs by NaN.
    ///
    /// # Panics
    /// Panics if the shapes differ.
    pub fn max_abs_diff(&self, other: &Matrix) -> f32 {
        assert_eq!(self.shape, other.shape, "cannot compare matrices of different shapes");
        self.as_slice()
            .iter()
            .zip(other.as_slice())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, nan_max)
    }

    /// Give up the buffer, leaving the matrix empty.
    ///
    /// # Panics
    /// Panics if the matrix was already released.
    pub fn release(&mut self) -> Vec<f32> {
        self.data.take().expect("matrix released twice")
    }

    pub fn is_released(&self) -> bool {
        self.data.is_none()
    }
}

/// `f32::max` that propagates NaN from either side.
pub fn nan_max(acc: f32, x: f32) -> f32 {
    if acc.is_nan() || x.is_nan() {
        f32::NAN
    } else {
        acc.max(x)
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f32;

    fn index(&self, (row, col): (usize, usize)) -> &f32 {
        let i = self.shape.offset(row, col);
        &self.as_slice()[i]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f32 {
        let i = self.shape.offset(row, col);
        &mut self.as_mut_slice()[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_create_matrix() {
        let m = Matrix::zeros(4, 5);
        assert_eq!(m.rows(), 4);
        assert_eq!(m.cols(), 5);
        assert_eq!(m.as_slice(), &[0.0; 20]);
    }

    #[test]
    fn test_row_major_indexing() {
        let m = Matrix::new(2, 3, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(m[(0, 2)], 2.0);
        assert_eq!(m[(1, 0)], 3.0);
        assert_eq!(m.get(1, 2), 5.0);
        assert_eq!(m.row(1), &[3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_from_fn() {
        let m = Matrix::from_fn(2, 2, |r, c| (r * 10 + c) as f32);
        assert_eq!(m.as_slice(), &[0.0, 1.0, 10.0, 11.0]);
    }

    #[test]
    fn test_set_and_fill_zero() {
        let mut m = Matrix::zeros(2, 2);
        m.set(1, 1, 7.0);
        m[(0, 1)] = 3.0;
        assert_eq!(m.as_slice(), &[0.0, 3.0, 0.0, 7.0]);
        m.fill_zero();
        assert_eq!(m.as_slice(), &[0.0; 4]);
    }

    #[test]
    fn test_random_in_range_and_seeded() {
        let mut rng = StdRng::seed_from_u64(11);
        let a = Matrix::random(8, 8, 9.0, &mut rng);
        assert!(a.as_slice().iter().all(|&v| (0.0..9.0).contains(&v)));

        let mut rng = StdRng::seed_from_u64(11);
        let b = Matrix::random(8, 8, 9.0, &mut rng);
        assert_eq!(a, b);
    }

    #[test]
    fn test_max_abs_diff() {
        let a = Matrix::new(1, 3, vec![1.0, 2.0, 3.0]);
        let b = Matrix::new(1, 3, vec![1.0, 2.5, 2.0]);
        assert_eq!(a.max_abs_diff(&b), 1.0);
        assert_eq!(a.max_abs_diff(&a), 0.0);
    }

    #[test]
    #[should_panic(expected = "too large")]
    fn test_zeros_rejects_overflowing_shape() {
        Matrix::zeros(usize::MAX, 2);
    }

    #[test]
    fn test_max_abs_diff_reports_nan() {
        let a = Matrix::new(1, 2, vec![1.0, f32::NAN]);
        let b = Matrix::new(1, 2, vec![1.0, 2.0]);
        assert!(a.max_abs_diff(&b).is_nan());
        assert!(b.max_abs_diff(&a).is_nan());
        let c = Matrix::new(1, 2, vec![f32::NAN, 2.0]);
        assert!(c.max_abs_diff(&b).is_nan());
    }

    #[test]
    fn test_release_empties_buffer() {
        let mut m = Matrix::zeros(4, 5);
        let buf = m.release();
        assert_eq!(buf.len(), 20);
        assert!(m.is_released());
    }

    #[test]
    #[should_panic(expected = "released twice")]
    fn test_double_release_panics() {
        let mut m = Matrix::zeros(2, 2);
        m.release();
        m.release();
    }

    #[test]
    #[should_panic(expected = "used after release")]
    fn test_use_after_release_panics() {
        let mut m = Matrix::zeros(2, 2);
        m.release();
        let _ = m.get(0, 0);
    }

    #[test]
    #[should_panic]
    fn test_new_shape_mismatch_panics() {
        let _m = Matrix::new(2, 2, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    #[should_panic]
    fn test_index_out_of_bounds_panics() {
        let m = Matrix::zeros(2, 3);
        let _ = m[(0, 3)];
    }
}
