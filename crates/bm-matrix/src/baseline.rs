//! Untiled reference multiplication.

use rayon::prelude::*;

use crate::error::Result;
use crate::matrix::Matrix;
use crate::shape::Shape;

#[inline]
fn dot_row(a_row: &[f32], right: &Matrix, out_row: &mut [f32]) {
    let b = right.as_slice();
    let q = right.cols();
    for (j, out) in out_row.iter_mut().enumerate() {
        let mut sum = 0.0f32;
        for (k, &a) in a_row.iter().enumerate() {
            sum += a * b[k * q + j];
        }
        *out = sum;
    }
}

/// Plain i-j-k triple loop. Overwrites `result`.
pub fn vanilla_mul(left: &Matrix, right: &Matrix, result: &mut Matrix) -> Result<()> {
    Shape::check_product(&left.shape(), &right.shape(), &result.shape())?;
    if result.shape().is_empty() {
        return Ok(());
    }
    let q = result.cols();
    for (i, out_row) in result.as_mut_slice().chunks_mut(q).enumerate() {
        dot_row(left.row(i), right, out_row);
    }
    Ok(())
}

/// Triple loop with result rows shared out across the current rayon pool.
/// Overwrites `result`.
pub fn vanilla_mul_parallel(left: &Matrix, right: &Matrix, result: &mut Matrix) -> Result<()> {
    Shape::check_product(&left.shape(), &right.shape(), &result.shape())?;
    if result.shape().is_empty() {
        return Ok(());
    }
    let q = result.cols();
    result
        .as_mut_slice()
        .par_chunks_mut(q)
        .enumerate()
        .for_each(|(i, out_row)| dot_row(left.row(i), right, out_row));
    Ok(())
}
