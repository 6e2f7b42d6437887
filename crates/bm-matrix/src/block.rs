//! Tiled multiplication over a [`MultiplicationPlan`].
//!
//! Both entry points only accumulate into the result, which therefore has to
//! be zeroed by the caller. Every result cell receives its contributions in
//! ascending inner-index order, so sequential and parallel runs agree
//! bit-for-bit with the untiled baseline.

use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::instrument;

use crate::matrix::Matrix;
use crate::plan::MultiplicationPlan;
use crate::tiling::{TileBounds, TileGrid};

/// Accumulate `left[i, k] * right[k, j]` over the tile pair into one row of
/// the result. `out[0]` corresponds to result column `col_offset`.
#[inline]
fn accumulate_row(
    i: usize,
    left: &Matrix,
    right: &Matrix,
    left_tile: &TileBounds,
    right_tile: &TileBounds,
    out: &mut [f32],
    col_offset: usize,
) {
    let a_row = left.row(i);
    let b = right.as_slice();
    let q = right.cols();
    for j in right_tile.cols() {
        let mut acc = out[j - col_offset];
        for k in left_tile.cols() {
            acc += a_row[k] * b[k * q + j];
        }
        out[j - col_offset] = acc;
    }
}

/// Multiply all tile pairs that feed one column band of the result.
///
/// `band[i]` is row `i` of the result restricted to the columns of right tile
/// column `v`.
fn multiply_band(
    left: &Matrix,
    right: &Matrix,
    left_tiles: &TileGrid,
    right_tiles: &TileGrid,
    v: usize,
    band: &mut [&mut [f32]],
) {
    let col_offset = right_tiles.col_spans()[v].0;
    for u in 0..left_tiles.rows() {
        for c in 0..left_tiles.cols() {
            let lt = left_tiles.tile(u, c);
            let rt = right_tiles.tile(c, v);
            for i in lt.rows() {
                accumulate_row(i, left, right, lt, rt, &mut band[i], col_offset);
            }
        }
    }
}

/// Split a row-major buffer into one band per column span. Band `v` holds a
/// `&mut` slice of every row covering exactly `col_spans[v]`.
fn column_bands<'r>(
    data: &'r mut [f32],
    cols: usize,
    col_spans: &[(usize, usize)],
) -> Vec<Vec<&'r mut [f32]>> {
    let mut bands: Vec<Vec<&'r mut [f32]>> = col_spans.iter().map(|_| Vec::new()).collect();
    for row in data.chunks_mut(cols) {
        let mut rest = row;
        for (band, &(start, end)) in bands.iter_mut().zip(col_spans) {
            let (head, tail) = std::mem::take(&mut rest).split_at_mut(end - start);
            band.push(head);
            rest = tail;
        }
    }
    bands
}

/// Sequential block multiplication.
///
/// Loops over left tile rows `u`, right tile columns `v` and shared tiles
/// `c`, accumulating each tile product into `plan.result`.
#[instrument(skip_all, fields(
    left_grid = ?(plan.left_tiles().rows(), plan.left_tiles().cols()),
    right_grid = ?(plan.right_tiles().rows(), plan.right_tiles().cols()),
))]
pub fn multiply(plan: &mut MultiplicationPlan<'_>) {
    let MultiplicationPlan {
        left,
        right,
        result,
        tiles,
    } = plan;
    let left: &Matrix = left;
    let right: &Matrix = right;
    let left_tiles = tiles.left_tiles();
    let right_tiles = tiles.right_tiles();
    let q = result.cols();
    if result.shape().is_empty() {
        return;
    }
    let out = result.as_mut_slice();

    for u in 0..left_tiles.rows() {
        for v in 0..right_tiles.cols() {
            for c in 0..left_tiles.cols() {
                let lt = left_tiles.tile(u, c);
                let rt = right_tiles.tile(c, v);
                for i in lt.rows() {
                    accumulate_row(i, left, right, lt, rt, &mut out[i * q..(i + 1) * q], 0);
                }
            }
        }
    }
}

/// Parallel block multiplication on the current rayon pool.
///
/// Each right tile column `v` owns a disjoint column band of the result, so
/// the bands are handed to workers without locking.
#[instrument(skip_all, fields(
    bands = plan.right_tiles().cols(),
    threads = rayon::current_num_threads(),
))]
pub fn multiply_parallel(plan: &mut MultiplicationPlan<'_>) {
    let MultiplicationPlan {
        left,
        right,
        result,
        tiles,
    } = plan;
    let left: &Matrix = left;
    let right: &Matrix = right;
    let left_tiles = tiles.left_tiles();
    let right_tiles = tiles.right_tiles();
    if result.shape().is_empty() {
        return;
    }
    let q = result.cols();
    let bands = column_bands(result.as_mut_slice(), q, right_tiles.col_spans());

    bands.into_par_iter().enumerate().for_each(|(v, mut band)| {
        multiply_band(left, right, left_tiles, right_tiles, v, &mut band);
    });
}

/// Parallel block multiplication on an explicit worker pool.
pub fn multiply_parallel_in(plan: &mut MultiplicationPlan<'_>, pool: &ThreadPool) {
    pool.install(|| multiply_parallel(plan));
}
