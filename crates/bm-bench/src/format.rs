//! Text rendering of matrices and their tile grids.

use std::fmt::Write;

use bm_matrix::{Matrix, TileGrid, TileSize};

/// Indices in `[1, len)` at which a new tile starts.
fn boundaries(tile: TileSize, len: usize) -> Vec<usize> {
    tile.spans(len)
        .into_iter()
        .map(|(start, _)| start)
        .filter(|&start| start > 0)
        .collect()
}

/// Render the top-left `max_len x max_len` corner of `matrix`, drawing a
/// `|` before every column tile boundary and a dashed line before every row
/// tile boundary. Cells are four wide with one decimal, so columns line up
/// with the dashes for values below 100.
pub fn render_matrix(
    name: &str,
    matrix: &Matrix,
    row_tile: TileSize,
    col_tile: TileSize,
    max_len: usize,
) -> String {
    let max_row = matrix.rows().min(max_len);
    let max_col = matrix.cols().min(max_len);
    let row_breaks = boundaries(row_tile, matrix.rows());
    let col_breaks = boundaries(col_tile, matrix.cols());

    let mut out = String::new();
    let _ = writeln!(
        out,
        "matrix {} {} (row tile {:?}, col tile {:?}), showing {}x{}",
        name,
        matrix.shape(),
        row_tile,
        col_tile,
        max_row,
        max_col
    );

    for i in 0..max_row {
        if row_breaks.contains(&i) {
            for j in 0..max_col {
                if col_breaks.contains(&j) {
                    out.push_str("+ ");
                }
                out.push_str("---- ");
            }
            out.push('\n');
        }
        for j in 0..max_col {
            if col_breaks.contains(&j) {
                out.push_str("| ");
            }
            let _ = write!(out, "{:4.1} ", matrix.get(i, j));
        }
        out.push('\n');
    }
    out
}

/// Render the bounds of the top-left `max_len x max_len` tiles of a grid,
/// one tile row per line.
pub fn render_tile_grid(name: &str, grid: &TileGrid, max_len: usize) -> String {
    let max_row = grid.rows().min(max_len);
    let max_col = grid.cols().min(max_len);

    let mut out = String::new();
    let _ = writeln!(out, "tile grid {} [{}x{}]", name, grid.rows(), grid.cols());
    for u in 0..max_row {
        for v in 0..max_col {
            let t = grid.tile(u, v);
            let _ = write!(
                out,
                "{}{},{}[{}..{}, {}..{}] ",
                name, u, v, t.row_start, t.row_end, t.col_start, t.col_end
            );
        }
        out.push('\n');
    }
    out
}
