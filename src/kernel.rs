//! One step of the min-plus recurrence over a single tile.
//!
//! If `l(i, j)` is the shortest path from `i` to `j` using at most `2^s`
//! hops, then `min_k l(i, k) + l(k, j)` is the shortest using at most
//! `2^(s+1)` hops. This is a matrix square with `(min, +)` in place of
//! `(+, *)`.

use rayon::prelude::*;

use crate::error::{ApspError, Result};
use crate::matrix::DistanceMatrix;
use crate::partition::Tile;

/// Square `current` into `next`, restricted to the cells of `tile`.
///
/// Each cell of the tile in `next` is lowered to
/// `min_k current(i, k) + current(k, j)` when that is smaller; cells outside
/// the tile are left alone. Returns `true` when no cell changed.
pub fn square(tile: &Tile, current: &DistanceMatrix, next: &mut DistanceMatrix) -> Result<bool> {
    let n = current.n;
    if next.n != n {
        return Err(ApspError::DimensionMismatch {
            expected: n,
            found: next.n,
        });
    }
    if tile.row_max > n || tile.col_max > n {
        return Err(ApspError::InvalidGrid(format!(
            "tile {:?} does not fit a {}x{} matrix",
            tile, n, n
        )));
    }
    if tile.cell_count() == 0 {
        return Ok(true);
    }

    let cur = &current.data;

    // Rows of the tile copied out so the inner loop reads both operands
    // linearly.
    let row_len = n;
    let mut tile_rows = vec![0u32; tile.rows().len() * row_len];
    for (r, i) in tile.rows().enumerate() {
        let row = &mut tile_rows[r * row_len..(r + 1) * row_len];
        for (k, value) in row.iter_mut().enumerate() {
            *value = cur[k * n + i];
        }
    }

    let improved = next.data[tile.col_min * n..tile.col_max * n]
        .par_chunks_mut(n)
        .enumerate()
        .map(|(offset, next_col)| {
            let j = tile.col_min + offset;
            let cur_col = &cur[j * n..(j + 1) * n];
            let mut improved = false;
            for (r, i) in tile.rows().enumerate() {
                let row = &tile_rows[r * row_len..(r + 1) * row_len];
                let mut lij = next_col[i];
                for (lik, lkj) in row.iter().zip(cur_col) {
                    let via = lik + lkj;
                    if via < lij {
                        lij = via;
                        improved = true;
                    }
                }
                next_col[i] = lij;
            }
            improved
        })
        .reduce(|| false, |a, b| a || b);

    Ok(!improved)
}
