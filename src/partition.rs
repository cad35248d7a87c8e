//! Block decomposition of the distance matrix over a 2D grid of ranks.
//!
//! The first grid axis (`x`) splits matrix rows, the second (`y`) splits
//! columns. Along each axis the first `total % parts` blocks are one longer
//! than the rest, so block sizes differ by at most one.

use std::ops::Range;

use crate::error::{ApspError, Result};

/// Start and length of block `index` when `total` items are split into
/// `parts` contiguous blocks.
pub fn partition(total: usize, parts: usize, index: usize) -> Result<(usize, usize)> {
    if parts == 0 {
        return Err(ApspError::InvalidGrid(
            "cannot split into zero parts".to_string(),
        ));
    }
    if parts > total {
        return Err(ApspError::InvalidGrid(format!(
            "{} parts would leave empty blocks of a {}-wide axis",
            parts, total
        )));
    }
    if index >= parts {
        return Err(ApspError::InvalidGrid(format!(
            "block {} out of range for {} parts",
            index, parts
        )));
    }

    let q = total / parts;
    let r = total % parts;
    let len = if index < r { q + 1 } else { q };
    let start = index * q + index.min(r);
    Ok((start, len))
}

/// Shape of the rank grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridShape {
    pub x: usize,
    pub y: usize,
}

impl GridShape {
    pub fn new(x: usize, y: usize) -> Result<Self> {
        if x == 0 || y == 0 {
            return Err(ApspError::InvalidGrid(format!(
                "grid dimensions must be positive, got {}x{}",
                x, y
            )));
        }
        Ok(GridShape { x, y })
    }

    /// Number of ranks the grid needs.
    pub fn size(&self) -> usize {
        self.x * self.y
    }

    /// Fail unless the grid holds exactly `available` ranks.
    pub fn check_size(&self, available: usize) -> Result<()> {
        if self.size() != available {
            return Err(ApspError::GridMismatch {
                requested: self.size(),
                available,
            });
        }
        Ok(())
    }

    /// Grid coordinate of `rank`, in row-major rank order.
    pub fn coord_of(&self, rank: usize) -> Result<GridCoord> {
        if rank >= self.size() {
            return Err(ApspError::InvalidGrid(format!(
                "rank {} outside {}x{} grid",
                rank, self.x, self.y
            )));
        }
        Ok(GridCoord {
            px: rank / self.y,
            py: rank % self.y,
        })
    }
}

/// Zero-based position of a rank in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCoord {
    pub px: usize,
    pub py: usize,
}

/// Half-open block `[row_min, row_max) x [col_min, col_max)` of the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub row_min: usize,
    pub row_max: usize,
    pub col_min: usize,
    pub col_max: usize,
}

impl Tile {
    /// The whole `n x n` matrix.
    pub fn full(n: usize) -> Self {
        Tile {
            row_min: 0,
            row_max: n,
            col_min: 0,
            col_max: n,
        }
    }

    pub fn rows(&self) -> Range<usize> {
        self.row_min..self.row_max
    }

    pub fn cols(&self) -> Range<usize> {
        self.col_min..self.col_max
    }

    pub fn cell_count(&self) -> usize {
        self.rows().len() * self.cols().len()
    }
}

/// Tile owned by the rank at `coord` when an `n x n` matrix is spread
/// over `grid`.
pub fn compute_tile(n: usize, grid: GridShape, coord: GridCoord) -> Result<Tile> {
    let (row_min, rows) = partition(n, grid.x, coord.px)?;
    let (col_min, cols) = partition(n, grid.y, coord.py)?;
    Ok(Tile {
        row_min,
        row_max: row_min + rows,
        col_min,
        col_max: col_min + cols,
    })
}
