//! Block-aligned grids around a box.

use std::iter::FusedIterator;

use peeptree_core::{BoundingBox, PixelRect};
use serde::{Deserialize, Serialize};

use crate::GeometryError;

/// Lattice coordinates of a block on the canvas: `(x0 / block_dim, y0 / block_dim)`.
///
/// Ordering is row-major (`row` first, then `col`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockCell {
    pub row: i32,
    pub col: i32,
}

/// The smallest block-aligned rectangle that fully contains a box.
///
/// `min_row` / `min_col` are pixel offsets and always multiples of `block_dim`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockGrid {
    pub block_dim: u32,
    pub min_row: i32,
    pub min_col: i32,
    pub n_rows: u32,
    pub n_cols: u32,
}

/// One cell of a [`BlockGrid`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Block {
    /// Row inside the parent grid.
    pub row_index: u32,
    /// Column inside the parent grid.
    pub col_index: u32,
    /// Canvas lattice coordinates.
    pub cell: BlockCell,
    pub pixel_rect: PixelRect,
}

#[inline]
fn floor_to_multiple(v: i32, d: i32) -> i32 {
    v.div_euclid(d) * d
}

#[inline]
fn ceil_to_multiple(v: i32, d: i32) -> i32 {
    -(-v).div_euclid(d) * d
}

/// Compute the block grid covering `b`.
///
/// A box edge that lies exactly on a block boundary does not pull in an extra
/// row or column.
pub fn compute_block_grid(b: &BoundingBox, block_dim: u32) -> Result<BlockGrid, GeometryError> {
    if block_dim == 0 {
        return Err(GeometryError::ZeroBlockDim);
    }
    if !b.has_positive_extent() {
        return Err(GeometryError::Degenerate {
            label: b.label.clone(),
            rect: b.rect(),
        });
    }
    let d = i32::try_from(block_dim).map_err(|_| GeometryError::ZeroBlockDim)?;

    let min_row = floor_to_multiple(b.ymin, d);
    let row_extent = ceil_to_multiple(b.ymax, d);
    let min_col = floor_to_multiple(b.xmin, d);
    let col_extent = ceil_to_multiple(b.xmax, d);

    Ok(BlockGrid {
        block_dim,
        min_row,
        min_col,
        n_rows: ((row_extent - min_row) / d) as u32,
        n_cols: ((col_extent - min_col) / d) as u32,
    })
}

/// Row-major block sequence of `grid`.
#[inline]
pub fn enumerate_blocks(grid: &BlockGrid) -> Blocks {
    grid.blocks()
}

impl BlockGrid {
    /// See [`compute_block_grid`].
    pub fn for_box(b: &BoundingBox, block_dim: u32) -> Result<Self, GeometryError> {
        compute_block_grid(b, block_dim)
    }

    /// Number of blocks (`n_rows * n_cols`).
    #[inline]
    pub fn len(&self) -> usize {
        self.n_rows as usize * self.n_cols as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pixel extent of the whole grid.
    pub fn pixel_rect(&self) -> PixelRect {
        let d = self.block_dim as i32;
        PixelRect::new(
            self.min_col,
            self.min_row,
            self.min_col + self.n_cols as i32 * d,
            self.min_row + self.n_rows as i32 * d,
        )
    }

    /// Block at grid position `(row_index, col_index)`.
    pub fn block(&self, row_index: u32, col_index: u32) -> Option<Block> {
        if row_index >= self.n_rows || col_index >= self.n_cols {
            return None;
        }
        let d = self.block_dim as i32;
        let x0 = self.min_col + col_index as i32 * d;
        let y0 = self.min_row + row_index as i32 * d;
        Some(Block {
            row_index,
            col_index,
            cell: BlockCell {
                row: y0.div_euclid(d),
                col: x0.div_euclid(d),
            },
            pixel_rect: PixelRect::new(x0, y0, x0 + d, y0 + d),
        })
    }

    /// Lazy row-major iterator over every block. Call again to restart.
    pub fn blocks(&self) -> Blocks {
        Blocks {
            grid: *self,
            next: 0,
            end: self.len(),
        }
    }
}

/// Iterator returned by [`BlockGrid::blocks`].
#[derive(Clone, Debug)]
pub struct Blocks {
    grid: BlockGrid,
    next: usize,
    end: usize,
}

impl Iterator for Blocks {
    type Item = Block;

    fn next(&mut self) -> Option<Block> {
        if self.next >= self.end {
            return None;
        }
        let cols = self.grid.n_cols as usize;
        let idx = self.next;
        self.next += 1;
        self.grid.block((idx / cols) as u32, (idx % cols) as u32)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.end - self.next;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Blocks {}

impl FusedIterator for Blocks {}
