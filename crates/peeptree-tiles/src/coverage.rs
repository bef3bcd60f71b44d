//! Block labeling by covered area.

use std::collections::BTreeMap;

use peeptree_core::{BoundingBox, PixelRect};
use serde::{Deserialize, Serialize};

use crate::grid::{compute_block_grid, Block, BlockCell};
use crate::GeometryError;

/// Training label of a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockLabel {
    Positive,
    Background,
}

impl BlockLabel {
    /// `Positive` iff `covered_area >= threshold`.
    #[inline]
    pub fn from_coverage(covered_area: i64, threshold: f64) -> Self {
        if covered_area as f64 >= threshold {
            BlockLabel::Positive
        } else {
            BlockLabel::Background
        }
    }

    #[inline]
    pub fn is_positive(self) -> bool {
        self == BlockLabel::Positive
    }

    /// Directory / manifest name.
    pub fn as_str(self) -> &'static str {
        match self {
            BlockLabel::Positive => "positive",
            BlockLabel::Background => "background",
        }
    }
}

impl std::fmt::Display for BlockLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label one block against a single box.
pub fn classify_block(block: &Block, b: &BoundingBox, threshold: f64) -> BlockLabel {
    BlockLabel::from_coverage(block.pixel_rect.intersection_area(&b.rect()), threshold)
}

/// Coverage of one lattice cell by every box that touches it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellCoverage {
    pub cell: BlockCell,
    pub rect: PixelRect,
    /// `(box index, box ∩ block)` in the order boxes were added.
    pub pieces: Vec<(usize, PixelRect)>,
}

impl CellCoverage {
    /// Area of the union of all pieces; overlapping boxes are counted once.
    pub fn covered_area(&self) -> i64 {
        union_area(self.pieces.iter().map(|(_, r)| *r))
    }

    /// Index of the box covering the largest part of the block.
    ///
    /// Ties go to the box added first.
    pub fn dominant_box(&self) -> Option<usize> {
        let mut best: Option<(usize, i64)> = None;
        for &(idx, rect) in &self.pieces {
            let area = rect.area();
            match best {
                Some((_, best_area)) if best_area >= area => {}
                _ => best = Some((idx, area)),
            }
        }
        best.map(|(idx, _)| idx)
    }

    #[inline]
    pub fn label(&self, threshold: f64) -> BlockLabel {
        BlockLabel::from_coverage(self.covered_area(), threshold)
    }
}

/// Accumulates box coverage per lattice cell across all boxes of one image.
///
/// Cells are kept in row-major order, so iteration order is deterministic and
/// independent of the order boxes were added in.
#[derive(Clone, Debug)]
pub struct CoverageAccumulator {
    block_dim: u32,
    next_index: usize,
    cells: BTreeMap<BlockCell, CellCoverage>,
}

impl CoverageAccumulator {
    pub fn new(block_dim: u32) -> Self {
        Self {
            block_dim,
            next_index: 0,
            cells: BTreeMap::new(),
        }
    }

    /// Add a box (resized-image coordinates); returns its index.
    pub fn add_box(&mut self, b: &BoundingBox) -> Result<usize, GeometryError> {
        let grid = compute_block_grid(b, self.block_dim)?;
        let index = self.next_index;
        self.next_index += 1;

        let object = b.rect();
        for block in grid.blocks() {
            let entry = self.cells.entry(block.cell).or_insert_with(|| CellCoverage {
                cell: block.cell,
                rect: block.pixel_rect,
                pieces: Vec::new(),
            });
            if let Some(piece) = block.pixel_rect.intersection(&object) {
                entry.pieces.push((index, piece));
            }
        }
        Ok(index)
    }

    /// Number of candidate cells seen so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, cell: BlockCell) -> Option<&CellCoverage> {
        self.cells.get(&cell)
    }

    /// Candidate cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &CellCoverage> + '_ {
        self.cells.values()
    }

    pub fn into_cells(self) -> impl Iterator<Item = CellCoverage> {
        self.cells.into_values()
    }
}

/// Exact union area of axis-aligned rectangles via coordinate compression.
fn union_area(rects: impl Iterator<Item = PixelRect>) -> i64 {
    let rects: Vec<PixelRect> = rects.filter(|r| !r.is_empty()).collect();
    match rects.as_slice() {
        [] => return 0,
        [only] => return only.area(),
        _ => {}
    }

    let mut xs: Vec<i32> = rects.iter().flat_map(|r| [r.x0, r.x1]).collect();
    let mut ys: Vec<i32> = rects.iter().flat_map(|r| [r.y0, r.y1]).collect();
    xs.sort_unstable();
    xs.dedup();
    ys.sort_unstable();
    ys.dedup();

    let mut area = 0i64;
    for yw in ys.windows(2) {
        for xw in xs.windows(2) {
            let covered = rects
                .iter()
                .any(|r| r.x0 <= xw[0] && xw[1] <= r.x1 && r.y0 <= yw[0] && yw[1] <= r.y1);
            if covered {
                area += (xw[1] - xw[0]) as i64 * (yw[1] - yw[0]) as i64;
            }
        }
    }
    area
}
