//! Annotation-to-tile mapping for peeptree training data.
//!
//! Given the original size of an image and its labeled boxes, this crate
//! computes the fixed-size blocks (tiles) that a trunk classifier is trained
//! on, and decides for each block whether it is `positive` or `background`.
//!
//! The pipeline for one image is:
//! 1. compute [`ScaleFactors`] from the declared size to [`TileParams::resize`],
//! 2. rescale every box and reject boxes that collapse or leave the canvas,
//! 3. build the [`BlockGrid`] around each box (block-aligned floor/ceil),
//! 4. accumulate, per lattice cell, the union of box coverage,
//! 5. label the cell `positive` when the covered area reaches the threshold.
//!
//! ```
//! use peeptree_core::{BoundingBox, ImageSize};
//! use peeptree_tiles::{AnnotationTileMapper, BlockLabel, TileParams};
//!
//! let mapper = AnnotationTileMapper::new(TileParams::default()).unwrap();
//! let source = ImageSize::new(640, 480).unwrap();
//! let boxes = [BoundingBox::new("trunk", 30, 30, 90, 60)];
//!
//! let map = mapper.map_image(source, &boxes).unwrap();
//! assert_eq!(map.boxes[0], BoundingBox::new("trunk", 15, 15, 45, 30));
//! assert!(map.tiles.iter().all(|t| t.label == BlockLabel::Positive));
//! ```
//!
//! Everything here is a pure function of its inputs; there is no I/O.

mod coverage;
mod error;
mod grid;
mod mapper;
mod params;

pub use coverage::{classify_block, BlockLabel, CellCoverage, CoverageAccumulator};
pub use error::{GeometryError, TileParamsError};
pub use grid::{compute_block_grid, enumerate_blocks, Block, BlockCell, BlockGrid, Blocks};
pub use mapper::{AnnotationTileMapper, LabeledTile, TileMap};
pub use params::{TileParams, DEFAULT_BLOCK_DIM, DEFAULT_RESIZE};

pub use peeptree_core::{BoundingBox, ImageSize, PixelRect, ScaleFactors};
