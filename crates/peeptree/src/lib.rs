//! High-level facade crate for the `peeptree-*` workspace.
//!
//! This crate provides:
//! - stable re-exports of the underlying crates
//! - the batch driver [`TrainingDataGenerator`], which walks an annotation
//!   folder, maps every record to labeled tiles and hands them to a [`TileSink`]
//! - JSON configuration ([`GenerateConfig`]) and the per-run [`BatchReport`]
//! - (feature `image`) [`writer::ImageTileWriter`], which crops the tiles out of
//!   the resized source images and saves them as PNG files
//!
//! ## Quickstart
//!
//! ```no_run
//! use peeptree::writer::ImageTileWriter;
//! use peeptree::{TileParams, TrainingDataGenerator};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let params = TileParams::default();
//! let generator = TrainingDataGenerator::new("annotations", params.clone())?;
//! let mut writer = ImageTileWriter::new("tiles", params.resize)?;
//!
//! let report = generator.run(&mut writer)?;
//! println!("{} records mapped, {} skipped", report.records_mapped, report.skipped.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `peeptree::core`: geometry primitives and logger setup.
//! - `peeptree::tiles`: rescaling, block grids, coverage labeling.
//! - `peeptree::annotation`: VOC records, classes file, annotation folder.

pub use peeptree_annotation as annotation;
pub use peeptree_core as core;
pub use peeptree_tiles as tiles;

pub use peeptree_annotation::{AnnotationRecord, ClassList};
pub use peeptree_core::{BoundingBox, ImageSize, PixelRect, ScaleFactors};
pub use peeptree_tiles::{AnnotationTileMapper, BlockLabel, LabeledTile, TileParams};

mod generate;
mod io;
mod report;
mod sink;

pub use generate::{GenerateError, TrainingDataGenerator};
pub use io::{ConfigIoError, GenerateConfig};
pub use report::{BatchReport, SkipStage, SkippedRecord};
pub use sink::{ImageTiles, TileSink, TileSinkError};

#[cfg(feature = "image")]
pub mod render;
#[cfg(feature = "image")]
pub mod writer;
