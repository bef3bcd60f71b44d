use std::path::PathBuf;

use peeptree_core::{BoundingBox, ImageSize, ScaleFactors};
use peeptree_tiles::{BlockLabel, LabeledTile};
use serde::{Deserialize, Serialize};

/// Everything computed for one annotation record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageTiles {
    /// Annotation file stem.
    pub source_id: String,
    /// Resolved source image location.
    pub image_path: PathBuf,
    /// Declared original size.
    pub size: ImageSize,
    pub scale: ScaleFactors,
    /// Boxes in resized-image coordinates.
    pub boxes: Vec<BoundingBox>,
    /// Tiles in row-major canvas order.
    pub tiles: Vec<LabeledTile>,
}

impl ImageTiles {
    pub fn count(&self, label: BlockLabel) -> usize {
        self.tiles.iter().filter(|t| t.label == label).count()
    }
}

/// Errors reported by a [`TileSink`].
#[derive(thiserror::Error, Debug)]
pub enum TileSinkError {
    /// The record's source image is missing or cannot be decoded.
    #[error("failed to load image {path}: {reason}")]
    ImageLoad { path: PathBuf, reason: String },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode {path}: {reason}")]
    Encode { path: PathBuf, reason: String },
}

impl TileSinkError {
    /// True for errors that only concern the current record.
    pub fn is_record_local(&self) -> bool {
        matches!(self, TileSinkError::ImageLoad { .. })
    }
}

/// Consumer of the per-image tile lists (tile writer, visualizer, collector).
pub trait TileSink {
    /// Handle one record's tiles.
    ///
    /// Returning [`TileSinkError::ImageLoad`] skips the record; any other error
    /// stops the batch.
    fn write_image(&mut self, tiles: &ImageTiles) -> Result<(), TileSinkError>;

    /// Called once after the last record.
    fn finish(&mut self) -> Result<(), TileSinkError> {
        Ok(())
    }
}

/// Collects every record in memory.
impl TileSink for Vec<ImageTiles> {
    fn write_image(&mut self, tiles: &ImageTiles) -> Result<(), TileSinkError> {
        self.push(tiles.clone());
        Ok(())
    }
}

impl<S: TileSink + ?Sized> TileSink for &mut S {
    fn write_image(&mut self, tiles: &ImageTiles) -> Result<(), TileSinkError> {
        (**self).write_image(tiles)
    }

    fn finish(&mut self) -> Result<(), TileSinkError> {
        (**self).finish()
    }
}
