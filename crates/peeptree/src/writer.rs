//! PNG tile writer.
//!
//! Layout under the target folder:
//!
//! ```text
//! <target>/positive/<source_id>_r<row>_c<col>.png
//! <target>/background/<source_id>_r<row>_c<col>.png
//! <target>/manifest.json
//! ```
//!
//! `row` / `col` are the tile's lattice cell on the resized canvas.

use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageError, RgbImage};
use log::{debug, info};
use peeptree_core::{ImageSize, PixelRect};
use peeptree_tiles::{BlockCell, BlockLabel};
use serde::{Deserialize, Serialize};

use crate::render::{crop_tile, draw_overlay, load_resized};
use crate::{ImageTiles, TileSink, TileSinkError};

pub const MANIFEST_FILE: &str = "manifest.json";

/// One written tile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub source_id: String,
    /// Path relative to the target folder.
    pub file: String,
    pub cell: BlockCell,
    pub rect: PixelRect,
    pub label: BlockLabel,
    pub covered_area: i64,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub class_id: Option<usize>,
}

/// [`TileSink`] that crops every tile out of the resized source image.
pub struct ImageTileWriter {
    target_dir: PathBuf,
    resize: ImageSize,
    overlay_dir: Option<PathBuf>,
    manifest: Vec<ManifestEntry>,
}

fn create_dir(path: &Path) -> Result<(), TileSinkError> {
    fs::create_dir_all(path).map_err(|source| TileSinkError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn save_png(img: &RgbImage, path: &Path) -> Result<(), TileSinkError> {
    img.save(path).map_err(|e| match e {
        ImageError::IoError(source) => TileSinkError::Write {
            path: path.to_path_buf(),
            source,
        },
        other => TileSinkError::Encode {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    })
}

impl ImageTileWriter {
    /// Writer into `target_dir`; creates the label folders up front.
    ///
    /// `resize` must match the [`TileParams::resize`](crate::TileParams) the
    /// tiles were computed for.
    pub fn new(target_dir: impl Into<PathBuf>, resize: ImageSize) -> Result<Self, TileSinkError> {
        let target_dir = target_dir.into();
        for label in [BlockLabel::Positive, BlockLabel::Background] {
            create_dir(&target_dir.join(label.as_str()))?;
        }
        Ok(Self {
            target_dir,
            resize,
            overlay_dir: None,
            manifest: Vec::new(),
        })
    }

    /// Also save one overlay per record into `dir`.
    pub fn with_overlay(mut self, dir: impl Into<PathBuf>) -> Result<Self, TileSinkError> {
        let dir = dir.into();
        create_dir(&dir)?;
        self.overlay_dir = Some(dir);
        Ok(self)
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    /// Tiles written so far.
    pub fn manifest(&self) -> &[ManifestEntry] {
        &self.manifest
    }

    fn tile_file(source_id: &str, label: BlockLabel, cell: BlockCell) -> String {
        format!(
            "{}/{}_r{}_c{}.png",
            label.as_str(),
            source_id,
            cell.row,
            cell.col
        )
    }
}

impl TileSink for ImageTileWriter {
    fn write_image(&mut self, tiles: &ImageTiles) -> Result<(), TileSinkError> {
        let mut img = load_resized(&tiles.image_path, self.resize)?;

        for tile in &tiles.tiles {
            let Some(crop) = crop_tile(&img, tile.rect) else {
                debug!("{}: tile {:?} is off the canvas", tiles.source_id, tile.cell);
                continue;
            };
            let file = Self::tile_file(&tiles.source_id, tile.label, tile.cell);
            save_png(&crop, &self.target_dir.join(&file))?;
            self.manifest.push(ManifestEntry {
                source_id: tiles.source_id.clone(),
                file,
                cell: tile.cell,
                rect: tile.rect,
                label: tile.label,
                covered_area: tile.covered_area,
                class_name: tile.class_name.clone(),
                class_id: tile.class_id,
            });
        }

        if let Some(dir) = &self.overlay_dir {
            draw_overlay(&mut img, &tiles.boxes, &tiles.tiles);
            save_png(&img, &dir.join(format!("{}.png", tiles.source_id)))?;
        }
        debug!(
            "{}: wrote {} tiles",
            tiles.source_id,
            tiles.tiles.len()
        );
        Ok(())
    }

    fn finish(&mut self) -> Result<(), TileSinkError> {
        let path = self.target_dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(&self.manifest).map_err(|e| {
            TileSinkError::Encode {
                path: path.clone(),
                reason: e.to_string(),
            }
        })?;
        fs::write(&path, json).map_err(|source| TileSinkError::Write {
            path: path.clone(),
            source,
        })?;
        info!(
            "wrote {} tiles to {}",
            self.manifest.len(),
            self.target_dir.display()
        );
        Ok(())
    }
}
