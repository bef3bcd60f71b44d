use log::{debug, trace};
use peeptree_core::{BoundingBox, ImageSize, PixelRect, ScaleFactors};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::coverage::{BlockLabel, CoverageAccumulator};
use crate::grid::BlockCell;
use crate::{GeometryError, TileParams, TileParamsError};

/// One labeled training tile in resized-image coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabeledTile {
    pub cell: BlockCell,
    pub rect: PixelRect,
    pub label: BlockLabel,
    /// Union of all box coverage inside the tile, in px².
    pub covered_area: i64,
    /// Label of the box covering most of the tile; `None` for background.
    #[serde(default)]
    pub class_name: Option<String>,
    /// Position of `class_name` in the classes file, when known.
    #[serde(default)]
    pub class_id: Option<usize>,
}

/// Mapper output for one annotated image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileMap {
    pub scale: ScaleFactors,
    /// Boxes rescaled to the target resolution, in annotation order.
    pub boxes: Vec<BoundingBox>,
    /// Candidate tiles in row-major canvas order.
    pub tiles: Vec<LabeledTile>,
}

impl TileMap {
    pub fn positives(&self) -> impl Iterator<Item = &LabeledTile> + '_ {
        self.tiles.iter().filter(|t| t.label.is_positive())
    }

    pub fn count(&self, label: BlockLabel) -> usize {
        self.tiles.iter().filter(|t| t.label == label).count()
    }
}

/// Maps annotated boxes to labeled training tiles.
#[derive(Clone, Debug)]
pub struct AnnotationTileMapper {
    params: TileParams,
}

impl AnnotationTileMapper {
    pub fn new(params: TileParams) -> Result<Self, TileParamsError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &TileParams {
        &self.params
    }

    /// Scale factors from `source` to the configured resize target.
    pub fn scale_factors(&self, source: ImageSize) -> Result<ScaleFactors, GeometryError> {
        if !source.is_valid() {
            return Err(GeometryError::InvalidSource(source));
        }
        Ok(ScaleFactors::new(source, self.params.resize))
    }

    /// Rescale boxes and reject any that collapse or leave the target canvas.
    pub fn rescale_boxes(
        &self,
        scale: &ScaleFactors,
        boxes: &[BoundingBox],
    ) -> Result<Vec<BoundingBox>, GeometryError> {
        let canvas = scale.target;
        boxes
            .iter()
            .map(|b| {
                let r = scale.rescale_box(b);
                if !r.has_positive_extent() {
                    return Err(GeometryError::Degenerate {
                        label: r.label.clone(),
                        rect: r.rect(),
                    });
                }
                if !canvas.rect().contains_rect(&r.rect()) {
                    return Err(GeometryError::OutsideCanvas {
                        label: r.label.clone(),
                        rect: r.rect(),
                        canvas,
                    });
                }
                trace!("rescaled {:?} -> {:?}", b.rect(), r.rect());
                Ok(r)
            })
            .collect()
    }

    /// Label every block touched by `boxes` (already in resized coordinates).
    ///
    /// Coverage is aggregated across all boxes before thresholding.
    pub fn label_boxes(&self, boxes: &[BoundingBox]) -> Result<Vec<LabeledTile>, GeometryError> {
        let mut acc = CoverageAccumulator::new(self.params.block_dim);
        for b in boxes {
            acc.add_box(b)?;
        }

        let threshold = self.params.coverage_threshold();
        let tiles = acc
            .into_cells()
            .map(|cell| {
                let covered_area = cell.covered_area();
                let label = BlockLabel::from_coverage(covered_area, threshold);
                let class_name = match label {
                    BlockLabel::Positive => cell
                        .dominant_box()
                        .and_then(|idx| boxes.get(idx))
                        .map(|b| b.label.clone()),
                    BlockLabel::Background => None,
                };
                LabeledTile {
                    cell: cell.cell,
                    rect: cell.rect,
                    label,
                    covered_area,
                    class_name,
                    class_id: None,
                }
            })
            .collect();
        Ok(tiles)
    }

    /// Full per-image mapping: scale factors, rescaling, grids, labels.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, boxes), fields(source = %source, boxes = boxes.len()))
    )]
    pub fn map_image(
        &self,
        source: ImageSize,
        boxes: &[BoundingBox],
    ) -> Result<TileMap, GeometryError> {
        let scale = self.scale_factors(source)?;
        let boxes = self.rescale_boxes(&scale, boxes)?;
        let tiles = self.label_boxes(&boxes)?;
        debug!(
            "mapped {} boxes from {} to {} tiles ({} positive)",
            boxes.len(),
            source,
            tiles.len(),
            tiles.iter().filter(|t| t.label.is_positive()).count()
        );
        Ok(TileMap {
            scale,
            boxes,
            tiles,
        })
    }
}
