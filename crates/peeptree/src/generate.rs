//! Batch driver: annotation folder -> mapper -> tile sink.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{error, info, warn};
use peeptree_annotation::{
    image_path_for, AnnotationParseError, AnnotationRecord, AnnotationStore, ClassList,
    StoreError, PREDEFINED_CLASSES_FILE,
};
use peeptree_tiles::{AnnotationTileMapper, BlockLabel, GeometryError, TileParams, TileParamsError};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{BatchReport, ConfigIoError, ImageTiles, SkipStage, TileSink, TileSinkError};

/// Errors that stop a whole run.
///
/// Per-record problems never show up here; they are recorded in the
/// [`BatchReport`] instead.
#[derive(thiserror::Error, Debug)]
pub enum GenerateError {
    #[error(transparent)]
    Params(#[from] TileParamsError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Sink(#[from] TileSinkError),
    #[error(transparent)]
    Io(#[from] ConfigIoError),
}

/// Generates labeled training tiles for every annotation in a folder.
pub struct TrainingDataGenerator {
    src_dir: PathBuf,
    classes: ClassList,
    classes_error: Option<String>,
    mapper: AnnotationTileMapper,
}

impl TrainingDataGenerator {
    /// Driver for `src_dir`, reading classes from `<src_dir>/predefined_classes.txt`.
    pub fn new(src_dir: impl AsRef<Path>, params: TileParams) -> Result<Self, GenerateError> {
        let src_dir = src_dir.as_ref();
        Self::with_classes_file(src_dir, src_dir.join(PREDEFINED_CLASSES_FILE), params)
    }

    /// Driver with an explicit classes file.
    ///
    /// A classes file that cannot be read is not fatal: the run continues with
    /// an empty list, and the problem is logged and kept for the report.
    pub fn with_classes_file(
        src_dir: impl AsRef<Path>,
        classes_file: impl AsRef<Path>,
        params: TileParams,
    ) -> Result<Self, GenerateError> {
        let mapper = AnnotationTileMapper::new(params)?;
        let (classes, load_err) = ClassList::load_or_empty(classes_file);
        let classes_error = load_err.map(|e| {
            warn!("continuing without class ids: {e}");
            e.to_string()
        });
        Ok(Self {
            src_dir: src_dir.as_ref().to_path_buf(),
            classes,
            classes_error,
            mapper,
        })
    }

    /// Replace the class list (e.g. one built in code).
    pub fn with_classes(mut self, classes: ClassList) -> Self {
        self.classes = classes;
        self.classes_error = None;
        self
    }

    pub fn src_dir(&self) -> &Path {
        &self.src_dir
    }

    pub fn classes(&self) -> &ClassList {
        &self.classes
    }

    pub fn mapper(&self) -> &AnnotationTileMapper {
        &self.mapper
    }

    /// Map one parsed record to its tiles.
    pub fn map_record(&self, record: &AnnotationRecord) -> Result<ImageTiles, GeometryError> {
        let map = self.mapper.map_image(record.size, &record.objects)?;
        let mut tiles = map.tiles;
        for tile in &mut tiles {
            tile.class_id = tile
                .class_name
                .as_deref()
                .and_then(|name| self.classes.index_of(name));
        }
        Ok(ImageTiles {
            source_id: record.source_id.clone(),
            image_path: image_path_for(record, &self.src_dir),
            size: record.size,
            scale: map.scale,
            boxes: map.boxes,
            tiles,
        })
    }

    /// Process every annotation record once, in file-name order.
    ///
    /// A record that fails to parse, has unusable boxes, or whose image cannot
    /// be loaded is logged, listed in the report and skipped; the batch goes on.
    /// Only errors outside a single record (unreadable source folder, sink
    /// write failures) end the run early.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, sink), fields(src = %self.src_dir.display()))
    )]
    pub fn run<S: TileSink + ?Sized>(&self, sink: &mut S) -> Result<BatchReport, GenerateError> {
        let store = AnnotationStore::open(&self.src_dir)?;
        let mut report = BatchReport::new(&self.src_dir);
        report.classes_error = self.classes_error.clone();

        info!(
            "processing {} annotation files from {}",
            store.len(),
            self.src_dir.display()
        );

        // source_id -> annotation file whose tiles were written under it
        let mut claimed: HashMap<String, PathBuf> = HashMap::new();
        for (path, parsed) in store.records() {
            report.records_seen += 1;
            self.process_record(path, parsed, sink, &mut claimed, &mut report)?;
        }
        sink.finish()?;

        info!(
            "mapped {}/{} records: {} positive, {} background tiles, {} skipped",
            report.records_mapped,
            report.records_seen,
            report.positive_tiles,
            report.background_tiles,
            report.skipped.len()
        );
        Ok(report)
    }

    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip_all, fields(file = %path.display()))
    )]
    fn process_record<S: TileSink + ?Sized>(
        &self,
        path: &Path,
        parsed: Result<AnnotationRecord, AnnotationParseError>,
        sink: &mut S,
        claimed: &mut HashMap<String, PathBuf>,
        report: &mut BatchReport,
    ) -> Result<(), GenerateError> {
        let record = match parsed {
            Ok(record) => record,
            Err(err) => {
                error!(
                    "failed to extract data from label file {}: {err}",
                    path.display()
                );
                report.skip(path, SkipStage::Parse, err);
                return Ok(());
            }
        };

        // tiles are named by source_id, so `a.xml` and `a.XML` collide
        if let Some(first) = claimed.get(&record.source_id) {
            let err = format!(
                "source id '{}' is already used by {}",
                record.source_id,
                first.display()
            );
            error!("skipping {}: {err}", path.display());
            report.skip(path, SkipStage::DuplicateId, err);
            return Ok(());
        }

        if !self.classes.is_empty() {
            for object in &record.objects {
                if !self.classes.contains(&object.label)
                    && report.unknown_labels.insert(object.label.clone())
                {
                    warn!(
                        "{}: label '{}' is not in the classes file",
                        path.display(),
                        object.label
                    );
                }
            }
        }

        let tiles = match self.map_record(&record) {
            Ok(tiles) => tiles,
            Err(err) => {
                error!("rejected boxes in {}: {err}", path.display());
                report.skip(path, SkipStage::Geometry, err);
                return Ok(());
            }
        };

        match sink.write_image(&tiles) {
            Ok(()) => {}
            Err(err) if err.is_record_local() => {
                error!("skipping {}: {err}", path.display());
                report.skip(path, SkipStage::ImageLoad, err);
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        }

        claimed.insert(record.source_id.clone(), path.to_path_buf());
        report.records_mapped += 1;
        report.positive_tiles += tiles.count(BlockLabel::Positive);
        report.background_tiles += tiles.count(BlockLabel::Background);
        Ok(())
    }
}
