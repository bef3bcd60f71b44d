use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{AnnotationParseError, AnnotationRecord, StoreError};

/// The annotation files of one source folder.
///
/// Only `*.xml` entries (any case) are considered, sorted by file name so that
/// a batch always visits records in the same order.
#[derive(Clone, Debug)]
pub struct AnnotationStore {
    dir: PathBuf,
    files: Vec<PathBuf>,
}

impl AnnotationStore {
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip_all, fields(dir = %dir.as_ref().display()))
    )]
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        let read_err = |source| StoreError::ReadDir {
            path: dir.clone(),
            source,
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(&dir).map_err(read_err)? {
            let path = entry.map_err(read_err)?.path();
            if path.is_file() && is_xml(&path) {
                files.push(path);
            }
        }
        files.sort();
        debug!("found {} annotation files in {}", files.len(), dir.display());

        Ok(Self { dir, files })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Lazily parse every record; a failing file does not stop the others.
    pub fn records(
        &self,
    ) -> impl Iterator<Item = (&Path, Result<AnnotationRecord, AnnotationParseError>)> + '_ {
        self.files
            .iter()
            .map(|p| (p.as_path(), AnnotationRecord::load(p)))
    }
}

fn is_xml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xml"))
}

/// Resolve the source image of `record`.
///
/// Relative `path` values are taken relative to `annotation_dir`. When the
/// declared path does not exist but `filename` does exist next to the
/// annotation, that file is used instead.
pub fn image_path_for(record: &AnnotationRecord, annotation_dir: &Path) -> PathBuf {
    let declared = Path::new(&record.path);
    let declared = if declared.is_absolute() {
        declared.to_path_buf()
    } else {
        annotation_dir.join(declared)
    };
    if declared.exists() {
        return declared;
    }
    if let Some(name) = record.filename.as_deref() {
        let local = annotation_dir.join(name);
        if local.exists() {
            debug!(
                "{}: declared image {} not found, using {}",
                record.source_id,
                declared.display(),
                local.display()
            );
            return local;
        }
    }
    declared
}
