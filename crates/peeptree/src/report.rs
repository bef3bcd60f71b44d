//! Per-run batch report.

use std::collections::BTreeSet;
use std::path::Path;
use std::{fmt, fs};

use serde::{Deserialize, Serialize};

use crate::ConfigIoError;

/// Where a record was dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipStage {
    Parse,
    /// Another record of the run already produced tiles under the same name.
    DuplicateId,
    Geometry,
    ImageLoad,
}

impl fmt::Display for SkipStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SkipStage::Parse => "parse",
            SkipStage::DuplicateId => "duplicate id",
            SkipStage::Geometry => "geometry",
            SkipStage::ImageLoad => "image load",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRecord {
    pub file: String,
    pub stage: SkipStage,
    pub error: String,
}

/// Outcome of one [`TrainingDataGenerator::run`](crate::TrainingDataGenerator::run).
///
/// Every record seen is either mapped or listed in `skipped`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub src_dir: String,
    pub records_seen: usize,
    pub records_mapped: usize,
    pub positive_tiles: usize,
    pub background_tiles: usize,
    #[serde(default)]
    pub skipped: Vec<SkippedRecord>,
    /// Set when the classes file could not be loaded.
    #[serde(default)]
    pub classes_error: Option<String>,
    /// Object labels missing from a non-empty classes list.
    #[serde(default)]
    pub unknown_labels: BTreeSet<String>,
}

impl BatchReport {
    pub fn new(src_dir: &Path) -> Self {
        Self {
            src_dir: src_dir.to_string_lossy().into_owned(),
            ..Self::default()
        }
    }

    pub(crate) fn skip(&mut self, file: &Path, stage: SkipStage, error: impl ToString) {
        self.skipped.push(SkippedRecord {
            file: file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.to_string_lossy().into_owned()),
            stage,
            error: error.to_string(),
        });
    }

    /// No skipped records and a usable classes file.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.classes_error.is_none()
    }

    pub fn total_tiles(&self) -> usize {
        self.positive_tiles + self.background_tiles
    }

    /// Load a report from JSON on disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
