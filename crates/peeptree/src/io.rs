//! JSON configuration for a tile-generation run.

use std::fs;
use std::path::{Path, PathBuf};

use peeptree_annotation::PREDEFINED_CLASSES_FILE;
use peeptree_tiles::{TileParams, TileParamsError};
use serde::{Deserialize, Serialize};

use crate::{GenerateError, TrainingDataGenerator};

#[derive(thiserror::Error, Debug)]
pub enum ConfigIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Configuration for `peeptree generate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateConfig {
    /// Folder with the `*.xml` annotations (and usually the images).
    pub src_dir: PathBuf,
    /// Folder the tiles are written to.
    pub target_dir: PathBuf,
    /// Classes file; defaults to `<src_dir>/predefined_classes.txt`.
    #[serde(default)]
    pub classes_file: Option<PathBuf>,
    /// Optional folder for debug overlays.
    #[serde(default)]
    pub overlay_dir: Option<PathBuf>,
    /// Optional path for the JSON batch report.
    #[serde(default)]
    pub report_path: Option<PathBuf>,
    #[serde(default)]
    pub params: TileParams,
}

impl GenerateConfig {
    pub fn new(src_dir: impl Into<PathBuf>, target_dir: impl Into<PathBuf>) -> Self {
        Self {
            src_dir: src_dir.into(),
            target_dir: target_dir.into(),
            classes_file: None,
            overlay_dir: None,
            report_path: None,
            params: TileParams::default(),
        }
    }

    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Resolve the classes file path.
    pub fn classes_path(&self) -> PathBuf {
        self.classes_file
            .clone()
            .unwrap_or_else(|| self.src_dir.join(PREDEFINED_CLASSES_FILE))
    }

    /// Validated tile parameters.
    pub fn build_params(&self) -> Result<TileParams, TileParamsError> {
        self.params.validate()?;
        Ok(self.params.clone())
    }

    /// Build the batch driver from this config.
    pub fn build_generator(&self) -> Result<TrainingDataGenerator, GenerateError> {
        let params = self.build_params()?;
        TrainingDataGenerator::with_classes_file(&self.src_dir, self.classes_path(), params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_json_uses_defaults() {
        let cfg: GenerateConfig =
            serde_json::from_str(r#"{ "src_dir": "ann", "target_dir": "out" }"#).expect("json");
        assert_eq!(cfg, GenerateConfig::new("ann", "out"));
        assert_eq!(cfg.classes_path(), PathBuf::from("ann/predefined_classes.txt"));
        assert_eq!(cfg.build_params().expect("params"), TileParams::default());
    }

    #[test]
    fn config_round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("peeptree.json");
        let mut cfg = GenerateConfig::new("ann", "out");
        cfg.params.block_dim = 20;
        cfg.overlay_dir = Some("overlay".into());
        cfg.write_json(&path).expect("write");
        assert_eq!(GenerateConfig::load_json(&path).expect("load"), cfg);
    }

    #[test]
    fn invalid_params_are_reported() {
        let mut cfg = GenerateConfig::new("ann", "out");
        cfg.params.min_block_covered_area = Some(-1.0);
        assert!(cfg.build_params().is_err());
    }
}
