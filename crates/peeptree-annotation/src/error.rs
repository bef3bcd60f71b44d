use std::path::PathBuf;

use peeptree_core::InvalidImageSize;

/// Errors while reading or interpreting one annotation record.
#[derive(thiserror::Error, Debug)]
pub enum AnnotationParseError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` has invalid value '{value}'")]
    InvalidNumber { field: String, value: String },
    #[error(transparent)]
    InvalidSize(#[from] InvalidImageSize),
    #[error("object {index} ('{label}') has an empty or inverted box ({xmin},{ymin})-({xmax},{ymax})")]
    InvalidBox {
        index: usize,
        label: String,
        xmin: i32,
        ymin: i32,
        xmax: i32,
        ymax: i32,
    },
}

/// The classes file could not be loaded.
#[derive(thiserror::Error, Debug)]
#[error("failed to load classes from {path}: {source}")]
pub struct ConfigLoadError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// The annotation folder itself could not be listed.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("failed to list annotation folder {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
