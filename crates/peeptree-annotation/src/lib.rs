//! Annotation input for peeptree.
//!
//! - [`AnnotationRecord`]: one Pascal VOC XML file (as written by LabelImg):
//!   declared image size, source image path and labeled boxes.
//! - [`ClassList`]: the newline-separated `predefined_classes.txt`.
//! - [`AnnotationStore`]: the `*.xml` files of a source folder, in file-name order.

mod classes;
mod error;
mod store;
mod voc;

pub use classes::{ClassList, PREDEFINED_CLASSES_FILE};
pub use error::{AnnotationParseError, ConfigLoadError, StoreError};
pub use store::{image_path_for, AnnotationStore};
pub use voc::AnnotationRecord;
