//! Core types and utilities for peeptree training-tile generation.
//!
//! This crate is intentionally small and purely geometric. It does *not*
//! depend on any image decoder or annotation format.

mod geom;
mod logger;
mod scale;

pub use geom::{BoundingBox, ImageSize, InvalidImageSize, PixelRect};
pub use scale::ScaleFactors;

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, level_from_verbosity};
