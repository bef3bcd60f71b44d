use serde::{Deserialize, Serialize};

use crate::{BoundingBox, ImageSize};

/// Per-axis scale from original-image pixels to resized-image pixels.
///
/// The ratios are kept as exact fractions `target / source`, so rescaling a
/// coordinate is an exact integer operation rather than a rounded float product.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleFactors {
    pub source: ImageSize,
    pub target: ImageSize,
}

impl ScaleFactors {
    /// Both sizes must be valid (non-zero); use `ImageSize::new` to build them.
    pub fn new(source: ImageSize, target: ImageSize) -> Self {
        debug_assert!(source.is_valid() && target.is_valid());
        Self { source, target }
    }

    /// Identity factors for an image that is already at the target size.
    pub fn identity(size: ImageSize) -> Self {
        Self::new(size, size)
    }

    #[inline]
    pub fn x_ratio(&self) -> f64 {
        self.target.width as f64 / self.source.width as f64
    }

    #[inline]
    pub fn y_ratio(&self) -> f64 {
        self.target.height as f64 / self.source.height as f64
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        self.source == self.target
    }

    /// `trunc(x * x_ratio)`.
    #[inline]
    pub fn scale_x(&self, x: i32) -> i32 {
        scale_coord(x, self.target.width, self.source.width)
    }

    /// `trunc(y * y_ratio)`.
    #[inline]
    pub fn scale_y(&self, y: i32) -> i32 {
        scale_coord(y, self.target.height, self.source.height)
    }

    /// Map a box from original-image to resized-image coordinates.
    ///
    /// Each coordinate is multiplied by its axis ratio and truncated toward
    /// zero. No range check is done here; inputs outside the source image
    /// produce coordinates outside the target canvas.
    pub fn rescale_box(&self, b: &BoundingBox) -> BoundingBox {
        BoundingBox {
            label: b.label.clone(),
            xmin: self.scale_x(b.xmin),
            ymin: self.scale_y(b.ymin),
            xmax: self.scale_x(b.xmax),
            ymax: self.scale_y(b.ymax),
        }
    }
}

#[inline]
fn scale_coord(v: i32, num: u32, den: u32) -> i32 {
    let scaled = v as i64 * num as i64 / den as i64;
    scaled.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}
