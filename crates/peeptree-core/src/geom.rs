use serde::{Deserialize, Serialize};

/// Width/height of an image in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("image dimensions must be positive (width={width}, height={height})")]
pub struct InvalidImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    /// Validated constructor; both sides must be non-zero.
    pub fn new(width: u32, height: u32) -> Result<Self, InvalidImageSize> {
        if width == 0 || height == 0 {
            return Err(InvalidImageSize { width, height });
        }
        Ok(Self { width, height })
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// The whole canvas as a rectangle anchored at the origin.
    #[inline]
    pub fn rect(&self) -> PixelRect {
        PixelRect::new(0, 0, self.width as i32, self.height as i32)
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Axis-aligned pixel rectangle `[x0, x1) x [y0, y1)`.
///
/// `(x0, y0)` is the top-left corner, `(x1, y1)` the exclusive bottom-right.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl PixelRect {
    #[inline]
    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    #[inline]
    pub fn width(&self) -> i32 {
        (self.x1 - self.x0).max(0)
    }

    #[inline]
    pub fn height(&self) -> i32 {
        (self.y1 - self.y0).max(0)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }

    /// Area in px², zero for empty rectangles.
    #[inline]
    pub fn area(&self) -> i64 {
        self.width() as i64 * self.height() as i64
    }

    /// Overlap with `other`, or `None` when they only touch or are disjoint.
    pub fn intersection(&self, other: &PixelRect) -> Option<PixelRect> {
        let r = PixelRect {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        };
        (!r.is_empty()).then_some(r)
    }

    #[inline]
    pub fn intersection_area(&self, other: &PixelRect) -> i64 {
        self.intersection(other).map_or(0, |r| r.area())
    }

    /// True if `other` lies fully inside `self`.
    pub fn contains_rect(&self, other: &PixelRect) -> bool {
        other.x0 >= self.x0 && other.y0 >= self.y0 && other.x1 <= self.x1 && other.y1 <= self.y1
    }
}

/// Labeled object box in pixel coordinates.
///
/// The coordinate space depends on where the box came from: boxes read from an
/// annotation are in original-image pixels, boxes produced by
/// `ScaleFactors::rescale_box` are in resized-image pixels.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub label: String,
    pub xmin: i32,
    pub ymin: i32,
    pub xmax: i32,
    pub ymax: i32,
}

impl BoundingBox {
    pub fn new(label: impl Into<String>, xmin: i32, ymin: i32, xmax: i32, ymax: i32) -> Self {
        Self {
            label: label.into(),
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    #[inline]
    pub fn rect(&self) -> PixelRect {
        PixelRect::new(self.xmin, self.ymin, self.xmax, self.ymax)
    }

    /// `xmin < xmax && ymin < ymax`.
    #[inline]
    pub fn has_positive_extent(&self) -> bool {
        self.xmin < self.xmax && self.ymin < self.ymax
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sized_image_is_rejected() {
        assert!(ImageSize::new(0, 240).is_err());
        assert!(ImageSize::new(320, 0).is_err());
        let size = ImageSize::new(320, 240).expect("size");
        assert_eq!(size.rect(), PixelRect::new(0, 0, 320, 240));
        assert_eq!(size.to_string(), "320x240");
    }

    #[test]
    fn touching_rects_do_not_intersect() {
        let a = PixelRect::new(0, 0, 15, 15);
        let b = PixelRect::new(15, 0, 30, 15);
        assert_eq!(a.intersection(&b), None);
        assert_eq!(a.intersection_area(&b), 0);
    }

    #[test]
    fn partial_overlap_area() {
        let block = PixelRect::new(0, 0, 15, 15);
        let object = PixelRect::new(10, 10, 20, 22);
        assert_eq!(block.intersection(&object), Some(PixelRect::new(10, 10, 15, 15)));
        assert_eq!(block.intersection_area(&object), 25);
    }

    #[test]
    fn containment_is_inclusive_of_edges() {
        let canvas = PixelRect::new(0, 0, 320, 240);
        assert!(canvas.contains_rect(&PixelRect::new(0, 0, 320, 240)));
        assert!(!canvas.contains_rect(&PixelRect::new(-1, 0, 10, 10)));
        assert!(!canvas.contains_rect(&PixelRect::new(0, 0, 321, 10)));
    }

    #[test]
    fn bounding_box_serializes_flat() {
        let b = BoundingBox::new("trunk", 1, 2, 3, 4);
        let json = serde_json::to_value(&b).expect("json");
        assert_eq!(json["label"], "trunk");
        assert_eq!(json["xmax"], 3);
        assert!(b.has_positive_extent());
        assert!(!BoundingBox::new("trunk", 3, 2, 3, 4).has_positive_extent());
    }
}
