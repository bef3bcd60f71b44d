use peeptree_core::{ImageSize, PixelRect};

/// Errors for boxes that cannot be turned into a block grid.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("block_dim must be > 0")]
    ZeroBlockDim,
    #[error("declared image size {0} has a zero dimension")]
    InvalidSource(ImageSize),
    #[error("box '{label}' has non-positive extent after rescaling ({rect:?})")]
    Degenerate { label: String, rect: PixelRect },
    #[error("box '{label}' ({rect:?}) falls outside the {canvas} canvas")]
    OutsideCanvas {
        label: String,
        rect: PixelRect,
        canvas: ImageSize,
    },
}

/// Tile parameter validation errors.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TileParamsError {
    #[error("resize target must be non-zero, got {0}")]
    InvalidResize(ImageSize),
    #[error("block_dim must be > 0")]
    ZeroBlockDim,
    #[error("min_block_covered_area must be finite and in [0, {max}], got {value}")]
    InvalidCoverageThreshold { value: f64, max: f64 },
}
