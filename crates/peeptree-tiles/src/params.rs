use peeptree_core::ImageSize;
use serde::{Deserialize, Serialize};

use crate::TileParamsError;

/// Training resolution every annotated image is normalized to.
pub const DEFAULT_RESIZE: ImageSize = ImageSize {
    width: 320,
    height: 240,
};

/// Side length of a square training tile, in resized-image pixels.
pub const DEFAULT_BLOCK_DIM: u32 = 15;

fn default_resize() -> ImageSize {
    DEFAULT_RESIZE
}

fn default_block_dim() -> u32 {
    DEFAULT_BLOCK_DIM
}

/// Configuration for annotation-to-tile mapping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileParams {
    /// Target resolution the boxes are rescaled to.
    #[serde(default = "default_resize")]
    pub resize: ImageSize,
    /// Square block side in pixels.
    #[serde(default = "default_block_dim")]
    pub block_dim: u32,
    /// Minimum covered area (px²) for a `positive` block.
    ///
    /// When `None`, half of the block area (`0.5 * block_dim²`) is used, so the
    /// threshold follows `block_dim`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_block_covered_area: Option<f64>,
}

impl Default for TileParams {
    fn default() -> Self {
        Self {
            resize: DEFAULT_RESIZE,
            block_dim: DEFAULT_BLOCK_DIM,
            min_block_covered_area: None,
        }
    }
}

impl TileParams {
    /// Default parameters with a custom block size (threshold follows it).
    pub fn with_block_dim(block_dim: u32) -> Self {
        Self {
            block_dim,
            ..Self::default()
        }
    }

    /// Area of one block in px².
    #[inline]
    pub fn block_area(&self) -> f64 {
        let d = self.block_dim as f64;
        d * d
    }

    /// Effective coverage threshold in px².
    #[inline]
    pub fn coverage_threshold(&self) -> f64 {
        self.min_block_covered_area
            .unwrap_or_else(|| 0.5 * self.block_area())
    }

    pub fn validate(&self) -> Result<(), TileParamsError> {
        if !self.resize.is_valid() {
            return Err(TileParamsError::InvalidResize(self.resize));
        }
        if self.block_dim == 0 {
            return Err(TileParamsError::ZeroBlockDim);
        }
        let value = self.coverage_threshold();
        let max = self.block_area();
        if !value.is_finite() || value < 0.0 || value > max {
            return Err(TileParamsError::InvalidCoverageThreshold { value, max });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn defaults_match_training_setup() {
        let p = TileParams::default();
        assert_eq!(p.resize, ImageSize::new(320, 240).unwrap());
        assert_eq!(p.block_dim, 15);
        assert_relative_eq!(p.coverage_threshold(), 112.5);
        p.validate().expect("valid");
    }

    #[test]
    fn threshold_follows_block_dim_unless_set() {
        let p = TileParams::with_block_dim(20);
        assert_relative_eq!(p.coverage_threshold(), 200.0);

        let p = TileParams {
            min_block_covered_area: Some(10.0),
            ..TileParams::with_block_dim(20)
        };
        assert_relative_eq!(p.coverage_threshold(), 10.0);
    }

    #[test]
    fn invalid_params_are_rejected() {
        assert_eq!(
            TileParams::with_block_dim(0).validate(),
            Err(TileParamsError::ZeroBlockDim)
        );

        let too_big = TileParams {
            min_block_covered_area: Some(226.0),
            ..TileParams::default()
        };
        assert!(matches!(
            too_big.validate(),
            Err(TileParamsError::InvalidCoverageThreshold { .. })
        ));

        let nan = TileParams {
            min_block_covered_area: Some(f64::NAN),
            ..TileParams::default()
        };
        assert!(nan.validate().is_err());

        let flat = TileParams {
            resize: ImageSize {
                width: 320,
                height: 0,
            },
            ..TileParams::default()
        };
        assert!(matches!(
            flat.validate(),
            Err(TileParamsError::InvalidResize(_))
        ));
    }

    #[test]
    fn missing_fields_use_defaults() {
        let p: TileParams = serde_json::from_str(r#"{ "block_dim": 10 }"#).expect("json");
        assert_eq!(p.resize, DEFAULT_RESIZE);
        assert_relative_eq!(p.coverage_threshold(), 50.0);
    }
}
