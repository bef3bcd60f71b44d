//! Image helpers for tile writing: decode + resize, tile crops, debug overlays.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use peeptree_core::{BoundingBox, ImageSize, PixelRect};
use peeptree_tiles::{BlockLabel, LabeledTile};

use crate::TileSinkError;

const POSITIVE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const BACKGROUND_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Decode `path` and resize it to exactly `size`.
///
/// The triangle filter averages source pixels when shrinking, close to the
/// area interpolation the annotations were drawn against.
pub fn load_resized(path: &Path, size: ImageSize) -> Result<RgbImage, TileSinkError> {
    let img = image::open(path).map_err(|e| TileSinkError::ImageLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    if img.width() == 0 || img.height() == 0 {
        return Err(TileSinkError::ImageLoad {
            path: path.to_path_buf(),
            reason: "image dimensions are zero".to_string(),
        });
    }
    Ok(img
        .resize_exact(size.width, size.height, FilterType::Triangle)
        .to_rgb8())
}

/// Copy `rect` out of `img`.
///
/// Parts of the tile outside the image are left black, so every crop has the
/// full tile size. Returns `None` when the tile does not overlap the image.
pub fn crop_tile(img: &RgbImage, rect: PixelRect) -> Option<RgbImage> {
    let canvas = PixelRect::new(0, 0, img.width() as i32, img.height() as i32);
    let visible = rect.intersection(&canvas)?;

    let view = imageops::crop_imm(
        img,
        visible.x0 as u32,
        visible.y0 as u32,
        visible.width() as u32,
        visible.height() as u32,
    )
    .to_image();

    if visible == rect {
        return Some(view);
    }
    let mut out = RgbImage::new(rect.width() as u32, rect.height() as u32);
    imageops::replace(
        &mut out,
        &view,
        (visible.x0 - rect.x0) as i64,
        (visible.y0 - rect.y0) as i64,
    );
    Some(out)
}

fn to_rect(r: PixelRect) -> Option<Rect> {
    (!r.is_empty()).then(|| Rect::at(r.x0, r.y0).of_size(r.width() as u32, r.height() as u32))
}

/// Outline tiles (red positive, blue background) and boxes (green) on `img`.
pub fn draw_overlay(img: &mut RgbImage, boxes: &[BoundingBox], tiles: &[LabeledTile]) {
    for tile in tiles {
        let color = match tile.label {
            BlockLabel::Positive => POSITIVE_COLOR,
            BlockLabel::Background => BACKGROUND_COLOR,
        };
        if let Some(r) = to_rect(tile.rect) {
            draw_hollow_rect_mut(img, r, color);
        }
    }
    for b in boxes {
        if let Some(r) = to_rect(b.rect()) {
            draw_hollow_rect_mut(img, r, BOX_COLOR);
        }
    }
}
