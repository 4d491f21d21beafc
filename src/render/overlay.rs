use std::path::Path;

use image::{RgbaImage, imageops::FilterType};

use crate::{
    config::ImageElementConfig,
    foundation::error::{CardError, CardResult},
    render::{SkipReason, StageOutcome, center_x, composite, load_asset, place_y},
};

/// Size of an asset scaled to `canvas_w * width_ratio`, keeping its aspect ratio.
///
/// Both dimensions truncate. Returns `None` when either side would be zero.
pub fn scaled_size(canvas_w: u32, width_ratio: f64, asset_w: u32, asset_h: u32) -> Option<(u32, u32)> {
    if asset_w == 0 || asset_h == 0 {
        return None;
    }
    let new_w = (f64::from(canvas_w) * width_ratio) as u32;
    let ratio = f64::from(new_w) / f64::from(asset_w);
    let new_h = (f64::from(asset_h) * ratio) as u32;
    (new_w > 0 && new_h > 0).then_some((new_w, new_h))
}

/// Scale a badge/banner asset, center it horizontally, anchor it vertically and composite it
/// through a canvas-sized transparent buffer.
pub fn apply_overlay(
    canvas: &mut RgbaImage,
    asset_path: &Path,
    cfg: &ImageElementConfig,
    width_ratio: f64,
) -> CardResult<StageOutcome> {
    let Some(asset) = load_asset(asset_path)? else {
        return Ok(StageOutcome::Skipped(SkipReason::MissingAsset(
            asset_path.to_path_buf(),
        )));
    };

    let (w, h) = scaled_size(canvas.width(), width_ratio, asset.width(), asset.height())
        .ok_or_else(|| {
            CardError::render(format!(
                "'{}' scales to an empty overlay on a {}px wide canvas",
                asset_path.display(),
                canvas.width()
            ))
        })?;
    let mut scaled = image::imageops::resize(&asset, w, h, FilterType::Lanczos3);
    composite::scale_alpha(&mut scaled, cfg.opacity);

    let x = center_x(canvas.width(), w);
    let y = place_y(cfg.position, canvas.height(), h, cfg.offset_y);

    let buffer = positioned_layer(canvas.width(), canvas.height(), &scaled, x, y);
    composite::over_in_place(canvas, &buffer)?;
    Ok(StageOutcome::Applied)
}

/// Copy `item` into a transparent `width x height` layer at `(x, y)`; out-of-bounds pixels are
/// clipped.
pub fn positioned_layer(width: u32, height: u32, item: &RgbaImage, x: i64, y: i64) -> RgbaImage {
    let mut layer = RgbaImage::new(width, height);
    image::imageops::replace(&mut layer, item, x, y);
    layer
}
