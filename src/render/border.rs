use image::{RgbaImage, imageops::FilterType};

use crate::{
    config::ImageElementConfig,
    foundation::error::CardResult,
    render::{SkipReason, StageOutcome, composite, load_asset},
};

/// Stretch the border asset over the whole canvas and composite it on top.
pub fn apply_border(
    canvas: &mut RgbaImage,
    asset_path: &std::path::Path,
    cfg: &ImageElementConfig,
) -> CardResult<StageOutcome> {
    let Some(asset) = load_asset(asset_path)? else {
        return Ok(StageOutcome::Skipped(SkipReason::MissingAsset(
            asset_path.to_path_buf(),
        )));
    };

    let mut layer = stretch_to(&asset, canvas.width(), canvas.height());
    composite::scale_alpha(&mut layer, cfg.opacity);
    composite::over_in_place(canvas, &layer)?;
    Ok(StageOutcome::Applied)
}

fn stretch_to(asset: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if asset.dimensions() == (width, height) {
        return asset.clone();
    }
    image::imageops::resize(asset, width, height, FilterType::Lanczos3)
}
