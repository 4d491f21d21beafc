use image::RgbaImage;

use crate::{
    config::Opacity,
    foundation::error::{CardError, CardResult},
};

pub type StraightRgba8 = [u8; 4];

/// Porter-Duff source-over on straight (non-premultiplied) RGBA8 pixels.
pub fn over(dst: StraightRgba8, src: StraightRgba8) -> StraightRgba8 {
    let sa = u32::from(src[3]);
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return src;
    }

    let da = u32::from(dst[3]);
    // Both terms carry a 255^2 scale.
    let dst_weight = da * (255 - sa);
    let out_a_scaled = sa * 255 + dst_weight;
    if out_a_scaled == 0 {
        return [0, 0, 0, 0];
    }

    let mut out = [0u8; 4];
    for i in 0..3 {
        let num = u32::from(src[i]) * sa * 255 + u32::from(dst[i]) * dst_weight;
        out[i] = ((num + out_a_scaled / 2) / out_a_scaled).min(255) as u8;
    }
    out[3] = ((out_a_scaled + 127) / 255).min(255) as u8;
    out
}

/// Composite `src` over `dst`; both images must have identical dimensions.
pub fn over_in_place(dst: &mut RgbaImage, src: &RgbaImage) -> CardResult<()> {
    if dst.dimensions() != src.dimensions() {
        return Err(CardError::render(format!(
            "over_in_place expects equal-size images, got {:?} and {:?}",
            dst.dimensions(),
            src.dimensions()
        )));
    }
    for (d, s) in dst.pixels_mut().zip(src.pixels()) {
        d.0 = over(d.0, s.0);
    }
    Ok(())
}

/// Multiply every alpha value by `opacity`, keeping color channels untouched.
pub fn scale_alpha(img: &mut RgbaImage, opacity: Opacity) {
    if opacity.is_opaque() {
        return;
    }
    let o = opacity.get();
    for px in img.pixels_mut() {
        px.0[3] = (f32::from(px.0[3]) * o).round().clamp(0.0, 255.0) as u8;
    }
}

/// Convert premultiplied RGBA8 bytes into a straight-alpha image.
pub fn unpremultiply(width: u32, height: u32, premul: &[u8]) -> CardResult<RgbaImage> {
    if premul.len() != (width as usize) * (height as usize) * 4 {
        return Err(CardError::render(
            "premultiplied buffer does not match image dimensions",
        ));
    }
    let mut straight = premul.to_vec();
    for px in straight.chunks_exact_mut(4) {
        let a = u32::from(px[3]);
        if a == 0 {
            px[..3].fill(0);
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
    RgbaImage::from_raw(width, height, straight)
        .ok_or_else(|| CardError::render("failed to wrap unpremultiplied buffer"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn over_src_alpha_0_is_noop() {
        let dst = [10, 20, 30, 40];
        let src = [255, 255, 255, 0];
        assert_eq!(over(dst, src), dst);
    }

    #[test]
    fn over_src_opaque_replaces_dst() {
        let dst = [0, 0, 0, 255];
        let src = [255, 0, 0, 255];
        assert_eq!(over(dst, src), src);
    }

    #[test]
    fn over_dst_transparent_returns_src() {
        let dst = [0, 0, 0, 0];
        let src = [100, 110, 120, 200];
        assert_eq!(over(dst, src), src);
    }

    #[test]
    fn over_half_alpha_on_opaque_blends_midway() {
        let dst = [0, 0, 0, 255];
        let src = [255, 255, 255, 128];
        let out = over(dst, src);
        assert_eq!(out[3], 255);
        assert!((127..=129).contains(&out[0]));
    }

    #[test]
    fn over_in_place_rejects_size_mismatch() {
        let mut dst = RgbaImage::new(2, 2);
        let src = RgbaImage::new(3, 2);
        assert!(over_in_place(&mut dst, &src).is_err());
        assert!(dst.pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }

    #[test]
    fn scale_alpha_multiplies_alpha_only() {
        let mut img = RgbaImage::from_raw(
            3,
            1,
            vec![10, 20, 30, 255, 40, 50, 60, 100, 70, 80, 90, 0],
        )
        .unwrap();
        let original = img.clone();
        scale_alpha(&mut img, Opacity::new(0.5));

        for (scaled, orig) in img.pixels().zip(original.pixels()) {
            assert_eq!(&scaled.0[..3], &orig.0[..3]);
            let expected = (f32::from(orig.0[3]) * 0.5).round() as u8;
            assert_eq!(scaled.0[3], expected);
        }
    }

    #[test]
    fn scale_alpha_at_full_opacity_is_noop() {
        let mut img = RgbaImage::from_raw(1, 1, vec![1, 2, 3, 77]).unwrap();
        scale_alpha(&mut img, Opacity::OPAQUE);
        assert_eq!(img.get_pixel(0, 0).0, [1, 2, 3, 77]);
        scale_alpha(&mut img, Opacity::new(0.0));
        assert_eq!(img.get_pixel(0, 0).0, [1, 2, 3, 0]);
    }

    #[test]
    fn unpremultiply_restores_straight_color() {
        let premul = vec![64, 32, 0, 128, 9, 9, 9, 0];
        let img = unpremultiply(2, 1, &premul).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [128, 64, 0, 128]);
        assert_eq!(img.get_pixel(1, 0).0, [0, 0, 0, 0]);
        assert!(unpremultiply(3, 1, &premul).is_err());
    }
}
