use image::{Rgb, RgbImage};

/// Weight of the photo when blending class colors on top of it.
pub const OVERLAY_IMAGE_WEIGHT: f64 = 0.30;
/// Weight of the class colors when blending.
pub const OVERLAY_COLOR_WEIGHT: f64 = 0.70;

/// RGB value of pixel `i` of a mean-subtracted BGR CHW buffer, before any rounding.
fn denormalized_rgb(chw: &[f32], plane: usize, i: usize, mean_bgr: [f32; 3]) -> [f32; 3] {
    [
        chw[2 * plane + i] + mean_bgr[2],
        chw[plane + i] + mean_bgr[1],
        chw[i] + mean_bgr[0],
    ]
}

/// Undo mean subtraction on a BGR CHW buffer and return an RGB image.
pub fn denormalize_bgr_chw(
    chw: &[f32],
    width: u32,
    height: u32,
    mean_bgr: [f32; 3],
) -> Option<RgbImage> {
    let plane = width as usize * height as usize;
    if chw.len() != 3 * plane {
        return None;
    }
    let to_u8 = |v: f32| v.round().clamp(0.0, 255.0) as u8;
    Some(RgbImage::from_fn(width, height, |x, y| {
        let [r, g, b] = denormalized_rgb(chw, plane, (y * width + x) as usize, mean_bgr);
        Rgb([to_u8(r), to_u8(g), to_u8(b)])
    }))
}

/// Blend class colors over the float image held in a mean-subtracted BGR CHW buffer.
///
/// The photo is not rounded first; the weighted sum is truncated once.
pub fn overlay_labels_chw(
    chw: &[f32],
    mean_bgr: [f32; 3],
    colored: &RgbImage,
) -> Option<RgbImage> {
    let (width, height) = colored.dimensions();
    let plane = width as usize * height as usize;
    if chw.len() != 3 * plane {
        return None;
    }
    Some(RgbImage::from_fn(width, height, |x, y| {
        let rgb = denormalized_rgb(chw, plane, (y * width + x) as usize, mean_bgr);
        let o = colored.get_pixel(x, y);
        let mix = |c: usize| {
            (OVERLAY_IMAGE_WEIGHT * rgb[c] as f64 + OVERLAY_COLOR_WEIGHT * o[c] as f64)
                .clamp(0.0, 255.0) as u8
        };
        Rgb([mix(0), mix(1), mix(2)])
    }))
}

/// Weighted per-channel blend, truncated to u8. `None` on size mismatch.
pub fn blend(
    base: &RgbImage,
    overlay: &RgbImage,
    base_weight: f64,
    overlay_weight: f64,
) -> Option<RgbImage> {
    if base.dimensions() != overlay.dimensions() {
        return None;
    }
    let (w, h) = base.dimensions();
    Some(RgbImage::from_fn(w, h, |x, y| {
        let b = base.get_pixel(x, y);
        let o = overlay.get_pixel(x, y);
        let mix = |c: usize| {
            (base_weight * b[c] as f64 + overlay_weight * o[c] as f64).clamp(0.0, 255.0) as u8
        };
        Rgb([mix(0), mix(1), mix(2)])
    }))
}

/// Blend class colors over a photo with the default 30/70 weighting.
pub fn overlay_labels(base: &RgbImage, colored: &RgbImage) -> Option<RgbImage> {
    blend(base, colored, OVERLAY_IMAGE_WEIGHT, OVERLAY_COLOR_WEIGHT)
}
