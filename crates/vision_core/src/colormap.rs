use data_contracts::class_color;
use image::{Rgb, RgbImage};

/// "Hot" colormap: black -> red -> yellow -> white.
///
/// Red ramps over the first 3/8 of the range, green over the next 3/8, blue over the last 1/4.
pub fn hot_colormap(v: u8) -> Rgb<u8> {
    let t = v as f32 / 255.0;
    let ramp = |x: f32| (x.clamp(0.0, 1.0) * 255.0).round() as u8;
    Rgb([
        ramp(t / 0.375),
        ramp((t - 0.375) / 0.375),
        ramp((t - 0.75) / 0.25),
    ])
}

/// Scale an entropy value to `0..=255` relative to `max_entropy`, truncating.
pub fn entropy_to_u8(entropy: f32, max_entropy: f32) -> u8 {
    if max_entropy <= 0.0 {
        return 0;
    }
    ((entropy / max_entropy) * 255.0).clamp(0.0, 255.0) as u8
}

/// Paint a train-id map with the class palette. `None` if `labels` is not `width * height` long.
pub fn colorize_labels(labels: &[u8], width: u32, height: u32) -> Option<RgbImage> {
    if labels.len() != width as usize * height as usize {
        return None;
    }
    Some(RgbImage::from_fn(width, height, |x, y| {
        Rgb(class_color(labels[(y * width + x) as usize]))
    }))
}

/// Per-pixel entropy rendered through [`hot_colormap`].
pub fn entropy_heatmap(
    entropy: &[f32],
    width: u32,
    height: u32,
    max_entropy: f32,
) -> Option<RgbImage> {
    if entropy.len() != width as usize * height as usize {
        return None;
    }
    Some(RgbImage::from_fn(width, height, |x, y| {
        hot_colormap(entropy_to_u8(
            entropy[(y * width + x) as usize],
            max_entropy,
        ))
    }))
}
