//! PNG outputs for a single evaluated sample.

use burn_dataset::IMG_MEAN_BGR;
use image::RgbImage;
use std::path::{Path, PathBuf};
use thiserror::Error;
use vision_core::colormap::{colorize_labels, entropy_heatmap};
use vision_core::overlay::{denormalize_bgr_chw, overlay_labels_chw};

#[derive(Debug, Error)]
pub enum VisualizeError {
    #[error("failed to write {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("{what} buffer does not match {width}x{height}")]
    Shape {
        what: &'static str,
        width: u32,
        height: u32,
    },
}

/// Host-side buffers for one sample of a batch.
#[derive(Debug, Clone, Copy)]
pub struct SampleVisuals<'a> {
    pub name: &'a str,
    /// Mean-subtracted BGR CHW image.
    pub image_chw: &'a [f32],
    pub labels: &'a [u8],
    pub preds: &'a [u8],
    pub entropy: &'a [f32],
    pub width: u32,
    pub height: u32,
    pub max_entropy: f32,
}

fn save(img: &RgbImage, path: PathBuf) -> Result<PathBuf, VisualizeError> {
    img.save(&path)
        .map_err(|e| VisualizeError::Image {
            path: path.clone(),
            source: e,
        })?;
    Ok(path)
}

/// Write `<name>_img.png`, `<name>_label_overlayed.png`, `<name>_pred_overlayed.png`
/// and `<name>_entropy.png` into `out_dir`. Returns the written paths in that order.
pub fn write_sample_visuals(
    out_dir: &Path,
    sample: &SampleVisuals<'_>,
) -> Result<Vec<PathBuf>, VisualizeError> {
    let (w, h) = (sample.width, sample.height);
    let shape_err = |what| VisualizeError::Shape {
        what,
        width: w,
        height: h,
    };

    let img = denormalize_bgr_chw(sample.image_chw, w, h, IMG_MEAN_BGR)
        .ok_or_else(|| shape_err("image"))?;
    let overlay = |labels: &[u8]| {
        colorize_labels(labels, w, h)
            .and_then(|colored| overlay_labels_chw(sample.image_chw, IMG_MEAN_BGR, &colored))
    };
    let label_overlay = overlay(sample.labels).ok_or_else(|| shape_err("label"))?;
    let pred_overlay = overlay(sample.preds).ok_or_else(|| shape_err("prediction"))?;
    let heat = entropy_heatmap(sample.entropy, w, h, sample.max_entropy)
        .ok_or_else(|| shape_err("entropy"))?;

    let name = sample.name;
    Ok(vec![
        save(&img, out_dir.join(format!("{name}_img.png")))?,
        save(&label_overlay, out_dir.join(format!("{name}_label_overlayed.png")))?,
        save(&pred_overlay, out_dir.join(format!("{name}_pred_overlayed.png")))?,
        save(&heat, out_dir.join(format!("{name}_entropy.png")))?,
    ])
}
