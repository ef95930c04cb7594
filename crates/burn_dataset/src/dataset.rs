//! Resolving list files and loading individual evaluation samples.

use crate::types::{BurnDatasetError, DatasetResult, EvalSample, SampleIndex};
use data_contracts::{label_id_to_train_id, parse_list};
use image::RgbImage;
use std::fs;
use std::path::{Path, PathBuf};

/// Per-channel mean (BGR order) subtracted from input images.
pub const IMG_MEAN_BGR: [f32; 3] = [102.9801, 115.9465, 122.7717];

#[derive(Debug, Clone)]
pub struct EvalDataset {
    pub root: PathBuf,
    indices: Vec<SampleIndex>,
}

impl EvalDataset {
    /// Read `list_path` and resolve every entry relative to `root`.
    pub fn from_list(root: &Path, list_path: &Path) -> DatasetResult<Self> {
        let text = fs::read_to_string(list_path).map_err(|e| BurnDatasetError::Io {
            path: list_path.to_path_buf(),
            source: e,
        })?;
        let entries = parse_list(&text).map_err(|e| BurnDatasetError::List {
            path: list_path.to_path_buf(),
            source: e,
        })?;
        let indices = entries
            .into_iter()
            .map(|entry| SampleIndex {
                name: entry.name(),
                image_path: root.join(&entry.image),
                label_path: root.join(&entry.label),
            })
            .collect();
        Ok(Self::from_indices(root, indices))
    }

    pub fn from_indices(root: &Path, indices: Vec<SampleIndex>) -> Self {
        Self {
            root: root.to_path_buf(),
            indices,
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn indices(&self) -> &[SampleIndex] {
        &self.indices
    }
}

/// Convert an RGB image into mean-subtracted BGR floats in CHW order.
pub fn image_to_bgr_chw(img: &RgbImage) -> Vec<f32> {
    let (w, h) = img.dimensions();
    let plane = w as usize * h as usize;
    let mut out = vec![0.0f32; 3 * plane];
    for (i, px) in img.pixels().enumerate() {
        for c in 0..3 {
            out[c * plane + i] = px[2 - c] as f32 - IMG_MEAN_BGR[c];
        }
    }
    out
}

/// Decode a `labelIds` PNG and map it to train ids. Returns `(train_ids, width, height)`.
pub fn load_label(path: &Path) -> DatasetResult<(Vec<u8>, u32, u32)> {
    let gray = image::open(path)
        .map_err(|e| BurnDatasetError::Image {
            path: path.to_path_buf(),
            source: e,
        })?
        .to_luma8();
    let (w, h) = gray.dimensions();
    let ids = gray
        .into_raw()
        .into_iter()
        .map(label_id_to_train_id)
        .collect();
    Ok((ids, w, h))
}

pub fn load_sample(idx: &SampleIndex) -> DatasetResult<EvalSample> {
    let img = image::open(&idx.image_path)
        .map_err(|e| BurnDatasetError::Image {
            path: idx.image_path.clone(),
            source: e,
        })?
        .to_rgb8();
    let (width, height) = img.dimensions();
    let (label, label_w, label_h) = load_label(&idx.label_path)?;
    if (label_w, label_h) != (width, height) {
        return Err(BurnDatasetError::SizeMismatch {
            label: idx.label_path.clone(),
            label_w,
            label_h,
            image_w: width,
            image_h: height,
        });
    }
    Ok(EvalSample {
        name: idx.name.clone(),
        image_chw: image_to_bgr_chw(&img),
        label,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bgr_chw_swaps_channels_and_subtracts_mean() {
        let img = RgbImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                image::Rgb([10, 20, 30])
            } else {
                image::Rgb([200, 100, 50])
            }
        });
        let chw = image_to_bgr_chw(&img);
        assert_eq!(chw.len(), 6);
        // Blue plane first.
        assert!((chw[0] - (30.0 - IMG_MEAN_BGR[0])).abs() < 1e-4);
        assert!((chw[1] - (50.0 - IMG_MEAN_BGR[0])).abs() < 1e-4);
        // Red plane last.
        assert!((chw[4] - (10.0 - IMG_MEAN_BGR[2])).abs() < 1e-4);
        assert!((chw[5] - (200.0 - IMG_MEAN_BGR[2])).abs() < 1e-4);
    }
}
