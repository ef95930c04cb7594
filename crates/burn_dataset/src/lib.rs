//! Dataset loading and Burn-compatible batching for segmentation evaluation.
//!
//! This crate provides utilities for:
//! - Resolving `<image> <label>` list files against a dataset root
//! - Loading mean-subtracted BGR images and train-id label maps
//! - Ordered, parallel batch assembly into Burn tensors

pub mod batch;
pub mod dataset;
pub mod types;

pub use batch::{EvalBatch, EvalBatchIter};
pub use dataset::{image_to_bgr_chw, load_label, load_sample, EvalDataset, IMG_MEAN_BGR};
pub use types::*;
