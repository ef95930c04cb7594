//! Core types and error definitions for burn_dataset.

use std::path::PathBuf;
use thiserror::Error;

pub type DatasetResult<T> = Result<T, BurnDatasetError>;

#[derive(Debug, Error)]
pub enum BurnDatasetError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("list parse error in {path}: {source}")]
    List {
        path: PathBuf,
        #[source]
        source: data_contracts::ListParseError,
    },
    #[error("image decode error at {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("label {label} is {label_w}x{label_h} but image is {image_w}x{image_h}")]
    SizeMismatch {
        label: PathBuf,
        label_w: u32,
        label_h: u32,
        image_w: u32,
        image_h: u32,
    },
    #[error("{name} is {width}x{height} but the batch is {batch_w}x{batch_h}")]
    MixedSizes {
        name: String,
        width: u32,
        height: u32,
        batch_w: u32,
        batch_h: u32,
    },
}

/// Resolved paths for one evaluation sample.
#[derive(Debug, Clone)]
pub struct SampleIndex {
    pub name: String,
    pub image_path: PathBuf,
    pub label_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct EvalSample {
    pub name: String,
    /// Image in CHW layout, BGR channel order, mean-subtracted.
    pub image_chw: Vec<f32>,
    /// Train ids in row-major order (`IGNORE_LABEL` for unevaluated pixels).
    pub label: Vec<u8>,
    pub width: u32,
    pub height: u32,
}
