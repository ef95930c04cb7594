#![recursion_limit = "256"]

pub mod distribution;
pub mod factory;
pub mod predictor;

use std::path::PathBuf;
use thiserror::Error;

#[cfg(feature = "backend-wgpu")]
pub type InferenceBackend = burn_wgpu::Wgpu<f32>;
#[cfg(not(feature = "backend-wgpu"))]
pub type InferenceBackend = burn_ndarray::NdArray<f32>;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("number of stochastic samples must be at least 1")]
    InvalidSamples,
    #[error("model produced {actual} classes, expected {expected}")]
    ClassMismatch { expected: usize, actual: usize },
    #[error("at most 256 classes are supported for u8 label maps, got {0}")]
    TooManyClasses(usize),
    #[error("probability buffer has {actual} values, expected {expected}")]
    ShapeMismatch { expected: usize, actual: usize },
    #[error("input is {height}x{width} but the model needs at least {min}x{min}")]
    InputTooSmall {
        height: usize,
        width: usize,
        min: usize,
    },
    #[error("tensor data error: {0}")]
    Data(String),
    #[error("checkpoint not found: {0}")]
    MissingCheckpoint(PathBuf),
    #[error("failed to load checkpoint {path}: {message}")]
    Checkpoint { path: PathBuf, message: String },
    #[error(transparent)]
    Config(#[from] models::ModelConfigError),
}

/// Seed the inference backend RNG so dropout masks are reproducible.
pub fn seed_backend(seed: u64) {
    <InferenceBackend as burn::tensor::backend::Backend>::seed(seed);
}

pub use distribution::{max_entropy, PredictiveDistribution};
pub use factory::{load_segmentation_net, SegmentationNetFactory};
pub use predictor::{McDropoutPredictor, SegmentationModel};

pub mod prelude {
    pub use crate::distribution::{max_entropy, PredictiveDistribution};
    pub use crate::factory::{load_segmentation_net, SegmentationNetFactory};
    pub use crate::predictor::{McDropoutPredictor, SegmentationModel};
    pub use crate::{InferenceBackend, InferenceError};
}
