#![recursion_limit = "256"]

pub mod metrics;
pub mod predict;
pub mod run;
pub mod visualize;

pub use metrics::{ConfusionMatrix, MetricsError};
pub use predict::{predict_image, run_predict, PredictArgs, PredictOutputs};
pub use run::{evaluate, format_summary, run_cli, run_eval, EvalArgs, EvalSettings};
pub use visualize::{write_sample_visuals, SampleVisuals, VisualizeError};

/// Backend alias for evaluation (NdArray by default; WGPU if enabled).
pub type EvalBackend = inference::InferenceBackend;
