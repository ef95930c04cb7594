//! Shared CLI plumbing for the evaluation binaries.

pub mod common;
pub mod config;
pub mod logging;

pub use common::{validate_backend_choice, BackendKind, VisualizeMode};
pub use config::{ConfigError, EvalConfigFile, ModelSection, PathSection};
pub use logging::init_tracing;
