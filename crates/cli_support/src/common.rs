use clap::ValueEnum;
use serde::Deserialize;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    NdArray,
    Wgpu,
}

/// Which samples of each batch get PNG visualizations.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualizeMode {
    /// No images are written.
    None,
    /// Only the first sample of every batch.
    #[default]
    First,
    /// Every sample.
    All,
}

impl VisualizeMode {
    pub fn wants(&self, index_in_batch: usize) -> bool {
        match self {
            VisualizeMode::None => false,
            VisualizeMode::First => index_in_batch == 0,
            VisualizeMode::All => true,
        }
    }
}

/// Check the requested backend against the compiled feature set.
///
/// `wgpu_built` is `cfg!(feature = "backend-wgpu")` of the calling crate.
pub fn validate_backend_choice(kind: BackendKind, wgpu_built: bool) -> anyhow::Result<()> {
    match (kind, wgpu_built) {
        (BackendKind::Wgpu, false) => {
            anyhow::bail!("backend-wgpu feature not enabled; rebuild with --features backend-wgpu or choose ndarray backend")
        }
        (BackendKind::NdArray, true) => {
            tracing::warn!("built with backend-wgpu; evaluation will still use the WGPU backend despite --backend nd-array");
        }
        _ => {}
    }
    Ok(())
}
