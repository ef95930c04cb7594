use crate::InferenceError;
use burn::module::Module;
use burn::record::{BinFileRecorder, FullPrecisionSettings};
use burn::tensor::backend::Backend;
use models::{SegmentationNet, SegmentationNetConfig};
use std::path::Path;

/// Load `SegmentationNet` weights saved with `BinFileRecorder<FullPrecisionSettings>`.
pub fn load_segmentation_net<B: Backend>(
    path: &Path,
    cfg: &SegmentationNetConfig,
    device: &B::Device,
) -> Result<SegmentationNet<B>, InferenceError> {
    if !path.exists() {
        return Err(InferenceError::MissingCheckpoint(path.to_path_buf()));
    }
    let recorder = BinFileRecorder::<FullPrecisionSettings>::new();
    cfg.init::<B>(device)
        .load_file(path, &recorder, device)
        .map_err(|e| InferenceError::Checkpoint {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Builds the evaluation network, from a checkpoint when one is given.
pub struct SegmentationNetFactory;

impl SegmentationNetFactory {
    pub fn build<B: Backend>(
        &self,
        cfg: &SegmentationNetConfig,
        checkpoint: Option<&Path>,
        device: &B::Device,
    ) -> Result<SegmentationNet<B>, InferenceError> {
        cfg.validate()?;
        match checkpoint {
            Some(path) => {
                let model = load_segmentation_net::<B>(path, cfg, device)?;
                tracing::info!(checkpoint = %path.display(), "loaded SegmentationNet checkpoint");
                Ok(model)
            }
            None => {
                tracing::warn!(
                    "no checkpoint provided; using freshly initialised SegmentationNet (metrics will be meaningless)"
                );
                Ok(cfg.init::<B>(device))
            }
        }
    }
}
