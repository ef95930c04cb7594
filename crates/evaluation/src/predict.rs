//! Single-image MC-dropout prediction.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use burn_dataset::image_to_bgr_chw;
use clap::Parser;
use cli_support::{validate_backend_choice, BackendKind};
use inference::{max_entropy, McDropoutPredictor, SegmentationModel, SegmentationNetFactory};
use models::SegmentationNetConfig;
use vision_core::colormap::{colorize_labels, entropy_heatmap};
use vision_core::overlay::overlay_labels;

use crate::EvalBackend;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "predict",
    about = "Run MC-dropout segmentation on one image and write prediction + entropy PNGs"
)]
pub struct PredictArgs {
    /// Input RGB image.
    #[arg(long)]
    pub image: PathBuf,
    /// Checkpoint to load; omit to run a freshly initialised network.
    #[arg(long)]
    pub checkpoint: Option<PathBuf>,
    /// Backend to use (ndarray or wgpu if enabled).
    #[arg(long, value_enum, default_value_t = BackendKind::NdArray)]
    pub backend: BackendKind,
    /// Stochastic forward passes (M).
    #[arg(long, short = 'M', default_value_t = 8)]
    pub samples: usize,
    #[arg(long, default_value_t = data_contracts::NUM_CLASSES)]
    pub num_classes: usize,
    /// Output directory (defaults to the image's directory).
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct PredictOutputs {
    pub pred_overlay: PathBuf,
    pub entropy: PathBuf,
    pub mean_entropy: f32,
}

/// Predict one image and write `<stem>_pred_overlayed.png` and `<stem>_entropy.png`.
pub fn predict_image<B: Backend, M: SegmentationModel<B>>(
    predictor: &McDropoutPredictor<B, M>,
    image_path: &Path,
    out_dir: &Path,
    device: &B::Device,
) -> anyhow::Result<PredictOutputs> {
    let rgb = image::open(image_path)
        .with_context(|| format!("failed to open {}", image_path.display()))?
        .to_rgb8();
    let (w, h) = rgb.dimensions();
    let input = Tensor::<B, 4>::from_data(
        TensorData::new(image_to_bgr_chw(&rgb), [1, 3, h as usize, w as usize]),
        device,
    );
    let dist = predictor.predict(input)?;
    let preds = dist.argmax();
    let entropy = dist.entropy();

    let colored = colorize_labels(&preds, w, h)
        .context("prediction does not match the input size")?;
    let overlay = overlay_labels(&rgb, &colored).context("overlay size mismatch")?;
    let heat = entropy_heatmap(&entropy, w, h, max_entropy(dist.classes()))
        .context("entropy does not match the input size")?;

    let stem = image_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    fs::create_dir_all(out_dir)?;
    let pred_path = out_dir.join(format!("{stem}_pred_overlayed.png"));
    let entropy_path = out_dir.join(format!("{stem}_entropy.png"));
    overlay
        .save(&pred_path)
        .with_context(|| format!("failed to write {}", pred_path.display()))?;
    heat.save(&entropy_path)
        .with_context(|| format!("failed to write {}", entropy_path.display()))?;

    let mean_entropy = if entropy.is_empty() {
        0.0
    } else {
        entropy.iter().sum::<f32>() / entropy.len() as f32
    };
    Ok(PredictOutputs {
        pred_overlay: pred_path,
        entropy: entropy_path,
        mean_entropy,
    })
}

pub fn run_predict(args: PredictArgs) -> anyhow::Result<PredictOutputs> {
    validate_backend_choice(args.backend, cfg!(feature = "backend-wgpu"))?;
    if let Some(seed) = args.seed {
        inference::seed_backend(seed);
    }
    let device = <EvalBackend as Backend>::Device::default();
    let cfg = SegmentationNetConfig {
        num_classes: args.num_classes,
        ..SegmentationNetConfig::default()
    };
    let model =
        SegmentationNetFactory.build::<EvalBackend>(&cfg, args.checkpoint.as_deref(), &device)?;
    let predictor = McDropoutPredictor::new(model, args.samples)?;
    let out_dir = args.out_dir.clone().unwrap_or_else(|| {
        args.image
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    });
    predict_image(&predictor, &args.image, &out_dir, &device)
}
