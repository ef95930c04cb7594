use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use burn::tensor::backend::Backend;
use burn_dataset::{EvalBatchIter, EvalDataset};
use clap::Parser;
use cli_support::{validate_backend_choice, BackendKind, EvalConfigFile, VisualizeMode};
use data_contracts::{class_name, ClassIou, EvalReport};
use inference::{max_entropy, McDropoutPredictor, SegmentationModel, SegmentationNetFactory};
use models::SegmentationNetConfig;

use crate::metrics::ConfusionMatrix;
use crate::visualize::{write_sample_visuals, SampleVisuals};
use crate::EvalBackend;

pub const DEFAULT_MODEL_ID: &str = "mcdropout_0";
pub const DEFAULT_SAMPLES: usize = 8;
pub const DEFAULT_DATA_DIR: &str = "../data/cityscapes";
pub const DEFAULT_DATA_LIST: &str = "lists/cityscapes/val.lst";
pub const DEFAULT_BATCH_SIZE: usize = 2;
pub const DEFAULT_CHECKPOINT_STEP: usize = 60_000;
pub const METRICS_FILE: &str = "metrics.json";

#[derive(Parser, Debug, Clone)]
#[command(
    name = "eval",
    about = "Evaluate an MC-dropout segmentation checkpoint (mean IoU + entropy maps)"
)]
pub struct EvalArgs {
    /// TOML config (falls back to $MCDROPOUT_EVAL_CONFIG, then ./mcdropout-eval.toml).
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Backend to use (ndarray or wgpu if enabled).
    #[arg(long, value_enum, default_value_t = BackendKind::NdArray)]
    pub backend: BackendKind,
    /// Model identifier; names the default checkpoint and output directories.
    #[arg(long)]
    pub model_id: Option<String>,
    /// Stochastic forward passes per image (M).
    #[arg(long, short = 'M')]
    pub samples: Option<usize>,
    /// Dataset root the list file paths are relative to.
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
    /// List file with `<image> <label>` pairs.
    #[arg(long)]
    pub data_list: Option<PathBuf>,
    #[arg(long)]
    pub batch_size: Option<usize>,
    #[arg(long)]
    pub num_classes: Option<usize>,
    /// Checkpoint to load (defaults to trained_models/<model_id>/checkpoint_60000.bin).
    #[arg(long)]
    pub checkpoint: Option<PathBuf>,
    /// Skip checkpoint loading and evaluate a freshly initialised network.
    #[arg(long, default_value_t = false)]
    pub fresh_model: bool,
    /// Output directory (defaults to training_logs/<model_id>_M<samples>_eval).
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// Which samples of each batch get PNG visualizations.
    #[arg(long, value_enum)]
    pub visualize: Option<VisualizeMode>,
    /// Stop after this many batches.
    #[arg(long)]
    pub max_batches: Option<usize>,
    /// Seed for the dropout masks.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Override the dropout probability of the MC-dropout layer.
    #[arg(long)]
    pub dropout_prob: Option<f64>,
}

/// Fully resolved evaluation settings.
#[derive(Debug, Clone)]
pub struct EvalSettings {
    pub model_id: String,
    pub samples: usize,
    pub data_dir: PathBuf,
    pub data_list: PathBuf,
    pub batch_size: usize,
    pub num_classes: usize,
    /// `None` evaluates a freshly initialised network.
    pub checkpoint: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub visualize: VisualizeMode,
    pub max_batches: Option<usize>,
    pub seed: Option<u64>,
    pub model: SegmentationNetConfig,
}

impl EvalSettings {
    /// CLI values win over the config file, which wins over built-in defaults.
    pub fn resolve(args: &EvalArgs, file: &EvalConfigFile) -> Self {
        let model_id = args
            .model_id
            .clone()
            .or_else(|| file.model_id.clone())
            .unwrap_or_else(|| DEFAULT_MODEL_ID.to_string());
        let samples = args.samples.or(file.samples).unwrap_or(DEFAULT_SAMPLES);
        let num_classes = args
            .num_classes
            .or(file.num_classes)
            .unwrap_or(data_contracts::NUM_CLASSES);

        let checkpoint = if args.fresh_model {
            None
        } else {
            Some(
                args.checkpoint
                    .clone()
                    .or_else(|| file.checkpoint())
                    .unwrap_or_else(|| default_checkpoint(&model_id)),
            )
        };
        let output_dir = args
            .output
            .clone()
            .or_else(|| file.output())
            .unwrap_or_else(|| default_output_dir(&model_id, samples));

        let defaults = SegmentationNetConfig::default();
        let model = SegmentationNetConfig {
            num_classes,
            base_channels: file.model.base_channels.unwrap_or(defaults.base_channels),
            aspp_channels: file.model.aspp_channels.unwrap_or(defaults.aspp_channels),
            dropout_prob: args
                .dropout_prob
                .or(file.model.dropout_prob)
                .unwrap_or(defaults.dropout_prob),
        };

        Self {
            model_id,
            samples,
            data_dir: args
                .data_dir
                .clone()
                .or_else(|| file.data_dir())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            data_list: args
                .data_list
                .clone()
                .or_else(|| file.data_list())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_LIST)),
            batch_size: args
                .batch_size
                .or(file.batch_size)
                .unwrap_or(DEFAULT_BATCH_SIZE),
            num_classes,
            checkpoint,
            output_dir,
            visualize: args.visualize.or(file.visualize).unwrap_or_default(),
            max_batches: args.max_batches.or(file.max_batches),
            seed: args.seed.or(file.seed),
            model,
        }
    }
}

pub fn default_checkpoint(model_id: &str) -> PathBuf {
    Path::new("trained_models")
        .join(model_id)
        .join(format!("checkpoint_{DEFAULT_CHECKPOINT_STEP}.bin"))
}

pub fn default_output_dir(model_id: &str, samples: usize) -> PathBuf {
    Path::new("training_logs").join(format!("{model_id}_M{samples}_eval"))
}

/// Parse config, resolve settings and run on [`EvalBackend`].
pub fn run_cli(args: EvalArgs) -> anyhow::Result<EvalReport> {
    validate_backend_choice(args.backend, cfg!(feature = "backend-wgpu"))?;
    let file = EvalConfigFile::load(args.config.as_deref())?;
    let settings = EvalSettings::resolve(&args, &file);
    run_eval(&settings)
}

/// Build the model from `settings`, evaluate the listed dataset and write `metrics.json`.
pub fn run_eval(settings: &EvalSettings) -> anyhow::Result<EvalReport> {
    if settings.batch_size == 0 {
        anyhow::bail!("batch size must be at least 1");
    }
    if settings.max_batches == Some(0) {
        anyhow::bail!("max_batches must be at least 1");
    }
    if let Some(seed) = settings.seed {
        inference::seed_backend(seed);
    }
    fs::create_dir_all(&settings.output_dir).with_context(|| {
        format!(
            "failed to create output directory {}",
            settings.output_dir.display()
        )
    })?;

    let dataset = EvalDataset::from_list(&settings.data_dir, &settings.data_list)
        .with_context(|| format!("failed to load list {}", settings.data_list.display()))?;
    if dataset.is_empty() {
        anyhow::bail!("list {} contains no samples", settings.data_list.display());
    }
    tracing::info!(
        samples = dataset.len(),
        list = %settings.data_list.display(),
        "loaded evaluation list"
    );

    let device = <EvalBackend as Backend>::Device::default();
    let model = SegmentationNetFactory.build::<EvalBackend>(
        &settings.model,
        settings.checkpoint.as_deref(),
        &device,
    )?;
    let predictor = McDropoutPredictor::new(model, settings.samples)?;
    let batches = EvalBatchIter::new(dataset, settings.batch_size);
    evaluate(&predictor, batches, settings, &device)
}

/// Evaluation loop over an already built predictor. Backend- and model-agnostic.
pub fn evaluate<B: Backend, M: SegmentationModel<B>>(
    predictor: &McDropoutPredictor<B, M>,
    mut batches: EvalBatchIter,
    settings: &EvalSettings,
    device: &B::Device,
) -> anyhow::Result<EvalReport> {
    let num_classes = predictor.model().num_classes();
    let max_h = max_entropy(num_classes);
    let total = batches.len_batches();
    let mut confusion = ConfusionMatrix::new(num_classes);
    let mut step = 0usize;
    let mut num_images = 0usize;

    loop {
        if settings.max_batches.is_some_and(|max| step >= max) {
            tracing::info!(step, "max_batches reached; stopping early");
            break;
        }
        let Some(batch) = batches.next_batch::<B>(device)? else {
            break;
        };
        step += 1;
        tracing::info!("{step}/{total}");

        let dist = predictor.predict(batch.images.clone())?;
        let preds = dist.argmax();
        confusion.update(&batch.labels, &preds)?;
        num_images += batch.len();

        if settings.visualize != VisualizeMode::None {
            let image_data = batch
                .images
                .clone()
                .into_data()
                .to_vec::<f32>()
                .map_err(|e| anyhow::anyhow!("failed to read batch images: {e:?}"))?;
            let entropy = dist.entropy();
            for (i, name) in batch.names.iter().enumerate() {
                if !settings.visualize.wants(i) {
                    continue;
                }
                let pixels = dist.sample_range(i);
                let sample = SampleVisuals {
                    name,
                    image_chw: &image_data[3 * pixels.start..3 * pixels.end],
                    labels: batch.sample_labels(i),
                    preds: &preds[pixels.clone()],
                    entropy: &entropy[pixels],
                    width: batch.width as u32,
                    height: batch.height as u32,
                    max_entropy: max_h,
                };
                write_sample_visuals(&settings.output_dir, &sample)?;
            }
        }
    }

    if confusion.skipped() > 0 {
        tracing::warn!(
            skipped = confusion.skipped(),
            "ground-truth pixels with out-of-range class ids were ignored"
        );
    }

    let classes = confusion
        .iou_per_class()
        .into_iter()
        .enumerate()
        .map(|(c, iou)| ClassIou {
            train_id: c as u8,
            name: class_name(c as u8)
                .map(str::to_string)
                .unwrap_or_else(|| format!("class_{c}")),
            iou,
        })
        .collect();
    let report = EvalReport {
        model_id: settings.model_id.clone(),
        samples: predictor.samples(),
        num_images,
        num_batches: step,
        mean_iou: confusion.mean_iou(),
        pixel_accuracy: confusion.pixel_accuracy(),
        classes,
    };

    let metrics_path = settings.output_dir.join(METRICS_FILE);
    fs::write(&metrics_path, serde_json::to_string_pretty(&report)?)
        .with_context(|| format!("failed to write {}", metrics_path.display()))?;
    tracing::info!(path = %metrics_path.display(), "wrote metrics");
    Ok(report)
}

/// Console summary: mean IoU followed by the per-class IoU array.
pub fn format_summary(report: &EvalReport) -> String {
    let ious: Vec<String> = report
        .iou_array()
        .iter()
        .map(|v| format!("{v:.4}"))
        .collect();
    format!(
        "meanIU: {:.4}\nIU_array: [{}]\npixel_acc: {:.4} (images={}, batches={}, M={})",
        report.mean_iou,
        ious.join(", "),
        report.pixel_accuracy,
        report.num_images,
        report.num_batches,
        report.samples
    )
}
