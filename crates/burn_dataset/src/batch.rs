//! Ordered batch iteration for evaluation.

use crate::dataset::{load_sample, EvalDataset};
use crate::types::{BurnDatasetError, DatasetResult, EvalSample};
use burn::tensor::{backend::Backend, Tensor, TensorData};
use rayon::prelude::*;
use std::time::{Duration, Instant};

pub(crate) const DEFAULT_LOG_EVERY_SAMPLES: usize = 100;

pub struct EvalBatch<B: Backend> {
    /// Mean-subtracted BGR images, shape `[batch, 3, height, width]`.
    pub images: Tensor<B, 4>,
    /// Train-id labels, `batch * height * width` in row-major order.
    pub labels: Vec<u8>,
    pub names: Vec<String>,
    pub width: usize,
    pub height: usize,
}

impl<B: Backend> EvalBatch<B> {
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Labels of sample `i` within the batch.
    pub fn sample_labels(&self, i: usize) -> &[u8] {
        let plane = self.width * self.height;
        &self.labels[i * plane..(i + 1) * plane]
    }
}

pub struct EvalBatchIter {
    dataset: EvalDataset,
    batch_size: usize,
    cursor: usize,
    processed_samples: usize,
    processed_batches: usize,
    started: Instant,
    total_load_time: Duration,
    last_logged_samples: usize,
    log_every_samples: Option<usize>,
}

impl EvalBatchIter {
    pub fn new(dataset: EvalDataset, batch_size: usize) -> Self {
        let log_every_samples = match std::env::var("BURN_DATASET_LOG_EVERY") {
            Ok(val) => {
                if val.eq_ignore_ascii_case("off") || val.trim() == "0" {
                    None
                } else {
                    val.trim().parse::<usize>().ok().filter(|v| *v > 0)
                }
            }
            Err(_) => Some(DEFAULT_LOG_EVERY_SAMPLES),
        };
        Self {
            dataset,
            batch_size: batch_size.max(1),
            cursor: 0,
            processed_samples: 0,
            processed_batches: 0,
            started: Instant::now(),
            total_load_time: Duration::ZERO,
            last_logged_samples: 0,
            log_every_samples,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Total number of batches over the whole dataset.
    pub fn len_batches(&self) -> usize {
        self.dataset.len().div_ceil(self.batch_size)
    }

    pub fn next_batch<B: Backend>(
        &mut self,
        device: &B::Device,
    ) -> DatasetResult<Option<EvalBatch<B>>> {
        if self.cursor >= self.dataset.len() {
            return Ok(None);
        }
        let end = (self.cursor + self.batch_size).min(self.dataset.len());
        let slice = &self.dataset.indices()[self.cursor..end];
        self.cursor = end;

        let t_load = Instant::now();
        let mut loaded: Vec<(usize, DatasetResult<EvalSample>)> = slice
            .par_iter()
            .enumerate()
            .map(|(i, idx)| (i, load_sample(idx)))
            .collect();
        loaded.sort_by_key(|(i, _)| *i);
        self.total_load_time += t_load.elapsed();

        let mut images_buf: Vec<f32> = Vec::new();
        let mut labels_buf: Vec<u8> = Vec::new();
        let mut names = Vec::with_capacity(loaded.len());
        let mut expected_size: Option<(u32, u32)> = None;
        for (_, res) in loaded {
            let sample = res?;
            let size = (sample.width, sample.height);
            match expected_size {
                None => expected_size = Some(size),
                Some((batch_w, batch_h)) if (batch_w, batch_h) != size => {
                    return Err(BurnDatasetError::MixedSizes {
                        name: sample.name,
                        width: size.0,
                        height: size.1,
                        batch_w,
                        batch_h,
                    });
                }
                _ => {}
            }
            images_buf.extend_from_slice(&sample.image_chw);
            labels_buf.extend_from_slice(&sample.label);
            names.push(sample.name);
        }

        let Some((width, height)) = expected_size else {
            return Ok(None);
        };
        let (width, height) = (width as usize, height as usize);
        let batch_len = names.len();
        let images = Tensor::<B, 4>::from_data(
            TensorData::new(images_buf, [batch_len, 3, height, width]),
            device,
        );

        self.processed_samples += batch_len;
        self.processed_batches += 1;
        self.maybe_log_progress();

        Ok(Some(EvalBatch {
            images,
            labels: labels_buf,
            names,
            width,
            height,
        }))
    }

    fn maybe_log_progress(&mut self) {
        let Some(threshold) = self.log_every_samples else {
            return;
        };
        if self.processed_samples - self.last_logged_samples < threshold
            && self.cursor < self.dataset.len()
        {
            return;
        }
        let secs = self.started.elapsed().as_secs_f32().max(0.001);
        let avg_load_ms =
            (self.total_load_time.as_secs_f64() * 1000.0) / self.processed_batches.max(1) as f64;
        tracing::info!(
            batches = self.processed_batches,
            samples = self.processed_samples,
            rate = self.processed_samples as f32 / secs,
            avg_load_ms,
            "[dataset] progress"
        );
        self.last_logged_samples = self.processed_samples;
    }
}
