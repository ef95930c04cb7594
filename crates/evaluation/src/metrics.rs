//! Confusion-matrix accumulation and IoU metrics.

use data_contracts::IGNORE_LABEL;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetricsError {
    #[error("ground truth has {gt} pixels but prediction has {pred}")]
    LengthMismatch { gt: usize, pred: usize },
    #[error("predicted class {0} is outside the {1}-class range")]
    PredictionOutOfRange(u8, usize),
    #[error("cannot merge a {other}-class matrix into a {this}-class matrix")]
    ClassCountMismatch { this: usize, other: usize },
}

/// Row = ground truth class, column = predicted class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    num_classes: usize,
    counts: Vec<u64>,
    skipped: u64,
}

impl ConfusionMatrix {
    pub fn new(num_classes: usize) -> Self {
        Self {
            num_classes,
            counts: vec![0; num_classes * num_classes],
            skipped: 0,
        }
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn get(&self, gt: usize, pred: usize) -> u64 {
        self.counts[gt * self.num_classes + pred]
    }

    /// Number of counted (non-ignored) pixels.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Pixels whose ground truth was outside `0..num_classes` but not the ignore label.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Accumulate one label map. Pixels labelled [`IGNORE_LABEL`] are not counted.
    pub fn update(&mut self, gt: &[u8], pred: &[u8]) -> Result<(), MetricsError> {
        if gt.len() != pred.len() {
            return Err(MetricsError::LengthMismatch {
                gt: gt.len(),
                pred: pred.len(),
            });
        }
        let n = self.num_classes;
        if let Some(bad) = pred.iter().find(|p| **p as usize >= n) {
            return Err(MetricsError::PredictionOutOfRange(*bad, n));
        }
        for (&g, &p) in gt.iter().zip(pred) {
            if g == IGNORE_LABEL {
                continue;
            }
            if g as usize >= n {
                self.skipped += 1;
                continue;
            }
            self.counts[g as usize * n + p as usize] += 1;
        }
        Ok(())
    }

    pub fn merge(&mut self, other: &ConfusionMatrix) -> Result<(), MetricsError> {
        if other.num_classes != self.num_classes {
            return Err(MetricsError::ClassCountMismatch {
                this: self.num_classes,
                other: other.num_classes,
            });
        }
        for (a, b) in self.counts.iter_mut().zip(&other.counts) {
            *a += b;
        }
        self.skipped += other.skipped;
        Ok(())
    }

    /// Per-class `tp / max(1, gt_count + pred_count - tp)`.
    pub fn iou_per_class(&self) -> Vec<f64> {
        let n = self.num_classes;
        (0..n)
            .map(|c| {
                let tp = self.get(c, c);
                let pos: u64 = (0..n).map(|p| self.get(c, p)).sum();
                let res: u64 = (0..n).map(|g| self.get(g, c)).sum();
                tp as f64 / (pos + res - tp).max(1) as f64
            })
            .collect()
    }

    /// Mean over every class, including classes that never occur.
    pub fn mean_iou(&self) -> f64 {
        if self.num_classes == 0 {
            return 0.0;
        }
        self.iou_per_class().iter().sum::<f64>() / self.num_classes as f64
    }

    pub fn pixel_accuracy(&self) -> f64 {
        let tp: u64 = (0..self.num_classes).map(|c| self.get(c, c)).sum();
        tp as f64 / self.total().max(1) as f64
    }
}
