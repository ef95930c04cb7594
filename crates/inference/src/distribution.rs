use crate::InferenceError;
use std::ops::Range;

/// Natural-log entropy of the uniform distribution over `classes`.
pub fn max_entropy(classes: usize) -> f32 {
    (classes.max(1) as f32).ln()
}

/// Averaged class probabilities for a batch, laid out NCHW on the host.
#[derive(Debug, Clone)]
pub struct PredictiveDistribution {
    probs: Vec<f32>,
    batch: usize,
    classes: usize,
    height: usize,
    width: usize,
}

impl PredictiveDistribution {
    pub fn new(
        probs: Vec<f32>,
        batch: usize,
        classes: usize,
        height: usize,
        width: usize,
    ) -> Result<Self, InferenceError> {
        if classes > 256 {
            return Err(InferenceError::TooManyClasses(classes));
        }
        let expected = batch * classes * height * width;
        if probs.len() != expected {
            return Err(InferenceError::ShapeMismatch {
                expected,
                actual: probs.len(),
            });
        }
        Ok(Self {
            probs,
            batch,
            classes,
            height,
            width,
        })
    }

    pub fn batch(&self) -> usize {
        self.batch
    }

    pub fn classes(&self) -> usize {
        self.classes
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn probs(&self) -> &[f32] {
        &self.probs
    }

    /// Probability of class `c` at pixel `(y, x)` of sample `b`.
    pub fn prob(&self, b: usize, c: usize, y: usize, x: usize) -> f32 {
        let plane = self.height * self.width;
        self.probs[(b * self.classes + c) * plane + y * self.width + x]
    }

    /// Index range of sample `i` within per-pixel outputs (`argmax`, `entropy`).
    pub fn sample_range(&self, i: usize) -> Range<usize> {
        let plane = self.height * self.width;
        i * plane..(i + 1) * plane
    }

    /// Most probable class per pixel, `batch * height * width` values. Ties keep the lower index.
    pub fn argmax(&self) -> Vec<u8> {
        let plane = self.height * self.width;
        let mut out = vec![0u8; self.batch * plane];
        for b in 0..self.batch {
            let base = b * self.classes * plane;
            for p in 0..plane {
                let mut best = 0usize;
                let mut best_p = f32::NEG_INFINITY;
                for c in 0..self.classes {
                    let v = self.probs[base + c * plane + p];
                    if v > best_p {
                        best_p = v;
                        best = c;
                    }
                }
                out[b * plane + p] = best as u8;
            }
        }
        out
    }

    /// Predictive entropy `-sum_c p ln p` per pixel (zero-probability classes contribute 0).
    pub fn entropy(&self) -> Vec<f32> {
        let plane = self.height * self.width;
        let mut out = vec![0f32; self.batch * plane];
        for b in 0..self.batch {
            let base = b * self.classes * plane;
            for c in 0..self.classes {
                let class_base = base + c * plane;
                for p in 0..plane {
                    let v = self.probs[class_base + p];
                    if v > 0.0 {
                        out[b * plane + p] -= v * v.ln();
                    }
                }
            }
        }
        out
    }
}
