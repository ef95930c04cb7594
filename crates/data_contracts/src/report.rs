use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassIou {
    pub train_id: u8,
    pub name: String,
    pub iou: f64,
}

/// Summary written to `metrics.json` at the end of an evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalReport {
    pub model_id: String,
    /// Number of stochastic forward passes averaged per image.
    pub samples: usize,
    pub num_images: usize,
    pub num_batches: usize,
    pub mean_iou: f64,
    pub pixel_accuracy: f64,
    pub classes: Vec<ClassIou>,
}

impl EvalReport {
    /// Per-class IoU values in train-id order.
    pub fn iou_array(&self) -> Vec<f64> {
        self.classes.iter().map(|c| c.iou).collect()
    }
}
