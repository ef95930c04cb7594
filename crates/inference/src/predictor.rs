use crate::distribution::PredictiveDistribution;
use crate::InferenceError;
use burn::tensor::activation::softmax;
use burn::tensor::backend::Backend;
use burn::tensor::module::interpolate;
use burn::tensor::ops::{InterpolateMode, InterpolateOptions};
use burn::tensor::Tensor;
use models::SegmentationNet;
use std::marker::PhantomData;

/// A network producing (possibly downsampled) per-class logits for a batch of images.
pub trait SegmentationModel<B: Backend> {
    fn num_classes(&self) -> usize;
    /// `[batch, 3, h, w]` -> `[batch, num_classes, h', w']`.
    fn forward_logits(&self, images: Tensor<B, 4>) -> Tensor<B, 4>;
    /// Smallest supported input height/width.
    fn min_input_size(&self) -> usize {
        1
    }
}

impl<B: Backend> SegmentationModel<B> for SegmentationNet<B> {
    fn num_classes(&self) -> usize {
        SegmentationNet::num_classes(self)
    }

    fn forward_logits(&self, images: Tensor<B, 4>) -> Tensor<B, 4> {
        self.forward(images)
    }

    fn min_input_size(&self) -> usize {
        SegmentationNet::min_input_size(self)
    }
}

/// Bilinear (align-corners) resize of logits to the input resolution.
pub fn upsample_logits<B: Backend>(logits: Tensor<B, 4>, height: usize, width: usize) -> Tensor<B, 4> {
    let [_, _, h, w] = logits.dims();
    if (h, w) == (height, width) {
        return logits;
    }
    interpolate(
        logits,
        [height, width],
        InterpolateOptions::new(InterpolateMode::Bilinear),
    )
}

/// Averages the softmax output of `samples` stochastic forward passes.
pub struct McDropoutPredictor<B: Backend, M: SegmentationModel<B>> {
    model: M,
    samples: usize,
    _backend: PhantomData<B>,
}

impl<B: Backend, M: SegmentationModel<B>> McDropoutPredictor<B, M> {
    pub fn new(model: M, samples: usize) -> Result<Self, InferenceError> {
        if samples == 0 {
            return Err(InferenceError::InvalidSamples);
        }
        Ok(Self {
            model,
            samples,
            _backend: PhantomData,
        })
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Mean predictive probabilities as a device tensor, shape `[batch, classes, h, w]`.
    pub fn predict_tensor(&self, images: Tensor<B, 4>) -> Result<Tensor<B, 4>, InferenceError> {
        let [batch, _, height, width] = images.dims();
        let min = self.model.min_input_size();
        if height < min || width < min {
            return Err(InferenceError::InputTooSmall { height, width, min });
        }
        let classes = self.model.num_classes();
        let device = images.device();
        let weight = self.samples as f64;

        let mut p = Tensor::<B, 4>::zeros([batch, classes, height, width], &device);
        for _ in 0..self.samples {
            let logits = self.model.forward_logits(images.clone());
            let actual = logits.dims()[1];
            if actual != classes {
                return Err(InferenceError::ClassMismatch {
                    expected: classes,
                    actual,
                });
            }
            let logits = upsample_logits(logits, height, width);
            p = p + softmax(logits, 1).div_scalar(weight);
        }
        Ok(p)
    }

    /// Mean predictive probabilities copied to the host.
    pub fn predict(&self, images: Tensor<B, 4>) -> Result<PredictiveDistribution, InferenceError> {
        let [batch, _, height, width] = images.dims();
        let classes = self.model.num_classes();
        let probs = self
            .predict_tensor(images)?
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| InferenceError::Data(format!("{e:?}")))?;
        PredictiveDistribution::new(probs, batch, classes, height, width)
    }
}
